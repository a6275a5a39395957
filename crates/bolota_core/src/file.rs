//! Document file open/save orchestration.
//!
//! # Responsibility
//! - Read whole files into memory before decoding and write only fully
//!   encoded documents.
//! - Attach the offending path to every failure.
//!
//! # Invariants
//! - A failed open never returns a partial document.
//! - A failed encode never touches the destination file.
//!
//! # See also
//! - `codec` for the byte layout.

use crate::codec::{decode_document, encode_document, CodecError, DecodeOptions};
use crate::model::document::Document;
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

pub type FileResult<T> = Result<T, FileError>;

/// Direction of the file operation that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileAction {
    Open,
    Save,
}

impl Display for FileAction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => f.write_str("reading"),
            Self::Save => f.write_str("writing"),
        }
    }
}

/// Errors from reading or writing a document file.
#[derive(Debug)]
pub enum FileError {
    /// Filesystem failure.
    Io {
        action: FileAction,
        path: PathBuf,
        source: io::Error,
    },
    /// File contents could not be decoded, or the document could not be encoded.
    Codec {
        action: FileAction,
        path: PathBuf,
        source: CodecError,
    },
}

impl FileError {
    pub fn action(&self) -> FileAction {
        match self {
            Self::Io { action, .. } | Self::Codec { action, .. } => *action,
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Self::Io { path, .. } | Self::Codec { path, .. } => path,
        }
    }

    /// Whether the file needs a newer reader rather than being corrupt.
    pub fn is_newer_version(&self) -> bool {
        matches!(self, Self::Codec { source, .. } if source.is_newer_version())
    }

    pub fn codec_error(&self) -> Option<&CodecError> {
        match self {
            Self::Codec { source, .. } => Some(source),
            Self::Io { .. } => None,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Io { .. } => "io_failed",
            Self::Codec {
                source: CodecError::NewerVersion { .. },
                ..
            } => "newer_version",
            Self::Codec { .. } => "codec_failed",
        }
    }
}

impl Display for FileError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = self
            .path()
            .file_name()
            .map_or_else(|| self.path().display().to_string(), |name| {
                name.to_string_lossy().into_owned()
            });
        let action = self.action();
        match self {
            Self::Io { source, .. } => {
                write!(f, "{source} while {action} the Bolota document {name}")
            }
            Self::Codec { source, .. } => {
                write!(f, "{source} while {action} the Bolota document {name}")
            }
        }
    }
}

impl Error for FileError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Codec { source, .. } => Some(source),
        }
    }
}

/// Opens a document, keeping icon ids unresolved.
pub fn open_document(path: impl AsRef<Path>) -> FileResult<Document> {
    open_document_with(path, DecodeOptions::default())
}

/// Opens a document with explicit decode collaborators.
///
/// # Side effects
/// - Emits `document_open` events with duration and status.
pub fn open_document_with(
    path: impl AsRef<Path>,
    options: DecodeOptions<'_>,
) -> FileResult<Document> {
    let path = path.as_ref();
    let started_at = Instant::now();
    info!(
        "event=document_open module=file status=start path={}",
        path.display()
    );

    let result = std::fs::read(path)
        .map_err(|source| FileError::Io {
            action: FileAction::Open,
            path: path.to_path_buf(),
            source,
        })
        .and_then(|bytes| {
            decode_document(&bytes, options).map_err(|source| FileError::Codec {
                action: FileAction::Open,
                path: path.to_path_buf(),
                source,
            })
        });

    match &result {
        Ok(doc) => info!(
            "event=document_open module=file status=ok path={} duration_ms={} topics={}",
            path.display(),
            started_at.elapsed().as_millis(),
            doc.topic_count()
        ),
        Err(err) => error!(
            "event=document_open module=file status=error path={} duration_ms={} error_code={} error={}",
            path.display(),
            started_at.elapsed().as_millis(),
            err.error_code(),
            err
        ),
    }
    result
}

/// Encodes and writes a document in one step.
///
/// # Side effects
/// - Replaces the file at `path`.
/// - Emits `document_save` events with duration and status.
pub fn save_document(doc: &Document, path: impl AsRef<Path>) -> FileResult<()> {
    let path = path.as_ref();
    let started_at = Instant::now();
    info!(
        "event=document_save module=file status=start path={}",
        path.display()
    );

    let result = encode_document(doc)
        .map_err(|source| FileError::Codec {
            action: FileAction::Save,
            path: path.to_path_buf(),
            source,
        })
        .and_then(|bytes| {
            std::fs::write(path, &bytes)
                .map(|()| bytes.len())
                .map_err(|source| FileError::Io {
                    action: FileAction::Save,
                    path: path.to_path_buf(),
                    source,
                })
        });

    match result {
        Ok(bytes) => {
            info!(
                "event=document_save module=file status=ok path={} duration_ms={} bytes={}",
                path.display(),
                started_at.elapsed().as_millis(),
                bytes
            );
            Ok(())
        }
        Err(err) => {
            error!(
                "event=document_save module=file status=error path={} duration_ms={} error_code={} error={}",
                path.display(),
                started_at.elapsed().as_millis(),
                err.error_code(),
                err
            );
            Err(err)
        }
    }
}
