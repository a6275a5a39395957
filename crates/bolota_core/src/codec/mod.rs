//! Bolota binary document codec.
//!
//! # Responsibility
//! - Encode a [`Document`] into the three-section Bolota layout and back.
//! - Report malformed input through a typed error taxonomy.
//!
//! # Invariants
//! - Decoding is atomic: on error no partially built document escapes.
//! - A version newer than [`FORMAT_VERSION`] is reported as
//!   [`CodecError::NewerVersion`], never as a format error.
//! - Section lengths in the header must match the file exactly; trailing
//!   bytes are rejected.
//!
//! # Layout
//! ```text
//! header      magic "BLT" | version u8 | properties_len u32 LE | topics_len u32 LE
//! properties  title (Text) | subtitle (Text) | created (Date)
//! topics      pre-order records, each tagged with its depth
//! ```

pub mod header;
pub mod record;
pub mod topics;

pub use header::{FileHeader, FORMAT_VERSION, HEADER_LEN, MAGIC};
pub use record::{decode_payload, encode_record, RECORD_HEADER_LEN};
pub use topics::{decode_topics, encode_topics};

use crate::icon::{EmptyCatalog, IconCatalog};
use crate::model::document::Document;
use crate::model::field::{Field, FieldKind, IconId, Timestamp, DATE_PAYLOAD_LEN};
use crate::model::text::{EncodingError, TextBuffer};
use log::debug;
use record::ByteReader;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type CodecResult<T> = Result<T, CodecError>;

/// File section named by layout errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Properties,
    Topics,
}

impl Display for Section {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Properties => f.write_str("properties"),
            Self::Topics => f.write_str("topics"),
        }
    }
}

/// Structural problems in a document's bytes.
///
/// Record offsets are relative to the start of their section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    InvalidMagic { found: [u8; 3] },
    TruncatedHeader { available: usize },
    TruncatedSection {
        section: Section,
        declared: u32,
        available: usize,
    },
    TrailingBytes { after: Section, count: usize },
    InvalidFieldType { tag: u8, offset: usize },
    TruncatedRecord { offset: usize },
    RecordLengthMismatch {
        offset: usize,
        declared: u16,
        expected: usize,
    },
    /// A blank record declared text bytes.
    UnexpectedText { offset: usize },
    /// Depth increased by more than one level between consecutive records.
    DepthJump {
        offset: usize,
        previous: i32,
        found: u8,
    },
    /// A properties record has the wrong field kind.
    UnexpectedFieldType { expected: FieldKind, found: FieldKind },
    InvalidTimestamp { bytes: [u8; DATE_PAYLOAD_LEN] },
    /// Icon id unknown to a strict catalog.
    UnresolvedIcon(IconId),
    /// Encoded section does not fit the 32-bit length field.
    SectionTooLarge { section: Section, length: usize },
}

impl Display for FormatError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidMagic { found } => write!(f, "an invalid magic was found: {found:02x?}"),
            Self::TruncatedHeader { available } => {
                write!(f, "document header ended prematurely after {available} bytes")
            }
            Self::TruncatedSection {
                section,
                declared,
                available,
            } => write!(
                f,
                "document {section} section ended prematurely: declared {declared} bytes, {available} available"
            ),
            Self::TrailingBytes { after, count } => {
                write!(f, "{count} unexpected bytes after the {after} section")
            }
            Self::InvalidFieldType { tag, offset } => {
                write!(f, "invalid field type {tag:#04x} at offset {offset}")
            }
            Self::TruncatedRecord { offset } => {
                write!(f, "field record at offset {offset} ended prematurely")
            }
            Self::RecordLengthMismatch {
                offset,
                declared,
                expected,
            } => write!(
                f,
                "field record at offset {offset} declares length {declared}, expected {expected}"
            ),
            Self::UnexpectedText { offset } => {
                write!(f, "blank field record at offset {offset} carries text")
            }
            Self::DepthJump {
                offset,
                previous,
                found,
            } => write!(
                f,
                "field depth forward jump greater than 1 at offset {offset}: {previous} -> {found}"
            ),
            Self::UnexpectedFieldType { expected, found } => {
                write!(f, "expected a {expected} property field, found {found}")
            }
            Self::InvalidTimestamp { bytes } => write!(f, "invalid timestamp bytes {bytes:02x?}"),
            Self::UnresolvedIcon(id) => write!(f, "icon {id} is not in the icon catalog"),
            Self::SectionTooLarge { section, length } => {
                write!(f, "{section} section of {length} bytes exceeds the format limit")
            }
        }
    }
}

impl Error for FormatError {}

/// Errors from encoding or decoding a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Bytes do not follow the Bolota layout.
    Format(FormatError),
    /// Written by a newer format version; the reader needs an upgrade.
    NewerVersion { found: u8, supported: u8 },
    /// Field text is not valid UTF-8.
    Encoding(EncodingError),
    /// Field text does not fit the 16-bit record length fields.
    TextTooLong { bytes: usize },
    /// Topic nesting does not fit the one-byte depth field.
    DepthTooDeep { depth: usize },
}

impl CodecError {
    pub fn is_newer_version(&self) -> bool {
        matches!(self, Self::NewerVersion { .. })
    }
}

impl Display for CodecError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Format(err) => write!(f, "{err}"),
            Self::NewerVersion { found, supported } => write!(
                f,
                "document version ({found}) is newer than what we currently support ({supported})"
            ),
            Self::Encoding(err) => write!(f, "{err}"),
            Self::TextTooLong { bytes } => {
                write!(f, "field text of {bytes} bytes exceeds the record size limit")
            }
            Self::DepthTooDeep { depth } => {
                write!(f, "topic depth {depth} exceeds the maximum of {}", u8::MAX)
            }
        }
    }
}

impl Error for CodecError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Format(err) => Some(err),
            Self::Encoding(err) => Some(err),
            Self::NewerVersion { .. } => None,
            Self::TextTooLong { .. } => None,
            Self::DepthTooDeep { .. } => None,
        }
    }
}

impl From<FormatError> for CodecError {
    fn from(value: FormatError) -> Self {
        Self::Format(value)
    }
}

impl From<EncodingError> for CodecError {
    fn from(value: EncodingError) -> Self {
        Self::Encoding(value)
    }
}

static EMPTY_CATALOG: EmptyCatalog = EmptyCatalog;

/// Collaborators consulted while decoding.
#[derive(Clone, Copy)]
pub struct DecodeOptions<'a> {
    /// Resolves icon ids of icon topics.
    pub catalog: &'a dyn IconCatalog,
}

impl Default for DecodeOptions<'static> {
    fn default() -> Self {
        Self {
            catalog: &EMPTY_CATALOG,
        }
    }
}

impl<'a> DecodeOptions<'a> {
    pub fn with_catalog(catalog: &'a dyn IconCatalog) -> Self {
        Self { catalog }
    }
}

/// Serializes a whole document.
///
/// # Errors
/// - [`CodecError::TextTooLong`] / [`CodecError::DepthTooDeep`] when a field
///   does not fit the record layout.
pub fn encode_document(doc: &Document) -> CodecResult<Vec<u8>> {
    let properties = encode_properties(doc)?;
    let topics = encode_topics(doc.tree())?;

    let header = FileHeader {
        version: FORMAT_VERSION,
        properties_length: section_length(Section::Properties, properties.len())?,
        topics_length: section_length(Section::Topics, topics.len())?,
    };

    let mut out = Vec::with_capacity(HEADER_LEN + properties.len() + topics.len());
    out.extend_from_slice(&header.to_bytes());
    out.extend_from_slice(&properties);
    out.extend_from_slice(&topics);
    debug!(
        "event=document_encode module=codec status=ok properties_bytes={} topics_bytes={}",
        properties.len(),
        topics.len()
    );
    Ok(out)
}

/// Parses a whole document from memory.
///
/// # Errors
/// - [`CodecError::Format`] for bad magic, truncation, trailing bytes, unknown
///   field tags or illegal depth jumps.
/// - [`CodecError::NewerVersion`] when the file needs a newer reader.
/// - [`CodecError::Encoding`] when field text is not UTF-8.
pub fn decode_document(bytes: &[u8], options: DecodeOptions<'_>) -> CodecResult<Document> {
    let header = FileHeader::parse(bytes)?;
    let body = &bytes[HEADER_LEN..];

    let properties_len = header.properties_length as usize;
    if body.len() < properties_len {
        return Err(FormatError::TruncatedSection {
            section: Section::Properties,
            declared: header.properties_length,
            available: body.len(),
        }
        .into());
    }
    let (properties, rest) = body.split_at(properties_len);

    let topics_len = header.topics_length as usize;
    if rest.len() < topics_len {
        return Err(FormatError::TruncatedSection {
            section: Section::Topics,
            declared: header.topics_length,
            available: rest.len(),
        }
        .into());
    }
    let (topics, trailing) = rest.split_at(topics_len);
    if !trailing.is_empty() {
        return Err(FormatError::TrailingBytes {
            after: Section::Topics,
            count: trailing.len(),
        }
        .into());
    }

    let (title, subtitle, created) = decode_properties(properties, options.catalog)?;
    let tree = decode_topics(topics, options.catalog)?;
    debug!(
        "event=document_decode module=codec status=ok version={} properties_bytes={} topics_bytes={}",
        header.version,
        properties.len(),
        topics.len()
    );

    Ok(Document::from_parts(title, subtitle, created, tree))
}

fn encode_properties(doc: &Document) -> CodecResult<Vec<u8>> {
    let mut out = Vec::new();
    encode_record(&Field::text(doc.title_buffer().clone()), 0, &mut out)?;
    encode_record(&Field::text(doc.subtitle_buffer().clone()), 0, &mut out)?;
    encode_record(&Field::date("", doc.created()), 0, &mut out)?;
    Ok(out)
}

fn decode_properties(
    section: &[u8],
    catalog: &dyn IconCatalog,
) -> CodecResult<(TextBuffer, TextBuffer, Timestamp)> {
    let mut reader = ByteReader::new(section);
    let title = expect_text(record::decode_record(&mut reader, catalog)?.field)?;
    let subtitle = expect_text(record::decode_record(&mut reader, catalog)?.field)?;
    let created = match record::decode_record(&mut reader, catalog)?.field {
        Field::Date { timestamp, .. } => timestamp,
        other => {
            return Err(FormatError::UnexpectedFieldType {
                expected: FieldKind::Date,
                found: other.kind(),
            }
            .into())
        }
    };

    if reader.remaining() > 0 {
        return Err(FormatError::TrailingBytes {
            after: Section::Properties,
            count: reader.remaining(),
        }
        .into());
    }
    Ok((title, subtitle, created))
}

fn expect_text(field: Field) -> CodecResult<TextBuffer> {
    match field {
        Field::Text { text } => Ok(text),
        other => Err(FormatError::UnexpectedFieldType {
            expected: FieldKind::Text,
            found: other.kind(),
        }
        .into()),
    }
}

fn section_length(section: Section, length: usize) -> CodecResult<u32> {
    u32::try_from(length).map_err(|_| FormatError::SectionTooLarge { section, length }.into())
}
