//! Core model and file format for Bolota outline documents.
//! This crate owns the binary layout and the tree invariants; viewers only
//! use the document and tree APIs.

pub mod codec;
pub mod file;
pub mod icon;
pub mod logging;
pub mod model;

pub use codec::{
    decode_document, encode_document, CodecError, CodecResult, DecodeOptions, FormatError,
    Section, FORMAT_VERSION,
};
pub use file::{
    open_document, open_document_with, save_document, FileAction, FileError, FileResult,
};
pub use icon::{CatalogError, DefinitionCatalog, EmptyCatalog, IconCatalog, IconHandle};
pub use logging::{default_log_level, init_logging, logging_status, LoggingConfig, LoggingError};
pub use model::document::Document;
pub use model::field::{Field, FieldError, FieldKind, IconId, Timestamp};
pub use model::text::{EncodingError, TextBuffer};
pub use model::tree::{FieldId, FieldTree, TreeError, TreeResult, ROOT_DEPTH};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
