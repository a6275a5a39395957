//! In-memory outline model.
//!
//! # Responsibility
//! - Define field text, field variants, the outline tree and the document container.
//! - Stay independent of the binary layout; the codec consumes this model.
//!
//! # Invariants
//! - Every field lives in exactly one `FieldTree` arena.
//! - Depth is derived from tree shape, never stored on a field.

pub mod document;
pub mod field;
pub mod text;
pub mod tree;
