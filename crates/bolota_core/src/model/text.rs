//! UTF-8 text value shared by every text-carrying field.
//!
//! # Responsibility
//! - Hold field text and expose its UTF-8 encoding for the wire format.
//! - Distinguish character count from encoded byte count.
//!
//! # Invariants
//! - `utf8_bytes()` is always exactly the UTF-8 encoding of `as_str()`.
//! - `byte_length()` is the length written to length-prefixed wire fields.
//! - A failed `set_utf8` leaves the previous text untouched.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::Utf8Error;

/// Text bytes read from a document were not valid UTF-8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodingError {
    source: Utf8Error,
}

impl EncodingError {
    /// Number of leading bytes that decoded cleanly.
    pub fn valid_up_to(&self) -> usize {
        self.source.valid_up_to()
    }
}

impl Display for EncodingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "field text is not valid UTF-8: {}", self.source)
    }
}

impl Error for EncodingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.source)
    }
}

impl From<Utf8Error> for EncodingError {
    fn from(value: Utf8Error) -> Self {
        Self { source: value }
    }
}

/// Owned field text.
///
/// `String` already stores UTF-8, so the encoded form is the buffer itself and
/// can never drift out of sync with the text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TextBuffer {
    text: String,
}

impl TextBuffer {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Builds a buffer from raw UTF-8 bytes.
    pub fn from_utf8(bytes: &[u8]) -> Result<Self, EncodingError> {
        let text = std::str::from_utf8(bytes)?;
        Ok(Self::new(text))
    }

    /// Replaces the text.
    pub fn set(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    /// Replaces the text with decoded UTF-8 bytes.
    ///
    /// # Errors
    /// - Returns [`EncodingError`] when `bytes` is not valid UTF-8; the
    ///   current text is kept.
    pub fn set_utf8(&mut self, bytes: &[u8]) -> Result<(), EncodingError> {
        let text = std::str::from_utf8(bytes)?;
        self.text.clear();
        self.text.push_str(text);
        Ok(())
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Encoded form used as the length-prefixed wire payload.
    pub fn utf8_bytes(&self) -> &[u8] {
        self.text.as_bytes()
    }

    /// Number of Unicode scalar values.
    pub fn char_length(&self) -> usize {
        self.text.chars().count()
    }

    /// Number of UTF-8 bytes.
    pub fn byte_length(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

impl Display for TextBuffer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

impl From<&str> for TextBuffer {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for TextBuffer {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}
