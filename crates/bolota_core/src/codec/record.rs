//! Field record encoding shared by the properties and topics sections.
//!
//! # Responsibility
//! - Write and read the common record header and text.
//! - Dispatch variant payloads by wire tag.
//!
//! # Invariants
//! - Header layout: tag u8, depth u8, record_len u16 LE, text_len u16 LE.
//! - `record_len == RECORD_HEADER_LEN + text_len + payload_len`; recomputed on
//!   every encode and checked on every decode.

use super::{CodecError, CodecResult, FormatError};
use crate::icon::IconCatalog;
use crate::model::field::{Field, FieldKind, IconId, Timestamp, DATE_PAYLOAD_LEN};
use crate::model::text::TextBuffer;

/// Bytes before a record's text: tag, depth, record length, text length.
pub const RECORD_HEADER_LEN: usize = 6;

/// Cursor over one in-memory section.
pub(crate) struct ByteReader<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> ByteReader<'a> {
    pub(crate) fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, position: 0 }
    }

    pub(crate) fn position(&self) -> usize {
        self.position
    }

    pub(crate) fn remaining(&self) -> usize {
        self.bytes.len() - self.position
    }

    /// Takes `len` bytes; `record_offset` is reported if the section ends first.
    fn take(&mut self, len: usize, record_offset: usize) -> CodecResult<&'a [u8]> {
        if self.remaining() < len {
            return Err(FormatError::TruncatedRecord {
                offset: record_offset,
            }
            .into());
        }
        let slice = &self.bytes[self.position..self.position + len];
        self.position += len;
        Ok(slice)
    }

    fn read_u8(&mut self, record_offset: usize) -> CodecResult<u8> {
        Ok(self.take(1, record_offset)?[0])
    }

    fn read_u16_le(&mut self, record_offset: usize) -> CodecResult<u16> {
        let bytes = self.take(2, record_offset)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }
}

/// One decoded record with its declared depth.
#[derive(Debug)]
pub(crate) struct DecodedRecord {
    pub(crate) field: Field,
    pub(crate) depth: u8,
    pub(crate) offset: usize,
}

/// Appends one record for `field` at `depth`.
///
/// # Errors
/// - [`CodecError::DepthTooDeep`] when `depth` does not fit one byte.
/// - [`CodecError::TextTooLong`] when the record exceeds the 16-bit length.
pub fn encode_record(field: &Field, depth: usize, out: &mut Vec<u8>) -> CodecResult<()> {
    let depth = u8::try_from(depth).map_err(|_| CodecError::DepthTooDeep { depth })?;
    let text_bytes = field.text_byte_length();
    let record_length = RECORD_HEADER_LEN + text_bytes + field.payload_length();
    let (Ok(text_length), Ok(record_length)) =
        (u16::try_from(text_bytes), u16::try_from(record_length))
    else {
        return Err(CodecError::TextTooLong { bytes: text_bytes });
    };
    let text = field.text_buffer().map_or(&[][..], TextBuffer::utf8_bytes);

    out.reserve(usize::from(record_length));
    out.push(field.kind().tag());
    out.push(depth);
    out.extend_from_slice(&record_length.to_le_bytes());
    out.extend_from_slice(&text_length.to_le_bytes());
    out.extend_from_slice(text);
    field.encode_payload(out);
    Ok(())
}

/// Reads the record starting at the reader's position.
pub(crate) fn decode_record(
    reader: &mut ByteReader<'_>,
    catalog: &dyn IconCatalog,
) -> CodecResult<DecodedRecord> {
    let offset = reader.position();
    let tag = reader.read_u8(offset)?;
    let kind =
        FieldKind::from_tag(tag).ok_or(FormatError::InvalidFieldType { tag, offset })?;
    let depth = reader.read_u8(offset)?;
    let declared = reader.read_u16_le(offset)?;
    let text_length = usize::from(reader.read_u16_le(offset)?);

    let expected = RECORD_HEADER_LEN + text_length + kind.payload_length();
    if usize::from(declared) != expected {
        return Err(FormatError::RecordLengthMismatch {
            offset,
            declared,
            expected,
        }
        .into());
    }
    if !kind.carries_text() && text_length > 0 {
        return Err(FormatError::UnexpectedText { offset }.into());
    }

    let text = reader.take(text_length, offset)?;
    let payload = reader.take(kind.payload_length(), offset)?;
    let field = decode_payload(kind, text, payload, catalog)?;
    Ok(DecodedRecord {
        field,
        depth,
        offset,
    })
}

/// Builds a field of `kind` from its text bytes and variant payload.
///
/// `payload` must be exactly `kind.payload_length()` bytes.
///
/// # Errors
/// - [`CodecError::Encoding`] when `text` is not UTF-8.
/// - [`FormatError::InvalidTimestamp`] for impossible calendar values.
/// - [`FormatError::UnresolvedIcon`] when a strict catalog lacks the icon.
pub fn decode_payload(
    kind: FieldKind,
    text: &[u8],
    payload: &[u8],
    catalog: &dyn IconCatalog,
) -> CodecResult<Field> {
    debug_assert_eq!(payload.len(), kind.payload_length());
    match kind {
        FieldKind::Text => Ok(Field::text(TextBuffer::from_utf8(text)?)),
        FieldKind::Date => {
            let text = TextBuffer::from_utf8(text)?;
            let mut bytes = [0u8; DATE_PAYLOAD_LEN];
            bytes.copy_from_slice(payload);
            let timestamp = Timestamp::from_le_bytes(bytes)
                .ok_or(FormatError::InvalidTimestamp { bytes })?;
            Ok(Field::date(text, timestamp))
        }
        FieldKind::Icon => {
            let text = TextBuffer::from_utf8(text)?;
            let icon = IconId(payload[0]);
            if catalog.lookup(icon).is_none() && catalog.is_strict() {
                return Err(FormatError::UnresolvedIcon(icon).into());
            }
            Ok(Field::icon(text, icon))
        }
        FieldKind::Blank => Ok(Field::blank()),
    }
}
