//! Outline field variants.
//!
//! # Responsibility
//! - Define the closed set of topic kinds stored in a Bolota document.
//! - Own each variant's payload and its fixed-size wire tail.
//!
//! # Invariants
//! - `Blank` never carries text.
//! - `payload_length()` matches the bytes produced by `encode_payload()`.
//! - `Timestamp` is whole seconds, UTC, with a year that fits in 16 bits.

use super::text::TextBuffer;
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Wire tag for [`FieldKind::Text`].
pub const TAG_TEXT: u8 = b'T';
/// Wire tag for [`FieldKind::Date`].
pub const TAG_DATE: u8 = b'd';
/// Wire tag for [`FieldKind::Icon`].
pub const TAG_ICON: u8 = b'I';
/// Wire tag for [`FieldKind::Blank`].
pub const TAG_BLANK: u8 = b'0';

/// Size of the encoded [`Timestamp`] payload.
pub const DATE_PAYLOAD_LEN: usize = 8;
/// Size of the encoded [`IconId`] payload.
pub const ICON_PAYLOAD_LEN: usize = 1;

/// Discriminant of a [`Field`], mirrored one-to-one by its wire tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Text,
    Date,
    Icon,
    Blank,
}

impl FieldKind {
    /// Resolves a wire tag. Unknown tags return `None`.
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            TAG_TEXT => Some(Self::Text),
            TAG_DATE => Some(Self::Date),
            TAG_ICON => Some(Self::Icon),
            TAG_BLANK => Some(Self::Blank),
            _ => None,
        }
    }

    pub fn tag(self) -> u8 {
        match self {
            Self::Text => TAG_TEXT,
            Self::Date => TAG_DATE,
            Self::Icon => TAG_ICON,
            Self::Blank => TAG_BLANK,
        }
    }

    /// Bytes that follow the text in a record of this kind.
    pub fn payload_length(self) -> usize {
        match self {
            Self::Text | Self::Blank => 0,
            Self::Date => DATE_PAYLOAD_LEN,
            Self::Icon => ICON_PAYLOAD_LEN,
        }
    }

    pub fn carries_text(self) -> bool {
        !matches!(self, Self::Blank)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Date => "date",
            Self::Icon => "icon",
            Self::Blank => "blank",
        }
    }
}

impl Display for FieldKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifier of an icon in the external icon catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IconId(pub u8);

impl Display for IconId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Calendar timestamp with second precision, interpreted as UTC.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(NaiveDateTime);

impl Timestamp {
    /// Builds a timestamp from calendar parts. `month` is 1-based.
    ///
    /// Returns `None` for values that do not name a real calendar instant.
    pub fn new(year: u16, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> Option<Self> {
        NaiveDate::from_ymd_opt(i32::from(year), u32::from(month), u32::from(day))?
            .and_hms_opt(u32::from(hour), u32::from(minute), u32::from(second))
            .map(Self)
    }

    /// Current UTC time truncated to whole seconds.
    pub fn now() -> Self {
        Self::from_datetime(Utc::now()).unwrap_or_default()
    }

    /// Converts a UTC datetime, dropping sub-second precision.
    ///
    /// Returns `None` when the year is outside `0..=65535`.
    pub fn from_datetime(value: DateTime<Utc>) -> Option<Self> {
        let naive = value.naive_utc().with_nanosecond(0)?;
        if !(0..=i32::from(u16::MAX)).contains(&naive.year()) {
            return None;
        }
        Some(Self(naive))
    }

    pub fn to_datetime(self) -> DateTime<Utc> {
        Utc.from_utc_datetime(&self.0)
    }

    pub fn year(self) -> u16 {
        // In range by construction.
        self.0.year() as u16
    }

    pub fn month(self) -> u8 {
        self.0.month() as u8
    }

    pub fn day(self) -> u8 {
        self.0.day() as u8
    }

    pub fn hour(self) -> u8 {
        self.0.hour() as u8
    }

    pub fn minute(self) -> u8 {
        self.0.minute() as u8
    }

    pub fn second(self) -> u8 {
        self.0.second() as u8
    }

    /// Wire layout: year (u16 LE), month, day, hour, minute, second, reserved 0.
    pub fn to_le_bytes(self) -> [u8; DATE_PAYLOAD_LEN] {
        let year = self.year().to_le_bytes();
        [
            year[0],
            year[1],
            self.month(),
            self.day(),
            self.hour(),
            self.minute(),
            self.second(),
            0,
        ]
    }

    /// Parses the wire layout. The reserved byte is ignored.
    pub fn from_le_bytes(bytes: [u8; DATE_PAYLOAD_LEN]) -> Option<Self> {
        let year = u16::from_le_bytes([bytes[0], bytes[1]]);
        Self::new(year, bytes[2], bytes[3], bytes[4], bytes[5], bytes[6])
    }

    /// Short label used by outline views, e.g. `2024-03-09 14:05`.
    pub fn short_label(self) -> String {
        self.0.format("%Y-%m-%d %H:%M").to_string()
    }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d %H:%M:%S"))
    }
}

/// Misuse of a field's variant-specific API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldError {
    /// Text was assigned to a variant that has none.
    NoText(FieldKind),
    /// A payload setter was called on a different variant.
    WrongKind { expected: FieldKind, found: FieldKind },
}

impl Display for FieldError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoText(kind) => write!(f, "{kind} fields carry no text"),
            Self::WrongKind { expected, found } => {
                write!(f, "expected a {expected} field, found a {found} field")
            }
        }
    }
}

impl Error for FieldError {}

/// One topic of an outline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field {
    /// Plain text topic.
    Text { text: TextBuffer },
    /// Text topic stamped with a calendar instant.
    Date {
        text: TextBuffer,
        timestamp: Timestamp,
    },
    /// Text topic decorated with a catalog icon.
    Icon { text: TextBuffer, icon: IconId },
    /// Visual spacer.
    Blank,
}

impl Field {
    pub fn text(text: impl Into<TextBuffer>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn date(text: impl Into<TextBuffer>, timestamp: Timestamp) -> Self {
        Self::Date {
            text: text.into(),
            timestamp,
        }
    }

    pub fn icon(text: impl Into<TextBuffer>, icon: IconId) -> Self {
        Self::Icon {
            text: text.into(),
            icon,
        }
    }

    pub fn blank() -> Self {
        Self::Blank
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            Self::Text { .. } => FieldKind::Text,
            Self::Date { .. } => FieldKind::Date,
            Self::Icon { .. } => FieldKind::Icon,
            Self::Blank => FieldKind::Blank,
        }
    }

    pub fn text_buffer(&self) -> Option<&TextBuffer> {
        match self {
            Self::Text { text } | Self::Date { text, .. } | Self::Icon { text, .. } => Some(text),
            Self::Blank => None,
        }
    }

    fn text_buffer_mut(&mut self) -> Option<&mut TextBuffer> {
        match self {
            Self::Text { text } | Self::Date { text, .. } | Self::Icon { text, .. } => Some(text),
            Self::Blank => None,
        }
    }

    /// Topic text; `None` for blank spacers.
    pub fn text_str(&self) -> Option<&str> {
        self.text_buffer().map(TextBuffer::as_str)
    }

    /// Replaces the topic text.
    ///
    /// # Errors
    /// - [`FieldError::NoText`] for blank spacers.
    pub fn set_text(&mut self, value: impl Into<String>) -> Result<(), FieldError> {
        let kind = self.kind();
        let text = self.text_buffer_mut().ok_or(FieldError::NoText(kind))?;
        text.set(value);
        Ok(())
    }

    pub fn timestamp(&self) -> Option<Timestamp> {
        match self {
            Self::Date { timestamp, .. } => Some(*timestamp),
            _ => None,
        }
    }

    pub fn set_timestamp(&mut self, value: Timestamp) -> Result<(), FieldError> {
        match self {
            Self::Date { timestamp, .. } => {
                *timestamp = value;
                Ok(())
            }
            other => Err(FieldError::WrongKind {
                expected: FieldKind::Date,
                found: other.kind(),
            }),
        }
    }

    pub fn icon_id(&self) -> Option<IconId> {
        match self {
            Self::Icon { icon, .. } => Some(*icon),
            _ => None,
        }
    }

    pub fn set_icon(&mut self, value: IconId) -> Result<(), FieldError> {
        match self {
            Self::Icon { icon, .. } => {
                *icon = value;
                Ok(())
            }
            other => Err(FieldError::WrongKind {
                expected: FieldKind::Icon,
                found: other.kind(),
            }),
        }
    }

    /// UTF-8 length of the topic text, 0 for blank spacers.
    pub fn text_byte_length(&self) -> usize {
        self.text_buffer().map_or(0, TextBuffer::byte_length)
    }

    pub fn payload_length(&self) -> usize {
        self.kind().payload_length()
    }

    /// Appends the variant-specific tail that follows the text on the wire.
    pub fn encode_payload(&self, out: &mut Vec<u8>) {
        match self {
            Self::Date { timestamp, .. } => out.extend_from_slice(&timestamp.to_le_bytes()),
            Self::Icon { icon, .. } => out.push(icon.0),
            Self::Text { .. } | Self::Blank => {}
        }
    }

    /// Label shown by outline views.
    ///
    /// Date topics are prefixed with `(yyyy-MM-dd HH:mm)`; blank spacers render
    /// as an empty line.
    pub fn display_text(&self) -> String {
        match self {
            Self::Text { text } | Self::Icon { text, .. } => text.to_string(),
            Self::Date { text, timestamp } => format!("({}) {}", timestamp.short_label(), text),
            Self::Blank => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Field, FieldError, FieldKind, IconId, Timestamp};

    #[test]
    fn tags_resolve_to_kinds() {
        for kind in [
            FieldKind::Text,
            FieldKind::Date,
            FieldKind::Icon,
            FieldKind::Blank,
        ] {
            assert_eq!(FieldKind::from_tag(kind.tag()), Some(kind));
        }
        assert_eq!(FieldKind::from_tag(b'x'), None);
    }

    #[test]
    fn timestamp_rejects_impossible_dates() {
        assert!(Timestamp::new(2023, 2, 29, 0, 0, 0).is_none());
        assert!(Timestamp::new(2024, 13, 1, 0, 0, 0).is_none());
        assert!(Timestamp::new(2024, 1, 1, 24, 0, 0).is_none());
        assert!(Timestamp::new(2024, 2, 29, 23, 59, 59).is_some());
    }

    #[test]
    fn timestamp_wire_layout_is_little_endian_with_reserved_zero() {
        let ts = Timestamp::new(2024, 3, 9, 14, 5, 30).unwrap();
        assert_eq!(ts.to_le_bytes(), [0xE8, 0x07, 3, 9, 14, 5, 30, 0]);

        let mut reserved_set = ts.to_le_bytes();
        reserved_set[7] = 0xAA;
        assert_eq!(Timestamp::from_le_bytes(reserved_set), Some(ts));
    }

    #[test]
    fn now_has_no_sub_second_precision() {
        let now = Timestamp::now();
        assert_eq!(now.to_datetime().timestamp_subsec_nanos(), 0);
    }

    #[test]
    fn blank_rejects_text() {
        let mut blank = Field::blank();
        assert_eq!(blank.text_str(), None);
        assert_eq!(
            blank.set_text("nope"),
            Err(FieldError::NoText(FieldKind::Blank))
        );
    }

    #[test]
    fn payload_matches_declared_length() {
        let ts = Timestamp::new(2000, 1, 2, 3, 4, 5).unwrap();
        for field in [
            Field::text("a"),
            Field::date("b", ts),
            Field::icon("c", IconId(7)),
            Field::blank(),
        ] {
            let mut out = Vec::new();
            field.encode_payload(&mut out);
            assert_eq!(out.len(), field.payload_length());
        }
    }

    #[test]
    fn text_byte_length_counts_utf8_bytes() {
        assert_eq!(Field::icon("café", IconId(3)).text_byte_length(), 5);
        assert_eq!(Field::blank().text_byte_length(), 0);
    }

    #[test]
    fn display_text_prefixes_dates() {
        let ts = Timestamp::new(2024, 3, 9, 14, 5, 30).unwrap();
        assert_eq!(
            Field::date("Launch", ts).display_text(),
            "(2024-03-09 14:05) Launch"
        );
        assert_eq!(Field::blank().display_text(), "");
    }

    #[test]
    fn setters_reject_other_variants() {
        let mut field = Field::text("plain");
        let err = field.set_icon(IconId(1)).unwrap_err();
        assert_eq!(
            err,
            FieldError::WrongKind {
                expected: FieldKind::Icon,
                found: FieldKind::Text,
            }
        );
    }
}
