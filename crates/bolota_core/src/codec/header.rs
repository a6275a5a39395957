//! Fixed-size document header.

use super::{CodecError, CodecResult, FormatError};

/// Magic bytes opening every Bolota document.
pub const MAGIC: [u8; 3] = *b"BLT";
/// Newest format version this crate reads and the version it writes.
pub const FORMAT_VERSION: u8 = 1;
/// Magic, version and two little-endian `u32` section lengths.
pub const HEADER_LEN: usize = MAGIC.len() + 1 + 4 + 4;

/// Parsed document header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    pub version: u8,
    pub properties_length: u32,
    pub topics_length: u32,
}

impl FileHeader {
    /// Parses the header at the start of `bytes`.
    ///
    /// The magic is checked before anything else and the version before the
    /// section lengths, so a foreign file is always reported as such and a
    /// newer file is reported as needing an upgrade.
    pub fn parse(bytes: &[u8]) -> CodecResult<Self> {
        let Some(found) = bytes.get(..MAGIC.len()) else {
            return Err(FormatError::TruncatedHeader {
                available: bytes.len(),
            }
            .into());
        };
        if found != MAGIC {
            let mut magic = [0u8; 3];
            magic.copy_from_slice(found);
            return Err(FormatError::InvalidMagic { found: magic }.into());
        }

        let Some(&version) = bytes.get(MAGIC.len()) else {
            return Err(FormatError::TruncatedHeader {
                available: bytes.len(),
            }
            .into());
        };
        if version > FORMAT_VERSION {
            return Err(CodecError::NewerVersion {
                found: version,
                supported: FORMAT_VERSION,
            });
        }

        if bytes.len() < HEADER_LEN {
            return Err(FormatError::TruncatedHeader {
                available: bytes.len(),
            }
            .into());
        }
        let read_u32 = |at: usize| {
            u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
        };
        Ok(Self {
            version,
            properties_length: read_u32(4),
            topics_length: read_u32(8),
        })
    }

    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        out[..3].copy_from_slice(&MAGIC);
        out[3] = self.version;
        out[4..8].copy_from_slice(&self.properties_length.to_le_bytes());
        out[8..12].copy_from_slice(&self.topics_length.to_le_bytes());
        out
    }
}
