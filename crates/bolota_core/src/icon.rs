//! Icon catalog contract and definitions-table catalog.
//!
//! # Responsibility
//! - Describe how the decoder resolves icon ids without knowing image data.
//! - Parse the tab-separated icon definitions table into an in-memory catalog.
//!
//! # Invariants
//! - The core stores only numeric icon ids; handles are never serialized.
//! - Icon ids are unique inside one catalog.
//! - A permissive catalog never fails a decode; unresolved ids are kept as-is.

use crate::model::field::IconId;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Description of the built-in bullet icon.
pub const BULLET_DESCRIPTION: &str = "Bullet";
/// Id of the built-in bullet icon. The bullet is not part of the definitions table.
pub const BULLET_ID: IconId = IconId(0);
/// Image file of the built-in bullet icon.
pub const BULLET_FILE_NAME: &str = "_Bullet1.png";
/// Description used by the catalog for the calendar icon shown on date topics.
pub const CALENDAR_DESCRIPTION: &str = "Calendar";

/// Resolved catalog entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconHandle {
    pub id: IconId,
    /// Human-readable label shown by pickers.
    pub description: String,
    /// Image file name relative to the catalog's icon directory.
    pub file_name: String,
}

/// Icon lookup collaborator consumed by the icon field decoder.
pub trait IconCatalog {
    /// Resolves one icon id.
    fn lookup(&self, id: IconId) -> Option<&IconHandle>;

    /// Whether unresolved ids must fail decoding.
    fn is_strict(&self) -> bool {
        false
    }
}

/// Catalog that knows no icons and accepts every id.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyCatalog;

impl IconCatalog for EmptyCatalog {
    fn lookup(&self, _id: IconId) -> Option<&IconHandle> {
        None
    }
}

/// Errors raised while parsing an icon definitions table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// Row does not have `id<TAB>description<TAB>filename` columns.
    MalformedLine { line: usize },
    /// First column is not a byte-sized integer.
    InvalidId { line: usize, value: String },
    /// Same id declared twice.
    DuplicateId { line: usize, id: IconId },
}

impl Display for CatalogError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MalformedLine { line } => {
                write!(f, "icon definition line {line} must have 3 tab-separated columns")
            }
            Self::InvalidId { line, value } => {
                write!(f, "icon definition line {line} has invalid id `{value}`")
            }
            Self::DuplicateId { line, id } => {
                write!(f, "icon definition line {line} repeats id {id}")
            }
        }
    }
}

impl Error for CatalogError {}

/// Catalog built from an icon definitions table.
///
/// The table has one header row followed by rows of
/// `id<TAB>description<TAB>filename`. The bullet drawn in front of plain
/// topics is built in and never looked up in the table.
#[derive(Debug, Clone)]
pub struct DefinitionCatalog {
    icons: BTreeMap<IconId, IconHandle>,
    bullet: IconHandle,
    strict: bool,
}

impl Default for DefinitionCatalog {
    fn default() -> Self {
        Self {
            icons: BTreeMap::new(),
            bullet: IconHandle {
                id: BULLET_ID,
                description: BULLET_DESCRIPTION.to_string(),
                file_name: BULLET_FILE_NAME.to_string(),
            },
            strict: false,
        }
    }
}

impl DefinitionCatalog {
    /// Parses a definitions table. The resulting catalog is permissive.
    pub fn parse(definitions: &str) -> Result<Self, CatalogError> {
        let mut icons = BTreeMap::new();
        for (index, raw) in definitions.lines().enumerate().skip(1) {
            let line = index + 1;
            let row = raw.trim_end_matches('\r');
            if row.trim().is_empty() {
                continue;
            }

            let columns: Vec<&str> = row.split('\t').collect();
            if columns.len() != 3 {
                return Err(CatalogError::MalformedLine { line });
            }
            let id = columns[0]
                .trim()
                .parse::<u8>()
                .map(IconId)
                .map_err(|_| CatalogError::InvalidId {
                    line,
                    value: columns[0].to_string(),
                })?;
            if icons.contains_key(&id) {
                return Err(CatalogError::DuplicateId { line, id });
            }
            icons.insert(
                id,
                IconHandle {
                    id,
                    description: columns[1].trim().to_string(),
                    file_name: columns[2].trim().to_string(),
                },
            );
        }

        Ok(Self {
            icons,
            ..Self::default()
        })
    }

    /// Switches unresolved-id handling for decoders using this catalog.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn len(&self) -> usize {
        self.icons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.icons.is_empty()
    }

    /// Table entries in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &IconHandle> {
        self.icons.values()
    }

    pub fn find_by_description(&self, description: &str) -> Option<&IconHandle> {
        self.icons
            .values()
            .find(|icon| icon.description == description)
    }

    pub fn bullet(&self) -> &IconHandle {
        &self.bullet
    }

    pub fn calendar(&self) -> Option<&IconHandle> {
        self.find_by_description(CALENDAR_DESCRIPTION)
    }
}

impl IconCatalog for DefinitionCatalog {
    fn lookup(&self, id: IconId) -> Option<&IconHandle> {
        self.icons.get(&id)
    }

    fn is_strict(&self) -> bool {
        self.strict
    }
}
