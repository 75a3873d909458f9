//! Content items: the records stored as `.../xml` entries in a package.
//!
//! - [`parser`]: item XML to [`Item`]
//! - [`path`]: archive key to serialization path
//! - [`serializer`]: [`Item`] to the textual `.item` format

pub mod parser;
pub mod path;
pub mod serializer;

pub use parser::{ItemParseError, parse_item};
pub use path::{ITEM_EXTENSION, is_identifier, resolve_item_path};
pub use serializer::{render_item, write_item};

/// One content record.
///
/// Identity fields are never absent; a missing source attribute is an
/// empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Item {
    pub id: String,
    pub name: String,
    pub parent_id: String,
    pub template_id: String,
    pub master_id: String,
    pub branch_id: String,
    pub template_name: String,
    pub versions: Vec<Version>,
}

/// One language/version variant of an [`Item`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Version {
    pub language: String,
    /// Kept as text; packages are not guaranteed to use plain numbers.
    pub number: String,
    /// Revisions are not recoverable from a package, so this starts empty.
    pub revision: String,
    pub fields: Vec<Field>,
}

/// One field value of a [`Version`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Field {
    pub field_id: String,
    pub name: String,
    pub key: String,
    /// `None` when the source had no `content` element, which is not the
    /// same as an empty value.
    pub value: Option<String>,
}

impl Field {
    /// A field whose display name and lookup key are both `key`.
    pub fn new(field_id: impl Into<String>, key: impl Into<String>, value: Option<String>) -> Self {
        let key = key.into();
        Self {
            field_id: field_id.into(),
            name: key.clone(),
            key,
            value,
        }
    }

    pub fn has_value(&self) -> bool {
        self.value.is_some()
    }
}
