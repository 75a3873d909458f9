//! Package metadata collected from `metadata/sc_<key>.txt` entries.

use anyhow::Result;
use tracing::debug;

use crate::package::{EntryKind, Package};

/// The known package metadata keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataKey {
    Author,
    Comment,
    License,
    Name,
    Publisher,
    Readme,
    Revision,
    Version,
}

impl MetadataKey {
    pub const ALL: [MetadataKey; 8] = [
        MetadataKey::Author,
        MetadataKey::Comment,
        MetadataKey::License,
        MetadataKey::Name,
        MetadataKey::Publisher,
        MetadataKey::Readme,
        MetadataKey::Revision,
        MetadataKey::Version,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetadataKey::Author => "author",
            MetadataKey::Comment => "comment",
            MetadataKey::License => "license",
            MetadataKey::Name => "name",
            MetadataKey::Publisher => "publisher",
            MetadataKey::Readme => "readme",
            MetadataKey::Revision => "revision",
            MetadataKey::Version => "version",
        }
    }

    /// Match an archive key of the form `metadata/sc_<key>.txt`.
    pub fn from_entry_key(key: &str) -> Option<Self> {
        let name = key.strip_prefix("metadata/sc_")?.strip_suffix(".txt")?;
        Self::ALL.into_iter().find(|k| k.as_str() == name)
    }
}

/// Values for every [`MetadataKey`], empty until an entry supplies one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataTable {
    values: [String; 8],
}

impl MetadataTable {
    pub fn get(&self, key: MetadataKey) -> &str {
        &self.values[Self::slot(key)]
    }

    pub fn set(&mut self, key: MetadataKey, value: impl Into<String>) {
        self.values[Self::slot(key)] = value.into();
    }

    /// Use `package_name` as the comment when none was supplied.
    pub fn default_comment(&mut self, package_name: &str) {
        if self.get(MetadataKey::Comment).trim().is_empty() {
            self.set(MetadataKey::Comment, package_name);
        }
    }

    fn slot(key: MetadataKey) -> usize {
        key as usize
    }
}

/// Scan the package once for metadata entries.
///
/// A key that occurs more than once keeps the value of its last entry.
pub async fn collect(package: &Package, package_name: &str) -> Result<MetadataTable> {
    let mut table = MetadataTable::default();

    for entry in package.entries().await? {
        if let EntryKind::Metadata(key) = entry.kind() {
            let value = entry.read_text().await?;
            debug!("Metadata {} = {:?}", key.as_str(), value);
            table.set(key, value);
        }
    }

    table.default_comment(package_name);
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_key_matching_is_exact() {
        assert_eq!(
            MetadataKey::from_entry_key("metadata/sc_author.txt"),
            Some(MetadataKey::Author)
        );
        assert_eq!(
            MetadataKey::from_entry_key("metadata/sc_readme.txt"),
            Some(MetadataKey::Readme)
        );
        assert_eq!(MetadataKey::from_entry_key("metadata/sc_Author.txt"), None);
        assert_eq!(MetadataKey::from_entry_key("metadata/author.txt"), None);
        assert_eq!(MetadataKey::from_entry_key("x/metadata/sc_name.txt"), None);
        assert_eq!(MetadataKey::from_entry_key("metadata/sc_name.txt.bak"), None);
    }

    #[test]
    fn every_key_has_its_own_slot() {
        let mut table = MetadataTable::default();
        for key in MetadataKey::ALL {
            table.set(key, key.as_str());
        }
        for key in MetadataKey::ALL {
            assert_eq!(table.get(key), key.as_str());
        }
    }

    #[test]
    fn blank_comment_defaults_to_package_name() {
        let mut table = MetadataTable::default();
        table.set(MetadataKey::Comment, " \r\n\t");
        table.default_comment("MyModule");
        assert_eq!(table.get(MetadataKey::Comment), "MyModule");

        table.set(MetadataKey::Comment, "Adds a module");
        table.default_comment("MyModule");
        assert_eq!(table.get(MetadataKey::Comment), "Adds a module");
    }
}
