//! Reading the nested package archive.
//!
//! A package file is a ZIP archive holding a single inner ZIP under
//! [`INNER_PACKAGE_ENTRY`]. The inner archive is buffered once and every
//! pass over it gets a fresh [`Entries`] iterator built from those bytes.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

use crate::error::ConvertError;
use crate::io::{LocalFileReader, MemoryReader};
use crate::metadata::MetadataKey;
use crate::zip::{ZipExtractor, ZipFileEntry};

/// Name of the inner archive inside the outer package file.
pub const INNER_PACKAGE_ENTRY: &str = "package.zip";

/// Keys of item records end with this marker.
pub const ITEM_SUFFIX: &str = "/xml";

/// Item-shaped keys under this prefix describe the package, not content.
pub const PROPERTIES_PREFIX: &str = "properties/";

/// Prefix of the plain files that are copied into the web root.
pub const PAYLOAD_PREFIX: &str = "files/";

type InnerExtractor = ZipExtractor<MemoryReader>;

/// The buffered inner archive of a package file.
pub struct Package {
    extractor: Arc<InnerExtractor>,
}

impl Package {
    /// Open the package file at `path` and buffer its inner archive.
    ///
    /// Fails with a [`ConvertError`] if the file is not an archive, has no
    /// inner package entry, or the inner blob is not an archive either.
    pub async fn open(path: &Path) -> Result<Self> {
        let invalid = |e: anyhow::Error| ConvertError::InvalidArchive {
            path: path.to_path_buf(),
            reason: format!("{e:#}"),
        };

        let reader = LocalFileReader::new(path).map_err(invalid)?;
        let outer = ZipExtractor::new(Arc::new(reader));

        let entry = outer
            .find(INNER_PACKAGE_ENTRY)
            .await
            .map_err(invalid)?
            .ok_or_else(|| ConvertError::MissingInnerArchive {
                archive: path.to_path_buf(),
                entry: INNER_PACKAGE_ENTRY.to_string(),
            })?;

        let blob = outer.extract_to_memory(&entry).await.map_err(invalid)?;
        tracing::debug!(
            "Buffered {} ({} bytes) from {}",
            INNER_PACKAGE_ENTRY,
            blob.len(),
            path.display()
        );

        Ok(Self::from_bytes(blob).await.map_err(invalid)?)
    }

    /// Wrap an already buffered inner archive.
    pub async fn from_bytes(blob: Vec<u8>) -> Result<Self> {
        let extractor = Arc::new(ZipExtractor::new(Arc::new(MemoryReader::new(blob))));
        // Reject a broken inner archive up front rather than on the first pass
        extractor.list_files().await?;
        Ok(Self { extractor })
    }

    /// Start a new forward-only traversal of the inner archive.
    pub async fn entries(&self) -> Result<Entries> {
        let listing = self.extractor.list_files().await?;
        Ok(Entries {
            listing: listing.into_iter(),
            extractor: Arc::clone(&self.extractor),
        })
    }
}

/// One pass over the entries of a [`Package`], in archive order.
pub struct Entries {
    listing: std::vec::IntoIter<ZipFileEntry>,
    extractor: Arc<InnerExtractor>,
}

impl Iterator for Entries {
    type Item = ArchiveEntry;

    fn next(&mut self) -> Option<ArchiveEntry> {
        let info = self.listing.next()?;
        Some(ArchiveEntry {
            info,
            extractor: Arc::clone(&self.extractor),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.listing.size_hint()
    }
}

/// A member of the inner archive. Its data can be read any number of times.
pub struct ArchiveEntry {
    info: ZipFileEntry,
    extractor: Arc<InnerExtractor>,
}

impl ArchiveEntry {
    pub fn key(&self) -> &str {
        &self.info.file_name
    }

    pub fn info(&self) -> &ZipFileEntry {
        &self.info
    }

    pub fn kind(&self) -> EntryKind {
        EntryKind::of(self.key())
    }

    pub fn is_safe(&self) -> bool {
        is_safe_key(self.key())
    }

    pub async fn read(&self) -> Result<Vec<u8>> {
        self.extractor.extract_to_memory(&self.info).await
    }

    /// Read the entry as text, dropping a UTF-8 byte order mark.
    pub async fn read_text(&self) -> Result<String> {
        Ok(decode_text(&self.read().await?))
    }

    pub async fn extract_to(&self, path: &Path) -> Result<()> {
        self.extractor.extract_to_file(&self.info, path).await
    }
}

/// What a pass does with an entry, decided by its key alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Item,
    Payload,
    Metadata(MetadataKey),
    Other,
}

impl EntryKind {
    pub fn of(key: &str) -> Self {
        if key.ends_with(ITEM_SUFFIX) && !key.starts_with(PROPERTIES_PREFIX) {
            EntryKind::Item
        } else if key.starts_with(PAYLOAD_PREFIX) && !key.ends_with('/') {
            EntryKind::Payload
        } else if let Some(meta) = MetadataKey::from_entry_key(key) {
            EntryKind::Metadata(meta)
        } else {
            EntryKind::Other
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EntryKind::Item => "item",
            EntryKind::Payload => "file",
            EntryKind::Metadata(_) => "metadata",
            EntryKind::Other => "-",
        }
    }
}

/// `false` if any key segment would climb out of the output directory.
pub fn is_safe_key(key: &str) -> bool {
    key.split(['/', '\\']).all(|segment| segment != "..")
}

fn decode_text(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_keys() {
        assert_eq!(
            EntryKind::of("items/master/sitecore/content/Home/{11111111-1111-1111-1111-111111111111}/en/1/xml"),
            EntryKind::Item
        );
        assert_eq!(EntryKind::of("properties/items/master/xml"), EntryKind::Other);
        assert_eq!(EntryKind::of("files/bin/Module.dll"), EntryKind::Payload);
        assert_eq!(EntryKind::of("files/bin/"), EntryKind::Other);
        assert_eq!(
            EntryKind::of("metadata/sc_name.txt"),
            EntryKind::Metadata(MetadataKey::Name)
        );
        assert_eq!(EntryKind::of("metadata/sc_unknown.txt"), EntryKind::Other);
        assert_eq!(EntryKind::of("installer/project"), EntryKind::Other);
    }

    #[test]
    fn rejects_parent_segments() {
        assert!(is_safe_key("files/bin/Module.dll"));
        assert!(is_safe_key("files/a..b/c.txt"));
        assert!(!is_safe_key("files/../../etc/passwd"));
        assert!(!is_safe_key("files/bin\\..\\..\\x.dll"));
    }

    #[test]
    fn decode_text_strips_bom() {
        assert_eq!(decode_text(b"\xEF\xBB\xBFJohn"), "John");
        assert_eq!(decode_text(b"plain"), "plain");
    }

    #[tokio::test]
    async fn from_bytes_rejects_garbage() {
        assert!(Package::from_bytes(b"definitely not a zip".to_vec()).await.is_err());
        assert!(Package::from_bytes(Vec::new()).await.is_err());
    }
}
