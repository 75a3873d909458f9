//! The `.nuspec` manifest describing a converted package.
//!
//! The manifest lists every file under the package root, so it has to be
//! built after everything else has been written. The manifest file itself
//! is written after the listing and never appears in it.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use quick_xml::Writer;
use tokio::fs;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use tracing::debug;
use walkdir::WalkDir;

use crate::metadata::{MetadataKey, MetadataTable};

const NUSPEC_NAMESPACE: &str = "http://schemas.microsoft.com/packaging/2010/07/nuspec.xsd";

/// Used for both the license and the project URL.
pub const PROJECT_URL: &str = "http://www.sitecore.net/";

pub const MANIFEST_EXTENSION: &str = "nuspec";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    pub id: String,
    pub version: String,
    pub title: String,
    pub authors: String,
    pub owners: String,
    pub license_url: String,
    pub project_url: String,
    pub description: String,
    /// Paths relative to the package root; each is both source and target.
    pub files: Vec<String>,
}

impl Manifest {
    /// Build the manifest for `package_name` from collected metadata.
    ///
    /// Expects the comment default to have been applied already.
    pub fn new(package_name: &str, metadata: &MetadataTable, files: Vec<String>) -> Self {
        let version = format!(
            "{} {}",
            metadata.get(MetadataKey::Version),
            metadata.get(MetadataKey::Revision)
        );

        Self {
            id: package_name.replace(' ', ""),
            version: version.trim().to_string(),
            title: metadata.get(MetadataKey::Name).to_string(),
            authors: metadata.get(MetadataKey::Author).to_string(),
            owners: metadata.get(MetadataKey::Publisher).to_string(),
            license_url: PROJECT_URL.to_string(),
            project_url: PROJECT_URL.to_string(),
            description: metadata.get(MetadataKey::Comment).to_string(),
            files,
        }
    }

    pub fn to_xml(&self) -> Result<String> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
        writer.write_event(Event::Start(
            BytesStart::new("package").with_attributes([("xmlns", NUSPEC_NAMESPACE)]),
        ))?;

        writer.write_event(Event::Start(BytesStart::new("metadata")))?;
        text_element(&mut writer, "id", &self.id)?;
        text_element(&mut writer, "version", &self.version)?;
        text_element(&mut writer, "title", &self.title)?;
        text_element(&mut writer, "authors", &self.authors)?;
        text_element(&mut writer, "owners", &self.owners)?;
        text_element(&mut writer, "licenseUrl", &self.license_url)?;
        text_element(&mut writer, "projectUrl", &self.project_url)?;
        text_element(&mut writer, "description", &self.description)?;
        writer.write_event(Event::End(BytesEnd::new("metadata")))?;

        writer.write_event(Event::Start(BytesStart::new("files")))?;
        for file in &self.files {
            writer.write_event(Event::Empty(
                BytesStart::new("file")
                    .with_attributes([("src", file.as_str()), ("target", file.as_str())]),
            ))?;
        }
        writer.write_event(Event::End(BytesEnd::new("files")))?;

        writer.write_event(Event::End(BytesEnd::new("package")))?;

        let mut xml = String::from_utf8(writer.into_inner())?;
        xml.push('\n');
        Ok(xml)
    }
}

fn text_element<W: Write>(writer: &mut Writer<W>, name: &str, text: &str) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

/// Every file below `root`, relative to it, sorted by path.
pub fn list_package_files(root: &Path) -> Result<Vec<String>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to walk {}", root.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry.path().strip_prefix(root)?;
        files.push(relative.to_string_lossy().into_owned());
    }

    Ok(files)
}

/// List the package tree and write `<package_name>.nuspec` into its root.
pub async fn write_manifest(
    root: &Path,
    package_name: &str,
    metadata: &MetadataTable,
) -> Result<PathBuf> {
    // walkdir is synchronous; keep the walk off the runtime threads
    let walk_root = root.to_path_buf();
    let files = tokio::task::spawn_blocking(move || list_package_files(&walk_root))
        .await
        .context("Package file listing was interrupted")??;
    debug!("Manifest lists {} files", files.len());

    let manifest = Manifest::new(package_name, metadata, files);
    let path = root.join(format!("{package_name}.{MANIFEST_EXTENSION}"));
    fs::write(&path, manifest.to_xml()?)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata() -> MetadataTable {
        let mut table = MetadataTable::default();
        table.set(MetadataKey::Name, "My Module");
        table.set(MetadataKey::Author, "Jane & John");
        table.set(MetadataKey::Publisher, "Example Corp");
        table.set(MetadataKey::Version, "1.0");
        table.set(MetadataKey::Revision, "42");
        table.set(MetadataKey::Comment, "Adds <things>");
        table
    }

    #[test]
    fn metadata_fields() {
        let manifest = Manifest::new("My Module", &metadata(), Vec::new());
        assert_eq!(manifest.id, "MyModule");
        assert_eq!(manifest.version, "1.0 42");
        assert_eq!(manifest.title, "My Module");
        assert_eq!(manifest.authors, "Jane & John");
        assert_eq!(manifest.owners, "Example Corp");
        assert_eq!(manifest.license_url, PROJECT_URL);
        assert_eq!(manifest.project_url, PROJECT_URL);
        assert_eq!(manifest.description, "Adds <things>");
    }

    #[test]
    fn version_without_revision_is_trimmed() {
        let mut table = metadata();
        table.set(MetadataKey::Revision, "");
        assert_eq!(Manifest::new("m", &table, Vec::new()).version, "1.0");

        let manifest = Manifest::new("m", &MetadataTable::default(), Vec::new());
        assert_eq!(manifest.version, "");
    }

    #[test]
    fn xml_escapes_values() {
        let files = vec!["content/My Module-1.0.zip".to_string()];
        let xml = Manifest::new("My Module", &metadata(), files).to_xml().unwrap();

        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>"));
        assert!(xml.contains(&format!("<package xmlns=\"{NUSPEC_NAMESPACE}\">")));
        assert!(xml.contains("<id>MyModule</id>"));
        assert!(xml.contains("<authors>Jane &amp; John</authors>"));
        assert!(xml.contains("<description>Adds &lt;things&gt;</description>"));
        assert!(xml.contains(
            "<file src=\"content/My Module-1.0.zip\" target=\"content/My Module-1.0.zip\"/>"
        ));
    }

    #[test]
    fn lists_nested_files_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("tools")).unwrap();
        std::fs::create_dir_all(root.join("serialization/master")).unwrap();
        std::fs::create_dir_all(root.join("wwwroot")).unwrap();
        std::fs::write(root.join("tools/install.ps1"), "x").unwrap();
        std::fs::write(root.join("serialization/master/Home.item"), "x").unwrap();

        let files = list_package_files(root).unwrap();
        let expected: Vec<String> = [
            Path::new("serialization").join("master").join("Home.item"),
            Path::new("tools").join("install.ps1"),
        ]
        .iter()
        .map(|p| p.to_string_lossy().into_owned())
        .collect();
        assert_eq!(files, expected);
    }

    #[tokio::test]
    async fn manifest_is_not_listed_in_itself() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::write(root.join("readme.txt"), "x").unwrap();

        let path = write_manifest(root, "Pkg", &MetadataTable::default())
            .await
            .unwrap();
        assert_eq!(path, root.join("Pkg.nuspec"));

        let xml = std::fs::read_to_string(&path).unwrap();
        assert!(xml.contains("src=\"readme.txt\""));
        assert!(!xml.contains("Pkg.nuspec"));
    }
}
