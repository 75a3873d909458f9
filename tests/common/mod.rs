//! Fixture packages for integration tests.

#![allow(dead_code)]

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use zip::CompressionMethod;
use zip::write::{SimpleFileOptions, ZipWriter};

pub const HOME_ID: &str = "{110D559F-DEA5-42EA-9C1C-8A5DF7E70EF9}";
pub const NEWS_ID: &str = "{2A5B6C7D-1111-4222-8333-944455556666}";

/// Item record XML with one field per `(key, content)` pair; `None`
/// leaves the field without a `content` element.
pub fn item_xml(id: &str, name: &str, fields: &[(&str, Option<&str>)]) -> String {
    let mut xml = format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<item name="{name}" key="{key}" id="{id}" tid="{{76036F5E-CBCE-46D1-AF0A-4143F9B557AA}}" mid="{{00000000-0000-0000-0000-000000000000}}" sortorder="100" language="en" version="1" template="sample item" parentid="{{0DE95AE4-41AB-4D01-9EB0-67441B7C2450}}">
  <fields>
"#,
        key = name.to_lowercase(),
    );
    for (i, (key, content)) in fields.iter().enumerate() {
        let tfid = format!("{{00000000-0000-0000-0000-{:012}}}", i + 1);
        match content {
            Some(content) => xml.push_str(&format!(
                "    <field tfid=\"{tfid}\" key=\"{key}\" type=\"text\">\n      <content>{content}</content>\n    </field>\n"
            )),
            None => xml.push_str(&format!(
                "    <field tfid=\"{tfid}\" key=\"{key}\" type=\"text\" />\n"
            )),
        }
    }
    xml.push_str("  </fields>\n</item>\n");
    xml
}

/// Builds an outer package archive around an inner `package.zip`.
#[derive(Default)]
pub struct PackageBuilder {
    entries: Vec<(String, Option<Vec<u8>>)>,
    skip_inner: bool,
}

impl PackageBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A package with two items, one payload file and basic metadata.
    pub fn sample() -> Self {
        Self::new()
            .entry("installer/version", "3")
            .entry("metadata/sc_name.txt", "My Module")
            .entry("metadata/sc_author.txt", "Jane Doe")
            .entry("metadata/sc_publisher.txt", "Example Corp")
            .entry("metadata/sc_version.txt", "1.0")
            .entry("metadata/sc_revision.txt", "42")
            .directory("files/")
            .directory("files/bin/")
            .entry("files/bin/MyModule.dll", b"MZ\x90\x00\x03")
            .entry("files/App_Config/Include/MyModule.config", "<configuration/>")
            .entry(
                format!("items/master/sitecore/content/Home/{HOME_ID}/en/1/xml"),
                item_xml(HOME_ID, "Home", &[("title", Some("Welcome")), ("text", None)]),
            )
            .entry(
                format!("items/master/sitecore/content/Home/News/{NEWS_ID}/en/1/xml"),
                item_xml(NEWS_ID, "News", &[("title", Some(""))]),
            )
            .entry(
                "properties/items/master/sitecore/content/Home/xml",
                "<properties/>",
            )
    }

    pub fn entry(mut self, key: impl Into<String>, data: impl AsRef<[u8]>) -> Self {
        self.entries.push((key.into(), Some(data.as_ref().to_vec())));
        self
    }

    pub fn directory(mut self, key: impl Into<String>) -> Self {
        self.entries.push((key.into(), None));
        self
    }

    /// Leave `package.zip` out of the outer archive.
    pub fn without_inner(mut self) -> Self {
        self.skip_inner = true;
        self
    }

    pub fn inner_bytes(&self) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options =
            || SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for (key, data) in &self.entries {
            match data {
                Some(data) => {
                    zip.start_file(key.as_str(), options()).unwrap();
                    zip.write_all(data).unwrap();
                }
                None => zip.add_directory(key.as_str(), options()).unwrap(),
            }
        }

        zip.finish().unwrap().into_inner()
    }

    /// Write the outer archive as `dir/file_name` and return its path.
    pub fn write(&self, dir: &Path, file_name: &str) -> PathBuf {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let stored = || SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

        zip.start_file("installer/readme.txt", stored()).unwrap();
        zip.write_all(b"Install with the package installer.").unwrap();
        if !self.skip_inner {
            zip.start_file("package.zip", stored()).unwrap();
            zip.write_all(&self.inner_bytes()).unwrap();
        }

        let path = dir.join(file_name);
        std::fs::write(&path, zip.finish().unwrap().into_inner()).unwrap();
        path
    }
}
