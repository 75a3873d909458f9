//! The textual `.item` format.
//!
//! ```text
//! ----item----
//! version: 1
//! id: {..}
//! name: Home
//! parent: {..}
//! template: {..}
//! master: {..}
//! branch: {..}
//! templatekey: sample item
//!
//! ----version----
//! language: en
//! version: 1
//! revision:
//!
//! ----field----
//! field: {..}
//! name: title
//! key: title
//! content-length: 7
//!
//! Welcome
//! ```
//!
//! A field without a value has no `content-length` line and no value block.

use std::borrow::Cow;
use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use tokio::fs;

use super::{Field, Item, Version};

/// Version of the item text format written into every file.
const FORMAT_VERSION: u32 = 1;

/// Render an item. The output depends only on the item.
pub fn render_item(item: &Item) -> String {
    let mut out = String::new();

    out.push_str("----item----\n");
    header(&mut out, "version", &FORMAT_VERSION.to_string());
    header(&mut out, "id", &item.id);
    header(&mut out, "name", &item.name);
    header(&mut out, "parent", &item.parent_id);
    header(&mut out, "template", &item.template_id);
    header(&mut out, "master", &item.master_id);
    header(&mut out, "branch", &item.branch_id);
    header(&mut out, "templatekey", &item.template_name);
    out.push('\n');

    for version in &item.versions {
        render_version(&mut out, version);
    }

    out
}

fn render_version(out: &mut String, version: &Version) {
    out.push_str("----version----\n");
    header(out, "language", &version.language);
    header(out, "version", &version.number);
    header(out, "revision", &version.revision);
    out.push('\n');

    for field in &version.fields {
        render_field(out, field);
    }
}

fn render_field(out: &mut String, field: &Field) {
    out.push_str("----field----\n");
    header(out, "field", &field.field_id);
    header(out, "name", &field.name);
    header(out, "key", &field.key);

    match &field.value {
        Some(value) => {
            header(out, "content-length", &value.len().to_string());
            out.push('\n');
            out.push_str(value);
            out.push('\n');
        }
        None => out.push('\n'),
    }
}

fn header(out: &mut String, name: &str, value: &str) {
    let value = single_line(value);
    // Writing to a String cannot fail
    let _ = if value.is_empty() {
        writeln!(out, "{name}:")
    } else {
        writeln!(out, "{name}: {value}")
    };
}

/// Header values occupy exactly one line; each line break (`\r\n`, `\r`
/// or `\n`) becomes a single space.
fn single_line(value: &str) -> Cow<'_, str> {
    if !value.contains(['\r', '\n']) {
        return Cow::Borrowed(value);
    }
    Cow::Owned(value.replace("\r\n", " ").replace(['\r', '\n'], " "))
}

/// Write `item` to `path`, creating parent directories as needed and
/// replacing any existing file.
pub async fn write_item(item: &Item, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }

    fs::write(path, render_item(item))
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Item {
        Item {
            id: "{110D559F-DEA5-42EA-9C1C-8A5DF7E70EF9}".to_string(),
            name: "Home".to_string(),
            parent_id: "{0DE95AE4-41AB-4D01-9EB0-67441B7C2450}".to_string(),
            template_id: "{76036F5E-CBCE-46D1-AF0A-4143F9B557AA}".to_string(),
            master_id: String::new(),
            branch_id: String::new(),
            template_name: "sample item".to_string(),
            versions: vec![Version {
                language: "en".to_string(),
                number: "1".to_string(),
                revision: String::new(),
                fields: vec![
                    Field::new("{75577384-3C97-45DA-A847-81B00500E250}", "title", Some("Welcome".to_string())),
                    Field::new("{C8F93AFE-BFD4-4E8F-9C61-152559854661}", "__created by", Some(String::new())),
                    Field::new("{5DD74568-4D4B-44C1-B513-0AF5F4CDA34F}", "__updated by", None),
                ],
            }],
        }
    }

    #[test]
    fn renders_expected_layout() {
        let expected = "\
----item----
version: 1
id: {110D559F-DEA5-42EA-9C1C-8A5DF7E70EF9}
name: Home
parent: {0DE95AE4-41AB-4D01-9EB0-67441B7C2450}
template: {76036F5E-CBCE-46D1-AF0A-4143F9B557AA}
master:
branch:
templatekey: sample item

----version----
language: en
version: 1
revision:

----field----
field: {75577384-3C97-45DA-A847-81B00500E250}
name: title
key: title
content-length: 7

Welcome
----field----
field: {C8F93AFE-BFD4-4E8F-9C61-152559854661}
name: __created by
key: __created by
content-length: 0


----field----
field: {5DD74568-4D4B-44C1-B513-0AF5F4CDA34F}
name: __updated by
key: __updated by

";
        assert_eq!(render_item(&sample()), expected);
    }

    #[test]
    fn rendering_is_repeatable() {
        let item = sample();
        assert_eq!(render_item(&item), render_item(&item.clone()));
    }

    #[test]
    fn empty_and_missing_values_render_differently() {
        let mut present = sample();
        present.versions[0].fields = vec![Field::new("f", "k", Some(String::new()))];
        let mut missing = sample();
        missing.versions[0].fields = vec![Field::new("f", "k", None)];

        let present = render_item(&present);
        let missing = render_item(&missing);
        assert_ne!(present, missing);
        assert!(present.contains("content-length: 0\n"));
        assert!(!missing.contains("content-length"));
    }

    #[test]
    fn content_length_counts_utf8_bytes() {
        let mut item = sample();
        item.versions[0].fields = vec![Field::new("f", "k", Some("Grüße".to_string()))];
        assert!(render_item(&item).contains("content-length: 7\n\nGrüße\n"));
    }

    #[tokio::test]
    async fn write_creates_parents_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("master").join("sitecore").join("Home.item");

        let mut item = sample();
        write_item(&item, &path).await.unwrap();
        let first = std::fs::read(&path).unwrap();
        write_item(&item, &path).await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), first);

        item.name = "Start".to_string();
        write_item(&item, &path).await.unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("name: Start\n"));
        assert!(!text.contains("name: Home\n"));
    }

    #[test]
    fn header_values_stay_on_one_line() {
        let mut item = sample();
        item.name = "Home\nid: {00000000-0000-0000-0000-000000000000}".to_string();
        item.template_name = "sample\r\nitem\r".to_string();

        let rendered = render_item(&item);
        assert!(rendered.contains("\nname: Home id: {00000000-0000-0000-0000-000000000000}\n"));
        assert!(rendered.contains("\ntemplatekey: sample item \n"));
        assert_eq!(rendered.lines().filter(|l| l.starts_with("id: ")).count(), 1);

        let parsed = crate::item::parse_item(r#"<item id="{x}" name="Line&#10;Break"/>"#)
            .unwrap()
            .unwrap();
        assert!(render_item(&parsed).contains("\nname: Line Break\n"));

        assert_eq!(single_line("plain"), "plain");
        assert_eq!(single_line("a\r\nb"), "a b");
    }
}
