//! Mapping item entry keys to serialization paths.
//!
//! A key such as `items/master/sitecore/content/Home/{GUID}/en/1/xml`
//! carries the content tree path, the item identifier and a record suffix.
//! Only the tree path above the identifier names the output file:
//! `master/sitecore/content/Home.item`.

use std::path::PathBuf;

use uuid::Uuid;

/// Extension of serialized item files, including the dot.
pub const ITEM_EXTENSION: &str = ".item";

/// Resolve an item entry key to a path relative to the serialization root.
///
/// The first non-empty segment (the archive area, e.g. `items`) is dropped.
/// The remaining segments are cut at the first identifier segment; with no
/// identifier segment all of them are kept. The last kept segment gets
/// [`ITEM_EXTENSION`] appended.
pub fn resolve_item_path(key: &str) -> PathBuf {
    let segments: Vec<&str> = key
        .split('/')
        .filter(|segment| !segment.is_empty())
        .skip(1)
        .collect();

    let kept = match segments.iter().position(|segment| is_identifier(segment)) {
        Some(index) => &segments[..index],
        None => &segments[..],
    };

    let mut path: PathBuf = kept.iter().collect();
    let file_name = match path.file_name() {
        Some(name) => format!("{}{}", name.to_string_lossy(), ITEM_EXTENSION),
        None => ITEM_EXTENSION.to_string(),
    };
    path.set_file_name(file_name);
    path
}

/// Whether `segment` is an item identifier: a GUID in braced
/// (`{xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx}`) or plain hyphenated form.
pub fn is_identifier(segment: &str) -> bool {
    let bare = match segment.strip_prefix('{') {
        Some(rest) => match rest.strip_suffix('}') {
            Some(inner) => inner,
            None => return false,
        },
        None => segment,
    };
    bare.len() == 36 && Uuid::try_parse(bare).is_ok()
}
