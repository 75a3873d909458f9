//! The conversion pipeline.
//!
//! Output layout below `<output-dir>/<package-name>/`:
//!
//! - `content/<input file name>`: the input package, unchanged
//! - `serialization/**.item`: one file per item record
//! - `wwwroot/**`: the payload files of the package
//! - `tools/*`: bundled installer scripts
//! - `<package-name>.nuspec`: the manifest, written last

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use tokio::fs;
use tracing::{debug, info, warn};

use crate::error::ConvertError;
use crate::item::{parse_item, resolve_item_path, write_item};
use crate::manifest::write_manifest;
use crate::metadata;
use crate::package::{EntryKind, PAYLOAD_PREFIX, Package};

pub const CONTENT_DIR: &str = "content";
pub const SERIALIZATION_DIR: &str = "serialization";
pub const TOOLS_DIR: &str = "tools";
pub const WWWROOT_DIR: &str = "wwwroot";

/// Installer scripts shipped in every converted package.
const TOOLS: &[(&str, &[u8])] = &[
    ("install.ps1", include_bytes!("../resources/tools/install.ps1")),
    ("uninstall.ps1", include_bytes!("../resources/tools/uninstall.ps1")),
];

/// Everything a conversion run needs to know, passed to each stage.
#[derive(Debug, Clone)]
pub struct Context {
    pub input: PathBuf,
    pub package_name: String,
    pub output_root: PathBuf,
}

impl Context {
    /// Derive the package name and output root for `input`.
    ///
    /// The package directory is created in `output_dir`, or next to the
    /// input file when none is given.
    pub fn new(input: PathBuf, output_dir: Option<PathBuf>) -> Self {
        let package_name = package_name(&input);
        let output_dir = output_dir.unwrap_or_else(|| match input.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        });
        let output_root = output_dir.join(&package_name);

        Self {
            input,
            package_name,
            output_root,
        }
    }

    pub fn dir(&self, name: &str) -> PathBuf {
        self.output_root.join(name)
    }
}

/// The input file stem up to its first `-`: `MyModule-1.0.zip` is `MyModule`.
pub fn package_name(input: &Path) -> String {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    match stem.split_once('-') {
        Some((name, _)) if !name.is_empty() => name.to_string(),
        _ => stem,
    }
}

/// What a finished run produced.
#[derive(Debug, Clone, Default)]
pub struct Summary {
    pub output_root: PathBuf,
    pub manifest: PathBuf,
    pub items: usize,
    pub files: usize,
    pub skipped: usize,
}

/// Run the whole conversion described by `ctx`.
///
/// Preconditions and the archive are checked before anything is written,
/// so a [`ConvertError`] leaves no output behind. Failures after that may
/// leave a partial package directory.
pub async fn convert(ctx: &Context) -> Result<Summary> {
    if !ctx.input.is_file() {
        return Err(ConvertError::InputNotFound(ctx.input.clone()).into());
    }
    if ctx.output_root.exists() {
        return Err(ConvertError::OutputExists(ctx.output_root.clone()).into());
    }

    let package = Package::open(&ctx.input).await?;
    info!(
        "Converting {} into {}",
        ctx.input.display(),
        ctx.output_root.display()
    );

    create_layout(ctx).await?;

    let mut summary = Summary {
        output_root: ctx.output_root.clone(),
        ..Summary::default()
    };

    copy_input(ctx).await?;
    extract_items(&package, &ctx.dir(SERIALIZATION_DIR), &mut summary).await?;
    extract_payload(&package, &ctx.dir(WWWROOT_DIR), &mut summary).await?;
    let metadata = metadata::collect(&package, &ctx.package_name).await?;
    write_tools(&ctx.dir(TOOLS_DIR)).await?;

    // Last: the manifest lists everything written above
    summary.manifest = write_manifest(&ctx.output_root, &ctx.package_name, &metadata).await?;

    info!(
        "Wrote {} items and {} files ({} entries skipped)",
        summary.items, summary.files, summary.skipped
    );
    Ok(summary)
}

async fn create_layout(ctx: &Context) -> Result<()> {
    for name in [CONTENT_DIR, SERIALIZATION_DIR, TOOLS_DIR, WWWROOT_DIR] {
        let dir = ctx.dir(name);
        fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    Ok(())
}

async fn copy_input(ctx: &Context) -> Result<()> {
    let file_name = ctx
        .input
        .file_name()
        .context("Input path has no file name")?;
    let target = ctx.dir(CONTENT_DIR).join(file_name);
    fs::copy(&ctx.input, &target)
        .await
        .with_context(|| format!("Failed to copy package to {}", target.display()))?;
    Ok(())
}

/// Item pass: parse every item record and serialize it below `root`.
async fn extract_items(package: &Package, root: &Path, summary: &mut Summary) -> Result<()> {
    for entry in package.entries().await? {
        if entry.kind() != EntryKind::Item {
            continue;
        }
        if !entry.is_safe() {
            warn!("Skipping item entry with unsafe path: {}", entry.key());
            summary.skipped += 1;
            continue;
        }

        let xml = entry.read_text().await?;
        let item = match parse_item(&xml) {
            Ok(Some(item)) => item,
            Ok(None) => {
                debug!("No root element in {}", entry.key());
                continue;
            }
            Err(e) => {
                warn!("Skipping malformed item entry {}: {}", entry.key(), e);
                summary.skipped += 1;
                continue;
            }
        };

        let path = root.join(resolve_item_path(entry.key()));
        debug!("{} -> {}", entry.key(), path.display());
        write_item(&item, &path).await?;
        summary.items += 1;
    }
    Ok(())
}

/// File pass: copy every payload entry below `root`.
async fn extract_payload(package: &Package, root: &Path, summary: &mut Summary) -> Result<()> {
    for entry in package.entries().await? {
        if entry.kind() != EntryKind::Payload {
            continue;
        }
        if !entry.is_safe() {
            warn!("Skipping payload entry with unsafe path: {}", entry.key());
            summary.skipped += 1;
            continue;
        }

        let relative = entry.key().strip_prefix(PAYLOAD_PREFIX).unwrap_or(entry.key());
        let path: PathBuf = relative
            .split('/')
            .filter(|segment| !segment.is_empty())
            .fold(root.to_path_buf(), |path, segment| path.join(segment));

        debug!("{} -> {}", entry.key(), path.display());
        entry.extract_to(&path).await?;
        summary.files += 1;
    }
    Ok(())
}

async fn write_tools(dir: &Path) -> Result<()> {
    for (name, bytes) in TOOLS {
        let path = dir.join(name);
        fs::write(&path, bytes)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }
    Ok(())
}
