//! # pkgconv
//!
//! Converts a content-management package archive into a NuGet-style
//! package directory.
//!
//! A package archive is a ZIP holding an inner `package.zip`. The inner
//! archive carries content items as XML records, plain payload files and
//! package metadata. Conversion produces:
//!
//! - one `.item` text file per content item, laid out by content tree path
//! - the payload files under `wwwroot/`
//! - a `.nuspec` manifest listing package metadata and every output file
//!
//! ## Example
//!
//! ```no_run
//! use std::path::PathBuf;
//! use pkgconv::{Context, convert};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let ctx = Context::new(PathBuf::from("MyModule-1.0.zip"), None);
//!     let summary = convert(&ctx).await?;
//!     println!("{} items written to {}", summary.items, summary.output_root.display());
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod convert;
pub mod error;
pub mod io;
pub mod item;
pub mod manifest;
pub mod metadata;
pub mod package;
pub mod zip;

pub use cli::Cli;
pub use convert::{Context, Summary, convert};
pub use error::ConvertError;
pub use item::{Field, Item, Version};
pub use metadata::{MetadataKey, MetadataTable};
pub use package::{ArchiveEntry, EntryKind, Package};
