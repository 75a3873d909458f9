//! Reading ZIP archives through [`ReadAt`](crate::io::ReadAt).
//!
//! Package files and the `package.zip` inside them are both plain ZIP
//! archives. Only what packages actually use is supported:
//!
//! - [`structures`]: EOCD, ZIP64 records and the [`ZipFileEntry`] listing type
//! - [`parser`]: central directory listing and local header lookup
//! - [`extractor`]: STORED and DEFLATE data with size and CRC-32 checks
//!
//! Encrypted entries, multi-disk archives and other compression methods
//! are rejected with an error.

mod extractor;
mod parser;
mod structures;

pub use extractor::ZipExtractor;
pub use parser::ZipParser;
pub use structures::*;
