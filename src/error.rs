//! Fatal conversion errors.
//!
//! Every variant aborts the run before (or instead of) producing output.
//! The binary reports these as plain messages rather than error traces.

use std::io::Write;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConvertError {
    /// No input package was given on the command line.
    #[error("no package file given. Usage: pkgconv <FILE>")]
    MissingArgument,

    #[error("package file '{}' does not exist", .0.display())]
    InputNotFound(PathBuf),

    /// The target package directory is already there; it is never merged.
    #[error("output directory '{}' already exists", .0.display())]
    OutputExists(PathBuf),

    #[error("'{}' does not contain the inner package entry '{entry}'", .archive.display())]
    MissingInnerArchive { archive: PathBuf, entry: String },

    #[error("'{}' is not a valid package archive: {reason}", .path.display())]
    InvalidArchive { path: PathBuf, reason: String },
}

/// Settle the outcome of a run the way the command line reports it.
///
/// A [`ConvertError`] is written to `out` as a plain message and the run
/// counts as finished. Any other error is returned unchanged.
pub fn report<W: Write>(result: anyhow::Result<()>, out: &mut W) -> anyhow::Result<()> {
    let err = match result {
        Ok(()) => return Ok(()),
        Err(err) => err,
    };
    match err.downcast_ref::<ConvertError>() {
        Some(convert_error) => {
            writeln!(out, "{convert_error}")?;
            Ok(())
        }
        None => Err(err),
    }
}
