use std::path::{Path, PathBuf};

use clap::Parser;

use crate::error::ConvertError;

#[derive(Parser, Debug)]
#[command(name = "pkgconv")]
#[command(version)]
#[command(about = "Convert a content package archive into a NuGet-style package directory", long_about = None)]
#[command(after_help = "Examples:\n  \
  pkgconv MyModule-1.0.zip             create ./MyModule next to the archive\n  \
  pkgconv MyModule-1.0.zip -d out      create out/MyModule\n  \
  pkgconv -l MyModule-1.0.zip          list the package entries")]
pub struct Cli {
    /// Package archive to convert
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Create the package directory inside DIR
    #[arg(short = 'd', long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// List package entries (short format)
    #[arg(short = 'l')]
    pub list: bool,

    /// List package entries verbosely (sizes, ratio, date)
    #[arg(short = 'v')]
    pub verbose: bool,

    /// Quiet mode, only errors are reported
    #[arg(short = 'q')]
    pub quiet: bool,
}

impl Cli {
    /// The package file, or [`ConvertError::MissingArgument`].
    pub fn input(&self) -> Result<&Path, ConvertError> {
        self.file.as_deref().ok_or(ConvertError::MissingArgument)
    }

    pub fn is_listing(&self) -> bool {
        self.list || self.verbose
    }

    /// Default log filter when `RUST_LOG` is not set.
    pub fn log_level(&self) -> &'static str {
        if self.quiet { "error" } else { "warn" }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_a_convert_error() {
        let cli = Cli::try_parse_from(["pkgconv"]).unwrap();
        assert!(matches!(cli.input(), Err(ConvertError::MissingArgument)));
        assert!(!cli.is_listing());
    }

    #[test]
    fn verbose_implies_listing() {
        let cli = Cli::try_parse_from(["pkgconv", "-v", "Pkg-1.0.zip"]).unwrap();
        assert_eq!(cli.input().unwrap(), Path::new("Pkg-1.0.zip"));
        assert!(cli.is_listing());
        assert_eq!(cli.log_level(), "warn");

        let cli = Cli::try_parse_from(["pkgconv", "-q", "-d", "out", "Pkg-1.0.zip"]).unwrap();
        assert_eq!(cli.output_dir.as_deref(), Some(Path::new("out")));
        assert_eq!(cli.log_level(), "error");
    }
}
