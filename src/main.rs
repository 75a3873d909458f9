//! Main entry point for the pkgconv CLI application.

use anyhow::Result;
use clap::Parser;

use pkgconv::{Cli, Context, ConvertError, Package, convert, error};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(cli.log_level())),
        )
        .with_writer(std::io::stderr)
        .init();

    // Precondition and archive problems are reported, not raised
    error::report(run(&cli).await, &mut std::io::stdout())
}

async fn run(cli: &Cli) -> Result<()> {
    let file = cli.input()?.to_path_buf();

    if cli.is_listing() {
        if !file.is_file() {
            return Err(ConvertError::InputNotFound(file).into());
        }
        let package = Package::open(&file).await?;
        return list_entries(&package, cli.verbose).await;
    }

    let ctx = Context::new(file, cli.output_dir.clone());
    let summary = convert(&ctx).await?;

    if !cli.quiet {
        println!(
            "  serialized: {} items\n  copied:     {} files",
            summary.items, summary.files
        );
        if summary.skipped > 0 {
            println!("  skipped:    {} entries (see warnings)", summary.skipped);
        }
    }
    println!("Package created at {}", summary.output_root.display());

    Ok(())
}

/// List the entries of the inner package.
///
/// - Simple format (`-l`): kind and name, one entry per line
/// - Verbose format (`-v`): sizes, compression ratio and timestamps as well
async fn list_entries(package: &Package, verbose: bool) -> Result<()> {
    if verbose {
        println!(
            "{:>10}  {:>10}  {:>5}  {:>10}  {:>5}  {:<8}  Name",
            "Length", "Size", "Cmpr", "Date", "Time", "Kind"
        );
        println!("{}", "-".repeat(80));
    }

    let mut total_uncompressed = 0u64;
    let mut total_compressed = 0u64;
    let mut count = 0usize;

    for entry in package.entries().await? {
        let info = entry.info();
        let kind = entry.kind().label();

        if verbose {
            let (year, month, day) = info.mod_date();
            let (hour, minute, _second) = info.mod_time();
            println!(
                "{:>10}  {:>10}  {:>4}%  {:04}-{:02}-{:02}  {:02}:{:02}  {:<8}  {}",
                info.uncompressed_size,
                info.compressed_size,
                info.compression_ratio(),
                year,
                month,
                day,
                hour,
                minute,
                kind,
                info.file_name
            );
        } else {
            println!("{:<8}  {}", kind, info.file_name);
        }

        if !info.is_directory {
            total_uncompressed += info.uncompressed_size;
            total_compressed += info.compressed_size;
            count += 1;
        }
    }

    if verbose {
        println!("{}", "-".repeat(80));
        println!(
            "{:>10}  {:>10}  {:>21}  {} files ({})",
            total_uncompressed,
            total_compressed,
            "",
            count,
            format_size(total_uncompressed)
        );
    }

    Ok(())
}

/// `1536` is shown as `1.50 KB`.
fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}
