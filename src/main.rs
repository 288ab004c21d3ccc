//! Main entry point for the wgtfile CLI application.
//!
//! Lists, prints and extracts the members of a widget package.

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use std::io::Write;
use std::path::Path;

use wgtfile::{Cli, LocalFileReader, WgtFile};

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let wgt = WgtFile::open(&cli.file).with_context(|| format!("cannot open {}", cli.file))?;

    if cli.list || cli.verbose {
        list_files(&wgt, cli.verbose);
        return Ok(());
    }

    if cli.config {
        let descriptor = wgt.template().context("cannot read the component descriptor")?;
        std::io::stdout().write_all(&descriptor)?;
        return Ok(());
    }

    if cli.pipe {
        return pipe_files(&wgt, &cli.names);
    }

    extract(&wgt, &cli)
}

/// List package members.
///
/// The verbose format adds sizes, compression ratio and timestamps.
fn list_files(wgt: &WgtFile<LocalFileReader>, verbose: bool) {
    if verbose {
        println!(
            "{:>10}  {:>10}  {:>5}  {:>10}  {:>5}  Name",
            "Length", "Size", "Cmpr", "Date", "Time"
        );
        println!("{}", "-".repeat(70));
    }

    let mut total_uncompressed = 0u64;
    let mut total_compressed = 0u64;
    let mut file_count = 0usize;

    for member in wgt.members() {
        let entry = member.entry();
        let display_name = if member.is_directory() {
            format!("{}/", member.name())
        } else {
            member.name().to_string()
        };

        if !verbose {
            println!("{display_name}");
            continue;
        }

        let (year, month, day) = entry.mod_date();
        let (hour, minute, _second) = entry.mod_time();
        println!(
            "{:>10}  {:>10}  {}  {:04}-{:02}-{:02}  {:02}:{:02}  {}",
            entry.uncompressed_size,
            entry.compressed_size,
            ratio(entry.compressed_size, entry.uncompressed_size),
            year,
            month,
            day,
            hour,
            minute,
            display_name
        );

        if !member.is_directory() {
            total_uncompressed += entry.uncompressed_size;
            total_compressed += entry.compressed_size;
            file_count += 1;
        }
    }

    if verbose {
        println!("{}", "-".repeat(70));
        println!(
            "{:>10}  {:>10}  {}  {:>21}  {} files",
            total_uncompressed,
            total_compressed,
            ratio(total_compressed, total_uncompressed),
            "",
            file_count
        );
    }
}

/// Space saved by compression, as a right-aligned percentage.
fn ratio(compressed: u64, uncompressed: u64) -> String {
    if uncompressed > 0 && compressed <= uncompressed {
        format!("{:>4}%", 100 - (compressed * 100 / uncompressed))
    } else {
        "  0%".to_string()
    }
}

/// Write file contents to stdout, all files when `names` is empty.
fn pipe_files(wgt: &WgtFile<LocalFileReader>, names: &[String]) -> Result<()> {
    let names: Vec<String> = if names.is_empty() {
        wgt.members()
            .filter(|m| !m.is_directory())
            .map(|m| m.name().to_string())
            .collect()
    } else {
        names.to_vec()
    };

    let mut stdout = std::io::stdout().lock();
    for name in &names {
        let data = wgt.read_file(name).with_context(|| format!("cannot read {name}"))?;
        stdout.write_all(&data)?;
    }
    stdout.flush()?;
    Ok(())
}

/// Extract the requested names, or the whole package.
fn extract(wgt: &WgtFile<LocalFileReader>, cli: &Cli) -> Result<()> {
    let root = Path::new(cli.destination());

    if cli.names.is_empty() {
        if !cli.is_quiet() {
            println!("  extracting: {} -> {}", cli.file, root.display());
        }
        return wgt
            .extract(root)
            .with_context(|| format!("cannot extract {}", cli.file));
    }

    for name in &cli.names {
        if wgt.is_dir(name) {
            if !cli.is_quiet() {
                println!("  extracting: {name}/");
            }
            wgt.extract_dir(name, root)
                .with_context(|| format!("cannot extract directory {name}"))?;
        } else {
            let dest = wgt
                .extract_file(name, root)
                .with_context(|| format!("cannot extract {name}"))?;
            if !cli.is_quiet() {
                println!("  extracting: {}", dest.display());
            }
        }
    }

    Ok(())
}
