//! `lino-import`: store a links-notation file in a links storage.

use anyhow::Result;
use clap::Parser;
use linostore_cli::{import_file, LogArgs};
use std::path::PathBuf;

/// Import a links-notation file into a links storage.
#[derive(Parser)]
#[command(name = "lino-import")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the notation file to read
    notation: PathBuf,

    /// Path to the links storage (created when missing)
    storage: PathBuf,

    /// Document name; empty stores the raw `(index: source target)` dump
    #[arg(default_value = "")]
    document: String,

    #[command(flatten)]
    log: LogArgs,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.log.init()?;

    let report = import_file(&cli.notation, &cli.storage, &cli.document)?;
    println!(
        "imported {} top-level links ({} mode, {} new relations)",
        report.nodes,
        report.mode.as_str(),
        report.links_created
    );
    Ok(())
}
