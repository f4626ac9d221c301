//! `lino-export`: write a stored document back as links notation.

use anyhow::Result;
use clap::Parser;
use linostore_cli::{export_file, LogArgs};
use std::path::PathBuf;

/// Export a document from a links storage into a links-notation file.
#[derive(Parser)]
#[command(name = "lino-export")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the links storage to read
    storage: PathBuf,

    /// Path to the notation file to write
    notation: PathBuf,

    /// Document name; empty exports the raw `(index: source target)` dump
    #[arg(default_value = "")]
    document: String,

    #[command(flatten)]
    log: LogArgs,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.log.init()?;
    export_file(&cli.storage, &cli.notation, &cli.document)
}
