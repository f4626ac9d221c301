//! Shared plumbing for the `lino-import` and `lino-export` binaries.
//!
//! # Responsibility
//! - Parse common logging flags and start file logging when asked.
//! - Move notation text between files and a links storage.

use anyhow::{Context, Result};
use clap::Args;
use linostore_core::{
    default_log_level, init_logging, open_db, ExportService, ImportReport, ImportService,
    LogLevel, SqliteLinks,
};
use log::info;
use std::path::{Path, PathBuf};

/// Logging flags shared by both binaries.
#[derive(Debug, Args)]
pub struct LogArgs {
    /// Log level (trace|debug|info|warn|error)
    #[arg(long, default_value = default_log_level())]
    pub log_level: LogLevel,

    /// Absolute directory for rotating log files; logging is off when omitted
    #[arg(long)]
    pub log_dir: Option<PathBuf>,
}

impl LogArgs {
    pub fn init(&self) -> Result<()> {
        if let Some(log_dir) = &self.log_dir {
            init_logging(self.log_level.as_str(), log_dir).context("failed to start logging")?;
        }
        Ok(())
    }
}

/// Reads `notation` and stores it in `storage` under `document`.
pub fn import_file(notation: &Path, storage: &Path, document: &str) -> Result<ImportReport> {
    let text = std::fs::read_to_string(notation)
        .with_context(|| format!("failed to read notation file `{}`", notation.display()))?;
    let conn = open_db(storage)
        .with_context(|| format!("failed to open links storage `{}`", storage.display()))?;
    let links = SqliteLinks::try_new(&conn)?;
    let report = ImportService::new(&links)
        .import_text(&text, document)
        .with_context(|| format!("failed to import `{}`", notation.display()))?;
    info!(
        "event=cli_import module=cli status=ok notation={} storage={} bytes={}",
        notation.display(),
        storage.display(),
        text.len()
    );
    Ok(report)
}

/// Formats `document` from `storage` and writes it to `notation`.
pub fn export_file(storage: &Path, notation: &Path, document: &str) -> Result<()> {
    let conn = open_db(storage)
        .with_context(|| format!("failed to open links storage `{}`", storage.display()))?;
    let links = SqliteLinks::try_new(&conn)?;
    let text = ExportService::new(&links)
        .export_text(document)
        .with_context(|| format!("failed to export from `{}`", storage.display()))?;
    std::fs::write(notation, &text)
        .with_context(|| format!("failed to write notation file `{}`", notation.display()))?;
    info!(
        "event=cli_export module=cli status=ok storage={} notation={} bytes={}",
        storage.display(),
        notation.display(),
        text.len()
    );
    Ok(())
}
