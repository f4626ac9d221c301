//! Notation import use-case service.
//!
//! # Responsibility
//! - Parse notation text and store it as a named document or a raw dump.
//! - Emit `lino_import` logging events with duration and status.
//!
//! # Invariants
//! - Parse errors are reported before the substrate is touched.
//! - A failed import leaves the substrate unchanged.
//! - Document contents are never logged.

use super::{ServiceResult, StorageMode};
use crate::links::Links;
use crate::lino::{LinoDocuments, RawLinksStorage};
use crate::notation::parse;
use log::{error, info};
use std::time::Instant;

/// Outcome of one successful import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportReport {
    pub mode: StorageMode,
    /// Top-level nodes stored.
    pub nodes: usize,
    /// Links added to the substrate by this import.
    pub links_created: u64,
}

/// Import service facade.
pub struct ImportService<'a, L: ?Sized> {
    links: &'a L,
}

impl<'a, L: Links + ?Sized> ImportService<'a, L> {
    pub fn new(links: &'a L) -> Self {
        Self { links }
    }

    /// Imports `notation` under `document`; an empty name selects raw mode.
    pub fn import_text(&self, notation: &str, document: &str) -> ServiceResult<ImportReport> {
        let started_at = Instant::now();
        let mode = StorageMode::for_document(document);
        info!(
            "event=lino_import module=service status=start mode={} document={}",
            mode.as_str(),
            document
        );

        match self.import_with_mode(notation, document, mode) {
            Ok(report) => {
                info!(
                    "event=lino_import module=service status=ok mode={} nodes={} links_created={} duration_ms={}",
                    mode.as_str(),
                    report.nodes,
                    report.links_created,
                    started_at.elapsed().as_millis()
                );
                Ok(report)
            }
            Err(err) => {
                error!(
                    "event=lino_import module=service status=error mode={} duration_ms={} error={}",
                    mode.as_str(),
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }

    fn import_with_mode(
        &self,
        notation: &str,
        document: &str,
        mode: StorageMode,
    ) -> ServiceResult<ImportReport> {
        let nodes = parse(notation)?;
        let before = self.links.count()?;
        match mode {
            StorageMode::Raw => {
                RawLinksStorage::new(self.links).import_nodes(&nodes)?;
            }
            StorageMode::Documents => {
                LinoDocuments::open(self.links)?.create_document(document, &nodes)?;
            }
        }
        Ok(ImportReport {
            mode,
            nodes: nodes.len(),
            links_created: self.links.count()?.saturating_sub(before),
        })
    }
}
