//! Notation export use-case service.
//!
//! # Responsibility
//! - Read a named document or the raw dump and format it as notation text.
//! - Emit `lino_export` logging events with duration and status.
//!
//! # Invariants
//! - Export never writes to the substrate; a substrate without documents
//!   reports `NoSuchDocument`.

use super::{ServiceResult, StorageMode};
use crate::links::Links;
use crate::lino::{LinoDocuments, LinoError, RawLinksStorage};
use crate::model::node::Node;
use crate::notation::format;
use log::{error, info};
use std::time::Instant;

/// Export service facade.
pub struct ExportService<'a, L: ?Sized> {
    links: &'a L,
}

impl<'a, L: Links + ?Sized> ExportService<'a, L> {
    pub fn new(links: &'a L) -> Self {
        Self { links }
    }

    /// Formats `document` as notation text; an empty name selects raw mode.
    pub fn export_text(&self, document: &str) -> ServiceResult<String> {
        let started_at = Instant::now();
        let mode = StorageMode::for_document(document);
        info!(
            "event=lino_export module=service status=start mode={} document={}",
            mode.as_str(),
            document
        );

        let result: ServiceResult<Vec<Node>> = match mode {
            StorageMode::Raw => RawLinksStorage::new(self.links)
                .export_nodes()
                .map_err(Into::into),
            StorageMode::Documents => LinoDocuments::open_existing(self.links)
                .and_then(|storage| match storage {
                    Some(storage) => storage.read_document(document),
                    None => Err(LinoError::NoSuchDocument(document.to_string())),
                })
                .map_err(Into::into),
        };

        match result {
            Ok(nodes) => {
                info!(
                    "event=lino_export module=service status=ok mode={} nodes={} duration_ms={}",
                    mode.as_str(),
                    nodes.len(),
                    started_at.elapsed().as_millis()
                );
                Ok(format(&nodes))
            }
            Err(err) => {
                error!(
                    "event=lino_export module=service status=error mode={} duration_ms={} error={}",
                    mode.as_str(),
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }

    /// Names of every stored document, sorted.
    pub fn list_documents(&self) -> ServiceResult<Vec<String>> {
        match LinoDocuments::open_existing(self.links)? {
            Some(storage) => Ok(storage.list_documents()?),
            None => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ExportService;
    use crate::db::open_db_in_memory;
    use crate::links::{Links, SqliteLinks};
    use crate::lino::{LinoError, RawLinksError};
    use crate::service::import_service::ImportService;
    use crate::service::ServiceError;

    #[test]
    fn exports_what_was_imported() {
        let conn = open_db_in_memory().unwrap();
        let links = SqliteLinks::try_new(&conn).unwrap();
        ImportService::new(&links)
            .import_text("(1: 1 1)\n(2: 2 2)", "pairs")
            .unwrap();

        let service = ExportService::new(&links);
        assert_eq!(service.export_text("pairs").unwrap(), "(1: 1 1)\n(2: 2 2)");
        assert_eq!(service.list_documents().unwrap(), vec!["pairs"]);
    }

    #[test]
    fn modes_do_not_mix() {
        let conn = open_db_in_memory().unwrap();
        let links = SqliteLinks::try_new(&conn).unwrap();
        ImportService::new(&links)
            .import_text("(1: 1 1)", "")
            .unwrap();

        let service = ExportService::new(&links);
        assert_eq!(service.export_text("").unwrap(), "(1: 1 1)");
        assert!(matches!(
            service.export_text("d1"),
            Err(ServiceError::Documents(LinoError::IncompatibleFormat { .. }))
        ));

        let documents = open_db_in_memory().unwrap();
        let document_links = SqliteLinks::try_new(&documents).unwrap();
        ImportService::new(&document_links)
            .import_text("a", "d1")
            .unwrap();
        assert!(matches!(
            ExportService::new(&document_links).export_text(""),
            Err(ServiceError::Raw(RawLinksError::IncompatibleFormat { .. }))
        ));
    }

    #[test]
    fn missing_document_is_reported_without_writing() {
        let conn = open_db_in_memory().unwrap();
        let links = SqliteLinks::try_new(&conn).unwrap();
        let service = ExportService::new(&links);

        assert!(matches!(
            service.export_text("ghost"),
            Err(ServiceError::Documents(LinoError::NoSuchDocument(name))) if name == "ghost"
        ));
        assert!(service.list_documents().unwrap().is_empty());
        assert_eq!(links.count().unwrap(), 0);
        assert_eq!(links.format_tag().unwrap(), None);

        ImportService::new(&links)
            .import_text("(1: 1 1)", "")
            .unwrap();
        assert_eq!(service.export_text("").unwrap(), "(1: 1 1)");
    }

    #[test]
    fn missing_document_in_document_storage_is_reported() {
        let conn = open_db_in_memory().unwrap();
        let links = SqliteLinks::try_new(&conn).unwrap();
        ImportService::new(&links).import_text("a", "d1").unwrap();
        let count = links.count().unwrap();

        assert!(matches!(
            ExportService::new(&links).export_text("ghost"),
            Err(ServiceError::Documents(LinoError::NoSuchDocument(name))) if name == "ghost"
        ));
        assert_eq!(links.count().unwrap(), count);
    }
}
