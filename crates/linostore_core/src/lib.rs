//! Core logic for linostore.
//! Stores links-notation documents in a SQLite-backed doublet substrate and
//! reads them back losslessly.

pub mod db;
pub mod links;
pub mod lino;
pub mod logging;
pub mod model;
pub mod notation;
pub mod service;

pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use links::{Link, LinkId, Links, LinksError, LinksResult, SqliteLinks, ANY, NULL};
pub use lino::{
    DocumentIndex, LinkDecoder, LinkEncoder, LinoDocuments, LinoError, LinoResult, Markers,
    RawLinksError, RawLinksStorage, ReferenceInterner, DOCUMENTS_FORMAT, RAW_FORMAT,
};
pub use logging::{default_log_level, init_logging, logging_status, LogLevel, LoggingError};
pub use model::node::{Node, NodeShape};
pub use notation::{format, parse, NotationError};
pub use service::export_service::ExportService;
pub use service::import_service::{ImportReport, ImportService};
pub use service::{ServiceError, ServiceResult, StorageMode};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
