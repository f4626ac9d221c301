//! Import and export use-case services.
//!
//! # Responsibility
//! - Orchestrate notation text <-> substrate round trips.
//! - Select document or raw storage from the document name.
//! - Keep CLI layers decoupled from codec and storage details.

use crate::lino::{LinoError, RawLinksError};
use crate::links::LinksError;
use crate::notation::NotationError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod export_service;
pub mod import_service;

/// How a substrate stores notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageMode {
    /// Named documents over role markers.
    Documents,
    /// Verbatim `(index: source target)` link dump.
    Raw,
}

impl StorageMode {
    /// An empty document name selects raw mode.
    pub fn for_document(document: &str) -> Self {
        if document.is_empty() {
            Self::Raw
        } else {
            Self::Documents
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Documents => "documents",
            Self::Raw => "raw",
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors surfaced by import and export services.
#[derive(Debug)]
pub enum ServiceError {
    /// Notation text could not be parsed.
    Notation(NotationError),
    /// Document codec failure.
    Documents(LinoError),
    /// Raw link dump failure.
    Raw(RawLinksError),
    /// Substrate primitive failure.
    Links(LinksError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Notation(err) => write!(f, "{err}"),
            Self::Documents(err) => write!(f, "{err}"),
            Self::Raw(err) => write!(f, "{err}"),
            Self::Links(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Notation(err) => Some(err),
            Self::Documents(err) => Some(err),
            Self::Raw(err) => Some(err),
            Self::Links(err) => Some(err),
        }
    }
}

impl From<NotationError> for ServiceError {
    fn from(value: NotationError) -> Self {
        Self::Notation(value)
    }
}

impl From<LinoError> for ServiceError {
    fn from(value: LinoError) -> Self {
        Self::Documents(value)
    }
}

impl From<RawLinksError> for ServiceError {
    fn from(value: RawLinksError) -> Self {
        Self::Raw(value)
    }
}

impl From<LinksError> for ServiceError {
    fn from(value: LinksError) -> Self {
        Self::Links(value)
    }
}
