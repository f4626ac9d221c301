//! Links-notation documents over a doublet substrate.
//!
//! # Responsibility
//! - Bootstrap role markers and classify stored relations.
//! - Intern reference text, encode node trees and decode them back.
//! - Index named documents and expose the legacy raw link dump.
//!
//! # Invariants
//! - Every component receives [`Markers`] explicitly; nothing is global.
//! - Encoding and decoding walk trees with explicit work stacks.
//! - A substrate carries one format tag for its whole lifetime.

use crate::links::{LinkId, LinksError};
use std::error::Error;
use std::fmt::{Display, Formatter};

mod decoder;
mod documents;
mod encoder;
mod markers;
mod raw;
mod reference;
mod text;

pub use decoder::LinkDecoder;
pub use documents::{DocumentIndex, LinoDocuments};
pub use encoder::LinkEncoder;
pub use markers::{LinkShape, MarkerKind, Markers, MEANING_ROOT_SEED};
pub use raw::{RawLinksError, RawLinksResult, RawLinksStorage};
pub use reference::ReferenceInterner;
pub use text::TextCodec;

/// Format tag of substrates holding named documents.
pub const DOCUMENTS_FORMAT: &str = "documents-v1";

/// Format tag of substrates holding a raw link dump.
pub const RAW_FORMAT: &str = "raw-v1";

pub type LinoResult<T> = Result<T, LinoError>;

/// Errors from the document codec.
#[derive(Debug)]
pub enum LinoError {
    /// Identifier is not a `(ReferenceMarker, text)` relation.
    NotAReference(LinkId),
    /// Identifier is not a link relation that can be decoded as a node.
    NotALink(LinkId),
    /// Identifier is not an encoded text.
    NotAText(LinkId),
    /// Document name is already registered.
    DuplicateDocument(String),
    /// No document is registered under this name.
    NoSuchDocument(String),
    /// Document relation has no associated top-level sequence.
    NoDocumentContent(LinkId),
    /// Sequence element is neither a link nor a reference.
    MalformedSequence(LinkId),
    /// Node has neither id nor children.
    EmptyNode,
    /// Document names must not be empty.
    InvalidDocumentName,
    /// Substrate was stamped by another storage format.
    IncompatibleFormat {
        expected: &'static str,
        found: String,
    },
    /// Substrate primitive failure.
    Links(LinksError),
}

impl Display for LinoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAReference(id) => write!(f, "link {id} is not a reference"),
            Self::NotALink(id) => write!(f, "link {id} is not a notation link"),
            Self::NotAText(id) => write!(f, "link {id} is not an encoded text"),
            Self::DuplicateDocument(name) => write!(f, "document `{name}` already exists"),
            Self::NoSuchDocument(name) => write!(f, "document `{name}` not found"),
            Self::NoDocumentContent(id) => write!(f, "document {id} has no content"),
            Self::MalformedSequence(id) => {
                write!(f, "sequence element {id} is neither a link nor a reference")
            }
            Self::EmptyNode => write!(f, "node has neither id nor children"),
            Self::InvalidDocumentName => write!(f, "document name must not be empty"),
            Self::IncompatibleFormat { expected, found } => write!(
                f,
                "storage format `{found}` is incompatible with `{expected}`"
            ),
            Self::Links(err) => write!(f, "{err}"),
        }
    }
}

impl Error for LinoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Links(err) => Some(err),
            _ => None,
        }
    }
}

impl From<LinksError> for LinoError {
    fn from(value: LinksError) -> Self {
        Self::Links(value)
    }
}
