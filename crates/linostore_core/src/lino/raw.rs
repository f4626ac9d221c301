//! Legacy raw link dump.
//!
//! # Responsibility
//! - Import `(index: source target)` nodes verbatim as substrate links.
//! - Export every stored link in the same shape.
//!
//! # Invariants
//! - Import only runs on an empty, unstamped substrate and stamps `raw-v1`.
//! - Export refuses substrates stamped by another format.
//! - Exported links are ordered by index.

use super::RAW_FORMAT;
use crate::links::{LinkId, Links, LinksError, ANY};
use crate::model::node::{Node, NodeShape};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RawLinksResult<T> = Result<T, RawLinksError>;

/// Errors from raw link import and export.
#[derive(Debug)]
pub enum RawLinksError {
    /// Substrate was stamped by another storage format.
    IncompatibleFormat { found: String },
    /// Raw import needs a substrate without links.
    NonEmptyStorage { count: u64 },
    /// Node at `position` is not a valid `(index: source target)` link.
    InvalidLink { position: usize, reason: String },
    /// Substrate primitive failure.
    Links(LinksError),
}

impl Display for RawLinksError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IncompatibleFormat { found } => write!(
                f,
                "storage format `{found}` is incompatible with `{RAW_FORMAT}`"
            ),
            Self::NonEmptyStorage { count } => {
                write!(f, "raw import needs empty storage, found {count} links")
            }
            Self::InvalidLink { position, reason } => {
                write!(f, "invalid raw link #{position}: {reason}")
            }
            Self::Links(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RawLinksError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Links(err) => Some(err),
            _ => None,
        }
    }
}

impl From<LinksError> for RawLinksError {
    fn from(value: LinksError) -> Self {
        Self::Links(value)
    }
}

/// One parsed `(index: source target)` node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RawLink {
    index: LinkId,
    source: LinkId,
    target: LinkId,
}

/// Raw link storage over one substrate.
pub struct RawLinksStorage<'a, L: ?Sized> {
    links: &'a L,
}

impl<'a, L: Links + ?Sized> RawLinksStorage<'a, L> {
    pub fn new(links: &'a L) -> Self {
        Self { links }
    }

    /// Stores `nodes` as links with exactly the given indices and endpoints.
    ///
    /// Creates one placeholder per node first, then points each at its
    /// endpoints, so links may refer to links declared later.
    ///
    /// # Errors
    /// - `IncompatibleFormat` / `NonEmptyStorage` when the substrate is in use.
    /// - `InvalidLink` when a node is not `(index: source target)` with
    ///   decimal numbers, or names an index that was not allocated.
    pub fn import_nodes(&self, nodes: &[Node]) -> RawLinksResult<usize> {
        let parsed = nodes
            .iter()
            .enumerate()
            .map(|(position, node)| parse_raw_link(position + 1, node))
            .collect::<RawLinksResult<Vec<_>>>()?;

        self.links.exclusive(|| {
            if let Some(found) = self.links.format_tag()? {
                return Err(RawLinksError::IncompatibleFormat { found });
            }
            let count = self.links.count()?;
            if count > 0 {
                return Err(RawLinksError::NonEmptyStorage { count });
            }

            let mut allocated = HashSet::with_capacity(parsed.len());
            for _ in &parsed {
                allocated.insert(self.links.create()?);
            }
            for (position, link) in (1..).zip(&parsed) {
                if !allocated.remove(&link.index) {
                    return Err(RawLinksError::InvalidLink {
                        position,
                        reason: format!("index {} is not a free allocated link", link.index),
                    });
                }
                self.links.update(link.index, link.source, link.target)?;
            }
            self.links.set_format_tag(RAW_FORMAT)?;
            Ok(parsed.len())
        })
    }

    /// Lists every stored link as `(index: source target)`.
    ///
    /// # Errors
    /// - `IncompatibleFormat` when the substrate holds another format.
    pub fn export_nodes(&self) -> RawLinksResult<Vec<Node>> {
        match self.links.format_tag()? {
            Some(tag) if tag != RAW_FORMAT => {
                return Err(RawLinksError::IncompatibleFormat { found: tag })
            }
            _ => {}
        }
        Ok(self
            .links
            .all(ANY, ANY)?
            .into_iter()
            .map(|link| {
                Node::composite(
                    link.index.to_string(),
                    vec![
                        Node::reference(link.source.to_string()),
                        Node::reference(link.target.to_string()),
                    ],
                )
            })
            .collect())
    }
}

fn parse_raw_link(position: usize, node: &Node) -> RawLinksResult<RawLink> {
    let invalid = |reason: &str| RawLinksError::InvalidLink {
        position,
        reason: reason.to_string(),
    };
    let (Some(index), [source, target]) = (node.id.as_deref(), node.children()) else {
        return Err(invalid("expected `(index: source target)`"));
    };
    let number = |text: Option<&str>, what: &str| -> RawLinksResult<LinkId> {
        text.and_then(|text| text.parse::<LinkId>().ok())
            .filter(|value| *value != ANY)
            .ok_or_else(|| invalid(&format!("{what} must be a decimal link number")))
    };
    let endpoint = |node: &Node, what: &str| -> RawLinksResult<LinkId> {
        if node.shape() != NodeShape::Reference {
            return Err(invalid(&format!("{what} must be a plain number")));
        }
        number(node.id.as_deref(), what)
    };
    Ok(RawLink {
        index: number(Some(index), "index")?,
        source: endpoint(source, "source")?,
        target: endpoint(target, "target")?,
    })
}
