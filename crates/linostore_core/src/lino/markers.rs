//! Role markers and relation classification.
//!
//! # Responsibility
//! - Create (or find) the meaning root and the six role markers.
//! - Resolve existing markers read-only for lookups.
//! - Stamp and verify the `documents-v1` format tag.
//! - Classify a stored relation by its marker endpoint.
//!
//! # Invariants
//! - Marker creation order is fixed; re-running yields identical ids.
//! - Role markers are mutually distinct and never used as content.
//! - Role markers tag the first endpoint; unicode markers tag the second.

use super::{LinoError, LinoResult, DOCUMENTS_FORMAT};
use crate::links::{Link, LinkId, Links, LinksError, LinksResult};
use log::debug;
use std::collections::HashMap;

/// Seed of the meaning root `(seed, seed)`; marker `k` is `(root, seed + k)`.
pub const MEANING_ROOT_SEED: LinkId = 1;

/// Role a marker plays in the encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerKind {
    UnicodeSymbol,
    UnicodeSequence,
    Document,
    Reference,
    LinkWithId,
    LinkWithoutId,
}

impl MarkerKind {
    /// Every kind, in creation order.
    pub const ALL: [MarkerKind; 6] = [
        MarkerKind::UnicodeSymbol,
        MarkerKind::UnicodeSequence,
        MarkerKind::Document,
        MarkerKind::Reference,
        MarkerKind::LinkWithId,
        MarkerKind::LinkWithoutId,
    ];
}

/// What a stored relation means, decided by its marker endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkShape {
    /// `(DocumentMarker, name)`.
    Document { name: LinkId },
    /// `(ReferenceMarker, text)`.
    Reference { text: LinkId },
    /// `(LinkWithIdMarker, target)`; target is a reference or `(id, children)`.
    LinkWithId { target: LinkId },
    /// `(LinkWithoutIdMarker, children)`.
    LinkWithoutId { children: LinkId },
    /// `(code point, UnicodeSymbolMarker)`.
    UnicodeSymbol { code_point: LinkId },
    /// `(symbols, UnicodeSequenceMarker)`.
    UnicodeSequence { symbols: LinkId },
    /// Sequence pairs, document contents, marker definitions.
    Other,
}

/// Marker identifiers of one substrate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Markers {
    pub meaning_root: LinkId,
    pub unicode_symbol: LinkId,
    pub unicode_sequence: LinkId,
    pub document: LinkId,
    pub reference: LinkId,
    pub link_with_id: LinkId,
    pub link_without_id: LinkId,
    kinds: HashMap<LinkId, MarkerKind>,
}

impl Markers {
    /// Bootstraps markers on `links`, or finds them when already present.
    ///
    /// Runs as one exclusive unit, so it must not be called from inside
    /// another [`Links::exclusive`] operation.
    ///
    /// # Errors
    /// - `IncompatibleFormat` when the substrate carries another format tag.
    pub fn initialize<L: Links + ?Sized>(links: &L) -> LinoResult<Self> {
        links.exclusive(|| {
            match links.format_tag()? {
                Some(tag) if tag == DOCUMENTS_FORMAT => {}
                Some(found) => {
                    return Err(LinoError::IncompatibleFormat {
                        expected: DOCUMENTS_FORMAT,
                        found,
                    })
                }
                None => links.set_format_tag(DOCUMENTS_FORMAT)?,
            }

            let meaning_root = links.get_or_create(MEANING_ROOT_SEED, MEANING_ROOT_SEED)?;
            let mut ids = [0; MarkerKind::ALL.len()];
            for (offset, id) in (1..).zip(ids.iter_mut()) {
                *id = links.get_or_create(meaning_root, MEANING_ROOT_SEED + offset)?;
            }
            let markers = Self::from_ids(meaning_root, ids);
            debug!(
                "event=markers_init module=lino status=ok meaning_root={} document={} reference={}",
                markers.meaning_root, markers.document, markers.reference
            );
            Ok(markers)
        })
    }

    /// Finds existing markers without writing anything.
    ///
    /// Returns `None` for an unstamped substrate, which holds no documents.
    ///
    /// # Errors
    /// - `IncompatibleFormat` when the substrate carries another format tag.
    /// - `Links(InvalidData)` when a `documents-v1` substrate lacks a marker.
    pub fn resolve<L: Links + ?Sized>(links: &L) -> LinoResult<Option<Self>> {
        match links.format_tag()? {
            None => return Ok(None),
            Some(tag) if tag == DOCUMENTS_FORMAT => {}
            Some(found) => {
                return Err(LinoError::IncompatibleFormat {
                    expected: DOCUMENTS_FORMAT,
                    found,
                })
            }
        }

        let missing = |what: &str| {
            LinoError::Links(LinksError::InvalidData(format!(
                "{DOCUMENTS_FORMAT} storage has no {what}"
            )))
        };
        let meaning_root = links
            .find(MEANING_ROOT_SEED, MEANING_ROOT_SEED)?
            .ok_or_else(|| missing("meaning root"))?;
        let mut ids = [0; MarkerKind::ALL.len()];
        for ((offset, id), kind) in (1..).zip(ids.iter_mut()).zip(MarkerKind::ALL) {
            *id = links
                .find(meaning_root, MEANING_ROOT_SEED + offset)?
                .ok_or_else(|| missing(&format!("{kind:?} marker")))?;
        }
        Ok(Some(Self::from_ids(meaning_root, ids)))
    }

    fn from_ids(meaning_root: LinkId, ids: [LinkId; 6]) -> Self {
        let kinds = ids.iter().copied().zip(MarkerKind::ALL).collect();
        let [unicode_symbol, unicode_sequence, document, reference, link_with_id, link_without_id] =
            ids;
        Self {
            meaning_root,
            unicode_symbol,
            unicode_sequence,
            document,
            reference,
            link_with_id,
            link_without_id,
            kinds,
        }
    }

    pub fn id(&self, kind: MarkerKind) -> LinkId {
        match kind {
            MarkerKind::UnicodeSymbol => self.unicode_symbol,
            MarkerKind::UnicodeSequence => self.unicode_sequence,
            MarkerKind::Document => self.document,
            MarkerKind::Reference => self.reference,
            MarkerKind::LinkWithId => self.link_with_id,
            MarkerKind::LinkWithoutId => self.link_without_id,
        }
    }

    /// Marker role of `id`, or `None` for non-marker identifiers.
    pub fn kind_of(&self, id: LinkId) -> Option<MarkerKind> {
        self.kinds.get(&id).copied()
    }

    /// Classifies an already loaded relation.
    pub fn shape_of(&self, link: &Link) -> LinkShape {
        match self.kind_of(link.source) {
            Some(MarkerKind::Document) => return LinkShape::Document { name: link.target },
            Some(MarkerKind::Reference) => return LinkShape::Reference { text: link.target },
            Some(MarkerKind::LinkWithId) => {
                return LinkShape::LinkWithId {
                    target: link.target,
                }
            }
            Some(MarkerKind::LinkWithoutId) => {
                return LinkShape::LinkWithoutId {
                    children: link.target,
                }
            }
            _ => {}
        }
        match self.kind_of(link.target) {
            Some(MarkerKind::UnicodeSymbol) => LinkShape::UnicodeSymbol {
                code_point: link.source,
            },
            Some(MarkerKind::UnicodeSequence) => LinkShape::UnicodeSequence {
                symbols: link.source,
            },
            _ => LinkShape::Other,
        }
    }

    /// Loads and classifies `id`; `None` when nothing is stored there.
    pub fn classify<L: Links + ?Sized>(
        &self,
        links: &L,
        id: LinkId,
    ) -> LinksResult<Option<LinkShape>> {
        Ok(links.try_get(id)?.map(|link| self.shape_of(&link)))
    }
}
