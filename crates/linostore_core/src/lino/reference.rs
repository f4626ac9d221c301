//! Reference interner.
//!
//! # Responsibility
//! - Map text to `(ReferenceMarker, text)` relations and back.
//!
//! # Invariants
//! - Interning is a pure, deduplicating function of text.
//! - `read(intern(s)) == s`.

use super::{LinoError, LinoResult, Markers, TextCodec};
use crate::links::{Link, LinkId, Links};

/// Text <-> reference identifier mapping for one substrate.
pub struct ReferenceInterner<'a, L: ?Sized> {
    links: &'a L,
    marker: LinkId,
    text: TextCodec<'a, L>,
}

impl<'a, L: Links + ?Sized> ReferenceInterner<'a, L> {
    pub fn new(links: &'a L, markers: &Markers) -> Self {
        Self {
            links,
            marker: markers.reference,
            text: TextCodec::new(links, markers),
        }
    }

    /// Returns the reference for `text`, creating it when absent.
    pub fn intern(&self, text: &str) -> LinoResult<LinkId> {
        let encoded = self.text.encode(text)?;
        Ok(self.links.get_or_create(self.marker, encoded)?)
    }

    /// Returns the reference for `text` without creating anything.
    pub fn find(&self, text: &str) -> LinoResult<Option<LinkId>> {
        match self.text.find(text)? {
            Some(encoded) => Ok(self.links.find(self.marker, encoded)?),
            None => Ok(None),
        }
    }

    /// Reads the text of the reference stored at `id`.
    ///
    /// # Errors
    /// - `NotAReference` when `id` is missing or not tagged by the reference marker.
    pub fn read(&self, id: LinkId) -> LinoResult<String> {
        let link = self
            .links
            .try_get(id)?
            .ok_or(LinoError::NotAReference(id))?;
        self.read_link(&link)
    }

    /// Same as [`read`](Self::read) for an already loaded relation.
    pub fn read_link(&self, link: &Link) -> LinoResult<String> {
        if link.source != self.marker {
            return Err(LinoError::NotAReference(link.index));
        }
        self.text.decode(link.target)
    }

    /// Whether `id` is a stored reference.
    pub fn is_reference(&self, id: LinkId) -> LinoResult<bool> {
        Ok(self
            .links
            .try_get(id)?
            .is_some_and(|link| link.source == self.marker))
    }

    /// Underlying text codec, shared with the document index.
    pub fn text(&self) -> &TextCodec<'a, L> {
        &self.text
    }

    pub fn clear_cache(&self) {
        self.text.clear_cache();
    }
}
