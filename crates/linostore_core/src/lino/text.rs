//! Unicode string codec.
//!
//! # Responsibility
//! - Encode text as a packed sequence of code-point symbols.
//! - Decode such sequences back into text.
//!
//! # Invariants
//! - Symbol: `(raw_number(code point), UnicodeSymbolMarker)`.
//! - Text: `(pack(symbols), UnicodeSequenceMarker)`; empty text packs to `NULL`.
//! - Equal text always encodes to the same identifier.
//! - Caches only hold identifiers that are visible in the substrate; callers
//!   clear them after a rolled-back write.

use super::{LinoError, LinoResult, Markers};
use crate::links::{
    as_raw_number, find_packed, pack, raw_number, LinkId, Links, LinksResult, SequenceWalker,
};
use std::cell::RefCell;
use std::collections::HashMap;

/// Text codec bound to one substrate.
pub struct TextCodec<'a, L: ?Sized> {
    links: &'a L,
    symbol_marker: LinkId,
    sequence_marker: LinkId,
    encoded: RefCell<HashMap<String, LinkId>>,
    decoded: RefCell<HashMap<LinkId, String>>,
}

impl<'a, L: Links + ?Sized> TextCodec<'a, L> {
    pub fn new(links: &'a L, markers: &Markers) -> Self {
        Self {
            links,
            symbol_marker: markers.unicode_symbol,
            sequence_marker: markers.unicode_sequence,
            encoded: RefCell::new(HashMap::new()),
            decoded: RefCell::new(HashMap::new()),
        }
    }

    /// Returns the identifier of `text`, creating the relations it needs.
    pub fn encode(&self, text: &str) -> LinoResult<LinkId> {
        if let Some(id) = self.encoded.borrow().get(text) {
            return Ok(*id);
        }
        let symbols = text
            .chars()
            .map(|ch| {
                self.links
                    .get_or_create(raw_number(u32::from(ch)), self.symbol_marker)
            })
            .collect::<Result<Vec<_>, _>>()?;
        let packed = pack(self.links, &symbols)?;
        let id = self.links.get_or_create(packed, self.sequence_marker)?;
        self.remember(text, id);
        Ok(id)
    }

    /// Returns the identifier of `text` when it was encoded before.
    pub fn find(&self, text: &str) -> LinoResult<Option<LinkId>> {
        if let Some(id) = self.encoded.borrow().get(text) {
            return Ok(Some(*id));
        }
        let mut symbols = Vec::new();
        for ch in text.chars() {
            match self
                .links
                .find(raw_number(u32::from(ch)), self.symbol_marker)?
            {
                Some(symbol) => symbols.push(symbol),
                None => return Ok(None),
            }
        }
        let Some(packed) = find_packed(self.links, &symbols)? else {
            return Ok(None);
        };
        let found = self.links.find(packed, self.sequence_marker)?;
        if let Some(id) = found {
            self.remember(text, id);
        }
        Ok(found)
    }

    /// Reads the text stored at `id`.
    ///
    /// # Errors
    /// - `NotAText` when `id` is not a `(symbols, UnicodeSequenceMarker)`
    ///   relation or a symbol is not a valid code point.
    pub fn decode(&self, id: LinkId) -> LinoResult<String> {
        if let Some(text) = self.decoded.borrow().get(&id) {
            return Ok(text.clone());
        }
        let link = self
            .links
            .try_get(id)?
            .filter(|link| link.target == self.sequence_marker)
            .ok_or(LinoError::NotAText(id))?;

        let is_symbol = |candidate: LinkId| -> LinksResult<bool> {
            Ok(self
                .links
                .try_get(candidate)?
                .is_some_and(|symbol| symbol.target == self.symbol_marker))
        };
        let mut text = String::new();
        for symbol in SequenceWalker::new(self.links, link.source, is_symbol) {
            let code_point = self.links.get_source(symbol?)?;
            let ch = as_raw_number(code_point)
                .and_then(char::from_u32)
                .ok_or(LinoError::NotAText(id))?;
            text.push(ch);
        }
        self.remember(&text, id);
        Ok(text)
    }

    /// Drops every cached identifier.
    pub fn clear_cache(&self) {
        self.encoded.borrow_mut().clear();
        self.decoded.borrow_mut().clear();
    }

    fn remember(&self, text: &str, id: LinkId) {
        self.encoded.borrow_mut().insert(text.to_string(), id);
        self.decoded.borrow_mut().insert(id, text.to_string());
    }
}
