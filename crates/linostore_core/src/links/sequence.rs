//! Balanced sequence codec.
//!
//! Packs an ordered list of identifiers into one identifier by pairing
//! neighbours level by level, and walks such a packed value back into the
//! original order.
//!
//! # Invariants
//! - `pack(&[])` is `NULL`, `pack(&[x])` is `x`.
//! - Walking a packed value with a predicate that accepts exactly the original
//!   elements yields them in the original order.
//! - Packing is deterministic: equal lists share one packed identifier.

use super::{LinkId, Links, LinksResult, NULL};

/// Packs `elements` into a single identifier.
pub fn pack<L: Links + ?Sized>(links: &L, elements: &[LinkId]) -> LinksResult<LinkId> {
    let mut level = elements.to_vec();
    while level.len() > 1 {
        let mut next = Vec::with_capacity(level.len().div_ceil(2));
        let mut pairs = level.chunks_exact(2);
        for pair in &mut pairs {
            next.push(links.get_or_create(pair[0], pair[1])?);
        }
        next.extend_from_slice(pairs.remainder());
        level = next;
    }
    Ok(level.first().copied().unwrap_or(NULL))
}

/// Looks up the packed form of `elements` without creating anything.
///
/// Returns `None` when any intermediate pair is missing, which means the list
/// was never packed on this substrate.
pub fn find_packed<L: Links + ?Sized>(
    links: &L,
    elements: &[LinkId],
) -> LinksResult<Option<LinkId>> {
    let mut level = elements.to_vec();
    while level.len() > 1 {
        let mut next = Vec::with_capacity(level.len().div_ceil(2));
        let mut pairs = level.chunks_exact(2);
        for pair in &mut pairs {
            match links.find(pair[0], pair[1])? {
                Some(id) => next.push(id),
                None => return Ok(None),
            }
        }
        next.extend_from_slice(pairs.remainder());
        level = next;
    }
    Ok(Some(level.first().copied().unwrap_or(NULL)))
}

/// Lazy left-to-right walk over a packed sequence.
///
/// The walk is single-pass: restart by building a new walker.
pub struct SequenceWalker<'a, L: ?Sized, P> {
    links: &'a L,
    stack: Vec<LinkId>,
    is_element: P,
}

impl<'a, L, P> SequenceWalker<'a, L, P>
where
    L: Links + ?Sized,
    P: Fn(LinkId) -> LinksResult<bool>,
{
    pub fn new(links: &'a L, sequence: LinkId, is_element: P) -> Self {
        let mut stack = Vec::new();
        if sequence != NULL {
            stack.push(sequence);
        }
        Self {
            links,
            stack,
            is_element,
        }
    }

    fn advance(&mut self) -> LinksResult<Option<LinkId>> {
        while let Some(current) = self.stack.pop() {
            if (self.is_element)(current)? {
                return Ok(Some(current));
            }
            let link = self.links.get(current)?;
            self.stack.push(link.target);
            self.stack.push(link.source);
        }
        Ok(None)
    }
}

impl<L, P> Iterator for SequenceWalker<'_, L, P>
where
    L: Links + ?Sized,
    P: Fn(LinkId) -> LinksResult<bool>,
{
    type Item = LinksResult<LinkId>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.advance() {
            Ok(Some(id)) => Some(Ok(id)),
            Ok(None) => None,
            Err(err) => {
                self.stack.clear();
                Some(Err(err))
            }
        }
    }
}
