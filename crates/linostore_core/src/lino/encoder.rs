//! Node tree -> tagged relations.
//!
//! # Responsibility
//! - Encode one node (and its subtree) into one identifier.
//! - Encode a node list into one packed top-level sequence.
//!
//! # Invariants
//! - Bare references encode to their interned reference.
//! - `(id: children)` encodes to `(LinkWithId, (ref(id), pack(children)))`.
//! - `(children)` encodes to `(LinkWithoutId, pack(children))`.
//! - Nesting depth is bounded by heap, not by the call stack.

use super::{LinoError, LinoResult, Markers, ReferenceInterner};
use crate::links::{pack, LinkId, Links};
use crate::model::node::{Node, NodeShape};

/// Subtree still being encoded.
struct Frame<'n> {
    node: &'n Node,
    next_child: usize,
    encoded: Vec<LinkId>,
}

impl<'n> Frame<'n> {
    fn new(node: &'n Node) -> Self {
        Self {
            node,
            next_child: 0,
            encoded: Vec::with_capacity(node.children().len()),
        }
    }
}

enum Step<'n> {
    Descend(&'n Node),
    Finish,
}

/// Node encoder over one substrate.
pub struct LinkEncoder<'s, 'a, L: ?Sized> {
    links: &'a L,
    markers: &'s Markers,
    references: &'s ReferenceInterner<'a, L>,
}

impl<'s, 'a, L: Links + ?Sized> LinkEncoder<'s, 'a, L> {
    pub fn new(
        links: &'a L,
        markers: &'s Markers,
        references: &'s ReferenceInterner<'a, L>,
    ) -> Self {
        Self {
            links,
            markers,
            references,
        }
    }

    /// Encodes `nodes` and packs the results in order.
    pub fn encode_nodes(&self, nodes: &[Node]) -> LinoResult<LinkId> {
        let encoded = nodes
            .iter()
            .map(|node| self.encode_node(node))
            .collect::<LinoResult<Vec<_>>>()?;
        Ok(pack(self.links, &encoded)?)
    }

    /// Encodes one node.
    ///
    /// # Errors
    /// - `EmptyNode` when the node or any descendant has neither id nor children.
    pub fn encode_node(&self, node: &Node) -> LinoResult<LinkId> {
        if let Some(leaf) = self.encode_leaf(node)? {
            return Ok(leaf);
        }

        let mut stack = vec![Frame::new(node)];
        loop {
            let step = match stack.last_mut() {
                Some(frame) => {
                    let parent: &Node = frame.node;
                    match parent.children().get(frame.next_child) {
                        Some(child) => {
                            frame.next_child += 1;
                            Step::Descend(child)
                        }
                        None => Step::Finish,
                    }
                }
                None => return Err(LinoError::EmptyNode),
            };

            match step {
                Step::Descend(child) => match self.encode_leaf(child)? {
                    Some(leaf) => {
                        if let Some(frame) = stack.last_mut() {
                            frame.encoded.push(leaf);
                        }
                    }
                    None => stack.push(Frame::new(child)),
                },
                Step::Finish => {
                    let Some(frame) = stack.pop() else {
                        return Err(LinoError::EmptyNode);
                    };
                    let id = self.encode_link(frame.node, &frame.encoded)?;
                    match stack.last_mut() {
                        Some(parent) => parent.encoded.push(id),
                        None => return Ok(id),
                    }
                }
            }
        }
    }

    /// Encodes nodes without children; `None` for nodes that need a frame.
    fn encode_leaf(&self, node: &Node) -> LinoResult<Option<LinkId>> {
        match (node.shape(), node.id.as_deref()) {
            (NodeShape::Empty, _) => Err(LinoError::EmptyNode),
            (NodeShape::Reference, Some(id)) => Ok(Some(self.references.intern(id)?)),
            _ => Ok(None),
        }
    }

    fn encode_link(&self, node: &Node, children: &[LinkId]) -> LinoResult<LinkId> {
        let sequence = pack(self.links, children)?;
        let id = match node.id.as_deref() {
            Some(id) => {
                let paired = self
                    .links
                    .get_or_create(self.references.intern(id)?, sequence)?;
                self.links.get_or_create(self.markers.link_with_id, paired)?
            }
            None => self
                .links
                .get_or_create(self.markers.link_without_id, sequence)?,
        };
        Ok(id)
    }
}
