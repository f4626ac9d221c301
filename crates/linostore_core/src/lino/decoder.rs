//! Tagged relations -> node tree.
//!
//! # Responsibility
//! - Decode one encoded link identifier into a node.
//! - Decode a packed sequence of encoded links into a node list.
//!
//! # Invariants
//! - Classification happens once per relation, through [`Markers`].
//! - Sequence elements are references, encoded links or partial points;
//!   anything else yields `MalformedSequence`.
//! - Child order follows the packed sequence exactly.
//! - Nesting depth is bounded by heap, not by the call stack.

use super::{LinkShape, LinoError, LinoResult, Markers, ReferenceInterner};
use crate::links::{LinkId, Links, LinksResult, SequenceWalker};
use crate::model::node::Node;

/// Subtree whose children are still being walked.
struct Frame<W> {
    id: Option<String>,
    elements: W,
    children: Vec<Node>,
}

impl<W> Frame<W> {
    fn into_node(self) -> Node {
        Node {
            id: self.id,
            children: Some(self.children),
        }
    }
}

enum Opened<W> {
    Leaf(Node),
    Link(Frame<W>),
}

/// Node decoder over one substrate.
pub struct LinkDecoder<'s, 'a, L: ?Sized> {
    links: &'a L,
    markers: &'s Markers,
    references: &'s ReferenceInterner<'a, L>,
}

impl<'s, 'a, L: Links + ?Sized> LinkDecoder<'s, 'a, L> {
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

    /// Element predicate for packed node sequences.
    ///
    /// Unknown identifiers count as elements so that decoding reports them
    /// instead of the walker failing on a missing pair.
    pub fn is_element(&self, id: LinkId) -> LinksResult<bool> {
        let Some(link) = self.links.try_get(id)? else {
            return Ok(true);
        };
        Ok(link.is_partial_point()
            || matches!(
                self.markers.shape_of(&link),
                LinkShape::Reference { .. }
                    | LinkShape::LinkWithId { .. }
                    | LinkShape::LinkWithoutId { .. }
            ))
    }

    /// Decodes every element of a packed sequence, in order.
    pub fn decode_sequence(&self, sequence: LinkId) -> LinoResult<Vec<Node>> {
        let is_element = |id: LinkId| self.is_element(id);
        SequenceWalker::new(self.links, sequence, &is_element)
            .map(|element| -> LinoResult<Node> {
                let element = element?;
                self.decode_node(element)
                    .map_err(|err| as_sequence_error(err, element))
            })
            .collect()
    }

    /// Decodes the node encoded at `id`.
    ///
    /// # Errors
    /// - `NotALink` when `id` is neither an encoded link nor a reference.
    /// - `MalformedSequence` when a descendant sequence holds a foreign element.
    pub fn decode_node(&self, id: LinkId) -> LinoResult<Node> {
        let is_element = |candidate: LinkId| self.is_element(candidate);
        let root = match self.open(id, &is_element)? {
            Opened::Leaf(node) => return Ok(node),
            Opened::Link(frame) => frame,
        };

        let mut stack = vec![root];
        while let Some(frame) = stack.last_mut() {
            match frame.elements.next() {
                Some(element) => {
                    let element = element?;
                    let opened = self
                        .open(element, &is_element)
                        .map_err(|err| as_sequence_error(err, element))?;
                    match opened {
                        Opened::Leaf(node) => frame.children.push(node),
                        Opened::Link(child) => stack.push(child),
                    }
                }
                None => {
                    let Some(done) = stack.pop() else { break };
                    let node = done.into_node();
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(node),
                        None => return Ok(node),
                    }
                }
            }
        }
        Err(LinoError::NotALink(id))
    }

    /// Classifies `id` and either decodes it fully or prepares a frame.
    fn open<'p, P>(
        &self,
        id: LinkId,
        is_element: &'p P,
    ) -> LinoResult<Opened<SequenceWalker<'a, L, &'p P>>>
    where
        P: Fn(LinkId) -> LinksResult<bool>,
    {
        let link = self.links.try_get(id)?.ok_or(LinoError::NotALink(id))?;
        match self.markers.shape_of(&link) {
            LinkShape::Reference { .. } => {
                Ok(Opened::Leaf(Node::reference(self.references.read_link(&link)?)))
            }
            LinkShape::LinkWithId { target } => {
                let target = self.links.try_get(target)?.ok_or(LinoError::NotALink(id))?;
                if let LinkShape::Reference { .. } = self.markers.shape_of(&target) {
                    return Ok(Opened::Leaf(Node::reference(
                        self.references.read_link(&target)?,
                    )));
                }
                Ok(Opened::Link(Frame {
                    id: Some(self.references.read(target.source)?),
                    elements: SequenceWalker::new(self.links, target.target, is_element),
                    children: Vec::new(),
                }))
            }
            LinkShape::LinkWithoutId { children } => Ok(Opened::Link(Frame {
                id: None,
                elements: SequenceWalker::new(self.links, children, is_element),
                children: Vec::new(),
            })),
            _ => Err(LinoError::NotALink(id)),
        }
    }
}

/// Inside a sequence, an element that is not a link is a malformed sequence.
fn as_sequence_error(err: LinoError, element: LinkId) -> LinoError {
    match err {
        LinoError::NotALink(id) if id == element => LinoError::MalformedSequence(element),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::LinkDecoder;
    use crate::db::open_db_in_memory;
    use crate::links::{pack, Links, SqliteLinks};
    use crate::lino::{LinkEncoder, LinoError, Markers, ReferenceInterner};
    use crate::model::node::Node;

    #[test]
    fn every_shape_round_trips() {
        let conn = open_db_in_memory().unwrap();
        let links = SqliteLinks::try_new(&conn).unwrap();
        let markers = Markers::initialize(&links).unwrap();
        let references = ReferenceInterner::new(&links, &markers);
        let encoder = LinkEncoder::new(&links, &markers, &references);
        let decoder = LinkDecoder::new(&links, &markers, &references);

        let trees = [
            Node::reference("mama"),
            Node::composite("love", vec![Node::reference("mama")]),
            Node::group(vec![Node::reference("son"), Node::reference("lovesMama")]),
            Node::composite("empty", vec![]),
            Node::group(vec![]),
            Node::composite(
                "papa",
                vec![
                    Node::composite(
                        "lovesMama",
                        vec![Node::reference("loves"), Node::reference("mama")],
                    ),
                    Node::group(vec![Node::reference("son"), Node::reference("lovesMama")]),
                    Node::group(vec![
                        Node::reference("all"),
                        Node::composite("love", vec![Node::reference("mama")]),
                    ]),
                ],
            ),
        ];
        for tree in trees {
            let id = encoder.encode_node(&tree).unwrap();
            assert_eq!(decoder.decode_node(id).unwrap(), tree);
        }
    }

    #[test]
    fn sequences_decode_in_order() {
        let conn = open_db_in_memory().unwrap();
        let links = SqliteLinks::try_new(&conn).unwrap();
        let markers = Markers::initialize(&links).unwrap();
        let references = ReferenceInterner::new(&links, &markers);
        let encoder = LinkEncoder::new(&links, &markers, &references);
        let decoder = LinkDecoder::new(&links, &markers, &references);

        let nodes: Vec<Node> = ["c", "a", "b", "a", "d"]
            .into_iter()
            .map(|name| Node::composite(name, vec![Node::reference(name)]))
            .collect();
        let sequence = encoder.encode_nodes(&nodes).unwrap();
        assert_eq!(decoder.decode_sequence(sequence).unwrap(), nodes);
    }

    #[test]
    fn tagged_reference_decodes_as_bare_reference() {
        let conn = open_db_in_memory().unwrap();
        let links = SqliteLinks::try_new(&conn).unwrap();
        let markers = Markers::initialize(&links).unwrap();
        let references = ReferenceInterner::new(&links, &markers);
        let decoder = LinkDecoder::new(&links, &markers, &references);

        let mama = references.intern("mama").unwrap();
        let tagged = links.get_or_create(markers.link_with_id, mama).unwrap();
        assert_eq!(decoder.decode_node(tagged).unwrap(), Node::reference("mama"));

        let group = links.get_or_create(markers.link_without_id, tagged).unwrap();
        assert_eq!(
            decoder.decode_node(group).unwrap(),
            Node::group(vec![Node::reference("mama")])
        );
    }

    #[test]
    fn foreign_relations_are_rejected() {
        let conn = open_db_in_memory().unwrap();
        let links = SqliteLinks::try_new(&conn).unwrap();
        let markers = Markers::initialize(&links).unwrap();
        let references = ReferenceInterner::new(&links, &markers);
        let decoder = LinkDecoder::new(&links, &markers, &references);

        let text = references.text().encode("mama").unwrap();
        assert!(matches!(
            decoder.decode_node(text),
            Err(LinoError::NotALink(id)) if id == text
        ));

        let mama = references.intern("mama").unwrap();
        let with_document = pack(&links, &[mama, markers.document]).unwrap();
        let group = links
            .get_or_create(markers.link_without_id, with_document)
            .unwrap();
        assert!(matches!(
            decoder.decode_node(group),
            Err(LinoError::MalformedSequence(id)) if id == markers.document
        ));
    }
}
