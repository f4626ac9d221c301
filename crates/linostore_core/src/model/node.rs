//! Notation node model.
//!
//! # Responsibility
//! - Define the tree shape exchanged between parser, codec and formatter.
//!
//! # Invariants
//! - A valid node carries an id, children, or both.
//! - `children: Some(vec![])` (an empty composite) differs from
//!   `children: None` (a bare reference).
//! - Dropping and comparing nodes never recurse, so nesting depth is bounded
//!   by heap rather than call stack.

use serde::{Deserialize, Serialize};

/// One link of a notation document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Optional identifier text, e.g. `papa` in `(papa: ...)`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Ordered children; `None` for bare references.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<Node>>,
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        let mut pending = vec![(self, other)];
        while let Some((left, right)) = pending.pop() {
            if left.id != right.id {
                return false;
            }
            match (&left.children, &right.children) {
                (None, None) => {}
                (Some(lhs), Some(rhs)) if lhs.len() == rhs.len() => {
                    pending.extend(lhs.iter().zip(rhs));
                }
                _ => return false,
            }
        }
        true
    }
}

impl Eq for Node {}

impl Drop for Node {
    fn drop(&mut self) {
        let Some(children) = self.children.take() else {
            return;
        };
        // Detached nodes are dropped childless, one at a time.
        let mut pending = children;
        while let Some(mut node) = pending.pop() {
            if let Some(grandchildren) = node.children.take() {
                pending.extend(grandchildren);
            }
        }
    }
}

/// Structural classification of a [`Node`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeShape {
    /// Id without children.
    Reference,
    /// Children without id.
    Group,
    /// Id with children.
    Composite,
    /// Neither id nor children; cannot be encoded.
    Empty,
}

impl Node {
    /// Bare reference such as `mama`.
    pub fn reference(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            children: None,
        }
    }

    /// Anonymous group such as `(son lovesMama)`.
    pub fn group(children: Vec<Node>) -> Self {
        Self {
            id: None,
            children: Some(children),
        }
    }

    /// Tagged composite such as `(love: mama)`.
    pub fn composite(id: impl Into<String>, children: Vec<Node>) -> Self {
        Self {
            id: Some(id.into()),
            children: Some(children),
        }
    }

    pub fn shape(&self) -> NodeShape {
        match (&self.id, &self.children) {
            (Some(_), None) => NodeShape::Reference,
            (None, Some(_)) => NodeShape::Group,
            (Some(_), Some(_)) => NodeShape::Composite,
            (None, None) => NodeShape::Empty,
        }
    }

    /// Children slice, empty for bare references.
    pub fn children(&self) -> &[Node] {
        self.children.as_deref().unwrap_or(&[])
    }

    /// Anonymous group with at least two children.
    ///
    /// The formatter may write such a group as a bare line inside a
    /// parenthesized link.
    pub fn is_line_group(&self) -> bool {
        self.id.is_none() && self.children().len() >= 2
    }

    /// Deepest nesting level, counting this node as 1.
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut pending = vec![(self, 1usize)];
        while let Some((node, level)) = pending.pop() {
            deepest = deepest.max(level);
            pending.extend(node.children().iter().map(|child| (child, level + 1)));
        }
        deepest
    }
}

#[cfg(test)]
mod tests {
    use super::{Node, NodeShape};

    fn chain(depth: usize, leaf: &str) -> Node {
        let mut node = Node::reference(leaf);
        for _ in 1..depth {
            node = Node::group(vec![node]);
        }
        node
    }

    #[test]
    fn deep_chains_compare_and_drop_on_the_default_stack() {
        let left = chain(200_000, "x");
        let right = chain(200_000, "x");
        let other = chain(200_000, "y");

        assert_eq!(left.depth(), 200_000);
        assert!(left == right);
        assert!(left != other);
    }

    #[test]
    fn equality_tells_empty_children_from_none() {
        assert_ne!(Node::composite("a", vec![]), Node::reference("a"));
        assert_ne!(
            Node::group(vec![Node::reference("a")]),
            Node::group(vec![Node::reference("a"), Node::reference("a")])
        );
        assert_eq!(Node::composite("a", vec![]).shape(), NodeShape::Composite);
    }
}
