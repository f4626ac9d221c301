//! Tree model shared by the notation, codec and service layers.
//!
//! # Invariants
//! - Nodes are plain values; identity inside the substrate is derived from
//!   content, never stored on the node.

pub mod node;
