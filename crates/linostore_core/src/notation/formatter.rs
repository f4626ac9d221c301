//! Canonical notation formatter.

use crate::model::node::Node;
use once_cell::sync::Lazy;
use regex::Regex;

static SIMPLE_REFERENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^[^\s():"']+$"#).expect("valid simple reference regex"));

/// Formats top-level nodes, one per line.
pub fn format(nodes: &[Node]) -> String {
    let mut out = String::new();
    for (index, node) in nodes.iter().enumerate() {
        if index > 0 {
            out.push('\n');
        }
        write_value(&mut out, node);
    }
    out
}

/// Formats a single node as a value.
pub fn format_node(node: &Node) -> String {
    let mut out = String::new();
    write_value(&mut out, node);
    out
}

enum Piece<'n> {
    Value(&'n Node),
    Text(&'static str),
}

fn write_value(out: &mut String, root: &Node) {
    let mut pending = vec![Piece::Value(root)];
    while let Some(piece) = pending.pop() {
        let node = match piece {
            Piece::Text(text) => {
                out.push_str(text);
                continue;
            }
            Piece::Value(node) => node,
        };
        let Some(children) = node.children.as_deref() else {
            write_reference(out, node.id.as_deref().unwrap_or_default());
            continue;
        };

        out.push('(');
        if let Some(id) = node.id.as_deref() {
            write_reference(out, id);
            out.push(':');
            if !children.is_empty() {
                out.push(' ');
            }
        }

        // First-line children stay inline; from the first later line group on,
        // every child gets its own line.
        let line_start = children
            .iter()
            .skip(1)
            .position(Node::is_line_group)
            .map_or(children.len(), |offset| offset + 1);

        let mut pieces = Vec::with_capacity(children.len() * 2 + 1);
        for (index, child) in children[..line_start].iter().enumerate() {
            if index > 0 {
                pieces.push(Piece::Text(" "));
            }
            pieces.push(Piece::Value(child));
        }
        for child in &children[line_start..] {
            pieces.push(Piece::Text("\n"));
            if child.is_line_group() {
                for (index, value) in child.children().iter().enumerate() {
                    if index > 0 {
                        pieces.push(Piece::Text(" "));
                    }
                    pieces.push(Piece::Value(value));
                }
            } else {
                pieces.push(Piece::Value(child));
            }
        }
        pieces.push(Piece::Text(")"));
        pending.extend(pieces.into_iter().rev());
    }
}

fn write_reference(out: &mut String, text: &str) {
    if SIMPLE_REFERENCE_RE.is_match(text) {
        out.push_str(text);
    } else if !text.contains('"') {
        out.push('"');
        out.push_str(text);
        out.push('"');
    } else if !text.contains('\'') {
        out.push('\'');
        out.push_str(text);
        out.push('\'');
    } else {
        out.push('"');
        out.push_str(&text.replace('"', "\"\""));
        out.push('"');
    }
}

#[cfg(test)]
mod tests {
    use super::{format, format_node};
    use crate::model::node::Node;
    use crate::notation::parse;

    #[test]
    fn canonical_documents_survive_parse_and_format() {
        for text in [
            "(1: 1 1)",
            "(1: 1 1)\n(2: 2 2)",
            "(1: 2 (3: 3 3))\n(2: 1 1)",
            "(son: lovesMama)",
            "(papa: (lovesMama: loves mama)\nson lovesMama\ndaughter lovesMama\nall (love: mama))",
            "mama\n(a b)\n(a:)\n()",
            "(x: (a b) c)",
        ] {
            assert_eq!(format(&parse(text).unwrap()), text);
        }
    }

    #[test]
    fn references_are_quoted_only_when_needed() {
        assert_eq!(format_node(&Node::reference("plain")), "plain");
        assert_eq!(format_node(&Node::reference("two words")), "\"two words\"");
        assert_eq!(format_node(&Node::reference("say \"hi\"")), "'say \"hi\"'");
        assert_eq!(format_node(&Node::reference("it's \"x\"")), "\"it's \"\"x\"\"\"");
        assert_eq!(format_node(&Node::reference("")), "\"\"");
    }

    #[test]
    fn formatted_trees_parse_back_identically() {
        let nodes = vec![
            Node::composite(
                "root",
                vec![
                    Node::reference("a"),
                    Node::group(vec![Node::reference("b"), Node::group(vec![])]),
                    Node::group(vec![Node::reference("only")]),
                    Node::composite("c d", vec![Node::reference("it's \"x\"")]),
                ],
            ),
            Node::group(vec![Node::reference("x"), Node::reference("y")]),
            Node::reference(""),
        ];
        assert_eq!(parse(&format(&nodes)).unwrap(), nodes);
    }
}
