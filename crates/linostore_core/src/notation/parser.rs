//! Notation tokenizer and parser.
//!
//! Nested parentheses are parsed with an explicit frame stack, so nesting
//! depth is bounded by heap rather than call stack.

use super::{NotationError, NotationResult, Position};
use crate::model::node::Node;

#[derive(Debug, Clone, PartialEq, Eq)]
enum TokenKind {
    Open,
    Close,
    Colon,
    Newline,
    Reference(String),
}

#[derive(Debug, Clone)]
struct Token {
    kind: TokenKind,
    at: Position,
}

impl Token {
    fn describe(&self) -> String {
        match &self.kind {
            TokenKind::Open => "(".to_string(),
            TokenKind::Close => ")".to_string(),
            TokenKind::Colon => ":".to_string(),
            TokenKind::Newline => "newline".to_string(),
            TokenKind::Reference(text) => text.clone(),
        }
    }

    fn unexpected(&self) -> NotationError {
        NotationError::UnexpectedToken {
            found: self.describe(),
            at: self.at,
        }
    }
}

/// Parses a notation document into its top-level nodes.
///
/// Every non-blank top-level line yields one node:
/// - `id: a b` is a tagged composite;
/// - a single value is that value;
/// - several values form an anonymous group.
pub fn parse(text: &str) -> NotationResult<Vec<Node>> {
    let tokens = tokenize(text)?;
    let mut parser = Parser { tokens, pos: 0 };
    parser.parse_document()
}

fn is_delimiter(ch: char) -> bool {
    ch.is_whitespace() || matches!(ch, '(' | ')' | ':' | '"' | '\'')
}

fn tokenize(text: &str) -> NotationResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();
    let mut line = 1;
    let mut column = 1;

    while let Some(&ch) = chars.peek() {
        let at = Position { line, column };
        match ch {
            '\n' => {
                chars.next();
                tokens.push(Token {
                    kind: TokenKind::Newline,
                    at,
                });
                line += 1;
                column = 1;
                continue;
            }
            '(' | ')' | ':' => {
                chars.next();
                let kind = match ch {
                    '(' => TokenKind::Open,
                    ')' => TokenKind::Close,
                    _ => TokenKind::Colon,
                };
                tokens.push(Token { kind, at });
                column += 1;
            }
            '"' | '\'' => {
                let quote = ch;
                chars.next();
                column += 1;
                let mut value = String::new();
                loop {
                    let Some(next) = chars.next() else {
                        return Err(NotationError::UnterminatedQuote { at });
                    };
                    if next == '\n' {
                        line += 1;
                        column = 1;
                    } else {
                        column += 1;
                    }
                    if next != quote {
                        value.push(next);
                        continue;
                    }
                    if chars.peek() == Some(&quote) {
                        chars.next();
                        column += 1;
                        value.push(quote);
                        continue;
                    }
                    break;
                }
                tokens.push(Token {
                    kind: TokenKind::Reference(value),
                    at,
                });
            }
            _ if ch.is_whitespace() => {
                chars.next();
                column += 1;
            }
            _ => {
                let mut value = String::new();
                while let Some(&next) = chars.peek() {
                    if is_delimiter(next) {
                        break;
                    }
                    value.push(next);
                    chars.next();
                    column += 1;
                }
                tokens.push(Token {
                    kind: TokenKind::Reference(value),
                    at,
                });
            }
        }
    }

    Ok(tokens)
}

/// Open parenthesized link awaiting its `)`.
struct Frame {
    id: Option<String>,
    lines: Vec<Vec<Node>>,
}

impl Frame {
    fn push(&mut self, node: Node) {
        if let Some(line) = self.lines.last_mut() {
            line.push(node);
        }
    }

    fn finish(self) -> Node {
        let mut lines = self.lines.into_iter();
        let mut children = lines.next().unwrap_or_default();
        for mut line in lines {
            match line.len() {
                0 => {}
                1 => children.append(&mut line),
                _ => children.push(Node::group(line)),
            }
        }
        Node {
            id: self.id,
            children: Some(children),
        }
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek_kind(&self) -> Option<&TokenKind> {
        self.tokens.get(self.pos).map(|token| &token.kind)
    }

    fn next_token(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn skip_newlines(&mut self) {
        while self.peek_kind() == Some(&TokenKind::Newline) {
            self.pos += 1;
        }
    }

    /// Consumes `reference :` when present.
    fn take_id(&mut self) -> Option<String> {
        let is_id = matches!(
            (
                self.tokens.get(self.pos).map(|token| &token.kind),
                self.tokens.get(self.pos + 1).map(|token| &token.kind),
            ),
            (Some(TokenKind::Reference(_)), Some(TokenKind::Colon))
        );
        if !is_id {
            return None;
        }
        let id = match self.next_token().map(|token| token.kind) {
            Some(TokenKind::Reference(text)) => Some(text),
            _ => None,
        };
        self.pos += 1;
        id
    }

    fn parse_document(&mut self) -> NotationResult<Vec<Node>> {
        let mut nodes = Vec::new();
        loop {
            self.skip_newlines();
            if self.pos >= self.tokens.len() {
                return Ok(nodes);
            }
            nodes.push(self.parse_line()?);
        }
    }

    fn parse_line(&mut self) -> NotationResult<Node> {
        let id = self.take_id();
        let mut values = Vec::new();
        while let Some(kind) = self.peek_kind() {
            if *kind == TokenKind::Newline {
                break;
            }
            values.push(self.parse_value()?);
        }

        Ok(match id {
            Some(id) => Node::composite(id, values),
            None if values.len() == 1 => values.remove(0),
            None => Node::group(values),
        })
    }

    fn open_frame(&mut self) -> Frame {
        self.skip_newlines();
        Frame {
            id: self.take_id(),
            lines: vec![Vec::new()],
        }
    }

    fn parse_value(&mut self) -> NotationResult<Node> {
        let Some(first) = self.next_token() else {
            let at = self
                .tokens
                .last()
                .map_or(Position { line: 1, column: 1 }, |token| token.at);
            return Err(NotationError::UnexpectedToken {
                found: "end of input".to_string(),
                at,
            });
        };
        match first.kind {
            TokenKind::Reference(text) => return Ok(Node::reference(text)),
            TokenKind::Open => {}
            _ => return Err(first.unexpected()),
        }

        let mut opened_at = vec![first.at];
        let mut stack = vec![self.open_frame()];
        loop {
            let Some(token) = self.next_token() else {
                let at = opened_at.last().copied().unwrap_or(first.at);
                return Err(NotationError::UnclosedParenthesis { at });
            };
            match token.kind {
                TokenKind::Reference(text) => {
                    if let Some(frame) = stack.last_mut() {
                        frame.push(Node::reference(text));
                    }
                }
                TokenKind::Newline => {
                    if let Some(frame) = stack.last_mut() {
                        frame.lines.push(Vec::new());
                    }
                }
                TokenKind::Open => {
                    opened_at.push(token.at);
                    stack.push(self.open_frame());
                }
                TokenKind::Close => {
                    opened_at.pop();
                    let Some(frame) = stack.pop() else {
                        return Err(token.unexpected());
                    };
                    let node = frame.finish();
                    match stack.last_mut() {
                        Some(parent) => parent.push(node),
                        None => return Ok(node),
                    }
                }
                TokenKind::Colon => return Err(token.unexpected()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::parse;
    use crate::model::node::Node;
    use crate::notation::{NotationError, Position};

    #[test]
    fn parses_single_line_and_parenthesized_composites_alike() {
        let expected = vec![Node::composite(
            "1",
            vec![Node::reference("1"), Node::reference("1")],
        )];
        assert_eq!(parse("(1: 1 1)").unwrap(), expected);
        assert_eq!(parse("1: 1 1").unwrap(), expected);
    }

    #[test]
    fn later_lines_inside_parentheses_become_groups() {
        let nodes = parse("(papa: (lovesMama: loves mama)\nson lovesMama\nall)").unwrap();
        assert_eq!(
            nodes,
            vec![Node::composite(
                "papa",
                vec![
                    Node::composite(
                        "lovesMama",
                        vec![Node::reference("loves"), Node::reference("mama")]
                    ),
                    Node::group(vec![Node::reference("son"), Node::reference("lovesMama")]),
                    Node::reference("all"),
                ]
            )]
        );
    }

    #[test]
    fn quoted_references_keep_delimiters() {
        let nodes = parse(r#"("a b": 'c:d' "say ""hi""" '')"#).unwrap();
        assert_eq!(
            nodes,
            vec![Node::composite(
                "a b",
                vec![
                    Node::reference("c:d"),
                    Node::reference("say \"hi\""),
                    Node::reference(""),
                ]
            )]
        );
    }

    #[test]
    fn empty_parentheses_and_blank_lines() {
        let nodes = parse("\n()\n\n(a:)\n").unwrap();
        assert_eq!(nodes, vec![Node::group(vec![]), Node::composite("a", vec![])]);
    }

    #[test]
    fn reports_unclosed_parenthesis_position() {
        let err = parse("(a: (b c)\n").unwrap_err();
        assert_eq!(
            err,
            NotationError::UnclosedParenthesis {
                at: Position { line: 1, column: 1 }
            }
        );
    }

    #[test]
    fn rejects_stray_colon_and_close() {
        assert!(matches!(
            parse("a b: c").unwrap_err(),
            NotationError::UnexpectedToken { .. }
        ));
        assert!(matches!(
            parse(")").unwrap_err(),
            NotationError::UnexpectedToken { .. }
        ));
        assert!(matches!(
            parse("'open").unwrap_err(),
            NotationError::UnterminatedQuote { .. }
        ));
    }
}
