//! Links notation text <-> node tree.
//!
//! # Responsibility
//! - Parse notation documents into [`Node`] trees.
//! - Format node trees back into canonical notation text.
//!
//! # Invariants
//! - `parse(&format(nodes)) == nodes` for every valid node list.
//! - Canonical text satisfies `format(&parse(text)?) == text`.
//!
//! [`Node`]: crate::model::node::Node

use std::error::Error;
use std::fmt::{Display, Formatter};

mod formatter;
mod parser;

pub use formatter::{format, format_node};
pub use parser::parse;

pub type NotationResult<T> = Result<T, NotationError>;

/// 1-based position inside notation text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Display for Position {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Syntax errors in notation text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotationError {
    /// Token that cannot appear where it was found.
    UnexpectedToken { found: String, at: Position },
    /// `(` without a matching `)`.
    UnclosedParenthesis { at: Position },
    /// Quoted reference without its closing quote.
    UnterminatedQuote { at: Position },
}

impl Display for NotationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnexpectedToken { found, at } => {
                write!(f, "unexpected `{found}` at {at}")
            }
            Self::UnclosedParenthesis { at } => {
                write!(f, "parenthesis opened at {at} is never closed")
            }
            Self::UnterminatedQuote { at } => {
                write!(f, "quoted reference starting at {at} is never closed")
            }
        }
    }
}

impl Error for NotationError {}
