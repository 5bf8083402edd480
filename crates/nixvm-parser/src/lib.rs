//! nixvm Parser
//!
//! Parses a subset of the Nix expression language (literals, lists,
//! attribute sets, `let`, `if`, parenthesized operators) into an AST.
//!
//! Parsing never fails outright. Every call yields an [`Expr`] together with
//! the diagnostics recorded along the way; a tree is only trustworthy when
//! that list is empty.
//!
//! # Example
//!
//! ```
//! let parsed = nixvm_parser::parse("let x = 1; in x");
//! assert!(parsed.is_ok());
//! assert_eq!(parsed.expr.to_string(), "(let x = 1; in x)");
//! ```

pub mod ast;
pub mod cursor;
pub mod parser;

pub use ast::{Binding, Expr};
pub use cursor::Position;
pub use parser::{parse, Parse, ParseOptions, Parser};

/// Classification of a [`Diagnostic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// Input ended while a construct was still open.
    UnexpectedEof,
    /// A required literal or keyword was missing.
    Expected,
    /// Input left over where nothing more was allowed.
    UnexpectedInput,
    /// No expression could be recognized at the cursor.
    ExpectedExpression,
    /// An integer literal does not fit in `i64`.
    IntegerOverflow,
    UnterminatedString,
    UnterminatedComment,
    /// Nesting exceeded [`ParseOptions::max_depth`].
    NestingTooDeep,
}

/// A problem found while parsing, with the position it was found at.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("line {line}, column {column}: {message}")]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>, position: Position) -> Self {
        Self {
            kind,
            message: message.into(),
            line: position.line,
            column: position.column,
        }
    }
}
