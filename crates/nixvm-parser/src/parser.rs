//! Expression parser for nixvm.
//!
//! A recursive-descent reader that works directly on characters through a
//! [`Cursor`]. Each recognizer matches one production and returns a node.
//! Recognizers never bail out: a failure records a [`Diagnostic`] and the
//! recognizer returns the best node it has (often [`Expr::Error`]), leaving the
//! cursor wherever it stopped.
//!
//! Binary and unary operators carry no precedence. Every binary application is
//! written in parentheses: `((1 + 2) * 3)`.

use tracing::{debug, trace};

use crate::ast::{Binding, Expr};
use crate::cursor::{is_ident_char, is_ident_start, is_operator_char, Cursor, Position};
use crate::{Diagnostic, DiagnosticKind};

/// Words that cannot appear where an expression is expected.
const RESERVED: &[&str] = &["then", "else", "in"];

/// Parser settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Deepest expression nesting accepted before parsing is abandoned.
    pub max_depth: usize,
    /// Treat `#`, `//` and `/* */` comments as whitespace. While set, `//`
    /// cannot be used as an operator.
    pub comments: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_depth: 256,
            comments: true,
        }
    }
}

impl ParseOptions {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_comments(mut self, comments: bool) -> Self {
        self.comments = comments;
        self
    }
}

/// Result of a parse: the tree plus everything that went wrong building it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parse {
    pub expr: Expr,
    pub diagnostics: Vec<Diagnostic>,
}

impl Parse {
    /// True when no diagnostics were recorded.
    pub fn is_ok(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn into_result(self) -> Result<Expr, Vec<Diagnostic>> {
        if self.diagnostics.is_empty() {
            Ok(self.expr)
        } else {
            Err(self.diagnostics)
        }
    }
}

/// Parse `source` with default options.
pub fn parse(source: &str) -> Parse {
    Parser::parse(source)
}

/// nixvm expression parser.
///
/// Holds the cursor and the diagnostics for a single parse; use
/// [`Parser::parse`] or [`Parser::parse_with`].
pub struct Parser<'a> {
    cursor: Cursor<'a>,
    options: ParseOptions,
    diagnostics: Vec<Diagnostic>,
    depth: usize,
    abandoned: bool,
}

impl<'a> Parser<'a> {
    /// Create a new parser for the given source.
    pub fn new(source: &'a str, options: ParseOptions) -> Self {
        Self {
            cursor: Cursor::new(source),
            options,
            diagnostics: Vec::new(),
            depth: 0,
            abandoned: false,
        }
    }

    /// Parse source text into an expression with default options.
    pub fn parse(source: &str) -> Parse {
        Self::parse_with(source, ParseOptions::default())
    }

    pub fn parse_with(source: &str, options: ParseOptions) -> Parse {
        trace!(len = source.len(), ?options, "parsing expression");
        let mut parser = Parser::new(source, options);
        let expr = parser.parse_root();
        trace!(diagnostics = parser.diagnostics.len(), "parse finished");
        Parse {
            expr,
            diagnostics: parser.diagnostics,
        }
    }

    /// Parse exactly one expression followed by end of input.
    fn parse_root(&mut self) -> Expr {
        let expr = self.parse_expr();
        self.skip_trivia();
        if !self.cursor.is_at_end() {
            let found = self.cursor.peek();
            self.error(
                DiagnosticKind::UnexpectedInput,
                format!("unexpected `{found}` after expression"),
            );
        }
        expr
    }

    // =========================================================================
    // Dispatch
    // =========================================================================

    /// Parse any expression, choosing a recognizer from the next character.
    fn parse_expr(&mut self) -> Expr {
        self.skip_trivia();

        if self.cursor.is_at_end() {
            self.error(DiagnosticKind::UnexpectedEof, "unexpected end of input");
            return Expr::Error;
        }

        if self.depth >= self.options.max_depth {
            self.error(
                DiagnosticKind::NestingTooDeep,
                format!("expression nested deeper than {} levels", self.options.max_depth),
            );
            // Nothing after this point is parsed or reported.
            self.abandoned = true;
            self.cursor.skip_to_end();
            return Expr::Error;
        }

        self.depth += 1;
        let expr = match self.cursor.peek() {
            '0'..='9' => self.parse_integer(),
            '"' => self.parse_string(),
            '[' => self.parse_list(),
            '{' => self.parse_attr_set(),
            '(' => self.parse_binary_op(),
            '!' => self.parse_unary_op(),
            c if is_ident_start(c) => self.parse_word(),
            _ => self.parse_identifier(),
        };
        self.depth -= 1;
        expr
    }

    /// Keywords are matched on the whole word, so `input` or `fold` stay
    /// identifiers.
    fn parse_word(&mut self) -> Expr {
        match self.cursor.word() {
            "if" => self.parse_conditional(),
            "let" => self.parse_let(),
            "true" | "false" => self.parse_boolean(),
            word if RESERVED.contains(&word) => {
                self.error(
                    DiagnosticKind::ExpectedExpression,
                    format!("expected expression, found keyword `{word}`"),
                );
                Expr::Error
            }
            _ => self.parse_identifier(),
        }
    }

    // =========================================================================
    // Literals
    // =========================================================================

    fn parse_identifier(&mut self) -> Expr {
        let name = self.cursor.eat_while(is_ident_char);
        if name.is_empty() {
            let found = self.cursor.peek();
            self.error(
                DiagnosticKind::ExpectedExpression,
                format!("expected expression, found `{found}`"),
            );
            return Expr::Error;
        }
        Expr::identifier(name)
    }

    fn parse_integer(&mut self) -> Expr {
        let start = self.cursor.position();
        let digits = self.cursor.eat_while(|c| c.is_ascii_digit());
        match digits.parse::<i64>() {
            Ok(value) => Expr::Integer(value),
            Err(_) => {
                self.error_at(
                    start,
                    DiagnosticKind::IntegerOverflow,
                    format!("integer literal `{digits}` does not fit in 64 bits"),
                );
                Expr::Error
            }
        }
    }

    /// Strings are taken verbatim; backslashes have no special meaning.
    fn parse_string(&mut self) -> Expr {
        let start = self.cursor.position();
        self.cursor.advance(); // consume opening quote
        let value = self.cursor.eat_while(|c| c != '"');
        if !self.cursor.eat('"') {
            self.error_at(
                start,
                DiagnosticKind::UnterminatedString,
                "unterminated string literal",
            );
        }
        Expr::string(value)
    }

    fn parse_boolean(&mut self) -> Expr {
        if self.cursor.eat_keyword("true") {
            Expr::Boolean(true)
        } else if self.cursor.eat_keyword("false") {
            Expr::Boolean(false)
        } else {
            self.error(DiagnosticKind::Expected, "expected `true` or `false`");
            Expr::Error
        }
    }

    // =========================================================================
    // Collections
    // =========================================================================

    /// `[ e1 e2 ]` or `[e1, e2]`
    fn parse_list(&mut self) -> Expr {
        self.expect("[");
        let mut elements = Vec::new();

        loop {
            self.skip_trivia();
            if self.cursor.is_at_end() {
                self.error(
                    DiagnosticKind::UnexpectedEof,
                    "unexpected end of input, expected `]`",
                );
                break;
            }
            if self.cursor.eat(']') {
                break;
            }

            let before = self.cursor.offset();
            elements.push(self.parse_expr());
            self.skip_trivia();
            self.cursor.eat(',');
            self.ensure_progress(before);
        }

        Expr::List(elements)
    }

    /// `{ a = 1; b = 2; }`. Bindings may be separated by `;` or `,`.
    fn parse_attr_set(&mut self) -> Expr {
        self.expect("{");
        let mut bindings = Vec::new();

        loop {
            self.skip_trivia();
            if self.cursor.is_at_end() {
                self.error(
                    DiagnosticKind::UnexpectedEof,
                    "unexpected end of input, expected `}`",
                );
                break;
            }
            if self.cursor.eat('}') {
                break;
            }

            let before = self.cursor.offset();
            bindings.push(self.parse_binding());
            self.skip_trivia();
            if !self.cursor.eat(';') {
                self.cursor.eat(',');
            }
            self.ensure_progress(before);
        }

        Expr::AttrSet(bindings)
    }

    /// `name = value`
    fn parse_binding(&mut self) -> Binding {
        let name = self.parse_binding_name();
        self.skip_trivia();
        self.expect("=");
        let value = self.parse_expr();
        Binding::new(name, value)
    }

    /// Binding names are plain identifier runs; keywords are allowed here.
    fn parse_binding_name(&mut self) -> Expr {
        self.skip_trivia();
        let name = self.cursor.eat_while(is_ident_char);
        if name.is_empty() {
            let found = self.cursor.peek();
            self.error(
                DiagnosticKind::Expected,
                format!("expected binding name, found `{found}`"),
            );
            return Expr::Error;
        }
        Expr::identifier(name)
    }

    // =========================================================================
    // Operators
    // =========================================================================

    /// `(left op right)`. The operator may be empty.
    fn parse_binary_op(&mut self) -> Expr {
        self.expect("(");
        let left = self.parse_expr();
        self.skip_trivia();
        let operator = self.cursor.eat_while(is_operator_char);
        let right = self.parse_expr();
        self.skip_trivia();
        self.expect(")");
        Expr::binary(left, operator, right)
    }

    /// `!op operand`. Operator characters right after the `!` belong to the
    /// operator, so `!= x` has operator `=`.
    fn parse_unary_op(&mut self) -> Expr {
        self.expect("!");
        self.skip_trivia();
        let operator = self.cursor.eat_while(is_operator_char);
        let operand = self.parse_expr();
        Expr::unary(operator, operand)
    }

    // =========================================================================
    // Control flow
    // =========================================================================

    /// `if c then a` with an optional `else b`.
    fn parse_conditional(&mut self) -> Expr {
        self.expect_keyword("if");
        let condition = self.parse_expr();
        self.skip_trivia();
        self.expect_keyword("then");
        let then_branch = self.parse_expr();
        self.skip_trivia();

        let else_branch = if self.cursor.eat_keyword("else") {
            Some(self.parse_expr())
        } else {
            None
        };

        Expr::conditional(condition, then_branch, else_branch)
    }

    /// `let a = 1; b = 2; in body`. Bindings end at the keyword `in`, so a
    /// binding named `index` does not end the block.
    fn parse_let(&mut self) -> Expr {
        self.expect_keyword("let");
        let mut bindings = Vec::new();

        loop {
            self.skip_trivia();
            if self.cursor.is_at_end() || self.cursor.word() == "in" {
                break;
            }

            let before = self.cursor.offset();
            bindings.push(self.parse_binding());
            self.skip_trivia();
            self.cursor.eat(';');
            self.ensure_progress(before);
        }

        self.expect_keyword("in");
        let body = self.parse_expr();
        Expr::let_in(bindings, body)
    }

    // =========================================================================
    // Cursor helpers
    // =========================================================================

    fn skip_trivia(&mut self) {
        if let Err(start) = self.cursor.skip_trivia(self.options.comments) {
            self.error_at(
                start,
                DiagnosticKind::UnterminatedComment,
                "unterminated block comment",
            );
        }
    }

    /// Consume `literal`, or record a diagnostic and leave the cursor alone.
    fn expect(&mut self, literal: &str) -> bool {
        if self.cursor.eat_str(literal) {
            return true;
        }
        self.report_missing(literal);
        false
    }

    /// Like [`Parser::expect`], but only matches `keyword` as a whole word.
    fn expect_keyword(&mut self, keyword: &str) -> bool {
        if self.cursor.eat_keyword(keyword) {
            return true;
        }
        self.report_missing(keyword);
        false
    }

    fn report_missing(&mut self, expected: &str) {
        if self.cursor.is_at_end() {
            self.error(
                DiagnosticKind::UnexpectedEof,
                format!("unexpected end of input, expected `{expected}`"),
            );
        } else {
            let found = self.cursor.peek();
            self.error(
                DiagnosticKind::Expected,
                format!("expected `{expected}`, found `{found}`"),
            );
        }
    }

    /// Skip one character if a loop iteration consumed nothing. The failed
    /// recognizer has already reported the problem.
    fn ensure_progress(&mut self, before: usize) {
        if self.cursor.offset() == before {
            self.cursor.advance();
        }
    }

    fn error(&mut self, kind: DiagnosticKind, message: impl Into<String>) {
        let position = self.cursor.position();
        self.error_at(position, kind, message);
    }

    fn error_at(&mut self, position: Position, kind: DiagnosticKind, message: impl Into<String>) {
        if self.abandoned {
            return;
        }
        let diagnostic = Diagnostic::new(kind, message, position);
        debug!(
            line = diagnostic.line,
            column = diagnostic.column,
            kind = ?diagnostic.kind,
            "{}",
            diagnostic.message
        );
        self.diagnostics.push(diagnostic);
    }
}
