//! Abstract Syntax Tree for nixvm expressions.
//!
//! Every node exclusively owns its children. Trees are built bottom-up by the
//! parser and never mutated afterwards.
//!
//! The `Display` impls produce a debug rendering: parenthesized operators,
//! bracketed lists, braced sets. It is deterministic but not a serialization
//! format and does not parse back into the same tree.

use std::fmt;

/// An expression node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// Identifier: `x`, `pkgs.hello`, `foo-bar'`
    Identifier(String),

    /// Integer literal: `42`
    Integer(i64),

    /// String literal, raw text between the quotes: `"hello"`
    String(String),

    /// Boolean literal: `true`, `false`
    Boolean(bool),

    /// List literal: `[ 1 2 3 ]`, `[1, 2, 3]`
    List(Vec<Expr>),

    /// A name/value pair outside of a set or `let`.
    ///
    /// Reserved for attribute access (`x.y`); the cursor folds dots into
    /// identifiers, so the parser never produces this variant.
    Binding(Box<Binding>),

    /// Attribute set: `{ a = 1; b = 2; }`. Duplicate names are kept.
    AttrSet(Vec<Binding>),

    /// Parenthesized binary operation: `(a + b)`
    BinaryOp {
        left: Box<Expr>,
        operator: String,
        right: Box<Expr>,
    },

    /// Unary operation: `!x`. `operator` holds the operator characters that
    /// follow the `!`, so `!x` has an empty operator.
    UnaryOp {
        operator: String,
        operand: Box<Expr>,
    },

    /// Conditional: `if c then a else b`, with the `else` clause optional.
    Conditional {
        condition: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Option<Box<Expr>>,
    },

    /// `let a = 1; in body`
    Let {
        bindings: Vec<Binding>,
        body: Box<Expr>,
    },

    /// Function with positional parameters. No concrete syntax produces it yet.
    Lambda {
        parameters: Vec<Expr>,
        body: Box<Expr>,
    },

    /// Placeholder for input that could not be recognized. Always accompanied
    /// by at least one diagnostic.
    Error,
}

/// `name = value`, as found in attribute sets and `let` blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub name: Expr,
    pub value: Expr,
}

impl Binding {
    pub fn new(name: Expr, value: Expr) -> Self {
        Self { name, value }
    }
}

impl Expr {
    pub fn identifier(name: impl Into<String>) -> Self {
        Expr::Identifier(name.into())
    }

    pub fn string(value: impl Into<String>) -> Self {
        Expr::String(value.into())
    }

    pub fn binary(left: Expr, operator: impl Into<String>, right: Expr) -> Self {
        Expr::BinaryOp {
            left: Box::new(left),
            operator: operator.into(),
            right: Box::new(right),
        }
    }

    pub fn unary(operator: impl Into<String>, operand: Expr) -> Self {
        Expr::UnaryOp {
            operator: operator.into(),
            operand: Box::new(operand),
        }
    }

    pub fn conditional(condition: Expr, then_branch: Expr, else_branch: Option<Expr>) -> Self {
        Expr::Conditional {
            condition: Box::new(condition),
            then_branch: Box::new(then_branch),
            else_branch: else_branch.map(Box::new),
        }
    }

    pub fn let_in(bindings: Vec<Binding>, body: Expr) -> Self {
        Expr::Let {
            bindings,
            body: Box::new(body),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Expr::Error)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Identifier(name) => f.write_str(name),
            Expr::Integer(value) => write!(f, "{value}"),
            Expr::String(value) => write!(f, "\"{value}\""),
            Expr::Boolean(value) => write!(f, "{value}"),
            Expr::List(elements) => {
                f.write_str("[")?;
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{element}")?;
                }
                f.write_str("]")
            }
            Expr::Binding(binding) => write!(f, "{binding}"),
            Expr::AttrSet(bindings) => {
                f.write_str("{ ")?;
                for binding in bindings {
                    write!(f, "{binding}; ")?;
                }
                f.write_str("}")
            }
            Expr::BinaryOp {
                left,
                operator,
                right,
            } => write!(f, "({left} {operator} {right})"),
            Expr::UnaryOp { operator, operand } => write!(f, "(!{operator} {operand})"),
            Expr::Conditional {
                condition,
                then_branch,
                else_branch,
            } => {
                write!(f, "(if {condition} then {then_branch}")?;
                if let Some(else_branch) = else_branch {
                    write!(f, " else {else_branch}")?;
                }
                f.write_str(")")
            }
            Expr::Let { bindings, body } => {
                f.write_str("(let ")?;
                for binding in bindings {
                    write!(f, "{binding}; ")?;
                }
                write!(f, "in {body})")
            }
            Expr::Lambda { parameters, body } => {
                f.write_str("(lambda")?;
                for parameter in parameters {
                    write!(f, " {parameter}")?;
                }
                write!(f, ": {body})")
            }
            Expr::Error => f.write_str("<error>"),
        }
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.name, self.value)
    }
}
