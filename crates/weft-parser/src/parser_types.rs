//! Parser AST types.
//!
//! Leaf values are wrapped in [`Spanned<T>`] to keep their source location.
//! Expression nodes are allocated in a `bumpalo` arena owned by the caller of
//! the parser, so the tree is freed in one go and never dropped node by node.

use std::fmt;

use crate::span::{Span, Spanned};

/// A composition expression as written.
#[derive(Debug)]
pub enum Expr<'a> {
    /// Reference to a brick or a `let` binding.
    Name(Spanned<&'a str>),
    /// `left >> right`
    Seq {
        left: &'a Expr<'a>,
        right: &'a Expr<'a>,
    },
    /// `left * right`
    Par {
        left: &'a Expr<'a>,
        right: &'a Expr<'a>,
    },
}

impl Expr<'_> {
    pub fn span(&self) -> Span {
        match self {
            Expr::Name(name) => name.span(),
            Expr::Seq { left, right } | Expr::Par { left, right } => {
                left.span().union(right.span())
            }
        }
    }
}

impl fmt::Display for Expr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Name(name) => write!(f, "{}", name.inner()),
            Expr::Seq { left, right } => write!(f, "({left} >> {right})"),
            Expr::Par { left, right } => write!(f, "({left} * {right})"),
        }
    }
}

/// A `grade N` or `tokens N` clause of a brick declaration.
#[derive(Debug, Clone, Copy)]
pub enum BrickAttribute {
    Grade(Spanned<u64>),
    Tokens(Spanned<u64>),
}

impl BrickAttribute {
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Grade(_) => "grade",
            Self::Tokens(_) => "tokens",
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Self::Grade(value) | Self::Tokens(value) => value.span(),
        }
    }
}

/// `brick name "Label": (inputs) -> (outputs) grade 1 tokens 150;`
#[derive(Debug)]
pub struct BrickDecl<'a> {
    pub name: Spanned<&'a str>,
    pub label: Option<Spanned<String>>,
    pub inputs: Vec<Spanned<&'a str>>,
    pub outputs: Vec<Spanned<&'a str>>,
    pub attributes: Vec<BrickAttribute>,
    pub span: Span,
}

/// A top-level statement.
#[derive(Debug)]
pub enum Statement<'a> {
    /// `diagram "Title";`
    Diagram { title: Spanned<String>, span: Span },
    Brick(BrickDecl<'a>),
    /// `let name = expr;`
    Let {
        name: Spanned<&'a str>,
        value: &'a Expr<'a>,
        span: Span,
    },
    /// `compose expr;`
    Compose { value: &'a Expr<'a>, span: Span },
}

impl Statement<'_> {
    pub fn span(&self) -> Span {
        match self {
            Statement::Diagram { span, .. }
            | Statement::Let { span, .. }
            | Statement::Compose { span, .. } => *span,
            Statement::Brick(brick) => brick.span,
        }
    }
}

/// All statements of a source file in order.
#[derive(Debug, Default)]
pub struct Document<'a> {
    pub statements: Vec<Statement<'a>>,
    /// Span covering the whole source.
    pub span: Span,
}
