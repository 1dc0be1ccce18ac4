//! Tokens of the Weft language.

use std::fmt;

use crate::span::Span;

/// A lexical token.
#[derive(Debug, Clone, PartialEq)]
pub enum Token<'src> {
    // Keywords
    Diagram,
    Brick,
    Grade,
    Tokens,
    Let,
    Compose,

    // Literals
    StringLiteral(String),
    IntegerLiteral(u64),
    Identifier(&'src str),

    // Operators
    Arrow,      // ->
    Sequential, // >> or ∘
    Parallel,   // * or ⊗
    Equals,     // =
    Colon,      // :

    // Punctuation
    LeftParen,  // (
    RightParen, // )
    Semicolon,  // ;
    Comma,      // ,

    // Comments
    LineComment(&'src str), // // comment

    // Whitespace
    Whitespace,
    Newline,
}

impl Token<'_> {
    /// Whitespace, newlines and comments carry no meaning for the parser.
    pub fn is_trivia(&self) -> bool {
        matches!(
            self,
            Token::Whitespace | Token::Newline | Token::LineComment(_)
        )
    }
}

/// A token together with its source span.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedToken<'src> {
    pub token: Token<'src>,
    pub span: Span,
}

impl<'src> PositionedToken<'src> {
    pub fn new(token: Token<'src>, span: Span) -> Self {
        Self { token, span }
    }
}

impl fmt::Display for PositionedToken<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.token.fmt(f)
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Diagram => write!(f, "diagram"),
            Token::Brick => write!(f, "brick"),
            Token::Grade => write!(f, "grade"),
            Token::Tokens => write!(f, "tokens"),
            Token::Let => write!(f, "let"),
            Token::Compose => write!(f, "compose"),

            Token::StringLiteral(s) => write!(f, "\"{s}\""),
            Token::IntegerLiteral(n) => write!(f, "{n}"),
            Token::Identifier(name) => write!(f, "{name}"),

            Token::Arrow => write!(f, "->"),
            Token::Sequential => write!(f, ">>"),
            Token::Parallel => write!(f, "*"),
            Token::Equals => write!(f, "="),
            Token::Colon => write!(f, ":"),

            Token::LeftParen => write!(f, "("),
            Token::RightParen => write!(f, ")"),
            Token::Semicolon => write!(f, ";"),
            Token::Comma => write!(f, ","),

            Token::LineComment(comment) => write!(f, "//{comment}"),
            Token::Whitespace => write!(f, " "),
            Token::Newline => write!(f, "\\n"),
        }
    }
}
