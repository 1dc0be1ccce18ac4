//! Error types for Weft operations.
//!
//! Problems with a composition are not errors: they are returned as
//! [`Diagnostic`](crate::diagnostic::Diagnostic)s next to the best output
//! that could still be produced. [`WeftError`] covers everything that stops
//! a request outright.

use std::io;

use thiserror::Error;

use weft_parser::error::ParseError;

use crate::export;

/// The main error type for Weft operations.
///
/// The `Parse` variant keeps the source text so callers can render the
/// parser's labelled spans.
#[derive(Debug, Error)]
pub enum WeftError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{err}")]
    Parse { err: ParseError, src: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Render error: {0}")]
    Render(String),
}

impl From<export::Error> for WeftError {
    fn from(error: export::Error) -> Self {
        match error {
            export::Error::Style(msg) => Self::Config(msg),
            export::Error::Render(msg) => Self::Render(msg),
        }
    }
}

impl WeftError {
    /// Create a new `Parse` error with the associated source code.
    pub fn new_parse_error(err: ParseError, src: impl Into<String>) -> Self {
        Self::Parse {
            err,
            src: src.into(),
        }
    }
}
