//! [`ParseError`] wraps the diagnostics of a failed parse.

use std::fmt;

use thiserror::Error;

use crate::error::Diagnostic;

/// A type alias for `Result<T, Diagnostic>`.
pub type Result<T> = std::result::Result<T, Diagnostic>;

/// Error type for the parsing lifecycle.
///
/// Holds every diagnostic reported by the phase that failed, errors and
/// warnings alike, in the order they were found.
#[derive(Debug, Error)]
#[error("{}", Summary(.diagnostics))]
pub struct ParseError {
    diagnostics: Vec<Diagnostic>,
}

/// Displays the first diagnostic and how many follow it.
struct Summary<'a>(&'a [Diagnostic]);

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(first) = self.0.first() {
            write!(f, "{first}")?;
            if self.0.len() > 1 {
                write!(f, " (+{} more)", self.0.len() - 1)?;
            }
        }
        Ok(())
    }
}

impl ParseError {
    /// Create a new parse error from diagnostics.
    pub fn new(diagnostics: Vec<Diagnostic>) -> Self {
        Self { diagnostics }
    }

    /// Get all diagnostics in this error.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}

impl From<Diagnostic> for ParseError {
    fn from(diagnostic: Diagnostic) -> Self {
        Self {
            diagnostics: vec![diagnostic],
        }
    }
}

impl From<Vec<Diagnostic>> for ParseError {
    fn from(diagnostics: Vec<Diagnostic>) -> Self {
        Self { diagnostics }
    }
}
