//! Diagnostics and the spans they point at.

use std::fmt;

use crate::{error::error_code::ErrorCode, span::Span};

/// Whether a diagnostic fails the parse.
///
/// Warnings are handed back next to a successful [`ParsedDiagram`](crate::ParsedDiagram).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    pub fn is_error(self) -> bool {
        self == Severity::Error
    }

    pub fn is_warning(self) -> bool {
        self == Severity::Warning
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Primary,
    Secondary,
}

/// A message attached to a span of source text.
///
/// The primary label underlines the offending text; secondary ones point
/// at related places, such as an earlier definition of the same brick.
#[derive(Debug, Clone)]
pub struct Label {
    span: Span,
    message: String,
    role: Role,
}

impl Label {
    pub fn primary(span: Span, message: impl Into<String>) -> Self {
        Self::new(span, message, Role::Primary)
    }

    pub fn secondary(span: Span, message: impl Into<String>) -> Self {
        Self::new(span, message, Role::Secondary)
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_primary(&self) -> bool {
        self.role == Role::Primary
    }

    pub fn is_secondary(&self) -> bool {
        self.role == Role::Secondary
    }

    fn new(span: Span, message: impl Into<String>, role: Role) -> Self {
        Self {
            span,
            message: message.into(),
            role,
        }
    }
}

/// A single error or warning with source locations.
///
/// Rendered by a report handler it reads like:
///
/// ```text
/// error[E200]: undefined name `sumarize`
///   --> pipeline.weft:6:17
///    |
///  6 | compose fetch >> sumarize;
///    |                  ^^^^^^^^ not defined
///    |
///    = help: did you mean `summarize`?
/// ```
#[derive(Debug, Clone)]
pub struct Diagnostic {
    severity: Severity,
    code: Option<ErrorCode>,
    message: String,
    labels: Vec<Label>,
    help: Option<String>,
}

impl Diagnostic {
    /// Create an error diagnostic.
    ///
    /// # Example
    ///
    /// ```
    /// # use weft_parser::error::{Diagnostic, ErrorCode};
    /// # use weft_parser::Span;
    ///
    /// let diag = Diagnostic::error("undefined name `foo`")
    ///     .with_code(ErrorCode::E200)
    ///     .with_label(Span::new(0..3), "not defined");
    /// assert!(diag.severity().is_error());
    /// ```
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn code(&self) -> Option<ErrorCode> {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    /// Span of the first primary label, if any.
    pub fn primary_span(&self) -> Option<Span> {
        self.labels
            .iter()
            .find(|label| label.is_primary())
            .map(Label::span)
    }

    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_label(mut self, span: Span, message: impl Into<String>) -> Self {
        self.labels.push(Label::primary(span, message));
        self
    }

    pub fn with_secondary_label(mut self, span: Span, message: impl Into<String>) -> Self {
        self.labels.push(Label::secondary(span, message));
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            code: None,
            message: message.into(),
            labels: Vec::new(),
            help: None,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "{}[{code}]: {}", self.severity, self.message),
            None => write!(f, "{}: {}", self.severity, self.message),
        }
    }
}

impl std::error::Error for Diagnostic {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_diagnostic() {
        let diag = Diagnostic::error("missing compose");

        assert!(diag.severity().is_error());
        assert!(diag.code().is_none());
        assert!(diag.labels().is_empty());
        assert!(diag.help().is_none());
        assert!(diag.primary_span().is_none());
    }

    #[test]
    fn test_primary_span_skips_secondary_labels() {
        let diag = Diagnostic::error("duplicate brick")
            .with_secondary_label(Span::new(5..15), "first defined here")
            .with_label(Span::new(30..40), "duplicate here");

        assert_eq!(diag.labels().len(), 2);
        assert!(diag.labels()[0].is_secondary());
        assert!(diag.labels()[1].is_primary());
        assert_eq!(diag.labels()[1].message(), "duplicate here");
        assert_eq!(diag.primary_span(), Some(Span::new(30..40)));
    }

    #[test]
    fn test_display_with_code() {
        let diag = Diagnostic::error("undefined name `foo`").with_code(ErrorCode::E200);
        assert_eq!(diag.to_string(), "error[E200]: undefined name `foo`");
    }

    #[test]
    fn test_display_warning() {
        let diag = Diagnostic::warning("unused brick `x`").with_help("remove it");
        assert!(diag.severity().is_warning());
        assert_eq!(diag.to_string(), "warning: unused brick `x`");
        assert_eq!(diag.help(), Some("remove it"));
    }
}
