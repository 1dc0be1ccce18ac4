//! Error adapter for converting Weft errors and diagnostics to miette reports.
//!
//! This module bridges the library's error and diagnostic types and miette's
//! rich formatting used by the CLI. Three things get reported:
//!
//! - parser diagnostics, with labeled source spans,
//! - engine diagnostics about the composition, labeled with the source span
//!   of the offending node when the input came from a `.weft` file,
//! - every other [`WeftError`].

use std::fmt;

use miette::{Diagnostic as MietteDiagnostic, LabeledSpan, Severity, SourceSpan};

use weft::{WeftError, diagnostic};
use weft_parser::{Span, error::Diagnostic};

/// A parser diagnostic together with the source it points into.
#[derive(Debug)]
pub struct DiagnosticAdapter<'a> {
    diag: &'a Diagnostic,
    src: &'a str,
}

impl<'a> DiagnosticAdapter<'a> {
    pub fn new(diag: &'a Diagnostic, src: &'a str) -> Self {
        Self { diag, src }
    }
}

impl fmt::Display for DiagnosticAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.diag.message())
    }
}

impl std::error::Error for DiagnosticAdapter<'_> {}

impl MietteDiagnostic for DiagnosticAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = self.diag.code()?;
        Some(Box::new(code))
    }

    fn severity(&self) -> Option<Severity> {
        Some(match self.diag.severity() {
            weft_parser::error::Severity::Warning => Severity::Warning,
            weft_parser::error::Severity::Error => Severity::Error,
        })
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let help = self.diag.help()?;
        Some(Box::new(help))
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&self.src)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let labels = self.diag.labels();
        if labels.is_empty() {
            return None;
        }

        Some(Box::new(labels.iter().map(|label| {
            let text = Some(label.message().to_string());
            let span = span_to_miette(label.span());
            if label.is_primary() {
                LabeledSpan::new_primary_with_span(text, span)
            } else {
                LabeledSpan::new_with_span(text, span)
            }
        })))
    }
}

/// Adapter for a diagnostic the engine raised about the composition.
#[derive(Debug)]
pub struct EngineAdapter<'a> {
    diag: &'a diagnostic::Diagnostic,
    /// Source text and the span of the diagnosed node, for `.weft` input.
    location: Option<(&'a str, Span)>,
}

impl<'a> EngineAdapter<'a> {
    pub fn new(diag: &'a diagnostic::Diagnostic) -> Self {
        Self {
            diag,
            location: None,
        }
    }

    /// Points the report at `span` inside `src`.
    pub fn with_location(mut self, src: &'a str, span: Span) -> Self {
        self.location = Some((src, span));
        self
    }
}

impl fmt::Display for EngineAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.diag.kind())
    }
}

impl std::error::Error for EngineAdapter<'_> {}

impl MietteDiagnostic for EngineAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(format!("weft::{}", self.diag.kind().name())))
    }

    fn severity(&self) -> Option<Severity> {
        let severity = match self.diag.severity() {
            diagnostic::Severity::Info => Severity::Advice,
            diagnostic::Severity::Warning => Severity::Warning,
            diagnostic::Severity::Error | diagnostic::Severity::Fatal => Severity::Error,
        };
        Some(severity)
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.diag
            .rank()
            .map(|rank| Box::new(format!("reported at rank {rank}")) as Box<dyn fmt::Display>)
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        self.location
            .as_ref()
            .map(|(src, _)| src as &dyn miette::SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let (_, span) = self.location?;
        let label = LabeledSpan::new_primary_with_span(
            Some(self.diag.kind().name().replace('_', " ")),
            span_to_miette(span),
        );
        Some(Box::new(std::iter::once(label)))
    }
}

/// Adapter for [`WeftError`] variants without source information.
pub struct ErrorAdapter<'a>(pub &'a WeftError);

impl fmt::Debug for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for ErrorAdapter<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl MietteDiagnostic for ErrorAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match &self.0 {
            WeftError::Io(_) => "weft::io",
            WeftError::Parse { .. } => return None,
            WeftError::Config(_) => "weft::config",
            WeftError::Render(_) => "weft::render",
        };
        Some(Box::new(code))
    }
}

/// A report miette can render.
#[derive(Debug)]
pub enum Reportable<'a> {
    /// A parser diagnostic with source location information.
    Diagnostic(DiagnosticAdapter<'a>),
    /// A diagnostic about the composition.
    Engine(EngineAdapter<'a>),
    /// A simple error without source location.
    Error(ErrorAdapter<'a>),
}

impl Reportable<'_> {
    /// Returns `true` for reports miette renders as errors.
    pub fn is_error(&self) -> bool {
        matches!(self.severity(), None | Some(Severity::Error))
    }
}

impl fmt::Display for Reportable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reportable::Diagnostic(d) => fmt::Display::fmt(d, f),
            Reportable::Engine(d) => fmt::Display::fmt(d, f),
            Reportable::Error(e) => fmt::Display::fmt(e, f),
        }
    }
}

impl std::error::Error for Reportable<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Reportable::Diagnostic(_) | Reportable::Engine(_) => None,
            Reportable::Error(e) => e.source(),
        }
    }
}

impl MietteDiagnostic for Reportable<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Diagnostic(d) => d.code(),
            Reportable::Engine(d) => d.code(),
            Reportable::Error(e) => e.code(),
        }
    }

    fn severity(&self) -> Option<Severity> {
        match self {
            Reportable::Diagnostic(d) => d.severity(),
            Reportable::Engine(d) => d.severity(),
            Reportable::Error(e) => e.severity(),
        }
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Diagnostic(d) => d.help(),
            Reportable::Engine(d) => d.help(),
            Reportable::Error(e) => e.help(),
        }
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        match self {
            Reportable::Diagnostic(d) => d.source_code(),
            Reportable::Engine(d) => d.source_code(),
            Reportable::Error(e) => e.source_code(),
        }
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        match self {
            Reportable::Diagnostic(d) => d.labels(),
            Reportable::Engine(d) => d.labels(),
            Reportable::Error(e) => e.labels(),
        }
    }
}

/// Convert a Weft [`Span`] to a miette [`SourceSpan`].
fn span_to_miette(span: Span) -> SourceSpan {
    SourceSpan::new(span.start().into(), span.len())
}

/// Convert a [`WeftError`] into a list of reportable errors.
///
/// [`WeftError::Parse`] yields one [`Reportable`] per diagnostic; every
/// other variant yields a single one.
pub fn to_reportables(err: &WeftError) -> Vec<Reportable<'_>> {
    match err {
        WeftError::Parse {
            err: parse_err,
            src,
        } => parse_err
            .diagnostics()
            .iter()
            .map(|d| Reportable::Diagnostic(DiagnosticAdapter::new(d, src)))
            .collect(),
        _ => vec![Reportable::Error(ErrorAdapter(err))],
    }
}

#[cfg(test)]
mod tests {
    use weft::{
        composition::{NodeId, NodePath, WireType},
        diagnostic::DiagnosticKind,
    };
    use weft_parser::error::{ErrorCode, ParseError};

    use super::*;

    fn mismatch() -> diagnostic::Diagnostic {
        diagnostic::Diagnostic::new(DiagnosticKind::TypeMismatch {
            path: NodePath::root(),
            expected: vec![WireType::new("x")],
            actual: vec![WireType::new("y")],
        })
        .with_node(NodeId::from_index(2))
        .with_rank(1)
    }

    #[test]
    fn test_single_diagnostic() {
        let diag = Diagnostic::error("undefined name `summarize`")
            .with_code(ErrorCode::E200)
            .with_label(Span::new(8..17), "not defined")
            .with_help("declare it with `brick`");
        let err = WeftError::new_parse_error(ParseError::from(diag), "compose summarize;");

        let reportables = to_reportables(&err);
        assert_eq!(reportables.len(), 1);

        match &reportables[0] {
            Reportable::Diagnostic(d) => {
                assert_eq!(d.to_string(), "undefined name `summarize`");
            }
            _ => panic!("Expected Diagnostic"),
        }
        assert!(reportables[0].is_error());
    }

    #[test]
    fn test_multiple_diagnostics() {
        let diags = vec![
            Diagnostic::error("first error").with_label(Span::new(0..5), "first"),
            Diagnostic::error("second error")
                .with_label(Span::new(10..15), "second")
                .with_help("help for second"),
        ];
        let err = WeftError::new_parse_error(ParseError::from(diags), "source code here...");

        let reportables = to_reportables(&err);

        assert_eq!(reportables.len(), 2);
        assert_eq!(reportables[0].to_string(), "first error");
        assert_eq!(reportables[1].to_string(), "second error");
    }

    #[test]
    fn test_non_parse_error() {
        let err = WeftError::Config("bad color".to_string());

        let reportables = to_reportables(&err);

        assert_eq!(reportables.len(), 1);
        match &reportables[0] {
            Reportable::Error(e) => {
                assert_eq!(e.to_string(), "Configuration error: bad color");
                assert_eq!(e.code().unwrap().to_string(), "weft::config");
            }
            _ => panic!("Expected Error"),
        }
    }

    #[test]
    fn test_primary_flag_on_labels() {
        let diag = Diagnostic::warning("unused brick `x`")
            .with_label(Span::new(0..5), "primary")
            .with_secondary_label(Span::new(10..15), "secondary");

        let adapter = DiagnosticAdapter::new(&diag, "some source code");

        let labels: Vec<_> = adapter.labels().unwrap().collect();
        assert_eq!(labels.len(), 2);
        assert!(labels[0].primary());
        assert!(!labels[1].primary());
        assert_eq!(adapter.severity(), Some(Severity::Warning));
    }

    #[test]
    fn test_engine_diagnostic_without_source() {
        let diag = mismatch();
        let adapter = EngineAdapter::new(&diag);

        assert_eq!(adapter.code().unwrap().to_string(), "weft::type_mismatch");
        assert_eq!(adapter.severity(), Some(Severity::Error));
        assert_eq!(adapter.help().unwrap().to_string(), "reported at rank 1");
        assert!(adapter.source_code().is_none());
        assert!(adapter.labels().is_none());
    }

    #[test]
    fn test_engine_diagnostic_with_source() {
        let diag = mismatch();
        let adapter = EngineAdapter::new(&diag).with_location("compose a >> b;", Span::new(8..14));

        let labels: Vec<_> = adapter.labels().unwrap().collect();
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].offset(), 8);
        assert_eq!(labels[0].len(), 6);
        assert_eq!(labels[0].label(), Some("type mismatch"));
    }
}
