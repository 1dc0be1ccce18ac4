//! Export of generated documents.
//!
//! This is the last stage of the pipeline:
//!
//! ```text
//! Composition
//!     ↓ validate
//! Diagnostics
//!     ↓ layout, route, aggregate
//! DiagramDocument
//!     ↓ export (this module)
//! SVG text
//! ```
//!
//! Exporters only draw what the document contains; every position comes
//! from the layout and the router.

/// SVG export backend.
pub mod svg;

use crate::document::DiagramDocument;

/// A backend turning a [`DiagramDocument`] into text.
pub trait Exporter {
    /// Renders `document`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Style`] for unusable style settings and
    /// [`Error::Render`] if the document cannot be drawn.
    fn export_document(&self, document: &DiagramDocument) -> Result<String, Error>;
}

/// Errors that can occur during export.
///
/// Converted into [`WeftError`](crate::WeftError) at the crate boundary.
#[derive(Debug)]
pub enum Error {
    /// The style configuration is invalid.
    Style(String),
    /// A rendering failure described by the message.
    Render(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Style(msg) => write!(f, "Style error: {msg}"),
            Self::Render(msg) => write!(f, "Render error: {msg}"),
        }
    }
}

impl std::error::Error for Error {}
