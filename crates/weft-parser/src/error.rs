//! Diagnostics produced while reading `.weft` source.
//!
//! Every problem found by the lexer, the parser or elaboration is a
//! [`Diagnostic`]: a severity, an optional [`ErrorCode`], a message, labeled
//! source spans and optional help. Phases accumulate diagnostics in a
//! collector so a single run reports as many problems as it can; the caller
//! receives them wrapped in a [`ParseError`].
//!
//! # Example
//!
//! ```
//! # use weft_parser::error::{Diagnostic, ErrorCode};
//! # use weft_parser::Span;
//!
//! let diag = Diagnostic::error("brick `fetch` is defined multiple times")
//!     .with_code(ErrorCode::E201)
//!     .with_label(Span::new(40..45), "duplicate definition")
//!     .with_secondary_label(Span::new(6..11), "first defined here")
//!     .with_help("rename one of the bricks");
//!
//! assert_eq!(diag.to_string(), "error[E201]: brick `fetch` is defined multiple times");
//! ```

mod collector;
mod diagnostic;
mod error_code;
mod parse_error;

pub(crate) use collector::DiagnosticCollector;
pub(crate) use parse_error::Result;

pub use diagnostic::{Diagnostic, Label, Severity};
pub use error_code::ErrorCode;
pub use parse_error::ParseError;
