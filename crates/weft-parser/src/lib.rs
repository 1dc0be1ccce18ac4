//! # Weft Parser
//!
//! Parser for the Weft string-diagram language. This crate turns `.weft`
//! source text into a [`weft_core::composition::Composition`] and the id of
//! the node to draw.
//!
//! ## Language
//!
//! ```text
//! diagram "Ingest";
//!
//! brick fetch "Fetch page": (url) -> (html) grade 0;
//! brick summarize: (html) -> (text) grade 1 tokens 300;
//! brick review: (text) -> (text) grade 2;
//!
//! let pipeline = fetch >> summarize;
//! compose pipeline >> review;
//! ```
//!
//! `>>` (or `∘`) composes sequentially and `*` (or `⊗`) in parallel.
//! Parallel binds tighter than sequential and both associate to the left.
//!
//! ## Usage
//!
//! ```
//! # use weft_parser::{parse, ParseError};
//!
//! fn main() -> Result<(), ParseError> {
//!     let source = r#"
//!         brick a: (x) -> (y);
//!         brick b: (y) -> (z) grade 1;
//!         compose a >> b;
//!     "#;
//!
//!     let diagram = parse(source)?;
//!     assert_eq!(diagram.composition().len(), 3);
//!     Ok(())
//! }
//! ```

mod elaborate;
pub mod error;
mod lexer;
mod parser;
mod parser_types;
mod span;
mod tokens;

pub use elaborate::{ParsedDiagram, SourceMap};
pub use error::ParseError;
pub use span::{Span, Spanned};

use bumpalo::Bump;
use log::debug;

use elaborate::Builder;

/// Parse source text into a composition.
///
/// The pipeline runs in three steps:
///
/// 1. **Tokenize** - Convert source text to tokens
/// 2. **Parse** - Build the statement AST from tokens
/// 3. **Elaborate** - Resolve names and build the shared composition table
///
/// Each step reports every problem it can find before giving up, so the
/// returned [`ParseError`] may carry several diagnostics.
pub fn parse(source: &str) -> Result<ParsedDiagram, ParseError> {
    // Step 1: Tokenize
    let tokens = lexer::tokenize(source)?;
    debug!(tokens = tokens.len(); "Tokenized source");

    // Step 2: Parse
    let arena = Bump::new();
    let document = parser::build_document(&tokens, &arena)?;

    // Step 3: Elaborate
    Builder::new().build(&document)
}
