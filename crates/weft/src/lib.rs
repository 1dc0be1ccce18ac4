//! Weft - layout, routing and rendering of string diagrams.
//!
//! A composition is a tree of bricks joined by sequential (`∘`) and
//! parallel (`⊗`) composition. [`Generator::generate`] checks it, lays it
//! out on a rank/track grid, routes the wires, rolls up token costs and
//! renders everything to SVG together with a machine-readable summary.
//!
//! Problems in the composition never abort generation. They come back as
//! [`Diagnostic`](diagnostic::Diagnostic)s attached to the document; only
//! fatal ones skip layout.

pub mod config;
pub mod cost;
pub mod diagnostic;
pub mod document;
pub mod export;
pub mod layout;
pub mod meta;
pub mod route;
pub mod validate;

mod error;
#[cfg(test)]
mod testing;

pub use weft_core::{color, composition, draw, geometry, identifier};
pub use weft_parser::{ParsedDiagram, SourceMap};

pub use error::WeftError;
pub use export::svg::RenderStyle;
pub use route::CrossingPolicy;

use log::{debug, info, trace};

use composition::Expr;
use config::{AppConfig, GenerateOptions};
use document::{DiagramDocument, DocumentSummary};

/// Output of one generation request.
#[derive(Debug, Clone)]
pub struct Generation {
    svg: String,
    document: DiagramDocument,
    summary: DocumentSummary,
}

impl Generation {
    /// The rendered SVG document.
    pub fn svg(&self) -> &str {
        &self.svg
    }

    pub fn document(&self) -> &DiagramDocument {
        &self.document
    }

    /// Per-rank node counts, tokens and diagnostics.
    pub fn summary(&self) -> &DocumentSummary {
        &self.summary
    }

    pub fn into_parts(self) -> (String, DiagramDocument, DocumentSummary) {
        (self.svg, self.document, self.summary)
    }
}

/// Entry point for parsing and generating Weft diagrams.
///
/// # Examples
///
/// ```
/// use weft::{Generator, composition::{Brick, Composition, Grade}, config::GenerateOptions};
///
/// let mut composition = Composition::new();
/// let fetch = composition.leaf(Brick::new("fetch", Grade::Deterministic).with_outputs(&["raw"]));
/// let summarize = composition.leaf(
///     Brick::new("summarize", Grade::Model).with_inputs(&["raw"]).with_outputs(&["text"]),
/// );
/// let root = composition.seq(fetch, summarize);
///
/// let generator = Generator::default();
/// let generation = generator
///     .generate(composition.expr(root), &GenerateOptions::default())
///     .expect("default style is valid");
///
/// assert!(generation.svg().contains("<svg"));
/// assert_eq!(generation.summary().totals.tokens, 200);
/// ```
#[derive(Debug, Default)]
pub struct Generator {
    config: AppConfig,
}

impl Generator {
    /// Create a new generator with the given configuration.
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Parse `.weft` source text.
    ///
    /// # Errors
    ///
    /// Returns [`WeftError::Parse`] with every lexer, parser and elaboration
    /// diagnostic found.
    pub fn parse(&self, source: &str) -> Result<ParsedDiagram, WeftError> {
        info!("Parsing diagram");

        let diagram = weft_parser::parse(source)
            .map_err(|err| WeftError::new_parse_error(err, source))?;

        debug!(
            nodes = diagram.composition().len(),
            warnings = diagram.warnings().len();
            "Diagram parsed successfully"
        );
        Ok(diagram)
    }

    /// Validate, lay out, route, cost and render `expr`.
    ///
    /// # Errors
    ///
    /// Returns [`WeftError::Config`] when the style configuration holds an
    /// invalid color. Problems with the composition itself are reported as
    /// diagnostics in the returned document.
    pub fn generate(
        &self,
        expr: Expr<'_>,
        options: &GenerateOptions,
    ) -> Result<Generation, WeftError> {
        self.generate_titled(expr, None, options)
    }

    /// Validate `expr` and count its bricks and connections, drawing
    /// nothing.
    pub fn check(&self, expr: Expr<'_>, options: &GenerateOptions) -> validate::Check {
        info!(root:% = expr.id(); "Checking composition");
        let check = validate::check(expr, options);
        debug!(
            valid = check.is_valid(),
            bricks = check.bricks(),
            connections = check.connections();
            "Check completed"
        );
        check
    }

    /// Generate a parsed diagram, keeping its title.
    pub fn generate_parsed(
        &self,
        diagram: &ParsedDiagram,
        options: &GenerateOptions,
    ) -> Result<Generation, WeftError> {
        let expr = diagram.composition().expr(diagram.root());
        self.generate_titled(expr, diagram.title(), options)
    }

    /// Generate the diagram of the engine's own stages.
    pub fn generate_meta(&self, options: &GenerateOptions) -> Result<Generation, WeftError> {
        let (composition, root) = meta::composition();
        self.generate_titled(composition.expr(root), Some(meta::TITLE), options)
    }

    /// Like [`Self::generate`], with a title drawn above the diagram.
    pub fn generate_titled(
        &self,
        expr: Expr<'_>,
        title: Option<&str>,
        options: &GenerateOptions,
    ) -> Result<Generation, WeftError> {
        let title = title.map(str::to_string);

        info!(root:% = expr.id(); "Validating composition");
        let diagnostics = validate::validate(expr, options);

        let document = if diagnostics.iter().any(|diagnostic| diagnostic.is_fatal()) {
            info!(diagnostics = diagnostics.len(); "Fatal diagnostics, skipping layout");
            DiagramDocument::fatal(title, diagnostics)
        } else {
            info!("Calculating layout");
            let layout = layout::layout(expr, self.config.layout());

            info!(policy:% = options.crossing_policy(); "Routing wires");
            let routing = route::route(&layout, options.crossing_policy());

            let cost = cost::aggregate(expr, self.config.cost());
            DiagramDocument::new(title, layout, routing, cost, diagnostics)
        };
        trace!(metadata:? = document.metadata(); "Document assembled");

        info!(style:% = options.render_style(); "Rendering SVG");
        let svg = export::svg::render(&document, self.config.style(), options)?;
        let summary = document.summary();

        info!(
            bricks = document.metadata().bricks,
            diagnostics = document.diagnostics().len();
            "Generation completed"
        );
        Ok(Generation {
            svg,
            document,
            summary,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use weft_core::composition::{Composition, NodeId};

    use crate::testing::arb_well_typed;

    fn check_well_typed_renders(composition: &Composition, root: NodeId) {
        let generator = Generator::default();
        let generation = generator
            .generate(composition.expr(root), &GenerateOptions::default())
            .unwrap();

        assert!(!generation.document().has_fatal());
        assert!(!generation.document().is_flagged());
        assert!(generation.document().layout().is_some());
        assert!(generation.svg().contains("class=\"rank\""));
    }

    fn check_generation_is_deterministic(composition: &Composition, root: NodeId) {
        let generator = Generator::default();
        let options = GenerateOptions::default();
        let first = generator.generate(composition.expr(root), &options).unwrap();
        let second = generator.generate(composition.expr(root), &options).unwrap();

        assert_eq!(first.svg(), second.svg());
        assert_eq!(first.summary(), second.summary());
    }

    proptest! {
        #[test]
        fn well_typed_renders((composition, root) in arb_well_typed()) {
            check_well_typed_renders(&composition, root);
        }

        #[test]
        fn generation_is_deterministic((composition, root) in arb_well_typed()) {
            check_generation_is_deterministic(&composition, root);
        }
    }
}
