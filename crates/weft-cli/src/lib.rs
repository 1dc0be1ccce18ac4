//! CLI logic for the Weft diagram tool.
//!
//! [`run`] reads a `.weft` file or a `.toml` composition table, generates the
//! diagram and writes the SVG (and optionally the TOML summary). [`check`]
//! only validates the input. Problems with the composition itself do not
//! fail either call; they come back in the outcome for the caller to report.

pub mod error_adapter;

mod args;
mod config;

pub use args::Args;

use std::{fs, io, path::Path};

use log::{info, warn};

use weft::{
    Generation, Generator, ParsedDiagram, SourceMap, WeftError,
    composition::{CompositionFile, Expr},
    config::{AppConfig, GenerateOptions},
    diagnostic::{self, Severity},
    meta,
    validate::Check,
};
use weft_parser::error::Diagnostic;

use error_adapter::{DiagnosticAdapter, EngineAdapter, Reportable};

/// Source text and node spans of a `.weft` input.
#[derive(Debug)]
struct SourceInfo {
    text: String,
    source_map: SourceMap,
    warnings: Vec<Diagnostic>,
}

/// A loaded input file.
enum Input {
    Table(CompositionFile),
    Source { diagram: ParsedDiagram, text: String },
}

impl Input {
    fn expr(&self) -> Expr<'_> {
        match self {
            Self::Table(file) => file.nodes.expr(file.root),
            Self::Source { diagram, .. } => diagram.composition().expr(diagram.root()),
        }
    }

    fn title(&self) -> Option<&str> {
        match self {
            Self::Table(file) => file.title.as_deref(),
            Self::Source { diagram, .. } => diagram.title(),
        }
    }

    fn into_source(self) -> Option<SourceInfo> {
        match self {
            Self::Table(_) => None,
            Self::Source { diagram, text } => Some(SourceInfo {
                source_map: diagram.source_map().clone(),
                warnings: diagram.warnings().to_vec(),
                text,
            }),
        }
    }
}

/// Result of a successful run.
#[derive(Debug)]
pub struct Outcome {
    generation: Generation,
    source: Option<SourceInfo>,
}

impl Outcome {
    pub fn generation(&self) -> &Generation {
        &self.generation
    }

    /// Returns `true` if the composition could not be laid out.
    pub fn has_fatal(&self) -> bool {
        self.generation.document().has_fatal()
    }

    /// Parser warnings and engine diagnostics of warning severity or above.
    ///
    /// Engine diagnostics point at the source span of their node when the
    /// input was a `.weft` file.
    pub fn reportables(&self) -> Vec<Reportable<'_>> {
        reportables(
            self.generation.document().diagnostics(),
            self.source.as_ref(),
        )
    }
}

/// Result of a successful [`check`].
#[derive(Debug)]
pub struct CheckOutcome {
    check: Check,
    source: Option<SourceInfo>,
}

impl CheckOutcome {
    pub fn check(&self) -> &Check {
        &self.check
    }

    /// Returns `true` when no diagnostic is an error or worse.
    pub fn is_valid(&self) -> bool {
        self.check.is_valid()
    }

    /// Same selection as [`Outcome::reportables`].
    pub fn reportables(&self) -> Vec<Reportable<'_>> {
        reportables(self.check.diagnostics(), self.source.as_ref())
    }
}

fn reportables<'a>(
    diagnostics: &'a [diagnostic::Diagnostic],
    source: Option<&'a SourceInfo>,
) -> Vec<Reportable<'a>> {
    let mut reportables: Vec<Reportable<'a>> = source
        .iter()
        .flat_map(|source| {
            source.warnings.iter().map(|warning| {
                Reportable::Diagnostic(DiagnosticAdapter::new(warning, &source.text))
            })
        })
        .collect();

    for diagnostic in diagnostics {
        if diagnostic.severity() < Severity::Warning {
            continue;
        }
        let mut adapter = EngineAdapter::new(diagnostic);
        if let Some(source) = source {
            if let Some(span) = diagnostic.node().and_then(|id| source.source_map.span(id)) {
                adapter = adapter.with_location(&source.text, span);
            }
        }
        reportables.push(Reportable::Engine(adapter));
    }
    reportables
}

/// Run the Weft CLI application
///
/// # Errors
///
/// Returns `WeftError` for:
/// - File I/O errors
/// - Configuration loading errors, including a malformed composition table
/// - Parsing errors
/// - Rendering errors
pub fn run(args: &Args) -> Result<Outcome, WeftError> {
    let app_config = config::load_config(args.config.as_ref())?;
    let options = generate_options(&app_config, args);
    let generator = Generator::new(app_config);

    let (generation, source) = match (&args.input, args.meta) {
        (_, true) => {
            info!(output_path = args.output; "Generating meta diagram");
            (generator.generate_meta(&options)?, None)
        }
        (Some(input), false) => {
            info!(
                input_path = input,
                output_path = args.output;
                "Processing diagram"
            );
            let input = read_input(&generator, Path::new(input))?;
            let generation = generator.generate_titled(input.expr(), input.title(), &options)?;
            (generation, input.into_source())
        }
        (None, false) => return Err(missing_input()),
    };

    fs::write(&args.output, generation.svg())?;
    info!(output_file = args.output; "SVG exported successfully");

    if let Some(summary_path) = &args.summary {
        let summary = toml::to_string(generation.summary())
            .map_err(|err| WeftError::Render(err.to_string()))?;
        fs::write(summary_path, summary)?;
        info!(summary_file = summary_path; "Summary exported successfully");
    }

    if generation.document().has_fatal() {
        warn!("Composition could not be laid out, wrote an empty canvas");
    }

    Ok(Outcome { generation, source })
}

/// Validate the input without laying it out. The output path is ignored;
/// `--summary` receives the check result as TOML.
///
/// # Errors
///
/// Returns `WeftError` for the same input problems as [`run`].
pub fn check(args: &Args) -> Result<CheckOutcome, WeftError> {
    let app_config = config::load_config(args.config.as_ref())?;
    let options = generate_options(&app_config, args);
    let generator = Generator::new(app_config);

    let (check, source) = match (&args.input, args.meta) {
        (_, true) => {
            let (composition, root) = meta::composition();
            (generator.check(composition.expr(root), &options), None)
        }
        (Some(input), false) => {
            info!(input_path = input; "Checking diagram");
            let input = read_input(&generator, Path::new(input))?;
            let check = generator.check(input.expr(), &options);
            (check, input.into_source())
        }
        (None, false) => return Err(missing_input()),
    };

    if let Some(summary_path) = &args.summary {
        let summary = toml::to_string(&check.summary())
            .map_err(|err| WeftError::Render(err.to_string()))?;
        fs::write(summary_path, summary)?;
        info!(summary_file = summary_path; "Check result exported successfully");
    }

    Ok(CheckOutcome { check, source })
}

fn missing_input() -> WeftError {
    WeftError::Io(io::Error::new(
        io::ErrorKind::InvalidInput,
        "no input file given",
    ))
}

/// Configuration defaults overridden by command-line flags.
fn generate_options(config: &AppConfig, args: &Args) -> GenerateOptions {
    let mut options = config.generate().clone();
    if args.no_cost {
        options = options.with_cost_annotations(false);
    }
    if let Some(policy) = args.crossing_policy {
        options = options.with_crossing_policy(policy);
    }
    if let Some(max_depth) = args.max_depth {
        options = options.with_max_depth(max_depth);
    }
    if let Some(render_style) = args.render_style {
        options = options.with_render_style(render_style);
    }
    options
}

/// Reads a `.toml` composition table or parses `.weft` source.
fn read_input(generator: &Generator, path: &Path) -> Result<Input, WeftError> {
    let text = fs::read_to_string(path)?;

    if path.extension().and_then(|ext| ext.to_str()) == Some("toml") {
        let file: CompositionFile = toml::from_str(&text).map_err(|err| {
            WeftError::Config(format!(
                "Malformed composition table {}: {}",
                path.display(),
                err.message()
            ))
        })?;
        return Ok(Input::Table(file));
    }

    let diagram = generator.parse(&text)?;
    Ok(Input::Source { diagram, text })
}
