//! Configuration types for Weft diagram generation.
//!
//! This module provides configuration structures that control how diagrams
//! are laid out, styled and costed. All types implement
//! [`serde::Deserialize`] for loading from external sources; every section
//! and every field may be omitted.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining all sections.
//! - [`LayoutConfig`] - Box sizes and spacing of the rank/track grid.
//! - [`StyleConfig`] - Colors and fonts of the rendered SVG.
//! - [`CostConfig`] - Default token cost per grade.
//! - [`GenerateOptions`] - Per-request options of [`Generator::generate`].
//!
//! # Example
//!
//! ```
//! # use weft::config::AppConfig;
//! let config: AppConfig = toml::from_str(r#"
//!     [layout]
//!     rank_gap = 96.0
//!
//!     [cost]
//!     grade1_tokens = 150
//!
//!     [generate]
//!     crossing_policy = "ignore"
//! "#).unwrap();
//!
//! assert_eq!(config.layout().rank_gap(), 96.0);
//! assert_eq!(config.cost().grade1_tokens(), 150);
//! assert_eq!(config.cost().grade2_tokens(), 500);
//! assert!(config.style().background_color().is_ok());
//! ```
//!
//! [`Generator::generate`]: crate::Generator::generate

use serde::Deserialize;

use weft_core::{color::Color, composition::Grade};

use crate::{export::svg::RenderStyle, route::CrossingPolicy};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    layout: LayoutConfig,

    #[serde(default)]
    style: StyleConfig,

    #[serde(default)]
    cost: CostConfig,

    /// Defaults for every [`GenerateOptions`] field.
    #[serde(default)]
    generate: GenerateOptions,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] from its sections.
    pub fn new(
        layout: LayoutConfig,
        style: StyleConfig,
        cost: CostConfig,
        generate: GenerateOptions,
    ) -> Self {
        Self {
            layout,
            style,
            cost,
            generate,
        }
    }

    pub fn layout(&self) -> &LayoutConfig {
        &self.layout
    }

    pub fn style(&self) -> &StyleConfig {
        &self.style
    }

    pub fn cost(&self) -> &CostConfig {
        &self.cost
    }

    /// Returns the default generation options.
    pub fn generate(&self) -> &GenerateOptions {
        &self.generate
    }

    /// Replaces the default generation options.
    pub fn with_generate(mut self, generate: GenerateOptions) -> Self {
        self.generate = generate;
        self
    }
}

/// Geometry of the rank/track grid.
///
/// | Field | Default | Meaning |
/// |-------|---------|---------|
/// | `min_box_width` | `96` | Narrowest brick box |
/// | `min_box_height` | `48` | Height of one track row |
/// | `rank_gap` | `72` | Horizontal gap between rank columns, where wires jog |
/// | `track_gap` | `24` | Vertical gap between track rows |
/// | `padding` | `24` | Canvas margin |
/// | `port_spacing` | `16` | Minimum vertical distance between ports |
/// | `font_size` | `13` | Label font size, also used for width estimates |
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    min_box_width: f32,
    min_box_height: f32,
    rank_gap: f32,
    track_gap: f32,
    padding: f32,
    port_spacing: f32,
    font_size: u16,
}

impl LayoutConfig {
    pub fn min_box_width(&self) -> f32 {
        self.min_box_width
    }

    pub fn min_box_height(&self) -> f32 {
        self.min_box_height
    }

    pub fn rank_gap(&self) -> f32 {
        self.rank_gap
    }

    pub fn track_gap(&self) -> f32 {
        self.track_gap
    }

    pub fn padding(&self) -> f32 {
        self.padding
    }

    pub fn port_spacing(&self) -> f32 {
        self.port_spacing
    }

    pub fn font_size(&self) -> u16 {
        self.font_size
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            min_box_width: 96.0,
            min_box_height: 48.0,
            rank_gap: 72.0,
            track_gap: 24.0,
            padding: 24.0,
            port_spacing: 16.0,
            font_size: 13,
        }
    }
}

/// Visual styling of rendered diagrams.
///
/// Colors are CSS color strings. Fields that are not set fall back to
/// renderer defaults.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct StyleConfig {
    #[serde(default)]
    background_color: Option<String>,

    #[serde(default)]
    font_family: Option<String>,

    #[serde(default)]
    box_fill: Option<String>,

    #[serde(default)]
    box_stroke: Option<String>,
}

impl StyleConfig {
    /// Returns the parsed background [`Color`], or `None` if no color is configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured color string cannot be parsed
    /// into a valid [`Color`].
    pub fn background_color(&self) -> Result<Option<Color>, String> {
        parse_color(self.background_color.as_deref(), "background color")
    }

    /// Returns the parsed box fill [`Color`].
    pub fn box_fill(&self) -> Result<Option<Color>, String> {
        parse_color(self.box_fill.as_deref(), "box fill")
    }

    /// Returns the parsed box stroke [`Color`].
    pub fn box_stroke(&self) -> Result<Option<Color>, String> {
        parse_color(self.box_stroke.as_deref(), "box stroke")
    }

    /// Returns the configured font family, if any.
    pub fn font_family(&self) -> Option<&str> {
        self.font_family.as_deref()
    }
}

fn parse_color(value: Option<&str>, what: &str) -> Result<Option<Color>, String> {
    value
        .map(Color::new)
        .transpose()
        .map_err(|err| format!("Invalid {what} in config: {err}"))
}

/// Default token estimates for graded bricks without their own estimate.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CostConfig {
    grade1_tokens: u64,
    grade2_tokens: u64,
}

impl CostConfig {
    pub fn new(grade1_tokens: u64, grade2_tokens: u64) -> Self {
        Self {
            grade1_tokens,
            grade2_tokens,
        }
    }

    pub fn grade1_tokens(&self) -> u64 {
        self.grade1_tokens
    }

    pub fn grade2_tokens(&self) -> u64 {
        self.grade2_tokens
    }

    /// Token cost of a brick of `grade` that carries no estimate of its own.
    pub fn default_tokens(&self, grade: Grade) -> u64 {
        match grade {
            Grade::Deterministic => 0,
            Grade::Model => self.grade1_tokens,
            Grade::Human => self.grade2_tokens,
        }
    }
}

impl Default for CostConfig {
    fn default() -> Self {
        Self::new(200, 500)
    }
}

/// Options of a single generation request.
///
/// ```
/// # use weft::{config::GenerateOptions, CrossingPolicy};
/// let options: GenerateOptions = toml::from_str("max_depth = 32").unwrap();
/// assert_eq!(options.max_depth(), 32);
/// assert!(options.include_cost_annotations());
/// assert_eq!(options.crossing_policy(), CrossingPolicy::Minimize);
/// assert!(!options.unique_wire_names());
/// assert_eq!(options.render_style(), weft::RenderStyle::Box);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GenerateOptions {
    include_cost_annotations: bool,
    max_depth: usize,
    crossing_policy: CrossingPolicy,
    unique_wire_names: bool,
    /// Upper bound on laid-out brick occurrences, after shared nodes are
    /// expanded.
    max_occurrences: usize,
    render_style: RenderStyle,
}

impl GenerateOptions {
    pub fn include_cost_annotations(&self) -> bool {
        self.include_cost_annotations
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn crossing_policy(&self) -> CrossingPolicy {
        self.crossing_policy
    }

    pub fn unique_wire_names(&self) -> bool {
        self.unique_wire_names
    }

    pub fn max_occurrences(&self) -> usize {
        self.max_occurrences
    }

    pub fn render_style(&self) -> RenderStyle {
        self.render_style
    }

    pub fn with_cost_annotations(mut self, include: bool) -> Self {
        self.include_cost_annotations = include;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_crossing_policy(mut self, policy: CrossingPolicy) -> Self {
        self.crossing_policy = policy;
        self
    }

    pub fn with_unique_wire_names(mut self, unique: bool) -> Self {
        self.unique_wire_names = unique;
        self
    }

    pub fn with_max_occurrences(mut self, max_occurrences: usize) -> Self {
        self.max_occurrences = max_occurrences;
        self
    }

    pub fn with_render_style(mut self, render_style: RenderStyle) -> Self {
        self.render_style = render_style;
        self
    }
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            include_cost_annotations: true,
            max_depth: 256,
            crossing_policy: CrossingPolicy::Minimize,
            unique_wire_names: false,
            max_occurrences: 10_000,
            render_style: RenderStyle::Box,
        }
    }
}
