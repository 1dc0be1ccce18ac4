//! SVG rendering of diagram documents.
//!
//! The document is drawn top to bottom as an optional title band, the
//! layout canvas and an optional footer with cost annotations, the grade
//! legend and diagnostic notes. Inside the canvas, wires share one group
//! and every rank gets its own `<g class="rank" data-rank="r">` holding the
//! drawings of its bricks.
//!
//! Two [`RenderStyle`]s share layout and routing. [`RenderStyle::Box`] draws
//! every brick as a labelled box with ports and a grade badge.
//! [`RenderStyle::Compact`] draws a grade-filled node with the label below
//! it, and widens each wire with the tokens its source brick spends.
//!
//! Output only depends on the document and the style, so equal inputs give
//! byte-identical SVG.

use std::{fmt, str::FromStr};

use log::{debug, info};
use serde::{Deserialize, Serialize};
use svg::{
    Document,
    node::{
        Text as SvgText,
        element::{self as svg_element, path::Data},
    },
};

use weft_core::{
    apply_stroke,
    color::Color,
    composition::{Grade, NodeId},
    draw::{LayeredOutput, RenderLayer, StrokeDefinition, StrokeStyle, TextDefinition},
    geometry::{Bounds, Insets, Point, Size},
};

use super::{Error, Exporter};
use crate::{
    config::{GenerateOptions, StyleConfig},
    cost::CostSummary,
    diagnostic::{Diagnostic, Severity},
    document::DiagramDocument,
    layout::{Layout, LayoutNode},
    route::{Crossing, CrossingKind, RoutedWire, WireEnd},
};

const GRADE_COLORS: [&str; 3] = ["#10b981", "#8b5cf6", "#ef4444"];
const GRADE_NAMES: [&str; 3] = ["deterministic", "model", "human"];
const MISMATCH_COLOR: &str = "#dc2626";
const DEFAULT_BACKGROUND: &str = "#ffffff";
const DEFAULT_BOX_FILL: &str = "#f8fafc";
const TEXT_COLOR: &str = "#1f2937";
const MUTED_COLOR: &str = "#6b7280";

const WIRE_WIDTH: f32 = 2.0;
/// Width of the wire with the largest token flow in compact style.
const MAX_FLOW_WIDTH: f32 = 8.0;
const NODE_RADIUS: f32 = 18.0;
const BOX_STROKE_WIDTH: f32 = 1.5;
const PORT_RADIUS: f32 = 3.0;
const CROSSING_RADIUS: f32 = 5.0;
/// Tint and margin of the band behind a rank with an error.
const FLAG_ALPHA: f32 = 0.08;
const FLAG_PADDING: f32 = 6.0;
const BADGE_SIZE: Size = Size::new(24.0, 14.0);
/// Line pitch of title and footer text, in font sizes.
const LINE_SPACING: f32 = 1.6;
/// Horizontal margin of footer text.
const MARGIN: f32 = 16.0;
/// Narrowest canvas for a document that could not be laid out.
const MIN_FATAL_WIDTH: f32 = 320.0;

/// How bricks and wires are drawn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderStyle {
    /// Labelled boxes with ports and grade badges.
    #[default]
    Box,
    /// Grade-filled nodes and wires as wide as their token flow.
    Compact,
}

impl fmt::Display for RenderStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Box => write!(f, "box"),
            Self::Compact => write!(f, "compact"),
        }
    }
}

impl FromStr for RenderStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "box" => Ok(Self::Box),
            "compact" => Ok(Self::Compact),
            _ => Err(format!("unknown render style `{s}`")),
        }
    }
}

/// Builder for [`Svg`].
#[derive(Debug)]
pub struct SvgBuilder<'a> {
    style: Option<&'a StyleConfig>,
    include_cost_annotations: bool,
    render_style: RenderStyle,
}

impl<'a> SvgBuilder<'a> {
    pub fn new() -> Self {
        Self {
            style: None,
            include_cost_annotations: true,
            render_style: RenderStyle::default(),
        }
    }

    pub fn with_style(mut self, style: &'a StyleConfig) -> Self {
        self.style = Some(style);
        self
    }

    /// Draws per-rank tokens, cost totals and the grade legend.
    pub fn with_cost_annotations(mut self, include: bool) -> Self {
        self.include_cost_annotations = include;
        self
    }

    pub fn with_render_style(mut self, render_style: RenderStyle) -> Self {
        self.render_style = render_style;
        self
    }

    /// Resolves the style into concrete colors.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Style`] when a configured color does not parse.
    pub fn build(self) -> Result<Svg, Error> {
        let style = self.style.cloned().unwrap_or_default();
        let background = style.background_color().map_err(Error::Style)?;
        let box_fill = style.box_fill().map_err(Error::Style)?;
        let box_stroke = style.box_stroke().map_err(Error::Style)?;

        let mut grade_colors = [Color::default(); 3];
        for (slot, value) in grade_colors.iter_mut().zip(GRADE_COLORS) {
            *slot = builtin_color(value)?;
        }

        Ok(Svg {
            background: background.map_or_else(|| builtin_color(DEFAULT_BACKGROUND), Ok)?,
            box_fill: box_fill.map_or_else(|| builtin_color(DEFAULT_BOX_FILL), Ok)?,
            box_stroke,
            text_color: builtin_color(TEXT_COLOR)?,
            muted_color: builtin_color(MUTED_COLOR)?,
            mismatch_color: builtin_color(MISMATCH_COLOR)?,
            grade_colors,
            font_family: style.font_family().map(str::to_string),
            include_cost_annotations: self.include_cost_annotations,
            render_style: self.render_style,
        })
    }
}

impl Default for SvgBuilder<'_> {
    fn default() -> Self {
        Self::new()
    }
}

fn builtin_color(value: &str) -> Result<Color, Error> {
    Color::new(value).map_err(Error::Render)
}

/// SVG exporter with a resolved style.
#[derive(Debug, Clone)]
pub struct Svg {
    background: Color,
    box_fill: Color,
    /// `None` strokes each box in its grade color.
    box_stroke: Option<Color>,
    text_color: Color,
    muted_color: Color,
    mismatch_color: Color,
    grade_colors: [Color; 3],
    font_family: Option<String>,
    include_cost_annotations: bool,
    render_style: RenderStyle,
}

impl Exporter for Svg {
    fn export_document(&self, document: &DiagramDocument) -> Result<String, Error> {
        let svg = self.render_document(document).to_string();
        debug!(bytes = svg.len(); "SVG document rendered");
        Ok(svg)
    }
}

/// Renders `document` with `style`, drawn the way `options` ask.
///
/// # Errors
///
/// Returns [`Error::Style`] when the style holds an invalid color.
pub fn render(
    document: &DiagramDocument,
    style: &StyleConfig,
    options: &GenerateOptions,
) -> Result<String, Error> {
    SvgBuilder::new()
        .with_style(style)
        .with_cost_annotations(options.include_cost_annotations())
        .with_render_style(options.render_style())
        .build()?
        .export_document(document)
}

impl Svg {
    /// Builds the SVG tree of `document`.
    pub fn render_document(&self, document: &DiagramDocument) -> Document {
        let font_size = document
            .layout()
            .map_or(TextDefinition::default_borrowed().font_size(), Layout::font_size);
        let text = self.text_definition(font_size, self.text_color);
        let line = f32::from(font_size) * LINE_SPACING;

        match document.layout() {
            Some(layout) => self.render_diagram(document, layout, &text, line),
            None => self.render_fatal(document, &text, line),
        }
    }

    fn render_diagram(
        &self,
        document: &DiagramDocument,
        layout: &Layout,
        text: &TextDefinition,
        line: f32,
    ) -> Document {
        let canvas = layout.size();
        let header = if document.title().is_some() { 2.0 * line } else { 0.0 };

        let mut footer_lines = Vec::new();
        let cost = document
            .cost()
            .filter(|_| self.include_cost_annotations);
        if let Some(cost) = cost {
            footer_lines.push(FooterLine::plain(totals_line(cost)));
        }
        footer_lines.extend(
            document
                .diagnostics()
                .iter()
                .filter(|diagnostic| diagnostic.severity() >= Severity::Warning)
                .map(FooterLine::diagnostic),
        );
        // Rank costs and the legend take one row each.
        let extra_rows = if cost.is_some() { 2 } else { 0 };
        let rows = footer_lines.len() + extra_rows;
        let footer = if rows == 0 {
            0.0
        } else {
            (rows as f32 + 0.5) * line
        };

        let widest = footer_lines
            .iter()
            .map(|footer_line| text.estimate_size(&footer_line.text).width() + 2.0 * MARGIN)
            .fold(canvas.width(), f32::max);
        let size = Size::new(widest, header + canvas.height() + footer);
        info!(
            width = size.width(),
            height = size.height(),
            style:% = self.render_style;
            "Rendering diagram"
        );

        let mut doc = self.new_document(size);
        doc = doc.add(self.marker_definitions());
        if let Some(title) = document.title() {
            doc = doc.add(self.render_title(title, size.width(), line));
        }

        let mut canvas_group = svg_element::Group::new()
            .set("class", "canvas")
            .set("transform", format!("translate(0, {header})"));
        canvas_group = canvas_group.add(self.render_wires(document, layout));
        for rank in 0..layout.rank_count() {
            canvas_group = canvas_group.add(self.render_rank(document, layout, rank, text));
        }
        canvas_group = canvas_group.add(self.render_crossings(document.routing().crossings()));
        doc = doc.add(canvas_group);

        if rows > 0 {
            let mut footer_group = svg_element::Group::new()
                .set("class", "footer")
                .set("transform", format!("translate(0, {})", header + canvas.height()));
            let mut y = line * 0.5;
            if let Some(cost) = cost {
                footer_group = footer_group.add(self.render_rank_costs(cost, layout, y, text));
                y += line;
            }
            for footer_line in &footer_lines {
                let color = footer_line.color(self);
                footer_group =
                    footer_group.add(self.text_line(&footer_line.text, MARGIN, y, color, text));
                y += line;
            }
            if cost.is_some() {
                footer_group = footer_group.add(self.render_legend(y, text));
            }
            doc = doc.add(footer_group);
        }
        doc
    }

    /// An empty canvas listing the diagnostics that stopped the pipeline.
    fn render_fatal(&self, document: &DiagramDocument, text: &TextDefinition, line: f32) -> Document {
        let mut lines = vec![FooterLine::plain(
            "The composition could not be laid out.".to_string(),
        )];
        lines.extend(document.diagnostics().iter().map(FooterLine::diagnostic));

        let header = if document.title().is_some() { 2.0 * line } else { 0.0 };
        let width = lines
            .iter()
            .map(|footer_line| text.estimate_size(&footer_line.text).width() + 2.0 * MARGIN)
            .fold(MIN_FATAL_WIDTH, f32::max);
        let size = Size::new(width, header + (lines.len() as f32 + 1.0) * line);
        info!(diagnostics = document.diagnostics().len(); "Rendering empty canvas");

        let mut doc = self.new_document(size);
        if let Some(title) = document.title() {
            doc = doc.add(self.render_title(title, size.width(), line));
        }
        let mut group = svg_element::Group::new().set("class", "diagnostics");
        let mut y = header + line;
        for footer_line in &lines {
            let color = footer_line.color(self);
            group = group.add(self.text_line(&footer_line.text, MARGIN, y, color, text));
            y += line;
        }
        doc.add(group)
    }

    fn new_document(&self, size: Size) -> Document {
        let background = svg_element::Rectangle::new()
            .set("x", 0)
            .set("y", 0)
            .set("width", size.width())
            .set("height", size.height())
            .set("fill", self.background);

        Document::new()
            .set("xmlns", "http://www.w3.org/2000/svg")
            .set(
                "viewBox",
                format!("0 0 {} {}", size.width(), size.height()),
            )
            .set("width", size.width())
            .set("height", size.height())
            .add(background)
    }

    fn render_title(&self, title: &str, width: f32, line: f32) -> svg_element::Text {
        let font_size = TextDefinition::default_borrowed().font_size() + 4;
        let style = self.text_definition(font_size, self.text_color);
        style
            .render_centered(title, Point::new(width / 2.0, line))
            .set("class", "title")
            .set("font-weight", "bold")
    }

    /// One arrowhead per grade color, plus one for mismatched wires.
    fn marker_definitions(&self) -> svg_element::Definitions {
        let mut defs = svg_element::Definitions::new();
        let markers = Grade::ALL
            .iter()
            .map(|grade| (grade_marker_id(*grade), self.grade_color(*grade)))
            .chain([("arrow-mismatch".to_string(), self.mismatch_color)]);
        for (id, color) in markers {
            let head = svg_element::Path::new()
                .set("d", "M 0 0 L 10 5 L 0 10 z")
                .set("fill", color);
            let marker = svg_element::Marker::new()
                .set("id", id)
                .set("viewBox", "0 0 10 10")
                .set("refX", 10)
                .set("refY", 5)
                .set("markerWidth", 6)
                .set("markerHeight", 6)
                .set("orient", "auto")
                .add(head);
            defs = defs.add(marker);
        }
        defs
    }

    fn render_wires(&self, document: &DiagramDocument, layout: &Layout) -> svg_element::Group {
        let wires = document.routing().wires();
        let flows: Vec<u64> = match (self.render_style, document.cost()) {
            (RenderStyle::Compact, Some(cost)) => wires
                .iter()
                .map(|wire| {
                    source_node(wire, layout)
                        .and_then(|node| cost.tokens_of(node))
                        .unwrap_or(0)
                })
                .collect(),
            _ => vec![0; wires.len()],
        };
        let max_flow = flows.iter().copied().max().unwrap_or(0);

        let mut group = svg_element::Group::new().set("class", "wires");
        for (wire, &flow) in wires.iter().zip(&flows) {
            let Some((first, rest)) = wire.path().split_first() else {
                continue;
            };
            let mut data = Data::new().move_to((first.x(), first.y()));
            for point in rest {
                data = data.line_to((point.x(), point.y()));
            }

            let width = flow_width(flow, max_flow);
            let (stroke, marker, class) = if wire.is_mismatched() {
                (
                    StrokeDefinition::dashed(self.mismatch_color, width),
                    "arrow-mismatch".to_string(),
                    "wire mismatched",
                )
            } else {
                (
                    StrokeDefinition::new(self.grade_color(wire.grade()), width)
                        .with_style(StrokeStyle::for_grade(wire.grade())),
                    grade_marker_id(wire.grade()),
                    "wire",
                )
            };

            let mut path = apply_stroke!(svg_element::Path::new(), &stroke)
                .set("d", data)
                .set("fill", "none")
                .set("class", class)
                .set("data-wire", wire.id().to_string())
                .set("data-tag", wire.tag().to_string());
            if let WireEnd::Port(_) = wire.to_port() {
                path = path.set("marker-end", format!("url(#{marker})"));
            }
            if let WireEnd::Port(from) = wire.from_port() {
                if let Some(node) = layout.nodes().get(from.node) {
                    path = path.set("data-from-rank", node.rank());
                }
            }
            group = group.add(path);

            if flow > 0 && self.include_cost_annotations {
                if let Some(at) = midpoint(wire.path()) {
                    let label = self
                        .text_definition(9, self.grade_color(wire.grade()))
                        .render_centered(&format!("{flow}t"), at.with_y(at.y() - width))
                        .set("class", "wire-tokens")
                        .set("data-wire", wire.id().to_string());
                    group = group.add(label);
                }
            }
        }
        group
    }

    fn render_rank(
        &self,
        document: &DiagramDocument,
        layout: &Layout,
        rank: usize,
        text: &TextDefinition,
    ) -> svg_element::Group {
        let flagged = document.diagnostics().iter().any(|diagnostic| {
            diagnostic.rank() == Some(rank) && diagnostic.severity() >= Severity::Error
        });
        let mut output = LayeredOutput::new();
        let mut band: Option<Bounds> = None;
        for node in layout.nodes().iter().filter(|node| node.rank() == rank) {
            self.render_node(node, text, &mut output);
            band = Some(band.map_or(node.bounds(), |band| band.merge(&node.bounds())));
        }
        if let Some(band) = band.filter(|_| flagged) {
            let band = band.add_padding(Insets::uniform(FLAG_PADDING));
            let rect = svg_element::Rectangle::new()
                .set("x", band.min_x())
                .set("y", band.min_y())
                .set("width", band.width())
                .set("height", band.height())
                .set("fill", self.mismatch_color.with_alpha(FLAG_ALPHA))
                .set("class", "flag");
            output.add_to_layer(RenderLayer::Background, Box::new(rect));
        }

        let mut group = svg_element::Group::new()
            .set("class", if flagged { "rank flagged" } else { "rank" })
            .set("data-rank", rank);
        for node in output.render() {
            group = group.add(node);
        }
        group
    }

    fn render_node(&self, node: &LayoutNode, text: &TextDefinition, output: &mut LayeredOutput) {
        match self.render_style {
            RenderStyle::Box => self.render_box(node, text, output),
            RenderStyle::Compact => self.render_compact(node, text, output),
        }
    }

    /// A grade-filled circle with legs to its ports and the label below.
    fn render_compact(
        &self,
        node: &LayoutNode,
        text: &TextDefinition,
        output: &mut LayeredOutput,
    ) {
        let bounds = node.bounds();
        let center = bounds.center();
        let radius = NODE_RADIUS.min(bounds.width().min(bounds.height()) / 2.0 - 4.0);
        let grade_color = self.grade_color(node.grade());
        let leg = StrokeDefinition::new(self.text_color, BOX_STROKE_WIDTH);

        // Legs go first so the circle covers their inner ends.
        for port in node.inputs().iter().chain(node.outputs()) {
            let line = apply_stroke!(svg_element::Line::new(), &leg)
                .set("x1", port.position().x())
                .set("y1", port.position().y())
                .set("x2", center.x())
                .set("y2", center.y())
                .set("class", "leg")
                .set("data-tag", port.tag().to_string());
            output.add_to_layer(RenderLayer::Box, Box::new(line));
        }

        let outline = self.box_stroke.unwrap_or(self.text_color);
        let stroke = StrokeDefinition::new(outline, BOX_STROKE_WIDTH);
        let circle = apply_stroke!(svg_element::Circle::new(), &stroke)
            .set("cx", center.x())
            .set("cy", center.y())
            .set("r", radius)
            .set("fill", grade_color)
            .set("class", "node")
            .set("data-node", node.node().index())
            .set("data-track", node.track());
        output.add_to_layer(RenderLayer::Box, Box::new(circle));

        let grade = self
            .text_definition(text.font_size(), self.background)
            .render_centered(&format!("G{}", node.grade()), center)
            .set("class", "grade")
            .set("font-weight", "bold");
        output.add_to_layer(RenderLayer::Badge, Box::new(grade));

        let label_at = center.with_y(center.y() + radius + f32::from(text.font_size()));
        let label = text
            .render_centered(node.label(), label_at)
            .set("class", "label");
        output.add_to_layer(RenderLayer::Text, Box::new(label));
    }

    fn render_box(&self, node: &LayoutNode, text: &TextDefinition, output: &mut LayeredOutput) {
        let bounds = node.bounds();
        let grade_color = self.grade_color(node.grade());
        let stroke = StrokeDefinition::new(self.box_stroke.unwrap_or(grade_color), BOX_STROKE_WIDTH);

        let rect = apply_stroke!(svg_element::Rectangle::new(), &stroke)
            .set("x", bounds.min_x())
            .set("y", bounds.min_y())
            .set("width", bounds.width())
            .set("height", bounds.height())
            .set("rx", 4)
            .set("fill", self.box_fill)
            .set("class", "brick")
            .set("data-node", node.node().index())
            .set("data-track", node.track());
        output.add_to_layer(RenderLayer::Box, Box::new(rect));

        for (side, ports) in [("input", node.inputs()), ("output", node.outputs())] {
            for port in ports {
                let circle = svg_element::Circle::new()
                    .set("cx", port.position().x())
                    .set("cy", port.position().y())
                    .set("r", PORT_RADIUS)
                    .set("fill", self.background)
                    .set("stroke", self.text_color)
                    .set("class", format!("port {side}"))
                    .set("data-tag", port.tag().to_string());
                output.add_to_layer(RenderLayer::Port, Box::new(circle));
            }
        }

        let badge_origin = Point::new(
            bounds.max_x() - BADGE_SIZE.width() - 4.0,
            bounds.min_y() + 4.0,
        );
        let badge = svg_element::Rectangle::new()
            .set("x", badge_origin.x())
            .set("y", badge_origin.y())
            .set("width", BADGE_SIZE.width())
            .set("height", BADGE_SIZE.height())
            .set("rx", 3)
            .set("fill", grade_color)
            .set("class", "badge");
        output.add_to_layer(RenderLayer::Badge, Box::new(badge));

        let badge_text = self.text_definition(9, self.background).render_centered(
            &node.grade().to_string(),
            Point::new(
                badge_origin.x() + BADGE_SIZE.width() / 2.0,
                badge_origin.y() + BADGE_SIZE.height() / 2.0,
            ),
        );
        output.add_to_layer(RenderLayer::Badge, Box::new(badge_text));

        let label = text
            .render_centered(node.label(), bounds.center())
            .set("class", "label");
        output.add_to_layer(RenderLayer::Text, Box::new(label));
    }

    fn render_crossings(&self, crossings: &[Crossing]) -> svg_element::Group {
        let mut group = svg_element::Group::new().set("class", "crossings");
        for crossing in crossings {
            let (first, second) = crossing.wires();
            let marker = svg_element::Circle::new()
                .set("cx", crossing.at().x())
                .set("cy", crossing.at().y())
                .set("r", CROSSING_RADIUS)
                .set("fill", "none")
                .set("stroke", self.muted_color)
                .set("class", match crossing.kind() {
                    CrossingKind::Cross => "crossing",
                    CrossingKind::Overlap => "overlap",
                })
                .set("data-wires", format!("{first} {second}"));
            group = group.add(marker);
        }
        group
    }

    fn render_rank_costs(
        &self,
        cost: &CostSummary,
        layout: &Layout,
        y: f32,
        text: &TextDefinition,
    ) -> svg_element::Group {
        let style = self.text_definition(text.font_size().saturating_sub(2), self.muted_color);
        let mut group = svg_element::Group::new().set("class", "rank-costs");
        for (rank_cost, column) in cost.per_rank_costs().iter().zip(layout.columns()) {
            let center = Point::new(column.x() + column.width() / 2.0, y);
            let label = style
                .render_centered(&format!("{} tokens", rank_cost.tokens), center)
                .set("data-rank", rank_cost.rank);
            group = group.add(label);
        }
        group
    }

    fn render_legend(&self, y: f32, text: &TextDefinition) -> svg_element::Group {
        let mut group = svg_element::Group::new().set("class", "legend");
        let mut x = MARGIN;
        for grade in Grade::ALL {
            let color = self.grade_color(grade);
            let stroke = grade_stroke(color, grade);
            let swatch = apply_stroke!(svg_element::Line::new(), &stroke)
                .set("x1", x)
                .set("y1", y)
                .set("x2", x + 24.0)
                .set("y2", y);
            group = group.add(swatch);

            let caption = format!("{grade} {}", GRADE_NAMES[usize::from(grade.level())]);
            group = group.add(self.text_line(&caption, x + 30.0, y, self.text_color, text));
            x += 30.0 + text.estimate_size(&caption).width() + MARGIN;
        }
        group
    }

    fn text_line(
        &self,
        content: &str,
        x: f32,
        y: f32,
        color: Color,
        text: &TextDefinition,
    ) -> svg_element::Text {
        svg_element::Text::new(String::new())
            .set("x", x)
            .set("y", y)
            .set("font-family", text.font_family())
            .set("font-size", text.font_size())
            .set("dominant-baseline", "central")
            .set("fill", color)
            .add(SvgText::new(content))
    }

    fn text_definition(&self, font_size: u16, color: Color) -> TextDefinition {
        let mut text = TextDefinition::new();
        text.set_font_size(font_size);
        text.set_color(Some(color));
        if let Some(family) = &self.font_family {
            text.set_font_family(family);
        }
        text
    }

    fn grade_color(&self, grade: Grade) -> Color {
        self.grade_colors[usize::from(grade.level())]
    }
}

fn grade_stroke(color: Color, grade: Grade) -> StrokeDefinition {
    StrokeDefinition::new(color, WIRE_WIDTH).with_style(StrokeStyle::for_grade(grade))
}

/// Width of a wire carrying `flow` tokens when the heaviest carries `max`.
fn flow_width(flow: u64, max: u64) -> f32 {
    if flow == 0 || max == 0 {
        return WIRE_WIDTH;
    }
    WIRE_WIDTH + (flow as f32 / max as f32) * (MAX_FLOW_WIDTH - WIRE_WIDTH)
}

/// The leaf driving `wire`, `None` for boundary inputs.
fn source_node(wire: &RoutedWire, layout: &Layout) -> Option<NodeId> {
    match wire.from_port() {
        WireEnd::Port(port) => layout.nodes().get(port.node).map(LayoutNode::node),
        WireEnd::Boundary(_) => None,
    }
}

/// Middle of the middle segment of a polyline.
fn midpoint(path: &[Point]) -> Option<Point> {
    let index = path.len().checked_sub(1)? / 2;
    let (start, end) = (path.get(index)?, path.get(index + 1)?);
    Some(Point::new(
        (start.x() + end.x()) / 2.0,
        (start.y() + end.y()) / 2.0,
    ))
}

fn grade_marker_id(grade: Grade) -> String {
    format!("arrow-g{}", grade.level())
}

fn totals_line(cost: &CostSummary) -> String {
    format!(
        "Total: {} tokens, display grade {}, all-model baseline {} tokens, savings {:.1}%",
        cost.total_tokens(),
        cost.display_grade(),
        cost.pure_llm_tokens(),
        cost.savings_pct()
    )
}

/// A line of footer text.
struct FooterLine {
    text: String,
    severity: Option<Severity>,
}

impl FooterLine {
    fn plain(text: String) -> Self {
        Self {
            text,
            severity: None,
        }
    }

    fn diagnostic(diagnostic: &Diagnostic) -> Self {
        Self {
            text: diagnostic.to_string(),
            severity: Some(diagnostic.severity()),
        }
    }

    fn color(&self, svg: &Svg) -> Color {
        match self.severity {
            Some(Severity::Error | Severity::Fatal) => svg.mismatch_color,
            Some(Severity::Warning | Severity::Info) => svg.muted_color,
            None => svg.text_color,
        }
    }
}
