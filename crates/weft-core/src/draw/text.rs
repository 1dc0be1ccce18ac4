//! Text style and label metrics.
//!
//! Label extents are estimated from character counts instead of shaping real
//! fonts, so layout never depends on the fonts installed on the machine and
//! the same composition always produces the same geometry.

use std::sync::OnceLock;

use svg::node::{Text as SvgText, element as svg_element};

use crate::{
    color::Color,
    geometry::{Point, Size},
};

/// Average glyph advance as a fraction of the font size.
const AVERAGE_ADVANCE: f32 = 0.6;

/// Line height as a multiple of the font size.
const LINE_HEIGHT: f32 = 1.2;

static DEFAULT_TEXT: OnceLock<TextDefinition> = OnceLock::new();

/// Font settings for a class of labels.
///
/// | Property | Default |
/// |----------|---------|
/// | Font family | `"sans-serif"` |
/// | Font size | `13` |
/// | Color | `None` (SVG default) |
///
/// # Examples
///
/// ```
/// # use weft_core::draw::TextDefinition;
/// let mut style = TextDefinition::new();
/// style.set_font_size(10);
///
/// let size = style.estimate_size("Fetch");
/// assert_eq!(size.width(), 30.0);
/// assert_eq!(size.height(), 12.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TextDefinition {
    font_family: String,
    font_size: u16,
    color: Option<Color>,
}

impl TextDefinition {
    /// Returns a reference to the shared default text definition.
    pub fn default_borrowed() -> &'static Self {
        DEFAULT_TEXT.get_or_init(Self::default)
    }

    /// Creates a new text definition with default values.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_font_size(&mut self, size: u16) {
        self.font_size = size;
    }

    pub fn set_font_family(&mut self, family: &str) {
        self.font_family = family.to_string();
    }

    pub fn set_color(&mut self, color: Option<Color>) {
        self.color = color;
    }

    pub fn font_size(&self) -> u16 {
        self.font_size
    }

    pub fn font_family(&self) -> &str {
        &self.font_family
    }

    pub fn color(&self) -> Option<Color> {
        self.color
    }

    /// Estimates the rendered extent of a single-line label.
    pub fn estimate_size(&self, text: &str) -> Size {
        let size = f32::from(self.font_size);
        let chars = text.chars().count() as f32;
        Size::new(chars * size * AVERAGE_ADVANCE, size * LINE_HEIGHT)
    }

    /// Builds a centered `<text>` element at `center`.
    pub fn render_centered(&self, text: &str, center: Point) -> svg_element::Text {
        let mut element = svg_element::Text::new(String::new())
            .set("x", center.x())
            .set("y", center.y())
            .set("font-family", self.font_family.as_str())
            .set("font-size", self.font_size)
            .set("text-anchor", "middle")
            .set("dominant-baseline", "central")
            .add(SvgText::new(text));
        if let Some(color) = self.color {
            element = element.set("fill", color);
        }
        element
    }
}

impl Default for TextDefinition {
    fn default() -> Self {
        Self {
            font_family: String::from("sans-serif"),
            font_size: 13,
            color: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::approx_eq;

    use super::*;

    #[test]
    fn test_default_values() {
        let text = TextDefinition::default_borrowed();
        assert_eq!(text.font_family(), "sans-serif");
        assert_eq!(text.font_size(), 13);
        assert!(text.color().is_none());
    }

    #[test]
    fn test_estimate_size_counts_chars_not_bytes() {
        let text = TextDefinition::new();
        let ascii = text.estimate_size("ab");
        let wide = text.estimate_size("⊗∘");
        assert!(approx_eq!(f32, ascii.width(), wide.width()));
    }

    #[test]
    fn test_estimate_size_empty() {
        let size = TextDefinition::new().estimate_size("");
        assert_eq!(size.width(), 0.0);
        assert!(size.height() > 0.0);
    }

    #[test]
    fn test_render_centered_contains_label() {
        let text = TextDefinition::new();
        let rendered = text
            .render_centered("Fetch", Point::new(10.0, 20.0))
            .to_string();
        assert!(rendered.contains("text-anchor=\"middle\""));
        assert!(rendered.contains("Fetch"));
    }

    #[test]
    fn test_render_centered_with_color() {
        let mut text = TextDefinition::new();
        text.set_color(Some(Color::new("#ff0000").unwrap()));
        let rendered = text.render_centered("x", Point::default()).to_string();
        assert!(rendered.contains("fill="));
    }
}
