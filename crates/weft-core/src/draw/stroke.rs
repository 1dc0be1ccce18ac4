//! Line appearance of wires, box borders and legend swatches.
//!
//! A [`StrokeDefinition`] maps onto SVG attributes as follows, and is
//! applied to an element with [`apply_stroke!`](crate::apply_stroke!):
//!
//! | Property | SVG attribute |
//! |----------|---------------|
//! | `color` | `stroke`, `stroke-opacity` |
//! | `width` | `stroke-width` |
//! | `style` | `stroke-dasharray` |
//!
//! ```
//! use weft_core::{color::Color, composition::Grade, draw::{StrokeDefinition, StrokeStyle}};
//! use svg::node::element::Path;
//!
//! let stroke = StrokeDefinition::new(Color::new("#8b5cf6").unwrap(), 2.0)
//!     .with_style(StrokeStyle::for_grade(Grade::Model));
//! let path = weft_core::apply_stroke!(Path::new().set("d", "M0,0 L10,0"), &stroke);
//! assert!(path.to_string().contains("stroke-dasharray=\"8,4\""));
//! ```

use crate::{color::Color, composition::Grade};

/// Dash pattern of a stroke.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum StrokeStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

impl StrokeStyle {
    /// Wires are solid when deterministic, dashed through a model and dotted
    /// through a human.
    pub fn for_grade(grade: Grade) -> Self {
        match grade {
            Grade::Deterministic => Self::Solid,
            Grade::Model => Self::Dashed,
            Grade::Human => Self::Dotted,
        }
    }

    /// The `stroke-dasharray` value, `None` for solid lines.
    pub fn dasharray(self) -> Option<&'static str> {
        match self {
            Self::Solid => None,
            Self::Dashed => Some("8,4"),
            Self::Dotted => Some("2,3"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StrokeDefinition {
    color: Color,
    width: f32,
    style: StrokeStyle,
}

impl StrokeDefinition {
    /// A solid stroke.
    pub fn new(color: Color, width: f32) -> Self {
        Self {
            color,
            width,
            style: StrokeStyle::Solid,
        }
    }

    pub fn dashed(color: Color, width: f32) -> Self {
        Self::new(color, width).with_style(StrokeStyle::Dashed)
    }

    pub fn with_style(mut self, style: StrokeStyle) -> Self {
        self.style = style;
        self
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn style(&self) -> StrokeStyle {
        self.style
    }
}

/// Sets the stroke attributes of `$stroke` on an SVG element.
///
/// Line joins are always rounded so routed wire corners stay smooth.
#[macro_export]
macro_rules! apply_stroke {
    ($element:expr, $stroke:expr) => {{
        let stroke = $stroke;
        let element = $element
            .set("stroke", stroke.color())
            .set("stroke-opacity", stroke.color().alpha())
            .set("stroke-width", stroke.width())
            .set("stroke-linejoin", "round");
        match stroke.style().dasharray() {
            Some(dasharray) => element.set("stroke-dasharray", dasharray),
            None => element,
        }
    }};
}
