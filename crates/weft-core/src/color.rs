//! CSS colors as used by the SVG renderer.

use std::{fmt, str::FromStr};

use color::{DynamicColor, palette::css};

/// A parsed CSS color.
///
/// Colors come from style configuration as strings, so parsing keeps the
/// offending text in its error message.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Color(DynamicColor);

impl Color {
    /// Parses a CSS color such as `"#10b981"`, `"rgb(16 185 129)"` or `"teal"`.
    ///
    /// # Examples
    ///
    /// ```
    /// use weft_core::color::Color;
    ///
    /// assert!(Color::new("#8b5cf6").is_ok());
    /// assert!(Color::new("teal").is_ok());
    /// assert!(Color::new("not-a-color").is_err());
    /// ```
    pub fn new(value: &str) -> Result<Self, String> {
        value.parse()
    }

    /// The same color with its alpha replaced, clamped to `0.0..=1.0`.
    pub fn with_alpha(self, alpha: f32) -> Self {
        Self(self.0.with_alpha(alpha.clamp(0.0, 1.0)))
    }

    pub fn alpha(self) -> f32 {
        self.0.components[3]
    }
}

impl FromStr for Color {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        DynamicColor::from_str(value)
            .map(Self)
            .map_err(|err| format!("invalid color `{value}`: {err}"))
    }
}

/// Opaque black.
impl Default for Color {
    fn default() -> Self {
        Self(DynamicColor::from_alpha_color(css::BLACK))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Color> for svg::node::Value {
    fn from(color: Color) -> Self {
        Self::from(color.to_string())
    }
}
