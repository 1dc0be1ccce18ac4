//! Drawing primitives shared by the SVG renderer.
//!
//! - [`RenderLayer`] and [`LayeredOutput`] order SVG nodes by z-layer.
//! - [`StrokeDefinition`] describes line appearance and is applied with
//!   [`apply_stroke!`](crate::apply_stroke!).
//! - [`TextDefinition`] describes label fonts and estimates label extents.

mod layer;
mod stroke;
mod text;

pub use layer::{LayeredOutput, RenderLayer, SvgNode};
pub use stroke::{StrokeDefinition, StrokeStyle};
pub use text::TextDefinition;
