//! Weft Core Types and Definitions
//!
//! This crate provides the foundational types shared by every stage of the
//! Weft string-diagram engine. It includes:
//!
//! - **Identifiers**: Efficient string-interned identifiers ([`identifier::Id`])
//! - **Colors**: Color handling with CSS color support ([`color::Color`])
//! - **Geometry**: Points, sizes, bounds and segment tests ([`geometry`] module)
//! - **Draw**: Render layers, strokes and text metrics ([`draw`] module)
//! - **Composition**: Bricks, wires and the composition tree ([`composition`] module)

pub mod color;
pub mod composition;
pub mod draw;
pub mod geometry;
pub mod identifier;
