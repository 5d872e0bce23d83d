//! Coordinate types shared by the geometry decomposer and the renderers.
//!
//! Canonical CPU space for instances:
//! - Logical pixels
//! - Origin at the viewport center
//! - +X right, +Y up
//!
//! Outline coordinates are unitless; a polygon instance's size scales them to pixels.

mod vec2;
mod viewport;

pub use vec2::Vec2;
pub use viewport::Viewport;
