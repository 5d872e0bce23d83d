//! Outline decomposition.
//!
//! A polygon kind is registered once as an outline; everything the GPU needs to
//! draw it (fill triangles, thickened edges, rounded corners) is derived here,
//! once, in outline units. Per-instance transforms and the outline thickness are
//! applied later by the vertex shader.

mod decompose;
mod outlines;

pub use decompose::{
    CORNER_DIRECTIONS, DirectedMesh, GeometrySet, decompose_corners, decompose_fill,
    decompose_outline, signed_area, triangle_area, validate_outline,
};
pub use outlines::{polar_outline, regular_polygon, star};
