use std::f32::consts::{FRAC_PI_2, FRAC_PI_4};

use crate::coords::Vec2;
use crate::render::{RenderError, Result};

/// Directions of the six corner-fan vertices, repeated for every outline vertex.
///
/// After the vertex shader pushes each copy along its direction the six
/// vertices form two triangles covering a square centered on the outline vertex:
///
/// ```text
///   135°-------45°
///    |  \     /  |
///    |    \ /    |
///    |     v     |
///    |    / \    |
///    |  /     \  |
///   225°------315°
/// ```
pub const CORNER_DIRECTIONS: [f32; 6] = [
    5.0 * FRAC_PI_4,
    3.0 * FRAC_PI_4,
    FRAC_PI_4,
    5.0 * FRAC_PI_4,
    FRAC_PI_4,
    7.0 * FRAC_PI_4,
];

/// Vertices paired with a per-vertex offset direction (radians).
///
/// The shader displaces each vertex along its direction by a screen-space
/// distance derived from the outline thickness, so the mesh keeps a constant
/// pixel width whatever the instance size.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DirectedMesh {
    pub vertices: Vec<Vec2>,
    pub directions: Vec<f32>,
}

impl DirectedMesh {
    #[inline]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    fn with_capacity(n: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(n),
            directions: Vec::with_capacity(n),
        }
    }

    #[inline]
    fn push(&mut self, vertex: Vec2, direction: f32) {
        self.vertices.push(vertex);
        self.directions.push(direction);
    }
}

/// The three vertex streams drawn for every instance of one polygon kind.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometrySet {
    /// Triangle list covering the interior.
    pub fill: Vec<Vec2>,
    /// Two triangles per edge, straddling the edge centerline.
    pub outline: DirectedMesh,
    /// Two triangles per vertex, filling the gap between adjacent edge quads.
    pub corners: DirectedMesh,
}

impl GeometrySet {
    /// Runs every decomposition for `outline`.
    pub fn from_outline(outline: &[Vec2]) -> Result<Self> {
        validate_outline(outline)?;
        Ok(Self {
            fill: decompose_fill(outline)?,
            outline: decompose_outline(outline)?,
            corners: decompose_corners(outline)?,
        })
    }

    #[inline]
    pub fn fill_triangle_count(&self) -> usize {
        self.fill.len() / 3
    }
}

/// Shoelace area; positive for counter-clockwise outlines.
pub fn signed_area(outline: &[Vec2]) -> f32 {
    let Some(&origin) = outline.first() else {
        return 0.0;
    };
    let n = outline.len();
    // relative to the first point; far-off outlines keep precision
    let twice: f32 = (0..n)
        .map(|i| (outline[i] - origin).cross(outline[(i + 1) % n] - origin))
        .sum();
    twice * 0.5
}

/// Unsigned area of one triangle.
#[inline]
pub fn triangle_area(a: Vec2, b: Vec2, c: Vec2) -> f32 {
    ((b - a).cross(c - a) * 0.5).abs()
}

/// Rejects outlines that cannot produce a finite, non-empty mesh.
pub fn validate_outline(outline: &[Vec2]) -> Result<()> {
    if outline.len() < 3 {
        return Err(RenderError::invalid_geometry(format!(
            "outline needs at least 3 points, got {}",
            outline.len()
        )));
    }

    if let Some(i) = outline.iter().position(|p| !p.is_finite()) {
        return Err(RenderError::invalid_geometry(format!("point {i} is not finite")));
    }

    let n = outline.len();
    if let Some(i) = (0..n).find(|&i| outline[i] == outline[(i + 1) % n]) {
        return Err(RenderError::invalid_geometry(format!(
            "edge {i} has zero length"
        )));
    }

    let (min, max) = outline.iter().fold(
        (outline[0], outline[0]),
        |(lo, hi), p| {
            (
                Vec2::new(lo.x.min(p.x), lo.y.min(p.y)),
                Vec2::new(hi.x.max(p.x), hi.y.max(p.y)),
            )
        },
    );
    let span = max - min;
    let extent = span.x.max(span.y);
    let area = signed_area(outline).abs();
    if area <= 1e-6 * extent * extent {
        return Err(RenderError::invalid_geometry("outline encloses no area"));
    }

    Ok(())
}

/// Triangulates a simple polygon (convex or concave) into a triangle list.
pub fn decompose_fill(outline: &[Vec2]) -> Result<Vec<Vec2>> {
    validate_outline(outline)?;

    let flat: Vec<f64> = outline
        .iter()
        .flat_map(|p| [p.x as f64, p.y as f64])
        .collect();

    let indices = earcutr::earcut(&flat, &[], 2)
        .map_err(|e| RenderError::Triangulation(format!("{e:?}")))?;

    if indices.len() < 3 || indices.len() % 3 != 0 {
        return Err(RenderError::Triangulation(format!(
            "unexpected index count {}",
            indices.len()
        )));
    }

    let mut fill = Vec::with_capacity(indices.len());
    for i in indices {
        let Some(&p) = outline.get(i) else {
            return Err(RenderError::Triangulation(format!("index {i} out of range")));
        };
        fill.push(p);
    }
    Ok(fill)
}

/// Thickens every edge `v[i] → v[i+1]` (cyclic) into a quad.
///
/// Each endpoint appears on both sides of the centerline; the side is encoded
/// in the direction (`edge + 90°` or `edge - 90°`):
///
/// ```text
///   neg ==== v2 ==== pos
///    |       |     / |
///    |       |   /   |
///    |       | /     |
///    |      /|       |
///    |    /  |       |
///    |  /    |       |
///   neg ==== v1 ==== pos
/// ```
///
/// Triangles: `(v1 neg, v1 pos, v2 pos)` and `(v1 neg, v2 pos, v2 neg)`.
pub fn decompose_outline(outline: &[Vec2]) -> Result<DirectedMesh> {
    validate_outline(outline)?;

    let n = outline.len();
    let mut mesh = DirectedMesh::with_capacity(6 * n);

    for i in 0..n {
        let v1 = outline[i];
        let v2 = outline[(i + 1) % n];
        let edge = (v2 - v1).angle();
        let neg = edge + FRAC_PI_2;
        let pos = edge - FRAC_PI_2;

        mesh.push(v1, neg);
        mesh.push(v1, pos);
        mesh.push(v2, pos);

        mesh.push(v1, neg);
        mesh.push(v2, pos);
        mesh.push(v2, neg);
    }

    Ok(mesh)
}

/// Emits six copies of every outline vertex tagged with [`CORNER_DIRECTIONS`].
pub fn decompose_corners(outline: &[Vec2]) -> Result<DirectedMesh> {
    validate_outline(outline)?;

    let mut mesh = DirectedMesh::with_capacity(6 * outline.len());
    for &v in outline {
        for dir in CORNER_DIRECTIONS {
            mesh.push(v, dir);
        }
    }
    Ok(mesh)
}
