use std::f32::consts::TAU;

use crate::coords::Vec2;

/// Builds an outline from `(radius, angle in degrees)` pairs.
pub fn polar_outline(points: &[(f32, f32)]) -> Vec<Vec2> {
    points
        .iter()
        .map(|&(radius, degrees)| Vec2::from_polar(radius, degrees.to_radians()))
        .collect()
}

/// Regular `sides`-gon of circumradius `radius`, first vertex on +x.
pub fn regular_polygon(sides: usize, radius: f32) -> Vec<Vec2> {
    (0..sides)
        .map(|i| Vec2::from_polar(radius, i as f32 * TAU / sides as f32))
        .collect()
}

/// Star with `points` tips alternating between `outer` and `inner` radii.
pub fn star(points: usize, outer: f32, inner: f32) -> Vec<Vec2> {
    let n = points * 2;
    (0..n)
        .map(|i| {
            let radius = if i % 2 == 0 { outer } else { inner };
            Vec2::from_polar(radius, i as f32 * TAU / n as f32)
        })
        .collect()
}
