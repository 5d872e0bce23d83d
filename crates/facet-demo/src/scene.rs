use std::f32::consts::TAU;

use rand::Rng;
use rand::seq::IndexedRandom;

use facet_engine::coords::{Vec2, Viewport};
use facet_engine::geometry::{polar_outline, regular_polygon};
use facet_engine::render::shapes::{CircleInstance, PolygonInstance};
use facet_engine::render::{InstancedRender, Result};

use crate::config::DemoConfig;

/// Polygon kinds of the demo, in registration (and draw) order.
pub fn shape_kinds() -> Vec<(&'static str, Vec<Vec2>)> {
    vec![
        (
            "star",
            polar_outline(&[
                (1.0, 0.0),
                (0.5, 45.0),
                (1.0, 90.0),
                (0.5, 135.0),
                (1.0, 180.0),
                (0.5, 225.0),
                (1.0, 270.0),
                (0.5, 315.0),
            ]),
        ),
        (
            "square",
            vec![
                Vec2::new(-1.0, -1.0),
                Vec2::new(1.0, -1.0),
                Vec2::new(1.0, 1.0),
                Vec2::new(-1.0, 1.0),
            ],
        ),
        (
            "triangle",
            vec![Vec2::new(-1.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(0.0, 4.0)],
        ),
        ("pentagon", regular_polygon(5, 1.0)),
        ("hexagon", regular_polygon(6, 1.0)),
    ]
}

/// Registers every store and fills them with randomized instances.
///
/// Instances are interleaved across kinds (one of each per step) so depth
/// order mixes the kinds.
pub fn populate<R: Rng>(
    render: &mut InstancedRender,
    config: &DemoConfig,
    viewport: Viewport,
    rng: &mut R,
) -> Result<()> {
    let kinds = shape_kinds();
    for (name, outline) in &kinds {
        render.register_polygon_store(*name, outline.clone())?;
    }
    render.register_circle_store()?;

    let (hw, hh) = viewport.half_extents();
    let size_range = config.min_size..config.max_size;

    for i in 0..config.count_per_kind {
        let rotation = i as f32 * TAU / 360.0;
        for (name, _) in &kinds {
            let instance = PolygonInstance::new(
                rotation,
                rng.random_range(size_range.clone()),
                random_offset(rng, hw, hh),
                pick_color(rng, config),
            );
            render.add_instance(name, instance)?;
        }
        render.add_circle_instance(CircleInstance::new(
            rng.random_range(size_range.clone()),
            random_offset(rng, hw, hh),
            pick_color(rng, config),
        ))?;
    }
    Ok(())
}

/// Advances every polygon rotation by `step`, wrapping past a full turn.
pub fn spin_all(render: &mut InstancedRender, step: f32) {
    for store in render.polygon_stores_mut() {
        for r in store.rotations_mut() {
            *r += step;
            if *r > TAU {
                *r -= TAU;
            }
        }
    }
}

fn random_offset<R: Rng>(rng: &mut R, hw: f32, hh: f32) -> Vec2 {
    Vec2::new(rng.random_range(-hw..=hw), rng.random_range(-hh..=hh))
}

fn pick_color<R: Rng>(rng: &mut R, config: &DemoConfig) -> facet_engine::paint::Rgba8 {
    config
        .palette
        .choose(rng)
        .copied()
        .unwrap_or(facet_engine::paint::Rgba8::BLACK)
}
