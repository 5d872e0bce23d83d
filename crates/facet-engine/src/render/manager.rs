use indexmap::IndexMap;

use crate::coords::{Vec2, Viewport};
use crate::paint::Rgba8;

use super::shading::ShadingParams;
use super::shapes::{CircleInstance, CircleStore, InstancedDrawable, PolygonInstance, PolygonStore};
use super::{RenderCtx, RenderError, RenderTarget, Result};

/// Coordinates every shape store of a scene.
///
/// Responsibilities:
/// - name-keyed polygon stores (one per outline) plus at most one circle store
/// - a depth counter shared by all stores: each insertion takes the current
///   value and decrements it, so later insertions are drawn nearer
/// - the shading parameters, pushed into every store on registration and on
///   every change
/// - draw order: polygon stores in registration order, circles last
///
/// Stores create their GPU objects lazily; nothing here touches the GPU except
/// through store methods.
#[derive(Default)]
pub struct InstancedRender {
    polygons: IndexMap<String, PolygonStore>,
    circles: Option<CircleStore>,
    depth_index: i32,
    shading: ShadingParams,
}

impl InstancedRender {
    pub fn new(shading: ShadingParams) -> Self {
        Self {
            shading,
            ..Self::default()
        }
    }

    // ── registration ──────────────────────────────────────────────────────

    /// Registers a polygon store for `outline` under `name`.
    ///
    /// The outline is validated and decomposed first; on error nothing is
    /// registered.
    pub fn register_polygon_store(
        &mut self,
        name: impl Into<String>,
        outline: Vec<Vec2>,
    ) -> Result<&mut PolygonStore> {
        let name = name.into();
        if self.polygons.contains_key(&name) {
            return Err(RenderError::DuplicateName(name));
        }

        let mut store = PolygonStore::new(name.clone(), outline)?;
        store.set_shading(&self.shading);
        log::info!("registered polygon store {name:?}");

        Ok(self.polygons.entry(name).or_insert(store))
    }

    /// Registers the circle store. Only one may exist.
    pub fn register_circle_store(&mut self) -> Result<&mut CircleStore> {
        if self.circles.is_some() {
            return Err(RenderError::DuplicateName(CircleStore::NAME.to_string()));
        }

        let mut store = CircleStore::new();
        store.set_shading(&self.shading);
        log::info!("registered circle store");

        Ok(self.circles.insert(store))
    }

    pub fn remove_polygon_store(&mut self, name: &str) -> Option<PolygonStore> {
        self.polygons.shift_remove(name)
    }

    pub fn remove_circle_store(&mut self) -> Option<CircleStore> {
        self.circles.take()
    }

    pub fn polygon_store(&self, name: &str) -> Option<&PolygonStore> {
        self.polygons.get(name)
    }

    pub fn polygon_store_mut(&mut self, name: &str) -> Option<&mut PolygonStore> {
        self.polygons.get_mut(name)
    }

    /// Polygon stores in registration (and draw) order.
    pub fn polygon_stores_mut(&mut self) -> impl Iterator<Item = &mut PolygonStore> {
        self.polygons.values_mut()
    }

    pub fn circle_store(&self) -> Option<&CircleStore> {
        self.circles.as_ref()
    }

    pub fn circle_store_mut(&mut self) -> Option<&mut CircleStore> {
        self.circles.as_mut()
    }

    pub fn store_names(&self) -> impl Iterator<Item = &str> {
        self.polygons.keys().map(String::as_str)
    }

    fn store_mut(&mut self, name: &str) -> Result<&mut PolygonStore> {
        self.polygons
            .get_mut(name)
            .ok_or_else(|| RenderError::UnknownStore(name.to_string()))
    }

    // ── population ────────────────────────────────────────────────────────

    /// Adds a polygon instance to the store `name` and returns its depth index.
    pub fn add_instance(&mut self, name: &str, instance: PolygonInstance) -> Result<i32> {
        let depth = self.depth_index;
        self.store_mut(name)?.add_instance(depth, instance);
        self.depth_index -= 1;
        Ok(depth)
    }

    /// Adds a circle instance and returns its depth index.
    ///
    /// Fails with [`RenderError::UnknownStore`] when no circle store is
    /// registered; the depth counter is left untouched.
    pub fn add_circle_instance(&mut self, instance: CircleInstance) -> Result<i32> {
        let depth = self.depth_index;
        let store = self
            .circles
            .as_mut()
            .ok_or_else(|| RenderError::UnknownStore(CircleStore::NAME.to_string()))?;
        store.add_instance(depth, instance);
        self.depth_index -= 1;
        Ok(depth)
    }

    /// Next depth index to be assigned (zero or negative).
    pub fn depth_index(&self) -> i32 {
        self.depth_index
    }

    /// Restarts depth assignment at zero.
    ///
    /// Only meaningful after [`clear_all`](Self::clear_all); otherwise new
    /// instances reuse depth values already held by existing ones.
    pub fn reset_depth_index(&mut self) {
        self.depth_index = 0;
    }

    /// Magnitude of the lowest depth index issued so far.
    ///
    /// Recomputed from the live counter on every draw, so instances added
    /// after a draw rescale the depth of everything drawn before.
    pub fn depth_normalizer(&self) -> f32 {
        self.depth_index.unsigned_abs() as f32
    }

    // ── shading ───────────────────────────────────────────────────────────

    pub fn shading(&self) -> &ShadingParams {
        &self.shading
    }

    /// Replaces every shading parameter at once.
    pub fn set_shading(&mut self, shading: ShadingParams) {
        self.update_shading(|s| *s = shading);
    }

    pub fn set_outline_color(&mut self, color: Rgba8) {
        self.update_shading(|s| s.outline_color = color);
    }

    pub fn set_outline_size(&mut self, size: f32) {
        self.update_shading(|s| s.outline_size = size);
    }

    pub fn set_transition_smoothness(&mut self, smoothness: f32) {
        self.update_shading(|s| s.transition_smoothness = smoothness);
    }

    pub fn set_blend_factor(&mut self, blend_factor: f32) {
        self.update_shading(|s| s.blend_factor = blend_factor);
    }

    pub fn set_viewport_resolution(&mut self, viewport: Viewport) {
        self.update_shading(|s| s.viewport = viewport);
    }

    fn update_shading(&mut self, apply: impl FnOnce(&mut ShadingParams)) {
        apply(&mut self.shading);
        for store in self.polygons.values_mut() {
            store.set_shading(&self.shading);
        }
        if let Some(circles) = self.circles.as_mut() {
            circles.set_shading(&self.shading);
        }
    }

    // ── buffers ───────────────────────────────────────────────────────────

    pub fn update_all_buffers(&mut self, ctx: &RenderCtx<'_>) {
        for store in self.polygons.values_mut() {
            store.update_all_buffers(ctx);
        }
        if let Some(circles) = self.circles.as_mut() {
            circles.update_all_buffers(ctx);
        }
    }

    pub fn update_buffers(&mut self, name: &str, ctx: &RenderCtx<'_>) -> Result<()> {
        self.store_mut(name)?.update_all_buffers(ctx);
        Ok(())
    }

    pub fn clear_store(&mut self, name: &str) -> Result<()> {
        self.store_mut(name)?.clear_buffers();
        Ok(())
    }

    pub fn clear_circle_store(&mut self) {
        if let Some(circles) = self.circles.as_mut() {
            circles.clear_buffers();
        }
    }

    /// Clears every store. The depth counter keeps running.
    pub fn clear_all(&mut self) {
        for store in self.polygons.values_mut() {
            store.clear_buffers();
        }
        self.clear_circle_store();
    }

    /// Total instances across all stores.
    pub fn instance_count(&self) -> usize {
        let polygons: usize = self.polygons.values().map(|s| s.instance_count()).sum();
        polygons + self.circles.as_ref().map_or(0, |c| c.instance_count())
    }

    // ── draw ──────────────────────────────────────────────────────────────

    /// Draws every polygon store (fill, outline, corners each) and then the
    /// circle store, in one pass that loads the target's color and depth.
    pub fn draw_all(&mut self, ctx: &RenderCtx<'_>, target: &mut RenderTarget<'_>) {
        let depth_normalizer = self.depth_normalizer();
        let mut pass = target.begin_load_pass("facet instanced pass");

        for store in self.polygons.values_mut() {
            store.draw(ctx, &mut pass, depth_normalizer);
        }
        // alpha-blended edges composite over the opaque polygons
        if let Some(circles) = self.circles.as_mut() {
            circles.draw(ctx, &mut pass, depth_normalizer);
        }
    }

    /// Draws a single polygon store in its own pass.
    pub fn draw_store(
        &mut self,
        name: &str,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
    ) -> Result<()> {
        let depth_normalizer = self.depth_normalizer();
        let store = self.store_mut(name)?;
        let mut pass = target.begin_load_pass("facet store pass");
        store.draw(ctx, &mut pass, depth_normalizer);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<Vec2> {
        vec![
            Vec2::new(-1.0, -1.0),
            Vec2::new(1.0, -1.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(-1.0, 1.0),
        ]
    }

    fn triangle() -> Vec<Vec2> {
        vec![Vec2::new(-1.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(0.0, 4.0)]
    }

    fn poly(size: f32) -> PolygonInstance {
        PolygonInstance::new(0.0, size, Vec2::zero(), Rgba8::rgb(255, 0, 0))
    }

    fn circle(size: f32) -> CircleInstance {
        CircleInstance::new(size, Vec2::zero(), Rgba8::WHITE)
    }

    fn manager() -> InstancedRender {
        let mut render = InstancedRender::default();
        render.register_polygon_store("square", square()).unwrap();
        render.register_polygon_store("triangle", triangle()).unwrap();
        render.register_circle_store().unwrap();
        render
    }

    // ── registration ──────────────────────────────────────────────────────

    #[test]
    fn duplicate_polygon_name_is_rejected() {
        let mut render = manager();
        let err = render.register_polygon_store("square", triangle()).err();
        assert_eq!(err, Some(RenderError::DuplicateName("square".to_string())));
        assert_eq!(render.polygon_store("square").unwrap().fill_triangle_count(), 2);
    }

    #[test]
    fn second_circle_store_is_rejected() {
        let mut render = manager();
        assert!(matches!(
            render.register_circle_store(),
            Err(RenderError::DuplicateName(_))
        ));
    }

    #[test]
    fn invalid_outline_registers_nothing() {
        let mut render = InstancedRender::default();
        let err = render
            .register_polygon_store("line", vec![Vec2::zero(), Vec2::new(1.0, 0.0)])
            .err();
        assert!(matches!(err, Some(RenderError::InvalidGeometry { .. })));
        assert!(render.polygon_store("line").is_none());
        assert_eq!(render.store_names().count(), 0);
    }

    #[test]
    fn registration_pushes_current_shading() {
        let mut render = InstancedRender::default();
        render.set_outline_size(4.5);
        let store = render.register_polygon_store("square", square()).unwrap();
        assert_eq!(store.shading().outline_size, 4.5);
        let circles = render.register_circle_store().unwrap();
        assert_eq!(circles.shading().outline_size, 4.5);
    }

    #[test]
    fn store_names_keep_registration_order() {
        let render = manager();
        assert_eq!(render.store_names().collect::<Vec<_>>(), vec!["square", "triangle"]);
    }

    #[test]
    fn removal_preserves_order_of_the_rest() {
        let mut render = manager();
        render.register_polygon_store("other", square()).unwrap();
        assert!(render.remove_polygon_store("triangle").is_some());
        assert_eq!(render.store_names().collect::<Vec<_>>(), vec!["square", "other"]);
        assert!(render.remove_circle_store().is_some());
        assert!(render.circle_store().is_none());
    }

    // ── population ────────────────────────────────────────────────────────

    #[test]
    fn square_scenario() {
        let mut render = InstancedRender::default();
        render.register_polygon_store("square", square()).unwrap();
        let depth = render
            .add_instance(
                "square",
                PolygonInstance::new(0.0, 5.0, Vec2::zero(), Rgba8::rgb(255, 0, 0)),
            )
            .unwrap();

        let store = render.polygon_store("square").unwrap();
        assert_eq!(depth, 0);
        assert_eq!(store.instance_count(), 1);
        assert_eq!(store.fill_triangle_count(), 2);
        assert_eq!(store.depth_indices().collect::<Vec<_>>(), vec![0]);
    }

    #[test]
    fn depth_indices_decrease_across_stores() {
        let mut render = manager();
        let mut issued = Vec::new();
        for i in 0..30 {
            let depth = match i % 3 {
                0 => render.add_instance("square", poly(1.0)).unwrap(),
                1 => render.add_instance("triangle", poly(1.0)).unwrap(),
                _ => render.add_circle_instance(circle(1.0)).unwrap(),
            };
            issued.push(depth);
        }

        let expected: Vec<i32> = (0..30).map(|k| -k).collect();
        assert_eq!(issued, expected);
        assert_eq!(render.depth_index(), -30);
        assert_eq!(render.depth_normalizer(), 30.0);

        let squares: Vec<i32> = render.polygon_store("square").unwrap().depth_indices().collect();
        let circles: Vec<i32> = render.circle_store().unwrap().depth_indices().collect();
        assert_eq!(squares, (0..10).map(|k| -3 * k).collect::<Vec<_>>());
        assert_eq!(circles, (0..10).map(|k| -3 * k - 2).collect::<Vec<_>>());
    }

    #[test]
    fn unknown_store_leaves_counter_untouched() {
        let mut render = manager();
        render.add_instance("square", poly(1.0)).unwrap();
        let err = render.add_instance("hexagon", poly(1.0)).unwrap_err();
        assert_eq!(err, RenderError::UnknownStore("hexagon".to_string()));
        assert_eq!(render.depth_index(), -1);
    }

    #[test]
    fn circle_instance_without_store_fails() {
        let mut render = InstancedRender::default();
        assert!(matches!(
            render.add_circle_instance(circle(3.0)),
            Err(RenderError::UnknownStore(_))
        ));
        assert_eq!(render.depth_index(), 0);
    }

    #[test]
    fn clear_all_empties_every_store() {
        let mut render = manager();
        render.add_instance("square", poly(1.0)).unwrap();
        render.add_instance("triangle", poly(2.0)).unwrap();
        render.add_circle_instance(circle(1.0)).unwrap();
        assert_eq!(render.instance_count(), 3);

        render.clear_all();
        assert_eq!(render.instance_count(), 0);
        // the counter keeps running so depth stays unique
        assert_eq!(render.add_instance("square", poly(1.0)).unwrap(), -3);
    }

    #[test]
    fn clear_single_store() {
        let mut render = manager();
        render.add_instance("square", poly(1.0)).unwrap();
        render.add_instance("triangle", poly(1.0)).unwrap();
        render.clear_store("square").unwrap();
        assert_eq!(render.polygon_store("square").unwrap().instance_count(), 0);
        assert_eq!(render.polygon_store("triangle").unwrap().instance_count(), 1);
        assert!(matches!(
            render.clear_store("nope"),
            Err(RenderError::UnknownStore(_))
        ));
    }

    #[test]
    fn reset_depth_index_restarts_at_zero() {
        let mut render = manager();
        render.add_instance("square", poly(1.0)).unwrap();
        render.clear_all();
        render.reset_depth_index();
        assert_eq!(render.add_instance("square", poly(1.0)).unwrap(), 0);
    }

    // ── shading ───────────────────────────────────────────────────────────

    #[test]
    fn outline_size_reaches_every_store() {
        let mut render = manager();
        assert_eq!(render.shading().outline_size, 1.8);

        render.set_outline_size(3.0);

        assert_eq!(render.shading().outline_size, 3.0);
        for name in ["square", "triangle"] {
            assert_eq!(render.polygon_store(name).unwrap().shading().outline_size, 3.0);
        }
        assert_eq!(render.circle_store().unwrap().shading().outline_size, 3.0);
    }

    #[test]
    fn every_setter_propagates() {
        let mut render = manager();
        render.set_outline_color(Rgba8::rgb(1, 2, 3));
        render.set_transition_smoothness(2.5);
        render.set_blend_factor(0.1);
        render.set_viewport_resolution(Viewport::new(640.0, 480.0));

        let expected = *render.shading();
        assert_eq!(expected.outline_color, Rgba8::rgb(1, 2, 3));
        assert_eq!(expected.transition_smoothness, 2.5);
        assert_eq!(expected.blend_factor, 0.1);
        assert_eq!(expected.viewport, Viewport::new(640.0, 480.0));

        for name in ["square", "triangle"] {
            assert_eq!(render.polygon_store(name).unwrap().shading(), &expected);
        }
        assert_eq!(render.circle_store().unwrap().shading(), &expected);
    }

    #[test]
    fn set_shading_replaces_all_values() {
        let mut render = manager();
        let params = ShadingParams {
            outline_size: 0.5,
            blend_factor: 1.0,
            ..ShadingParams::default()
        };
        render.set_shading(params);
        assert_eq!(render.polygon_store("square").unwrap().shading(), &params);
    }
}
