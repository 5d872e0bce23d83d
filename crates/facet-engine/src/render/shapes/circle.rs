use crate::coords::Vec2;
use crate::paint::Rgba8;
use crate::render::shading::ShadingParams;
use crate::render::{RenderCtx, RenderError, Result};

use super::common::{
    COLOR_ATTRS, ColumnBuffer, DEPTH_ATTRS, OFFSET_ATTRS, QUAD_VERTICES, QuadVertex, SIZE_ATTRS,
    ShadingBinding, depth_state, instance_layout, premul_alpha_blend, static_vertex_buffer,
    triangle_list,
};
use super::drawable::InstancedDrawable;

/// One circle occurrence.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CircleInstance {
    /// Radius in pixels; the outline band straddles it.
    pub size: f32,
    /// Pixel position of the center, relative to the viewport center.
    pub offset: Vec2,
    pub color: Rgba8,
}

/// Pulls the fill/outline boundary inward by one pixel.
const INNER_CORRECTION: f32 = -1.0;

/// Band boundaries `[r1, r2, r3, r4]` of the circle distance field.
///
/// Below `r1` is fill, `r1..r2` blends fill into outline, `r2..r3` is solid
/// outline and `r3..r4` fades to transparent. Mirrors `fs_main` in
/// `circle.wgsl`.
pub fn band_radii(size: f32, outline_size: f32, transition_smoothness: f32) -> [f32; 4] {
    let r1 = size - outline_size + INNER_CORRECTION;
    let r4 = size + outline_size;
    [r1, r1 + transition_smoothness, r4 - transition_smoothness, r4]
}

/// Half-width of the quad drawn for a circle; equals the outer band radius.
pub fn quad_extent(size: f32, outline_size: f32) -> f32 {
    size + outline_size
}

impl CircleInstance {
    #[inline]
    pub fn new(size: f32, offset: Vec2, color: Rgba8) -> Self {
        Self { size, offset, color }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
struct CircleColumns {
    depth: Vec<f32>,
    size: Vec<f32>,
    offset: Vec<[f32; 2]>,
    color: Vec<Rgba8>,
}

impl CircleColumns {
    fn push_row(&mut self, depth_index: i32, instance: &CircleInstance) {
        self.depth.push(depth_index as f32);
        self.size.push(instance.size);
        self.offset.push(instance.offset.to_array());
        self.color.push(instance.color);
    }

    fn clear(&mut self) {
        self.depth.clear();
        self.size.clear();
        self.offset.clear();
        self.color.clear();
    }

    #[inline]
    fn len(&self) -> usize {
        self.depth.len()
    }

    fn bytes(&self) -> [(&'static str, &[u8], usize); 4] {
        [
            ("depth", bytemuck::cast_slice(&self.depth), self.depth.len()),
            ("size", bytemuck::cast_slice(&self.size), self.size.len()),
            ("offset", bytemuck::cast_slice(&self.offset), self.offset.len()),
            ("color", bytemuck::cast_slice(&self.color), self.color.len()),
        ]
    }

    fn check(&self, store: &str) -> Result<()> {
        let expected = self.len();
        for (attribute, _, found) in self.bytes() {
            if found != expected {
                return Err(RenderError::AttributeLengthMismatch {
                    store: store.to_string(),
                    attribute,
                    expected,
                    found,
                });
            }
        }
        Ok(())
    }
}

struct CircleGpu {
    formats: (wgpu::TextureFormat, Option<wgpu::TextureFormat>),
    pipeline: wgpu::RenderPipeline,
    shading: ShadingBinding,
    quad_vbo: wgpu::Buffer,
}

/// Instanced renderer for circles.
///
/// Circles are not triangulated: every instance is a screen-aligned quad and
/// the fragment shader evaluates a radial distance field with four bands
/// (fill, fill→outline blend, outline, antialiased edge). Edges are
/// alpha-blended, so this store must be drawn after every opaque polygon.
pub struct CircleStore {
    name: String,
    columns: CircleColumns,
    shading: ShadingParams,

    gpu: Option<CircleGpu>,
    column_vbos: [ColumnBuffer; 4],
    uploaded_rows: usize,
}

impl Default for CircleStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CircleStore {
    pub const NAME: &'static str = "circle";

    pub fn new() -> Self {
        let column_vbos = [("depth", 4), ("size", 4), ("offset", 8), ("color", 4)]
            .map(|(attr, stride)| ColumnBuffer::new(format!("facet circle {attr} vbo"), stride));

        Self {
            name: Self::NAME.to_string(),
            columns: CircleColumns::default(),
            shading: ShadingParams::default(),
            gpu: None,
            column_vbos,
            uploaded_rows: 0,
        }
    }

    /// Depth indices in insertion order.
    pub fn depth_indices(&self) -> impl Iterator<Item = i32> + '_ {
        self.columns.depth.iter().map(|&d| d as i32)
    }

    pub fn sizes(&self) -> &[f32] {
        &self.columns.size
    }

    pub fn offsets(&self) -> &[[f32; 2]] {
        &self.columns.offset
    }

    pub fn colors(&self) -> &[Rgba8] {
        &self.columns.color
    }

    pub fn check_columns(&self) -> Result<()> {
        self.columns.check(&self.name)
    }

    pub fn staged_bytes(&self) -> Vec<(&'static str, &[u8])> {
        self.columns
            .bytes()
            .into_iter()
            .map(|(name, bytes, _)| (name, bytes))
            .collect()
    }

    fn drawable_rows(&self) -> usize {
        self.uploaded_rows.min(self.columns.len())
    }

    fn debug_check_columns(&self) {
        #[cfg(debug_assertions)]
        if let Err(e) = self.check_columns() {
            panic!("{e}");
        }
    }

    fn ensure_gpu(&mut self, ctx: &RenderCtx<'_>) {
        let formats = (ctx.surface_format, ctx.depth_format);
        if self.gpu.as_ref().is_some_and(|g| g.formats == formats) {
            return;
        }

        let shader = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("facet circle shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/circle.wgsl").into()),
        });

        let shading = ShadingBinding::new(ctx.device, "facet circle");

        let pipeline_layout =
            ctx.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("facet circle pipeline layout"),
                bind_group_layouts: &[&shading.layout],
                immediate_size: 0,
            });

        let pipeline = ctx.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("facet circle pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[
                    QuadVertex::layout(),
                    instance_layout(&DEPTH_ATTRS),
                    instance_layout(&SIZE_ATTRS),
                    instance_layout(&OFFSET_ATTRS),
                    instance_layout(&COLOR_ATTRS),
                ],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: ctx.surface_format,
                    blend: Some(premul_alpha_blend()),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: triangle_list(),
            depth_stencil: depth_state(ctx.depth_format),
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        let quad_vbo = static_vertex_buffer(ctx.device, "facet circle quad vbo", &QUAD_VERTICES);

        self.gpu = Some(CircleGpu {
            formats,
            pipeline,
            shading,
            quad_vbo,
        });
    }
}

impl InstancedDrawable for CircleStore {
    type Instance = CircleInstance;

    fn name(&self) -> &str {
        &self.name
    }

    fn add_instance(&mut self, depth_index: i32, instance: CircleInstance) {
        debug_assert!(instance.size >= 0.0, "circle size must be non-negative");
        debug_assert!(instance.offset.is_finite());
        self.columns.push_row(depth_index, &instance);
    }

    fn clear_buffers(&mut self) {
        self.columns.clear();
        self.uploaded_rows = 0;
    }

    fn instance_count(&self) -> usize {
        self.columns.len()
    }

    fn shading(&self) -> &ShadingParams {
        &self.shading
    }

    fn set_shading(&mut self, shading: &ShadingParams) {
        self.shading = *shading;
    }

    fn update_all_buffers(&mut self, ctx: &RenderCtx<'_>) {
        self.debug_check_columns();
        self.ensure_gpu(ctx);

        let rows = self.columns.len();
        for (vbo, (_, bytes, _)) in self.column_vbos.iter_mut().zip(self.columns.bytes()) {
            vbo.upload(ctx, bytes, rows);
        }
        self.uploaded_rows = rows;
    }

    fn draw(&mut self, ctx: &RenderCtx<'_>, pass: &mut wgpu::RenderPass<'_>, depth_normalizer: f32) {
        let rows = self.drawable_rows();
        if rows == 0 {
            return;
        }
        self.debug_check_columns();
        self.ensure_gpu(ctx);

        let Some(gpu) = self.gpu.as_ref() else { return };
        gpu.shading
            .write(ctx.queue, &self.shading.to_uniform(depth_normalizer));

        pass.set_pipeline(&gpu.pipeline);
        pass.set_bind_group(0, &gpu.shading.bind_group, &[]);
        pass.set_vertex_buffer(0, gpu.quad_vbo.slice(..));
        for (slot, vbo) in self.column_vbos.iter().enumerate() {
            let Some(buffer) = vbo.buffer() else { return };
            pass.set_vertex_buffer(slot as u32 + 1, buffer.slice(..));
        }
        pass.draw(0..QUAD_VERTICES.len() as u32, 0..rows as u32);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_store_is_empty_and_named() {
        let store = CircleStore::new();
        assert_eq!(store.name(), CircleStore::NAME);
        assert_eq!(store.instance_count(), 0);
    }

    #[test]
    fn add_then_clear() {
        let mut store = CircleStore::new();
        store.add_instance(0, CircleInstance::new(4.0, Vec2::new(1.0, -1.0), Rgba8::WHITE));
        store.add_instance(-1, CircleInstance::new(8.0, Vec2::zero(), Rgba8::BLACK));
        assert_eq!(store.instance_count(), 2);
        assert_eq!(store.sizes(), &[4.0, 8.0]);
        assert_eq!(store.offsets(), &[[1.0, -1.0], [0.0, 0.0]]);
        assert_eq!(store.depth_indices().collect::<Vec<_>>(), vec![0, -1]);
        assert!(store.check_columns().is_ok());

        store.clear_buffers();
        assert_eq!(store.instance_count(), 0);
        assert!(store.sizes().is_empty());
        assert!(store.offsets().is_empty());
        assert!(store.colors().is_empty());
    }

    #[test]
    fn rows_added_after_clear_wait_for_next_upload() {
        let mut store = CircleStore::new();
        for i in 0..10 {
            store.add_instance(-i, CircleInstance::new(3.0, Vec2::zero(), Rgba8::WHITE));
        }
        // stands in for update_all_buffers, which needs a device
        store.uploaded_rows = store.instance_count();
        assert_eq!(store.drawable_rows(), 10);

        store.clear_buffers();
        store.add_instance(0, CircleInstance::new(3.0, Vec2::zero(), Rgba8::WHITE));
        assert_eq!(store.drawable_rows(), 0);
    }

    #[test]
    fn mismatched_column_is_reported_by_name() {
        let mut store = CircleStore::new();
        store.add_instance(0, CircleInstance::new(1.0, Vec2::zero(), Rgba8::WHITE));
        store.columns.offset.push([0.0, 0.0]);
        match store.check_columns() {
            Err(RenderError::AttributeLengthMismatch {
                store: name,
                attribute,
                expected,
                found,
            }) => {
                assert_eq!(name, CircleStore::NAME);
                assert_eq!(attribute, "offset");
                assert_eq!((expected, found), (1, 2));
            }
            other => panic!("expected a length mismatch, got {other:?}"),
        }
    }

    // ── distance field ────────────────────────────────────────────────────

    fn assert_radii(actual: [f32; 4], expected: [f32; 4]) {
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-5, "{actual:?} != {expected:?}");
        }
    }

    #[test]
    fn band_radii_straddle_the_radius() {
        assert_radii(band_radii(10.0, 1.8, 1.0), [7.2, 8.2, 10.8, 11.8]);
    }

    #[test]
    fn quad_reaches_the_outer_band() {
        let [.., r4] = band_radii(10.0, 1.8, 1.0);
        assert!((quad_extent(10.0, 1.8) - 11.8).abs() < 1e-5);
        assert_eq!(quad_extent(10.0, 1.8), r4);
    }

    #[test]
    fn zero_outline_keeps_bands_ordered() {
        let [r1, r2, r3, r4] = band_radii(5.0, 0.0, 0.5);
        assert_radii([r1, r2, r3, r4], [4.0, 4.5, 4.5, 5.0]);
        assert!(r1 <= r2 && r2 <= r3 && r3 <= r4);
    }

    #[test]
    fn staged_columns_use_scalar_size() {
        let mut store = CircleStore::new();
        store.add_instance(-7, CircleInstance::new(2.5, Vec2::zero(), Rgba8::rgb(1, 2, 3)));
        let widths: Vec<usize> = store.staged_bytes().iter().map(|(_, b)| b.len()).collect();
        assert_eq!(widths, vec![4, 4, 8, 4]);
    }

    #[test]
    fn quad_covers_unit_square_with_two_triangles() {
        assert_eq!(QUAD_VERTICES.len(), 6);
        assert!(
            QUAD_VERTICES
                .iter()
                .all(|v| v.coord[0].abs() == 1.0 && v.coord[1].abs() == 1.0)
        );
    }
}
