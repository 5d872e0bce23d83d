use crate::coords::Vec2;
use crate::geometry::GeometrySet;
use crate::paint::Rgba8;
use crate::render::shading::ShadingParams;
use crate::render::{RenderCtx, RenderError, Result};

use super::common::{
    COLOR_ATTRS, ColumnBuffer, DEPTH_ATTRS, DrawLayer, LayerBindings, LayerVertex, OFFSET_ATTRS,
    ROTATION_ATTRS, SIZE_XY_ATTRS, ShadingBinding, depth_state, instance_layout,
    premul_alpha_blend, static_vertex_buffer, triangle_list,
};
use super::drawable::InstancedDrawable;

/// Polygon scale: one factor for both axes, or one per axis.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Size {
    Uniform(f32),
    Xy(f32, f32),
}

impl Size {
    #[inline]
    pub fn to_array(self) -> [f32; 2] {
        match self {
            Size::Uniform(s) => [s, s],
            Size::Xy(x, y) => [x, y],
        }
    }
}

impl From<f32> for Size {
    #[inline]
    fn from(s: f32) -> Self {
        Size::Uniform(s)
    }
}

impl From<Vec2> for Size {
    #[inline]
    fn from(v: Vec2) -> Self {
        Size::Xy(v.x, v.y)
    }
}

/// One polygon occurrence.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PolygonInstance {
    /// Radians, counter-clockwise.
    pub rotation: f32,
    /// Scale from outline units to pixels.
    pub size: Size,
    /// Pixel position of the outline origin, relative to the viewport center.
    pub offset: Vec2,
    pub color: Rgba8,
}

impl PolygonInstance {
    pub fn new(rotation: f32, size: impl Into<Size>, offset: Vec2, color: Rgba8) -> Self {
        Self {
            rotation,
            size: size.into(),
            offset,
            color,
        }
    }
}

/// CPU-side instance attributes, one column per shader attribute.
///
/// Rows are only ever appended through [`push_row`](Self::push_row) so the
/// columns stay index-aligned.
#[derive(Debug, Clone, Default, PartialEq)]
pub(super) struct PolygonColumns {
    depth: Vec<f32>,
    rotation: Vec<f32>,
    size: Vec<[f32; 2]>,
    offset: Vec<[f32; 2]>,
    color: Vec<Rgba8>,
}

impl PolygonColumns {
    fn push_row(&mut self, depth_index: i32, instance: &PolygonInstance) {
        self.depth.push(depth_index as f32);
        self.rotation.push(instance.rotation);
        self.size.push(instance.size.to_array());
        self.offset.push(instance.offset.to_array());
        self.color.push(instance.color);
    }

    fn clear(&mut self) {
        self.depth.clear();
        self.rotation.clear();
        self.size.clear();
        self.offset.clear();
        self.color.clear();
    }

    #[inline]
    fn len(&self) -> usize {
        self.depth.len()
    }

    /// Byte views of every column, in vertex-buffer slot order (1..=5).
    fn bytes(&self) -> [(&'static str, &[u8], usize); 5] {
        [
            ("depth", bytemuck::cast_slice(&self.depth), self.depth.len()),
            ("rotation", bytemuck::cast_slice(&self.rotation), self.rotation.len()),
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

/// GPU resources of a polygon store, created on first upload or draw.
struct PolygonGpu {
    formats: (wgpu::TextureFormat, Option<wgpu::TextureFormat>),
    pipeline: wgpu::RenderPipeline,
    shading: ShadingBinding,
    layers: LayerBindings,
    layer_vbos: [(wgpu::Buffer, u32); 3],
}

/// Instanced renderer for one polygon kind.
///
/// Owns the decomposed geometry of one outline plus parallel per-instance
/// attribute columns. Every instance is drawn in three passes over the same
/// instance data: fill, outline, corners.
pub struct PolygonStore {
    name: String,
    outline: Vec<Vec2>,
    geometry: GeometrySet,
    columns: PolygonColumns,
    shading: ShadingParams,

    gpu: Option<PolygonGpu>,
    column_vbos: [ColumnBuffer; 5],
    uploaded_rows: usize,
}

impl PolygonStore {
    /// Decomposes `outline` and creates an empty store.
    ///
    /// Fails with [`RenderError::InvalidGeometry`] for degenerate outlines.
    pub fn new(name: impl Into<String>, outline: Vec<Vec2>) -> Result<Self> {
        let name = name.into();
        let geometry = GeometrySet::from_outline(&outline)?;
        log::debug!(
            "polygon store {name:?}: {} fill, {} outline, {} corner vertices",
            geometry.fill.len(),
            geometry.outline.len(),
            geometry.corners.len(),
        );

        let column_vbos = [
            ("depth", 4),
            ("rotation", 4),
            ("size", 8),
            ("offset", 8),
            ("color", 4),
        ]
        .map(|(attr, stride)| ColumnBuffer::new(format!("facet polygon {name} {attr} vbo"), stride));

        Ok(Self {
            name,
            outline,
            geometry,
            columns: PolygonColumns::default(),
            shading: ShadingParams::default(),
            gpu: None,
            column_vbos,
            uploaded_rows: 0,
        })
    }

    pub fn outline(&self) -> &[Vec2] {
        &self.outline
    }

    pub fn geometry(&self) -> &GeometrySet {
        &self.geometry
    }

    pub fn fill_triangle_count(&self) -> usize {
        self.geometry.fill_triangle_count()
    }

    /// Depth indices in insertion order.
    pub fn depth_indices(&self) -> impl Iterator<Item = i32> + '_ {
        self.columns.depth.iter().map(|&d| d as i32)
    }

    pub fn rotations(&self) -> &[f32] {
        &self.columns.rotation
    }

    /// Mutable rotations for animation; call
    /// [`update_rotation_buffer`](Self::update_rotation_buffer) afterwards.
    pub fn rotations_mut(&mut self) -> &mut [f32] {
        &mut self.columns.rotation
    }

    pub fn sizes(&self) -> &[[f32; 2]] {
        &self.columns.size
    }

    pub fn offsets(&self) -> &[[f32; 2]] {
        &self.columns.offset
    }

    pub fn colors(&self) -> &[Rgba8] {
        &self.columns.color
    }

    /// Verifies that every attribute column has the same number of rows.
    pub fn check_columns(&self) -> Result<()> {
        self.columns.check(&self.name)
    }

    /// Byte payloads the next [`update_all_buffers`](InstancedDrawable::update_all_buffers)
    /// would upload, in vertex-buffer slot order.
    pub fn staged_bytes(&self) -> Vec<(&'static str, &[u8])> {
        self.columns
            .bytes()
            .into_iter()
            .map(|(name, bytes, _)| (name, bytes))
            .collect()
    }

    /// Uploads only the rotation column.
    ///
    /// Instances added since the last full upload stay undrawn until
    /// [`update_all_buffers`](InstancedDrawable::update_all_buffers) runs.
    pub fn update_rotation_buffer(&mut self, ctx: &RenderCtx<'_>) {
        self.debug_check_columns();
        let rows = self.columns.len();
        self.column_vbos[1].upload(ctx, bytemuck::cast_slice(&self.columns.rotation), rows);
    }

    /// Instances that both exist on the CPU and were uploaded.
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

        let label = format!("facet polygon {}", self.name);
        let device = ctx.device;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&format!("{label} shader")),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/polygon.wgsl").into()),
        });

        let shading = ShadingBinding::new(device, &label);
        let layers = LayerBindings::new(device, &label);

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(&format!("{label} pipeline layout")),
            bind_group_layouts: &[&shading.layout, &layers.layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(&format!("{label} pipeline")),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[
                    LayerVertex::layout(),
                    instance_layout(&DEPTH_ATTRS),
                    instance_layout(&ROTATION_ATTRS),
                    instance_layout(&SIZE_XY_ATTRS),
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

        let fill: Vec<LayerVertex> = self
            .geometry
            .fill
            .iter()
            .map(|p| LayerVertex { coord: p.to_array(), direction: 0.0 })
            .collect();
        let directed = |mesh: &crate::geometry::DirectedMesh| -> Vec<LayerVertex> {
            mesh.vertices
                .iter()
                .zip(&mesh.directions)
                .map(|(p, &direction)| LayerVertex { coord: p.to_array(), direction })
                .collect()
        };
        let outline = directed(&self.geometry.outline);
        let corners = directed(&self.geometry.corners);

        let layer_vbos = [
            (static_vertex_buffer(device, &format!("{label} fill vbo"), &fill), fill.len() as u32),
            (
                static_vertex_buffer(device, &format!("{label} outline vbo"), &outline),
                outline.len() as u32,
            ),
            (
                static_vertex_buffer(device, &format!("{label} corner vbo"), &corners),
                corners.len() as u32,
            ),
        ];

        self.gpu = Some(PolygonGpu {
            formats,
            pipeline,
            shading,
            layers,
            layer_vbos,
        });
    }
}

impl InstancedDrawable for PolygonStore {
    type Instance = PolygonInstance;

    fn name(&self) -> &str {
        &self.name
    }

    fn add_instance(&mut self, depth_index: i32, instance: PolygonInstance) {
        debug_assert!(
            instance.size.to_array().iter().all(|s| *s >= 0.0),
            "polygon size must be non-negative"
        );
        debug_assert!(instance.offset.is_finite() && instance.rotation.is_finite());
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
        for (slot, vbo) in self.column_vbos.iter().enumerate() {
            let Some(buffer) = vbo.buffer() else { return };
            pass.set_vertex_buffer(slot as u32 + 1, buffer.slice(..));
        }

        let instances = 0..rows as u32;
        for (layer, (vbo, vertex_count)) in DrawLayer::ALL.into_iter().zip(&gpu.layer_vbos) {
            pass.set_bind_group(1, gpu.layers.group(layer), &[]);
            pass.set_vertex_buffer(0, vbo.slice(..));
            pass.draw(0..*vertex_count, instances.clone());
        }
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

    fn red() -> Rgba8 {
        Rgba8::rgb(255, 0, 0)
    }

    // ── construction ──────────────────────────────────────────────────────

    #[test]
    fn square_store_geometry() {
        let store = PolygonStore::new("square", square()).unwrap();
        assert_eq!(store.name(), "square");
        assert_eq!(store.fill_triangle_count(), 2);
        assert_eq!(store.geometry().outline.len(), 24);
        assert_eq!(store.geometry().corners.len(), 24);
        assert_eq!(store.instance_count(), 0);
    }

    #[test]
    fn degenerate_outline_is_rejected() {
        let err = PolygonStore::new("line", vec![Vec2::zero(), Vec2::new(1.0, 0.0)]).err();
        assert!(matches!(err, Some(RenderError::InvalidGeometry { .. })));
    }

    // ── instances ─────────────────────────────────────────────────────────

    #[test]
    fn add_instance_appends_one_row_everywhere() {
        let mut store = PolygonStore::new("square", square()).unwrap();
        store.add_instance(0, PolygonInstance::new(0.5, 5.0, Vec2::new(1.0, 2.0), red()));
        store.add_instance(
            -1,
            PolygonInstance::new(0.0, Vec2::new(2.0, 3.0), Vec2::zero(), Rgba8::WHITE),
        );

        assert_eq!(store.instance_count(), 2);
        assert_eq!(store.depth_indices().collect::<Vec<_>>(), vec![0, -1]);
        assert_eq!(store.rotations(), &[0.5, 0.0]);
        assert_eq!(store.sizes(), &[[5.0, 5.0], [2.0, 3.0]]);
        assert_eq!(store.offsets(), &[[1.0, 2.0], [0.0, 0.0]]);
        assert_eq!(store.colors(), &[red(), Rgba8::WHITE]);
        assert!(store.check_columns().is_ok());
    }

    #[test]
    fn clear_buffers_empties_columns_but_keeps_geometry() {
        let mut store = PolygonStore::new("square", square()).unwrap();
        for i in 0..10 {
            store.add_instance(-i, PolygonInstance::new(0.0, 1.0, Vec2::zero(), red()));
        }
        store.clear_buffers();

        assert_eq!(store.instance_count(), 0);
        assert!(store.rotations().is_empty());
        assert!(store.sizes().is_empty());
        assert!(store.offsets().is_empty());
        assert!(store.colors().is_empty());
        assert!(store.staged_bytes().iter().all(|(_, b)| b.is_empty()));
        assert_eq!(store.fill_triangle_count(), 2);
    }

    #[test]
    fn rotations_mut_edits_in_place() {
        let mut store = PolygonStore::new("square", square()).unwrap();
        store.add_instance(0, PolygonInstance::new(1.0, 1.0, Vec2::zero(), red()));
        store.rotations_mut()[0] += 0.25;
        assert_eq!(store.rotations(), &[1.25]);
    }

    // ── staging ───────────────────────────────────────────────────────────

    #[test]
    fn staged_bytes_are_stable_without_mutation() {
        let mut store = PolygonStore::new("square", square()).unwrap();
        store.add_instance(0, PolygonInstance::new(0.1, 4.0, Vec2::new(-3.0, 7.0), red()));
        let first: Vec<(&str, Vec<u8>)> = store
            .staged_bytes()
            .into_iter()
            .map(|(n, b)| (n, b.to_vec()))
            .collect();
        let second: Vec<(&str, Vec<u8>)> = store
            .staged_bytes()
            .into_iter()
            .map(|(n, b)| (n, b.to_vec()))
            .collect();
        assert_eq!(first, second);
    }

    #[test]
    fn staged_bytes_follow_slot_order_and_widths() {
        let mut store = PolygonStore::new("square", square()).unwrap();
        store.add_instance(-3, PolygonInstance::new(0.0, 1.0, Vec2::zero(), red()));
        let staged = store.staged_bytes();
        let names: Vec<&str> = staged.iter().map(|(n, _)| *n).collect();
        let widths: Vec<usize> = staged.iter().map(|(_, b)| b.len()).collect();
        assert_eq!(names, vec!["depth", "rotation", "size", "offset", "color"]);
        assert_eq!(widths, vec![4, 4, 8, 8, 4]);
        assert_eq!(staged[0].1, bytemuck::bytes_of(&-3.0f32));
        assert_eq!(staged[4].1, &[255, 0, 0, 255]);
    }

    // ── shading ───────────────────────────────────────────────────────────

    #[test]
    fn set_shading_replaces_copy() {
        let mut store = PolygonStore::new("square", square()).unwrap();
        let params = ShadingParams {
            outline_size: 3.0,
            ..ShadingParams::default()
        };
        store.set_shading(&params);
        assert_eq!(store.shading().outline_size, 3.0);
    }

    #[test]
    fn nothing_is_drawable_before_upload() {
        let mut store = PolygonStore::new("square", square()).unwrap();
        store.add_instance(0, PolygonInstance::new(0.0, 1.0, Vec2::zero(), red()));
        assert_eq!(store.drawable_rows(), 0);
    }

    #[test]
    fn rows_added_after_clear_wait_for_next_upload() {
        let mut store = PolygonStore::new("square", square()).unwrap();
        for i in 0..10 {
            store.add_instance(-i, PolygonInstance::new(0.0, 1.0, Vec2::zero(), red()));
        }
        // stands in for update_all_buffers, which needs a device
        store.uploaded_rows = store.instance_count();
        assert_eq!(store.drawable_rows(), 10);

        store.clear_buffers();
        store.add_instance(0, PolygonInstance::new(0.0, 1.0, Vec2::zero(), red()));
        assert_eq!(store.drawable_rows(), 0);
    }
}
