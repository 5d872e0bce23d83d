//! Shared GPU types and utilities used by the polygon and circle stores.

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::render::RenderCtx;
use crate::render::shading::ShadingUniform;

// ── blend / depth ─────────────────────────────────────────────────────────

pub(super) fn premul_alpha_blend() -> wgpu::BlendState {
    wgpu::BlendState {
        color: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
        alpha: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
    }
}

/// Later instances carry smaller depth values; `LessEqual` lets the outline and
/// corner layers of an instance land on top of its own fill.
pub(super) fn depth_state(format: Option<wgpu::TextureFormat>) -> Option<wgpu::DepthStencilState> {
    format.map(|format| wgpu::DepthStencilState {
        format,
        depth_write_enabled: true,
        depth_compare: wgpu::CompareFunction::LessEqual,
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
    })
}

pub(super) fn triangle_list() -> wgpu::PrimitiveState {
    wgpu::PrimitiveState {
        topology: wgpu::PrimitiveTopology::TriangleList,
        strip_index_format: None,
        front_face: wgpu::FrontFace::Ccw,
        cull_mode: None,
        polygon_mode: wgpu::PolygonMode::Fill,
        unclipped_depth: false,
        conservative: false,
    }
}

// ── draw layers ───────────────────────────────────────────────────────────

/// Geometry pass selector. Polygons draw all three, in this order.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DrawLayer {
    Fill = 0,
    Outline = 1,
    Corner = 2,
}

impl DrawLayer {
    pub const ALL: [DrawLayer; 3] = [DrawLayer::Fill, DrawLayer::Outline, DrawLayer::Corner];

    #[inline]
    pub fn as_f32(self) -> f32 {
        self as u8 as f32
    }

    /// Pixels a vertex of this layer is pushed along its direction.
    /// Mirrors `vs_main` in `polygon.wgsl`.
    pub fn push_distance(self, outline_size: f32) -> f32 {
        match self {
            DrawLayer::Fill => 0.0,
            DrawLayer::Outline => outline_size,
            DrawLayer::Corner => outline_size * std::f32::consts::SQRT_2,
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct LayerUniform {
    kind: f32,
    _pad: [f32; 3], // 16-byte alignment
}

// ── uniform sizes ─────────────────────────────────────────────────────────

/// Minimum binding size for a uniform of type `T`.
///
/// Every uniform struct here is non-empty, so the size is never zero.
fn ubo_min_binding_size<T>() -> wgpu::BufferSize {
    wgpu::BufferSize::new(std::mem::size_of::<T>() as u64)
        .expect("uniform structs have non-zero size by construction")
}

fn uniform_layout_entry<T>() -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding: 0,
        visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: Some(ubo_min_binding_size::<T>()),
        },
        count: None,
    }
}

// ── shading binding (group 0) ─────────────────────────────────────────────

/// Per-store shading uniform buffer + bind group.
///
/// Each store owns its own copy, so writing one store's depth normalizer never
/// disturbs another store's draws in the same pass.
pub(super) struct ShadingBinding {
    pub layout: wgpu::BindGroupLayout,
    pub bind_group: wgpu::BindGroup,
    ubo: wgpu::Buffer,
}

impl ShadingBinding {
    pub fn new(device: &wgpu::Device, label: &str) -> Self {
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(&format!("{label} shading bgl")),
            entries: &[uniform_layout_entry::<ShadingUniform>()],
        });

        let ubo = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("{label} shading ubo")),
            size: std::mem::size_of::<ShadingUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{label} shading bind group")),
            layout: &layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: ubo.as_entire_binding(),
            }],
        });

        Self { layout, bind_group, ubo }
    }

    pub fn write(&self, queue: &wgpu::Queue, uniform: &ShadingUniform) {
        queue.write_buffer(&self.ubo, 0, bytemuck::bytes_of(uniform));
    }
}

// ── layer bindings (group 1) ──────────────────────────────────────────────

/// One static bind group per [`DrawLayer`]; switching layers is a bind-group
/// swap inside the pass rather than a uniform write.
pub(super) struct LayerBindings {
    pub layout: wgpu::BindGroupLayout,
    groups: Vec<wgpu::BindGroup>,
}

impl LayerBindings {
    pub fn new(device: &wgpu::Device, label: &str) -> Self {
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(&format!("{label} layer bgl")),
            entries: &[uniform_layout_entry::<LayerUniform>()],
        });

        let groups = DrawLayer::ALL
            .iter()
            .map(|layer| {
                let ubo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("{label} layer {layer:?} ubo")),
                    contents: bytemuck::bytes_of(&LayerUniform {
                        kind: layer.as_f32(),
                        _pad: [0.0; 3],
                    }),
                    usage: wgpu::BufferUsages::UNIFORM,
                });
                device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some(&format!("{label} layer {layer:?} bind group")),
                    layout: &layout,
                    entries: &[wgpu::BindGroupEntry {
                        binding: 0,
                        resource: ubo.as_entire_binding(),
                    }],
                })
            })
            .collect();

        Self { layout, groups }
    }

    #[inline]
    pub fn group(&self, layer: DrawLayer) -> &wgpu::BindGroup {
        &self.groups[layer as usize]
    }
}

// ── per-vertex geometry ───────────────────────────────────────────────────

/// Static per-vertex data of one polygon layer.
///
/// Fill vertices carry a zero direction; the shader ignores it on that layer.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub(super) struct LayerVertex {
    pub coord: [f32; 2],
    pub direction: f32,
}

impl LayerVertex {
    const ATTRS: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
        0 => Float32x2, // coord
        1 => Float32    // outline direction
    ];

    pub(super) fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<LayerVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(super) struct QuadVertex {
    pub coord: [f32; 2], // -1..1
}

impl QuadVertex {
    const ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x2];

    pub(super) fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<QuadVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

/// Two triangles covering `[-1, 1]²`, drawn without an index buffer.
pub(super) const QUAD_VERTICES: [QuadVertex; 6] = [
    QuadVertex { coord: [-1.0, -1.0] },
    QuadVertex { coord: [-1.0, 1.0] },
    QuadVertex { coord: [1.0, 1.0] },
    QuadVertex { coord: [-1.0, -1.0] },
    QuadVertex { coord: [1.0, 1.0] },
    QuadVertex { coord: [1.0, -1.0] },
];

// ── per-instance attributes ───────────────────────────────────────────────

// Shader locations are shared by both stores so the attribute contract reads
// the same in polygon.wgsl and circle.wgsl.
pub(super) const DEPTH_ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![2 => Float32];
pub(super) const ROTATION_ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![3 => Float32];
pub(super) const SIZE_XY_ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![4 => Float32x2];
pub(super) const SIZE_ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![4 => Float32];
pub(super) const OFFSET_ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![5 => Float32x2];
pub(super) const COLOR_ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![6 => Unorm8x4];

/// Layout for one instance column; the instance step mode is the divisor.
pub(super) fn instance_layout(
    attributes: &'static [wgpu::VertexAttribute],
) -> wgpu::VertexBufferLayout<'static> {
    let array_stride = attributes
        .iter()
        .map(|a| a.offset + a.format.size())
        .max()
        .unwrap_or(0);
    wgpu::VertexBufferLayout {
        array_stride,
        step_mode: wgpu::VertexStepMode::Instance,
        attributes,
    }
}

/// One growable GPU vertex buffer backing one CPU attribute column.
///
/// Capacity grows to the next power of two (at least 64 rows) and never shrinks.
pub(super) struct ColumnBuffer {
    label: String,
    stride: u64,
    buffer: Option<wgpu::Buffer>,
    capacity: usize,
}

impl ColumnBuffer {
    pub fn new(label: String, stride: u64) -> Self {
        Self {
            label,
            stride,
            buffer: None,
            capacity: 0,
        }
    }

    /// Writes `bytes` (exactly `rows` rows) at offset zero, growing first if needed.
    pub fn upload(&mut self, ctx: &RenderCtx<'_>, bytes: &[u8], rows: usize) {
        debug_assert_eq!(bytes.len() as u64, rows as u64 * self.stride);
        if rows > self.capacity || self.buffer.is_none() {
            let new_cap = rows.next_power_of_two().max(64);
            log::trace!("{}: growing to {new_cap} rows", self.label);
            self.buffer = Some(ctx.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(&self.label),
                size: new_cap as u64 * self.stride,
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }));
            self.capacity = new_cap;
        }
        if bytes.is_empty() {
            return;
        }
        if let Some(buffer) = self.buffer.as_ref() {
            ctx.queue.write_buffer(buffer, 0, bytes);
        }
    }

    #[inline]
    pub fn buffer(&self) -> Option<&wgpu::Buffer> {
        self.buffer.as_ref()
    }
}

/// Creates an immutable vertex buffer; empty slices get a 4-byte placeholder.
pub(super) fn static_vertex_buffer<T: Pod>(
    device: &wgpu::Device,
    label: &str,
    data: &[T],
) -> wgpu::Buffer {
    let bytes: &[u8] = bytemuck::cast_slice(data);
    let placeholder = [0u8; 4];
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: if bytes.is_empty() { &placeholder } else { bytes },
        usage: wgpu::BufferUsages::VERTEX,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instance_strides_match_cpu_columns() {
        assert_eq!(instance_layout(&DEPTH_ATTRS).array_stride, 4);
        assert_eq!(instance_layout(&ROTATION_ATTRS).array_stride, 4);
        assert_eq!(instance_layout(&SIZE_XY_ATTRS).array_stride, 8);
        assert_eq!(instance_layout(&SIZE_ATTRS).array_stride, 4);
        assert_eq!(instance_layout(&OFFSET_ATTRS).array_stride, 8);
        assert_eq!(instance_layout(&COLOR_ATTRS).array_stride, 4);
    }

    #[test]
    fn instance_layouts_step_per_instance() {
        assert_eq!(
            instance_layout(&COLOR_ATTRS).step_mode,
            wgpu::VertexStepMode::Instance
        );
        assert_eq!(LayerVertex::layout().step_mode, wgpu::VertexStepMode::Vertex);
    }

    #[test]
    fn layer_vertex_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<LayerVertex>(), 12);
        assert_eq!(LayerVertex::layout().array_stride, 12);
    }

    #[test]
    fn draw_layers_encode_as_selector_values() {
        let values: Vec<f32> = DrawLayer::ALL.iter().map(|l| l.as_f32()).collect();
        assert_eq!(values, vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn outline_layers_push_by_full_thickness() {
        let outline = 1.8;
        assert_eq!(DrawLayer::Fill.push_distance(outline), 0.0);
        assert!((DrawLayer::Outline.push_distance(outline) - 1.8).abs() < 1e-6);
        assert!((DrawLayer::Corner.push_distance(outline) - 1.8 * 2f32.sqrt()).abs() < 1e-5);
    }

    #[test]
    fn corner_diamond_encloses_outline_circle() {
        // corner pushes run along diagonals, so the diamond's inscribed
        // radius is push / sqrt(2)
        let outline = 3.0;
        let inscribed = DrawLayer::Corner.push_distance(outline) / 2f32.sqrt();
        assert!(inscribed >= outline - 1e-5);
    }
}
