use bytemuck::{Pod, Zeroable};

use crate::coords::Viewport;
use crate::paint::Rgba8;

/// Global shading parameters shared by every shape store.
///
/// Owned by [`InstancedRender`](super::InstancedRender); each store keeps a
/// copy that the manager refreshes on registration and after every setter.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ShadingParams {
    /// Viewport resolution in logical pixels.
    pub viewport: Viewport,
    pub outline_color: Rgba8,
    /// Outline thickness in pixels.
    pub outline_size: f32,
    /// Width in pixels of the antialiasing bands.
    pub transition_smoothness: f32,
    /// Weight of the outline color when mixed with the instance color (0..1).
    pub blend_factor: f32,
}

impl Default for ShadingParams {
    fn default() -> Self {
        Self {
            viewport: Viewport::new(1920.0, 1080.0),
            outline_color: Rgba8::rgb(0x48, 0x48, 0x48),
            outline_size: 1.8,
            transition_smoothness: 1.0,
            blend_factor: 0.6,
        }
    }
}

impl ShadingParams {
    pub(crate) fn to_uniform(&self, depth_normalizer: f32) -> ShadingUniform {
        ShadingUniform {
            resolution: self.viewport.resolution(),
            outline_size: self.outline_size.max(0.0),
            transition_smoothness: self.transition_smoothness.max(0.0),
            outline_color: self.outline_color.normalized(),
            blend_factor: self.blend_factor.clamp(0.0, 1.0),
            depth_normalizer,
            _pad: [0.0; 2],
        }
    }
}

/// GPU mirror of [`ShadingParams`] plus the per-draw depth normalizer.
///
/// Matches `struct Shading` in both WGSL shaders (48 bytes):
///
///  offset  0  resolution             vec2<f32>
///  offset  8  outline_size           f32
///  offset 12  transition_smoothness  f32
///  offset 16  outline_color          vec4<f32>
///  offset 32  blend_factor           f32
///  offset 36  depth_normalizer       f32
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub(crate) struct ShadingUniform {
    pub resolution: [f32; 2],
    pub outline_size: f32,
    pub transition_smoothness: f32,
    pub outline_color: [f32; 4],
    pub blend_factor: f32,
    pub depth_normalizer: f32,
    pub _pad: [f32; 2],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_is_48_bytes() {
        assert_eq!(std::mem::size_of::<ShadingUniform>(), 48);
    }

    #[test]
    fn uniform_carries_params() {
        let params = ShadingParams {
            viewport: Viewport::new(800.0, 600.0),
            outline_color: Rgba8::rgb(255, 0, 0),
            outline_size: 3.0,
            transition_smoothness: 0.5,
            blend_factor: 0.25,
        };
        let u = params.to_uniform(42.0);
        assert_eq!(u.resolution, [800.0, 600.0]);
        assert_eq!(u.outline_color, [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(u.outline_size, 3.0);
        assert_eq!(u.transition_smoothness, 0.5);
        assert_eq!(u.blend_factor, 0.25);
        assert_eq!(u.depth_normalizer, 42.0);
    }

    #[test]
    fn uniform_clamps_out_of_range_values() {
        let params = ShadingParams {
            viewport: Viewport::new(0.0, 0.0),
            outline_size: -1.0,
            blend_factor: 2.0,
            ..ShadingParams::default()
        };
        let u = params.to_uniform(0.0);
        assert_eq!(u.resolution, [1.0, 1.0]);
        assert_eq!(u.outline_size, 0.0);
        assert_eq!(u.blend_factor, 1.0);
    }
}
