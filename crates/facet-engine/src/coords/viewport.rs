/// Viewport size in logical pixels.
///
/// Shape offsets are centered on this viewport; the vertex shaders divide by
/// half of it to reach NDC.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    #[inline]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self.width > 0.0 && self.height > 0.0 && self.width.is_finite() && self.height.is_finite()
    }

    /// Resolution as uploaded to the shading uniform, never below 1×1.
    #[inline]
    pub fn resolution(self) -> [f32; 2] {
        [self.width.max(1.0), self.height.max(1.0)]
    }

    /// Half extents; offsets within `[-half, half]` are on screen.
    #[inline]
    pub fn half_extents(self) -> (f32, f32) {
        (self.width * 0.5, self.height * 0.5)
    }
}
