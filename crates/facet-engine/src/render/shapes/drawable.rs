use crate::render::RenderCtx;
use crate::render::shading::ShadingParams;

/// Common surface of the instanced shape stores.
///
/// A store owns one shape kind's geometry, its per-instance attribute columns
/// and every GPU object needed to draw them. The render manager only talks to
/// stores through this trait plus the store-specific extras.
pub trait InstancedDrawable {
    /// Attribute tuple of one instance, minus the depth index.
    type Instance;

    fn name(&self) -> &str;

    /// Appends one row to every attribute column. Nothing is uploaded.
    fn add_instance(&mut self, depth_index: i32, instance: Self::Instance);

    /// Drops every instance. Geometry and GPU buffers are kept.
    fn clear_buffers(&mut self);

    fn instance_count(&self) -> usize;

    fn shading(&self) -> &ShadingParams;

    /// Replaces the store's shading parameters; the next draw uses them.
    fn set_shading(&mut self, shading: &ShadingParams);

    /// Uploads every attribute column to its GPU buffer.
    fn update_all_buffers(&mut self, ctx: &RenderCtx<'_>);

    /// Records the store's draw calls into `pass`.
    ///
    /// `depth_normalizer` is the magnitude of the lowest depth index issued so
    /// far; the shaders divide by it to place instances in the depth range.
    /// Does nothing when no instances were uploaded.
    fn draw(&mut self, ctx: &RenderCtx<'_>, pass: &mut wgpu::RenderPass<'_>, depth_normalizer: f32);
}
