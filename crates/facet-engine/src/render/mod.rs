//! GPU rendering subsystem.
//!
//! Shape stores keep per-instance attributes on the CPU, upload them to
//! instance-stepped vertex buffers and issue one instanced draw per geometry
//! layer. [`InstancedRender`] coordinates the stores: it assigns depth
//! indices, owns the shared shading parameters and fixes the draw order.
//!
//! Convention:
//! - Instance offsets are logical pixels, origin at the viewport center, +Y up.
//! - Vertex shaders convert to NDC with the resolution in the shading uniform.
//! - Earlier insertions are drawn further away than later ones.

mod ctx;
mod error;
mod manager;
mod shading;
pub mod shapes;

pub use ctx::{RenderCtx, RenderTarget};
pub use error::{RenderError, Result};
pub use manager::InstancedRender;
pub use shading::ShadingParams;
