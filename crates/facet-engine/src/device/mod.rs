//! GPU device, surface and depth buffer.
//!
//! [`Gpu`] is created once per window by the runtime. It owns the wgpu
//! device/queue, keeps the swapchain and a matching depth texture configured
//! across resizes, and hands out one [`GpuFrame`] per redraw.

mod config;
mod depth;
mod gpu;
mod surface;

pub use config::GpuInit;
pub use depth::DepthBuffer;
pub use gpu::{Gpu, GpuFrame};
pub use surface::SurfaceErrorAction;
