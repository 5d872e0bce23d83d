//! facet engine crate.
//!
//! Instanced 2D shape rendering on wgpu: polygon kinds are registered once as
//! outlines and drawn many times per frame (fill, thickened outline and
//! rounded corners), circles are drawn as distance-field quads. The platform
//! pieces (window loop, GPU device, frame clock, logging) live alongside.

pub mod device;
pub mod window;
pub mod time;
pub mod core;

pub mod logging;
pub mod coords;
pub mod paint;
pub mod geometry;
pub mod render;
