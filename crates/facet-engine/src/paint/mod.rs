//! Color model shared by the demo, the render manager and the shape stores.
//!
//! Instance colors travel to the GPU as four packed bytes and are normalized by
//! the vertex fetch (`Unorm8x4`). Uniform colors use the normalized `[f32; 4]`
//! form of the same type.

pub mod color;

pub use color::{ColorParseError, Rgba8};
