//! Instanced shape stores.

mod common;
mod drawable;

pub mod circle;
pub mod polygon;

pub use circle::{CircleInstance, CircleStore};
pub use common::DrawLayer;
pub use drawable::InstancedDrawable;
pub use polygon::{PolygonInstance, PolygonStore, Size};
