//! Frame timing.
//!
//! One `FrameClock` per render loop: call `tick()` once per presented frame to
//! obtain a `FrameTime`. The clock also keeps a frames-per-second estimate.

mod frame_clock;

pub use frame_clock::{FrameClock, FrameTime};
