//! Contract between the runtime loop and applications.
//!
//! The runtime owns the window, GPU and clock; applications implement [`App`]
//! and receive a [`FrameCtx`] once per frame.

mod app;
mod ctx;

pub use app::{App, AppControl};
pub use ctx::{FrameCtx, WindowCtx};
