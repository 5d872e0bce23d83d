use anyhow::{Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::core::{App, AppControl, FrameCtx, WindowCtx};
use crate::device::{Gpu, GpuInit};
use crate::time::FrameClock;

/// Window configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
    pub resizable: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "facet".to_string(),
            initial_size: LogicalSize::new(1920.0, 1080.0),
            resizable: true,
        }
    }
}

/// Opens one window and drives an [`App`] until it exits or the window
/// closes. Redraws continuously.
pub struct Runtime;

impl Runtime {
    pub fn run<A>(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Result<()>
    where
        A: App + 'static,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut driver = Driver {
            config,
            gpu_init,
            app,
            clock: FrameClock::default(),
            target: None,
            failure: None,
        };

        event_loop
            .run_app(&mut driver)
            .context("winit event loop terminated with error")?;

        driver.failure.map_or(Ok(()), Err)
    }
}

/// The window and the GPU state whose surface borrows it.
#[self_referencing]
struct WindowTarget {
    window: Window,

    #[borrows(window)]
    #[covariant]
    gpu: Gpu<'this>,
}

impl WindowTarget {
    fn open(
        event_loop: &ActiveEventLoop,
        config: &RuntimeConfig,
        gpu_init: GpuInit,
    ) -> Result<Self> {
        let attrs = Window::default_attributes()
            .with_title(config.title.clone())
            .with_inner_size(config.initial_size)
            .with_resizable(config.resizable);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        WindowTargetTryBuilder {
            window,
            gpu_builder: |w| pollster::block_on(Gpu::new(w, gpu_init)),
        }
        .try_build()
        .context("GPU initialization failed")
    }

    fn request_redraw(&self) {
        self.with_window(|w| w.request_redraw());
    }

    fn resize_to_window(&mut self) {
        let size = self.with_window(|w| w.inner_size());
        self.with_gpu_mut(|gpu| gpu.resize(size));
    }
}

struct Driver<A: App + 'static> {
    config: RuntimeConfig,
    gpu_init: GpuInit,
    app: A,
    clock: FrameClock,

    target: Option<WindowTarget>,
    /// First fatal setup error, returned from `Runtime::run`.
    failure: Option<anyhow::Error>,
}

impl<A: App + 'static> Driver<A> {
    fn frame(&mut self) -> AppControl {
        let Some(target) = self.target.as_mut() else {
            return AppControl::Continue;
        };
        let (app, clock) = (&mut self.app, &mut self.clock);

        target.with_mut(|fields| {
            let mut ctx = FrameCtx {
                window: WindowCtx {
                    window: fields.window,
                },
                gpu: fields.gpu,
                time: clock.tick(),
            };
            app.on_frame(&mut ctx)
        })
    }
}

impl<A: App + 'static> ApplicationHandler for Driver<A> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.target.is_some() {
            self.clock.reset();
            return;
        }

        match WindowTarget::open(event_loop, &self.config, self.gpu_init.clone()) {
            Ok(target) => {
                log::info!("window opened: {:?}", self.config.title);
                target.request_redraw();
                self.target = Some(target);
            }
            Err(e) => {
                log::error!("{e:#}");
                self.failure = Some(e);
                event_loop.exit();
            }
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        event_loop.set_control_flow(ControlFlow::Poll);
        if let Some(target) = self.target.as_ref() {
            target.request_redraw();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        if self.app.on_window_event(&event) == AppControl::Exit {
            event_loop.exit();
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                self.target = None;
                event_loop.exit();
            }
            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(target) = self.target.as_mut() {
                    target.resize_to_window();
                    target.request_redraw();
                }
            }
            WindowEvent::RedrawRequested => {
                if self.frame() == AppControl::Exit {
                    event_loop.exit();
                }
            }
            _ => {}
        }
    }
}
