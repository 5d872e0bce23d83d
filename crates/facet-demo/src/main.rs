//! Instanced shape demo: thousands of rotating polygons and circles.
//!
//! Space toggles the rotation update, Escape exits.

mod config;
mod scene;

use std::time::Instant;

use anyhow::Result;
use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

use facet_engine::core::{App, AppControl, FrameCtx};
use facet_engine::device::GpuInit;
use facet_engine::logging::{LoggingConfig, init_logging};
use facet_engine::render::InstancedRender;
use facet_engine::window::{Runtime, RuntimeConfig};

use config::DemoConfig;

struct ShapesDemo {
    config: DemoConfig,
    render: InstancedRender,
    populated: bool,
    ticking: bool,
    since_fps_log: f32,
}

impl ShapesDemo {
    fn new(config: DemoConfig) -> Self {
        let render = InstancedRender::new(config.shading);
        Self {
            config,
            render,
            populated: false,
            ticking: true,
            since_fps_log: 0.0,
        }
    }

    /// Builds the scene once the first frame knows the window size.
    fn populate(&mut self, ctx: &FrameCtx<'_, '_>) -> Result<()> {
        let viewport = ctx.window.logical_size();
        let started = Instant::now();

        scene::populate(&mut self.render, &self.config, viewport, &mut rand::rng())?;

        let elapsed = started.elapsed();
        let count = self.render.instance_count();
        log::info!(
            "added {count} instances in {:.2} ms (avg {:.3} us)",
            elapsed.as_secs_f64() * 1e3,
            elapsed.as_secs_f64() * 1e6 / count.max(1) as f64,
        );

        self.render.update_all_buffers(&ctx.render_ctx());
        self.populated = true;
        Ok(())
    }
}

impl App for ShapesDemo {
    fn on_window_event(&mut self, event: &WindowEvent) -> AppControl {
        let WindowEvent::KeyboardInput { event, .. } = event else {
            return AppControl::Continue;
        };
        if event.state != ElementState::Pressed || event.repeat {
            return AppControl::Continue;
        }

        match event.physical_key {
            PhysicalKey::Code(KeyCode::Escape) => AppControl::Exit,
            PhysicalKey::Code(KeyCode::Space) => {
                self.ticking = !self.ticking;
                log::info!("rotation updates {}", if self.ticking { "on" } else { "off" });
                AppControl::Continue
            }
            _ => AppControl::Continue,
        }
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        if !self.populated {
            if let Err(e) = self.populate(ctx) {
                log::error!("failed to build scene: {e:#}");
                return AppControl::Exit;
            }
        }

        // ── update ────────────────────────────────────────────────────────
        self.render
            .set_viewport_resolution(ctx.window.logical_size());

        if self.ticking {
            scene::spin_all(&mut self.render, self.config.rotation_step);
            let rctx = ctx.render_ctx();
            for store in self.render.polygon_stores_mut() {
                store.update_rotation_buffer(&rctx);
            }
        }

        self.since_fps_log += ctx.time.dt;
        if self.since_fps_log >= self.config.fps_log_interval {
            self.since_fps_log = 0.0;
            log::info!("fps: {:.1}", ctx.time.fps);
        }

        // ── draw ──────────────────────────────────────────────────────────
        let render = &mut self.render;
        ctx.render(self.config.background, |rctx, target| {
            render.draw_all(rctx, target);
        })
    }
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let config = DemoConfig::default();
    log::info!(
        "facet demo: {} instances per kind, sizes [{}, {})",
        config.count_per_kind,
        config.min_size,
        config.max_size
    );

    Runtime::run(
        RuntimeConfig {
            title: "facet · instanced shapes".to_string(),
            ..RuntimeConfig::default()
        },
        GpuInit::default(),
        ShapesDemo::new(config),
    )
}
