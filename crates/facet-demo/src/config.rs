use facet_engine::paint::Rgba8;
use facet_engine::render::ShadingParams;

/// Demo scene settings.
#[derive(Debug, Clone)]
pub struct DemoConfig {
    /// Instances per polygon kind, and circles.
    pub count_per_kind: usize,
    /// Instance sizes are drawn uniformly from `[min_size, max_size)`.
    pub min_size: f32,
    pub max_size: f32,
    pub palette: Vec<Rgba8>,
    pub background: Rgba8,
    /// Rotation added to every polygon per ticked frame, in radians.
    pub rotation_step: f32,
    pub shading: ShadingParams,
    /// Seconds between FPS log lines.
    pub fps_log_interval: f32,
}

impl Default for DemoConfig {
    fn default() -> Self {
        let hex = |s: &str| Rgba8::from_hex(s).unwrap_or(Rgba8::BLACK);
        Self {
            count_per_kind: 2000,
            min_size: 2.0,
            max_size: 20.0,
            palette: ["#3ca4cb", "#8abc3f", "#e03e41", "#cc669c"]
                .into_iter()
                .map(hex)
                .collect(),
            background: hex("#dbdbdb"),
            rotation_step: 0.1,
            shading: ShadingParams::default(),
            fps_log_interval: 2.0,
        }
    }
}
