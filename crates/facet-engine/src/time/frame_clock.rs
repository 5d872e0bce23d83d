use std::time::{Duration, Instant};

/// Frame timing snapshot.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Time elapsed since the previous tick, in seconds (clamped).
    pub dt: f32,

    /// Monotonic timestamp taken at the tick.
    pub now: Instant,

    /// Monotonic frame counter.
    pub frame_index: u64,

    /// Frames per second over the last completed sampling window.
    pub fps: f32,
}

/// Frame clock producing `FrameTime` snapshots.
///
/// Delta time is clamped so a stall (debugger, minimized window) does not
/// produce a pathological step. The FPS estimate counts ticks over a sampling
/// window (0.5 s by default) and is refreshed when the window elapses.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Instant,
    frame_index: u64,
    dt_min: Duration,
    dt_max: Duration,

    fps_window: Duration,
    fps_window_start: Instant,
    fps_frames: u32,
    fps: f32,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::with_clamps(Duration::from_micros(100), Duration::from_millis(250))
    }

    /// Creates a clock with custom delta-time clamps.
    pub fn with_clamps(dt_min: Duration, dt_max: Duration) -> Self {
        debug_assert!(dt_min <= dt_max);
        let now = Instant::now();
        Self {
            last: now,
            frame_index: 0,
            dt_min,
            dt_max,
            fps_window: Duration::from_millis(500),
            fps_window_start: now,
            fps_frames: 0,
            fps: 0.0,
        }
    }

    /// Replaces the FPS sampling window.
    pub fn with_fps_window(mut self, window: Duration) -> Self {
        self.fps_window = window.max(Duration::from_millis(1));
        self
    }

    /// Resets the clock baseline, e.g. when resuming from suspension.
    pub fn reset(&mut self) {
        let now = Instant::now();
        self.last = now;
        self.fps_window_start = now;
        self.fps_frames = 0;
    }

    /// Latest FPS estimate; 0 until the first window completes.
    pub fn fps(&self) -> f32 {
        self.fps
    }

    /// Advances the clock and returns a new `FrameTime`.
    pub fn tick(&mut self) -> FrameTime {
        self.tick_at(Instant::now())
    }

    fn tick_at(&mut self, now: Instant) -> FrameTime {
        let dt = now
            .saturating_duration_since(self.last)
            .clamp(self.dt_min, self.dt_max);
        self.last = now;

        self.fps_frames += 1;
        let elapsed = now.saturating_duration_since(self.fps_window_start);
        if elapsed >= self.fps_window {
            self.fps = self.fps_frames as f32 / elapsed.as_secs_f32();
            self.fps_frames = 0;
            self.fps_window_start = now;
            log::trace!("fps: {:.1}", self.fps);
        }

        let ft = FrameTime {
            dt: dt.as_secs_f32(),
            now,
            frame_index: self.frame_index,
            fps: self.fps,
        };

        self.frame_index = self.frame_index.wrapping_add(1);

        ft
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_index_increments() {
        let mut clock = FrameClock::new();
        let base = clock.last;
        let a = clock.tick_at(base + Duration::from_millis(16));
        let b = clock.tick_at(base + Duration::from_millis(32));
        assert_eq!(a.frame_index, 0);
        assert_eq!(b.frame_index, 1);
    }

    #[test]
    fn dt_is_clamped() {
        let mut clock = FrameClock::new();
        let base = clock.last;
        let stalled = clock.tick_at(base + Duration::from_secs(3));
        assert!((stalled.dt - 0.25).abs() < 1e-6);
        let same = clock.tick_at(base + Duration::from_secs(3));
        assert!((same.dt - 0.0001).abs() < 1e-6);
    }

    #[test]
    fn fps_updates_once_per_window() {
        let mut clock = FrameClock::new();
        let base = clock.last;

        // 60 Hz for 0.5 s
        let mut last = None;
        for i in 1..=30 {
            last = Some(clock.tick_at(base + Duration::from_micros(16_667 * i)));
            if i < 30 {
                assert_eq!(clock.fps(), 0.0);
            }
        }
        let fps = last.map(|t| t.fps).unwrap_or_default();
        assert!((fps - 60.0).abs() < 0.5, "fps = {fps}");
    }

    #[test]
    fn reset_restarts_sampling() {
        let mut clock = FrameClock::new().with_fps_window(Duration::from_secs(1));
        let base = clock.last;
        clock.tick_at(base + Duration::from_millis(10));
        clock.reset();
        assert_eq!(clock.fps_frames, 0);
    }
}
