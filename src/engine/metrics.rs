//! Frame Metrics
//!
//! Timing and per-tick diagnostic counters, owned by the scheduler and
//! readable by hooks through the context.
//!
//! Every counter is overwritten once per tick, when its pass is set up.
//! During the update pass `rendered_count` and `render_ms` still hold the
//! previous tick's values.

/// Per-frame timing and counter data
#[derive(Debug, Clone, Default)]
pub struct FrameMetrics {
    /// Ticks completed since start
    pub frame: u64,
    /// Clamped time since the previous tick (seconds)
    pub delta_seconds: f32,
    /// Exponential moving average of 1 / raw delta
    pub average_fps: f32,
    /// Objects in this tick's update set
    pub updated_count: usize,
    /// Objects in this tick's render set
    pub rendered_count: usize,
    /// `init` hooks run during this tick's drain
    pub initialized_count: usize,
    /// Update pass time (ms)
    pub update_ms: f32,
    /// Render pass time (ms)
    pub render_ms: f32,
}

impl FrameMetrics {
    /// Record a raw delta: clamp it for integration and fold it into the
    /// rolling fps average.
    pub fn record_delta(&mut self, raw_delta: f64, max_delta: f32, smoothing: f32) {
        let raw = raw_delta.max(0.0) as f32;
        self.delta_seconds = raw.min(max_delta);
        if raw > 0.0 {
            let instant = 1.0 / raw;
            self.average_fps = if self.average_fps == 0.0 {
                instant
            } else {
                self.average_fps + (instant - self.average_fps) * smoothing
            };
        }
    }
}

/// Milliseconds between two clock readings
pub fn elapsed_ms(start: f64, end: f64) -> f32 {
    ((end - start) * 1000.0) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delta_is_clamped() {
        let mut metrics = FrameMetrics::default();
        metrics.record_delta(5.0, 0.1, 0.05);
        assert!((metrics.delta_seconds - 0.1).abs() < 1e-6);
        metrics.record_delta(0.016, 0.1, 0.05);
        assert!((metrics.delta_seconds - 0.016).abs() < 1e-6);
    }

    #[test]
    fn test_fps_average_converges() {
        let mut metrics = FrameMetrics::default();
        metrics.record_delta(0.5, 0.1, 0.1);
        assert!((metrics.average_fps - 2.0).abs() < 1e-3);
        for _ in 0..200 {
            metrics.record_delta(1.0 / 60.0, 0.1, 0.1);
        }
        assert!((metrics.average_fps - 60.0).abs() < 0.5);
    }

    #[test]
    fn test_zero_delta_keeps_average() {
        let mut metrics = FrameMetrics::default();
        metrics.record_delta(0.02, 0.1, 0.5);
        metrics.record_delta(0.0, 0.1, 0.5);
        assert!((metrics.average_fps - 50.0).abs() < 1e-3);
        assert_eq!(metrics.delta_seconds, 0.0);
    }
}
