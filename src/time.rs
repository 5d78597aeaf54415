//! Frame timing for the render loop.
//!
//! The snowfall steps a fixed distance per frame, so frame timing only feeds
//! diagnostics (the FPS readout in the panel) and the `delta` argument hosts
//! pass to [`SnowScene::tick`](crate::SnowScene::tick).
//!
//! ```ignore
//! let mut clock = FrameClock::new();
//!
//! // In your frame loop:
//! let frame = clock.tick();
//! scene.tick(frame.delta);
//! ```

use std::time::{Duration, Instant};

/// Timing values for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTime {
    /// Seconds since the clock started.
    pub elapsed: f32,
    /// Seconds since the previous frame.
    pub delta: f32,
    /// Frames ticked so far, including this one.
    pub frame: u64,
}

/// Tracks elapsed time, frame delta and a smoothed frame rate.
#[derive(Debug)]
pub struct FrameClock {
    start: Instant,
    last_frame: Instant,
    frame_count: u64,
    fps: f32,
    fps_frame_count: u64,
    fps_update_time: Instant,
    fps_update_interval: Duration,
}

impl FrameClock {
    /// Create a clock starting now.
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    /// Create a clock starting at `start`.
    pub fn starting_at(start: Instant) -> Self {
        Self {
            start,
            last_frame: start,
            frame_count: 0,
            fps: 0.0,
            fps_frame_count: 0,
            fps_update_time: start,
            fps_update_interval: Duration::from_millis(500),
        }
    }

    /// Record a frame happening now.
    pub fn tick(&mut self) -> FrameTime {
        self.tick_at(Instant::now())
    }

    /// Record a frame happening at `now`.
    ///
    /// Instants earlier than the previous frame count as zero delta.
    pub fn tick_at(&mut self, now: Instant) -> FrameTime {
        let delta = now.saturating_duration_since(self.last_frame).as_secs_f32();
        self.last_frame = self.last_frame.max(now);
        self.frame_count += 1;

        let since_fps = now.saturating_duration_since(self.fps_update_time);
        if since_fps >= self.fps_update_interval {
            let frames = self.frame_count - self.fps_frame_count;
            self.fps = frames as f32 / since_fps.as_secs_f32();
            self.fps_frame_count = self.frame_count;
            self.fps_update_time = now;
        }

        FrameTime {
            elapsed: self.last_frame.duration_since(self.start).as_secs_f32(),
            delta,
            frame: self.frame_count,
        }
    }

    /// Frames ticked so far.
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    /// Frame rate averaged over the last update interval.
    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }

    /// Seconds since the clock started, as of the latest frame.
    pub fn elapsed(&self) -> f32 {
        self.last_frame.duration_since(self.start).as_secs_f32()
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
    fn test_clock_new() {
        let clock = FrameClock::new();
        assert_eq!(clock.frame(), 0);
        assert_eq!(clock.fps(), 0.0);
    }

    #[test]
    fn test_tick_reports_delta() {
        let start = Instant::now();
        let mut clock = FrameClock::starting_at(start);

        let first = clock.tick_at(start + Duration::from_millis(20));
        assert!((first.delta - 0.020).abs() < 1e-4);
        assert_eq!(first.frame, 1);

        let second = clock.tick_at(start + Duration::from_millis(50));
        assert!((second.delta - 0.030).abs() < 1e-4);
        assert!((second.elapsed - 0.050).abs() < 1e-4);
        assert_eq!(second.frame, 2);
    }

    #[test]
    fn test_fps_after_interval() {
        let start = Instant::now();
        let mut clock = FrameClock::starting_at(start);
        for i in 1..=30 {
            clock.tick_at(start + Duration::from_micros(i * 16_667));
        }
        // 30 frames over ~0.5s
        assert!((clock.fps() - 60.0).abs() < 1.0, "fps was {}", clock.fps());
    }

    #[test]
    fn test_backwards_instant_is_zero_delta() {
        let start = Instant::now();
        let mut clock = FrameClock::starting_at(start + Duration::from_millis(10));
        let t = clock.tick_at(start);
        assert_eq!(t.delta, 0.0);
        assert_eq!(t.elapsed, 0.0);
    }
}
