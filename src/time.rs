//! Frame timing for the native window.
//!
//! The flame itself is tick-indexed and never reads the clock. This only
//! feeds the FPS readout in the window title and overlay.
//!
//! ```ignore
//! let mut time = FrameClock::new();
//!
//! // once per presented frame:
//! time.update();
//! println!("{} frames, {:.1} fps", time.frame(), time.fps());
//! ```

use std::time::{Duration, Instant};

/// Counts presented frames and estimates frames per second.
#[derive(Debug)]
pub struct FrameClock {
    frame_count: u64,
    /// Updated every `fps_update_interval`.
    fps: f32,
    fps_frame_count: u64,
    fps_update_time: Instant,
    fps_update_interval: Duration,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::with_interval(Duration::from_millis(500))
    }

    /// A clock that recomputes FPS every `interval`.
    pub fn with_interval(interval: Duration) -> Self {
        let now = Instant::now();
        Self {
            frame_count: 0,
            fps: 0.0,
            fps_frame_count: 0,
            fps_update_time: now,
            fps_update_interval: interval,
        }
    }

    /// Record a frame. Returns `true` when the FPS estimate changed.
    pub fn update(&mut self) -> bool {
        let now = Instant::now();
        self.frame_count += 1;

        let fps_elapsed = now.duration_since(self.fps_update_time);
        if fps_elapsed < self.fps_update_interval || fps_elapsed.is_zero() {
            return false;
        }
        let frames_since = self.frame_count - self.fps_frame_count;
        self.fps = frames_since as f32 / fps_elapsed.as_secs_f32();
        self.fps_frame_count = self.frame_count;
        self.fps_update_time = now;
        true
    }

    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
