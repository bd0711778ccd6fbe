// SPDX-License-Identifier: MIT
//
// Frame clock.
//
// Counts frames for the loop that owns it. The rate is measured over whole
// windows of at least one second and only changes when a window closes, so
// a status line showing it doesn't flicker every frame.

use std::time::{Duration, Instant};

/// Length of one measurement window.
const WINDOW: Duration = Duration::from_secs(1);

/// Frame counter and rate meter, owned by the frame loop.
#[derive(Debug, Clone)]
pub struct FrameClock {
    started: Instant,
    frames: u64,
    window_start: Instant,
    window_frames: u64,
    fps: f64,
}

impl FrameClock {
    /// A clock starting now, with no frames counted.
    #[must_use]
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    /// A clock whose start is `now`.
    #[must_use]
    pub const fn starting_at(now: Instant) -> Self {
        Self {
            started: now,
            frames: 0,
            window_start: now,
            window_frames: 0,
            fps: 0.0,
        }
    }

    /// Count one frame.
    pub fn tick(&mut self) {
        self.tick_at(Instant::now());
    }

    /// Count one frame finished at `now`.
    #[allow(clippy::cast_precision_loss)] // Frame counts stay far below 2^52.
    pub fn tick_at(&mut self, now: Instant) {
        self.frames += 1;
        self.window_frames += 1;

        let span = now.saturating_duration_since(self.window_start);
        if span >= WINDOW {
            self.fps = self.window_frames as f64 / span.as_secs_f64();
            self.window_start = now;
            self.window_frames = 0;
        }
    }

    /// Frames counted since the clock started.
    #[inline]
    #[must_use]
    pub const fn frames(&self) -> u64 {
        self.frames
    }

    /// Time since the clock started.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Frames per second over the last completed window, or 0 before the
    /// first window closes.
    #[inline]
    #[must_use]
    pub const fn fps(&self) -> f64 {
        self.fps
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
