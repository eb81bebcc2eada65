//! Frame clock shared by every sprite-sheet animation.
//!
//! A clock accumulates simulation time and reports a tick once the frame
//! interval has elapsed, after which the timer restarts from zero (leftover
//! time is discarded, so a long step never advances more than one frame).
//! What frame to show on a tick is the caller's decision.

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameClock {
    pub timer: f32,
    pub frame: u32,
}

impl FrameClock {
    pub fn new(frame: u32) -> Self {
        Self { timer: 0.0, frame }
    }

    /// Advance by `dt`; returns true when `interval` was reached this call.
    pub fn tick(&mut self, dt: f32, interval: f32) -> bool {
        self.timer += dt;
        if self.timer >= interval {
            self.timer = 0.0;
            true
        } else {
            false
        }
    }

    /// Tick and, on the interval, replace the frame with `next(frame)`.
    pub fn advance_with(&mut self, dt: f32, interval: f32, next: impl FnOnce(u32) -> u32) {
        if self.tick(dt, interval) {
            self.frame = next(self.frame);
        }
    }

    pub fn reset(&mut self, frame: u32) {
        *self = Self::new(frame);
    }
}
