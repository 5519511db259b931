//! Frame pacing for the main loop.

use std::time::Duration;

/// Decides which display refreshes run a frame to hold `target_fps`.
///
/// Real time is converted into frame credit (`delta * target_fps`). A refresh runs a frame
/// once a whole credit has built up, consuming it. Credit beyond one frame is discarded, so
/// a stall drops frames instead of bursting to catch up.
#[derive(Debug, Clone)]
pub struct FrameLimiter {
    target_fps: u32,
    progress: f64,
    frames: u64,
    skipped: u64,
}

impl FrameLimiter {
    /// `target_fps == 0` disables the cap.
    pub fn new(target_fps: u32) -> Self {
        Self {
            target_fps,
            progress: 0.0,
            frames: 0,
            skipped: 0,
        }
    }

    pub fn target_fps(&self) -> u32 {
        self.target_fps
    }

    /// Account for `real_delta` of wall time; returns whether this refresh runs a frame.
    pub fn tick(&mut self, real_delta: Duration) -> bool {
        if self.target_fps == 0 {
            self.frames += 1;
            return true;
        }
        self.progress += real_delta.as_secs_f64() * self.target_fps as f64;
        if self.progress < 1.0 {
            self.skipped += 1;
            return false;
        }
        self.progress = (self.progress - 1.0).min(1.0);
        self.frames += 1;
        true
    }

    /// Frames run so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Refreshes held back so far.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uncapped_runs_every_refresh() {
        let mut limiter = FrameLimiter::new(0);
        for _ in 0..10 {
            assert!(limiter.tick(Duration::from_micros(100)));
        }
        assert_eq!(limiter.frames(), 10);
    }

    #[test]
    fn halves_a_fast_display() {
        // 120 Hz display, 60 fps cap: every other refresh runs.
        let mut limiter = FrameLimiter::new(60);
        let refresh = Duration::from_micros(8_334);
        let ran = (0..120).filter(|_| limiter.tick(refresh)).count();
        assert_eq!(ran, 60);
        assert_eq!(limiter.skipped() as usize, 120 - ran);
    }

    #[test]
    fn stall_does_not_burst() {
        let mut limiter = FrameLimiter::new(60);
        assert!(limiter.tick(Duration::from_secs(2)));
        // Credit was capped at one frame: the next refresh may run, the one after needs
        // fresh time.
        assert!(limiter.tick(Duration::ZERO));
        assert!(!limiter.tick(Duration::ZERO));
    }
}
