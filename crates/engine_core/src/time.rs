//! Time management for the game loop.

use std::time::{Duration, Instant};

/// Manages frame timing and delta time calculation.
#[derive(Debug)]
pub struct Time {
    /// Time of the last frame.
    last_frame: Instant,
    /// Duration of the last frame.
    delta: Duration,
    /// Total elapsed time since start.
    elapsed: Duration,
    /// Frame count since start.
    frame_count: u64,
}

impl Default for Time {
    fn default() -> Self {
        Self::new()
    }
}

impl Time {
    /// Create a new time manager.
    pub fn new() -> Self {
        Self {
            last_frame: Instant::now(),
            delta: Duration::ZERO,
            elapsed: Duration::ZERO,
            frame_count: 0,
        }
    }

    /// Measure the wall-clock time since the previous call and advance by it.
    pub fn update(&mut self) {
        let now = Instant::now();
        let delta = now - self.last_frame;
        self.last_frame = now;
        self.advance(delta);
    }

    /// Advance by an explicit delta (headless runs and tests).
    pub fn advance(&mut self, delta: Duration) {
        self.delta = delta;
        self.elapsed += delta;
        self.frame_count += 1;
    }

    /// Get the delta time in seconds.
    pub fn delta_seconds(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    /// Get the delta time as a Duration.
    pub fn delta(&self) -> Duration {
        self.delta
    }

    /// Get total elapsed time in seconds.
    pub fn elapsed_seconds(&self) -> f32 {
        self.elapsed.as_secs_f32()
    }

    /// Get the current frame count.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Get the current FPS (averaged over last frame).
    pub fn fps(&self) -> f32 {
        if self.delta.as_secs_f32() > 0.0 {
            1.0 / self.delta.as_secs_f32()
        } else {
            0.0
        }
    }
}

/// Fixed sub-step accumulator.
///
/// Instead of subtracting a rounded step length from a floating remainder, it keeps the
/// total elapsed time and the number of steps already taken. The number of steps due is
/// `floor(elapsed * rate)`, so any split of the same total time into outer frames yields the
/// same step count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedTimestep {
    rate_hz: u32,
    elapsed: Duration,
    steps_taken: u64,
}

impl FixedTimestep {
    pub fn new(rate_hz: u32) -> Self {
        Self {
            rate_hz: rate_hz.max(1),
            elapsed: Duration::ZERO,
            steps_taken: 0,
        }
    }

    /// Length of one sub-step in seconds.
    pub fn step_seconds(&self) -> f32 {
        1.0 / self.rate_hz as f32
    }

    pub fn rate_hz(&self) -> u32 {
        self.rate_hz
    }

    /// Add `delta` and return how many whole sub-steps became due.
    pub fn advance(&mut self, delta: Duration) -> u64 {
        self.elapsed += delta;
        let due = (self.elapsed.as_nanos() * self.rate_hz as u128 / 1_000_000_000) as u64;
        let steps = due - self.steps_taken;
        self.steps_taken = due;
        steps
    }

    /// Time accumulated but not yet consumed by a whole sub-step.
    pub fn remainder(&self) -> Duration {
        let consumed_nanos = self.steps_taken as u128 * 1_000_000_000 / self.rate_hz as u128;
        let elapsed_nanos = self.elapsed.as_nanos();
        Duration::from_nanos(elapsed_nanos.saturating_sub(consumed_nanos) as u64)
    }

    pub fn steps_taken(&self) -> u64 {
        self.steps_taken
    }

    pub fn reset(&mut self) {
        self.elapsed = Duration::ZERO;
        self.steps_taken = 0;
    }
}
