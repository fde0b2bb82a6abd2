//! Fixed-timestep driver for the client.
//!
//! Wall-clock time is accumulated and spent in whole steps of
//! [`fixed_dt`](GameLoop::fixed_dt) seconds. The client counts time in
//! 60 Hz ticks, so each step reports how many of those it covers.

use std::time::Instant;
use tracing::warn;

/// Rate the client's tick counters are expressed in.
pub const TICKS_PER_SECOND: f64 = 60.0;

/// Longest frame accepted before clamping.
pub const MAX_FRAME_TIME: f64 = 0.25;

pub struct GameLoop {
    fixed_dt: f64,
    previous_time: Instant,
    accumulator: f64,
    update_count: u64,
}

impl GameLoop {
    /// A loop stepping `rate_hz` times per second. A zero rate is treated as 1.
    pub fn new(rate_hz: u32) -> Self {
        Self {
            fixed_dt: 1.0 / f64::from(rate_hz.max(1)),
            previous_time: Instant::now(),
            accumulator: 0.0,
            update_count: 0,
        }
    }

    /// Seconds per step.
    pub fn fixed_dt(&self) -> f64 {
        self.fixed_dt
    }

    /// Client ticks covered by one step.
    pub fn step_ticks(&self) -> f32 {
        (self.fixed_dt * TICKS_PER_SECOND) as f32
    }

    pub fn update_count(&self) -> u64 {
        self.update_count
    }

    /// Measure the time since the last call and run the due steps.
    pub fn tick(&mut self, update_fn: impl FnMut(f32)) -> u32 {
        let now = Instant::now();
        let frame_time = now.duration_since(self.previous_time).as_secs_f64();
        self.previous_time = now;
        self.advance(frame_time, update_fn)
    }

    /// Run the steps due after `frame_time` seconds. Returns how many ran.
    pub fn advance(&mut self, mut frame_time: f64, mut update_fn: impl FnMut(f32)) -> u32 {
        if frame_time > MAX_FRAME_TIME {
            warn!(
                "Frame time {:.1}ms exceeds maximum, clamping to {:.1}ms",
                frame_time * 1000.0,
                MAX_FRAME_TIME * 1000.0
            );
            frame_time = MAX_FRAME_TIME;
        }
        self.accumulator += frame_time;

        let step = self.step_ticks();
        let mut steps = 0;
        while self.accumulator >= self.fixed_dt {
            update_fn(step);
            self.accumulator -= self.fixed_dt;
            self.update_count += 1;
            steps += 1;
        }
        steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_steps_match_elapsed_time() {
        let mut game_loop = GameLoop::new(60);
        let mut ticks = 0.0;
        let steps = game_loop.advance(0.105, |dt| ticks += dt);
        assert_eq!(steps, 6);
        assert!((ticks - 6.0).abs() < 1e-4);
        assert_eq!(game_loop.update_count(), 6);
    }

    #[test]
    fn test_remainder_carries_over() {
        let mut game_loop = GameLoop::new(60);
        assert_eq!(game_loop.advance(0.01, |_| {}), 0);
        assert_eq!(game_loop.advance(0.01, |_| {}), 1);
    }

    #[test]
    fn test_long_frame_is_clamped() {
        let mut game_loop = GameLoop::new(4);
        let steps = game_loop.advance(2.0, |_| {});
        assert_eq!(steps, 1);
    }

    #[test]
    fn test_slower_rate_covers_more_ticks() {
        let game_loop = GameLoop::new(30);
        assert!((game_loop.step_ticks() - 2.0).abs() < 1e-6);
        assert_eq!(GameLoop::new(0).fixed_dt(), 1.0);
    }
}
