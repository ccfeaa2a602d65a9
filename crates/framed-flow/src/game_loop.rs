//! Fixed-timestep game loop implementing the "Fix Your Timestep" pattern.
//!
//! Scene logic always advances in fixed 60 Hz steps no matter how long a
//! frame took, so timers such as the settle delay and the wrong-order
//! message behave the same on every machine.

use tracing::warn;

/// Fixed simulation timestep: 60 Hz (16.666… ms per tick).
pub const FIXED_DT: f64 = 1.0 / 60.0;

/// Maximum frame time clamp to prevent spiral of death.
pub const MAX_FRAME_TIME: f64 = 0.25; // 250ms = 4 FPS minimum

/// Fixed-timestep accumulator.
///
/// Call [`advance`](Self::advance) once per frame with that frame's time.
pub struct GameLoop {
    accumulator: f64,
    total_sim_time: f64,
    frame_count: u64,
    update_count: u64,
}

impl GameLoop {
    /// Creates a new `GameLoop` with no simulated time.
    pub fn new() -> Self {
        Self {
            accumulator: 0.0,
            total_sim_time: 0.0,
            frame_count: 0,
            update_count: 0,
        }
    }

    /// Runs one frame of `frame_time` seconds.
    ///
    /// `update_fn(fixed_dt, total_sim_time)` is called zero or more times at
    /// the fixed rate. Returns the interpolation alpha in `[0.0, 1.0)`.
    pub fn advance(&mut self, frame_time: f64, mut update_fn: impl FnMut(f64, f64)) -> f64 {
        let mut frame_time = frame_time.max(0.0);
        if frame_time > MAX_FRAME_TIME {
            warn!(
                "Frame time {:.1}ms exceeds maximum, clamping to {:.1}ms",
                frame_time * 1000.0,
                MAX_FRAME_TIME * 1000.0
            );
            frame_time = MAX_FRAME_TIME;
        }

        self.accumulator += frame_time;

        while self.accumulator >= FIXED_DT {
            update_fn(FIXED_DT, self.total_sim_time);
            self.total_sim_time += FIXED_DT;
            self.accumulator -= FIXED_DT;
            self.update_count += 1;
        }

        self.frame_count += 1;
        self.alpha()
    }

    /// Returns the current interpolation alpha without running a tick.
    pub fn alpha(&self) -> f64 {
        if self.accumulator > 0.0 {
            self.accumulator / FIXED_DT
        } else {
            0.0
        }
    }

    /// Returns the total number of frames run.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Returns the total number of simulation update steps executed.
    pub fn update_count(&self) -> u64 {
        self.update_count
    }

    /// Returns the total simulation time in seconds.
    pub fn total_sim_time(&self) -> f64 {
        self.total_sim_time
    }
}

impl Default for GameLoop {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_dt_value() {
        assert!(
            (FIXED_DT - 1.0 / 60.0).abs() < f64::EPSILON * 10.0,
            "FIXED_DT should equal 1/60"
        );
    }

    #[test]
    fn test_accumulator_single_step() {
        let mut game_loop = GameLoop::new();
        let mut updates = 0u32;
        game_loop.advance(FIXED_DT, |_, _| updates += 1);
        assert_eq!(updates, 1);
        assert!(game_loop.accumulator.abs() < 1e-12);
    }

    #[test]
    fn test_accumulator_multiple_steps() {
        let mut game_loop = GameLoop::new();
        let mut updates = 0u32;
        game_loop.advance(3.0 * FIXED_DT, |_, _| updates += 1);
        assert_eq!(updates, 3);
        assert!((game_loop.total_sim_time() - 3.0 * FIXED_DT).abs() < 1e-12);
    }

    #[test]
    fn test_partial_frame_returns_alpha() {
        let mut game_loop = GameLoop::new();
        let mut updates = 0u32;
        let alpha = game_loop.advance(0.25 * FIXED_DT, |_, _| updates += 1);
        assert_eq!(updates, 0);
        assert!((alpha - 0.25).abs() < 1e-10, "alpha should be ~0.25, got {alpha}");
    }

    #[test]
    fn test_max_frame_time_clamp() {
        let mut game_loop = GameLoop::new();
        let mut updates = 0u32;
        game_loop.advance(1.0, |_, _| updates += 1);
        let max_updates = (MAX_FRAME_TIME / FIXED_DT).ceil() as u32;
        assert!(updates <= max_updates, "Expected at most {max_updates} updates, got {updates}");
        assert!(updates > 0);
    }

    #[test]
    fn test_negative_frame_time_is_ignored() {
        let mut game_loop = GameLoop::new();
        let mut updates = 0u32;
        game_loop.advance(-1.0, |_, _| updates += 1);
        assert_eq!(updates, 0);
        assert_eq!(game_loop.frame_count(), 1);
    }

    #[test]
    fn test_sim_time_passed_to_update() {
        let mut game_loop = GameLoop::new();
        let mut seen = Vec::new();
        game_loop.advance(2.0 * FIXED_DT, |_, t| seen.push(t));
        assert_eq!(seen.len(), 2);
        assert!(seen[0].abs() < 1e-12);
        assert!((seen[1] - FIXED_DT).abs() < 1e-12);
    }

    #[test]
    fn test_game_loop_default() {
        let game_loop = GameLoop::default();
        assert_eq!(game_loop.frame_count(), 0);
        assert_eq!(game_loop.update_count(), 0);
        assert!((game_loop.total_sim_time() - 0.0).abs() < f64::EPSILON);
    }
}
