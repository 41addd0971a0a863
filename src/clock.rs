//! Simulation clock.
//!
//! One call to `advance` per frame. Wall time always moves forward; simulated
//! time (which drives timers, ramps and particle motion) only moves while the
//! simulation is unpaused.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

/// Frame counter plus wall and simulated time.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimClock {
    /// Number of frames advanced so far.
    pub frame: u64,
    /// Seconds since start, including paused frames.
    pub wall_time: f64,
    /// Seconds of unpaused simulation.
    pub sim_time: f64,
    /// Simulated delta for the current tick (0 while paused).
    pub delta: f32,
    /// Sanitised frame delta for the current tick, paused or not.
    pub frame_delta: f32,
    /// Cap applied to every frame delta.
    pub max_delta: f32,
}

impl Default for SimClock {
    fn default() -> Self {
        Self::new(0.1)
    }
}

impl SimClock {
    pub fn new(max_delta: f32) -> Self {
        Self {
            frame: 0,
            wall_time: 0.0,
            sim_time: 0.0,
            delta: 0.0,
            frame_delta: 0.0,
            max_delta: max_delta.max(0.0),
        }
    }

    /// Clamp a raw frame delta into `[0, max_delta]`. Non-finite input counts as zero.
    #[inline]
    pub fn sanitize(&self, frame_dt: f32) -> f32 {
        if !frame_dt.is_finite() || frame_dt <= 0.0 {
            return 0.0;
        }
        frame_dt.min(self.max_delta)
    }

    /// Advance by one frame.
    pub fn advance(&mut self, frame_dt: f32, paused: bool) {
        let dt = self.sanitize(frame_dt);
        self.frame = self.frame.wrapping_add(1);
        self.frame_delta = dt;
        self.wall_time += dt as f64;
        if paused {
            self.delta = 0.0;
        } else {
            self.delta = dt;
            self.sim_time += dt as f64;
        }
    }

    /// Simulated time as f32, for kinematic formulas.
    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.sim_time as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_accumulates() {
        let mut clock = SimClock::new(0.1);
        clock.advance(0.05, false);
        clock.advance(0.05, false);
        assert_eq!(clock.frame, 2);
        assert!((clock.sim_time - 0.1).abs() < 1e-6);
        assert!((clock.wall_time - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_paused_only_wall_time_moves() {
        let mut clock = SimClock::new(0.1);
        clock.advance(0.05, true);
        assert_eq!(clock.sim_time, 0.0);
        assert_eq!(clock.delta, 0.0);
        assert!(clock.wall_time > 0.0);
        assert!((clock.frame_delta - 0.05).abs() < 1e-6);
    }

    #[test]
    fn test_bad_deltas_are_sanitised() {
        let mut clock = SimClock::new(0.1);
        clock.advance(-1.0, false);
        assert_eq!(clock.delta, 0.0);
        clock.advance(f32::NAN, false);
        assert_eq!(clock.delta, 0.0);
        clock.advance(f32::INFINITY, false);
        assert_eq!(clock.delta, 0.0);
        clock.advance(5.0, false);
        assert!((clock.delta - 0.1).abs() < 1e-6);
        assert_eq!(clock.frame, 4);
    }
}
