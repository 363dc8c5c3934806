//! Per-controller motion tracking.
//!
//! A controller "settles on the floor" when it has first moved downward for
//! a while, then stays low and still. The downward phase is latched once it
//! is long enough: the controller necessarily slows to a stop after the
//! descent, and the stillness timer starts from there. Lifting the controller
//! again clears the latch.

use crate::config::CalibrationConfig;

/// Which controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Controller {
    /// Left hand controller.
    Left,
    /// Right hand controller.
    Right,
}

/// Motion timers for one controller.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ControllerTracker {
    last_height: f64,
    downward_time: f64,
    descended: bool,
    stable_time: f64,
}

impl ControllerTracker {
    /// Start tracking from `height` with all timers cleared.
    #[must_use]
    pub fn new(height: f64) -> Self {
        Self {
            last_height: height,
            ..Default::default()
        }
    }

    /// Feed one frame. Returns the accumulated stable time.
    pub fn observe(&mut self, height: f64, head_height: f64, dt: f64, config: &CalibrationConfig) -> f64 {
        let drop = self.last_height - height;
        let is_still = drop.abs() < config.stability_threshold;
        let is_low = height < head_height - config.controller_low_offset;

        if drop > config.downward_speed_threshold {
            self.downward_time += dt;
            if self.downward_time > config.downward_required {
                self.descended = true;
            }
        } else {
            self.downward_time = 0.0;
            if -drop > config.downward_speed_threshold {
                self.descended = false;
            }
        }

        if is_low && is_still && self.descended {
            self.stable_time += dt;
        } else {
            self.stable_time = 0.0;
        }

        self.last_height = height;
        self.stable_time
    }

    /// Height seen on the last frame.
    #[must_use]
    pub fn last_height(&self) -> f64 {
        self.last_height
    }

    /// Time spent moving downward in the current descent.
    #[must_use]
    pub fn downward_time(&self) -> f64 {
        self.downward_time
    }

    /// Whether a long enough descent has been seen.
    #[must_use]
    pub fn has_descended(&self) -> bool {
        self.descended
    }

    /// Time spent low and still after a descent.
    #[must_use]
    pub fn stable_time(&self) -> f64 {
        self.stable_time
    }
}
