//! Calibration tuning.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use grab_types::{GrabError, Result};

/// Tuning for [`FloorCalibrator`](crate::FloorCalibrator).
///
/// Distances are in metres, times in seconds. Per-frame thresholds compare
/// against the controller's height change since the previous frame.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CalibrationConfig {
    /// Per-frame movement below which a controller counts as still.
    pub stability_threshold: f64,
    /// How long a controller must stay still on the floor.
    pub hold_time: f64,
    /// Rig offset smoothing rate (1/s).
    pub smoothing: f64,
    /// How long a controller must have moved downward before it can settle.
    pub downward_required: f64,
    /// How far below the head a controller must be to count as low.
    pub controller_low_offset: f64,
    /// Per-frame drop above which a controller counts as moving downward.
    pub downward_speed_threshold: f64,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            stability_threshold: 0.002,
            hold_time: 1.0,
            smoothing: 12.0,
            downward_required: 0.15,
            controller_low_offset: 0.6,
            downward_speed_threshold: 0.003,
        }
    }
}

impl CalibrationConfig {
    /// Tuning for seated play: the head sits closer to the floor.
    #[must_use]
    pub fn seated() -> Self {
        Self {
            controller_low_offset: 0.35,
            ..Default::default()
        }
    }

    /// Set the hold time.
    #[must_use]
    pub fn with_hold_time(mut self, seconds: f64) -> Self {
        self.hold_time = seconds;
        self
    }

    /// Set the smoothing rate.
    #[must_use]
    pub fn with_smoothing(mut self, rate: f64) -> Self {
        self.smoothing = rate;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("stability threshold", self.stability_threshold),
            ("hold time", self.hold_time),
            ("smoothing", self.smoothing),
            ("downward speed threshold", self.downward_speed_threshold),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(GrabError::invalid_config(format!(
                    "{name} must be positive and finite, got {value}"
                )));
            }
        }

        if !self.downward_required.is_finite() || self.downward_required < 0.0 {
            return Err(GrabError::invalid_config(
                "downward time must be finite and non-negative",
            ));
        }
        if !self.controller_low_offset.is_finite() {
            return Err(GrabError::invalid_config("controller low offset must be finite"));
        }

        Ok(())
    }
}
