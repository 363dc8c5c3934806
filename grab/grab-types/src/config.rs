//! Configuration for hand grabbing.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{GrabError, LockedAxes, Result};

/// Default minimum clearance above the floor for a grab target.
pub const DEFAULT_FLOOR_MARGIN: f64 = 0.02;

/// Default grab intensity at which a hand engages.
pub const DEFAULT_ENGAGE_THRESHOLD: f64 = 0.5;

/// Default force above which a grip joint breaks (N).
pub const DEFAULT_BREAK_FORCE: f64 = 2000.0;

/// Default torque above which a grip joint breaks (N·m).
pub const DEFAULT_BREAK_TORQUE: f64 = 2000.0;

/// Configuration for one hand's grab controller.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GrabConfig {
    /// Grab intensity in `[0, 1]` at or above which the hand is grabbing.
    pub engage_threshold: f64,
    /// Minimum height above the floor for a point or body to be grabbable.
    pub floor_margin: f64,
    /// Force above which the grip joint breaks (N).
    pub break_force: f64,
    /// Torque above which the grip joint breaks (N·m).
    pub break_torque: f64,
    /// Axes locked by the grip joint.
    pub locked_axes: LockedAxes,
}

impl Default for GrabConfig {
    fn default() -> Self {
        Self {
            engage_threshold: DEFAULT_ENGAGE_THRESHOLD,
            floor_margin: DEFAULT_FLOOR_MARGIN,
            break_force: DEFAULT_BREAK_FORCE,
            break_torque: DEFAULT_BREAK_TORQUE,
            locked_axes: LockedAxes::ALL,
        }
    }
}

impl GrabConfig {
    /// Configuration for light props that should come loose easily.
    #[must_use]
    pub fn delicate() -> Self {
        Self {
            break_force: 250.0,
            break_torque: 100.0,
            ..Default::default()
        }
    }

    /// Set the engage threshold.
    #[must_use]
    pub fn engage_threshold(mut self, threshold: f64) -> Self {
        self.engage_threshold = threshold;
        self
    }

    /// Set the floor margin.
    #[must_use]
    pub fn floor_margin(mut self, margin: f64) -> Self {
        self.floor_margin = margin;
        self
    }

    /// Set both break thresholds.
    #[must_use]
    pub fn break_limits(mut self, force: f64, torque: f64) -> Self {
        self.break_force = force;
        self.break_torque = torque;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if !(self.engage_threshold > 0.0 && self.engage_threshold <= 1.0) {
            return Err(GrabError::invalid_config(format!(
                "engage threshold {} must be in (0, 1]",
                self.engage_threshold
            )));
        }

        if !self.floor_margin.is_finite() || self.floor_margin < 0.0 {
            return Err(GrabError::invalid_config(
                "floor margin must be finite and non-negative",
            ));
        }

        // A held object must always come loose under a large enough load.
        if !self.break_force.is_finite() || self.break_force <= 0.0 {
            return Err(GrabError::invalid_config(
                "break force must be positive and finite",
            ));
        }
        if !self.break_torque.is_finite() || self.break_torque <= 0.0 {
            return Err(GrabError::invalid_config(
                "break torque must be positive and finite",
            ));
        }

        if self.locked_axes.locked_count() == 0 {
            return Err(GrabError::invalid_config(
                "grip joint must lock at least one axis",
            ));
        }

        Ok(())
    }

    /// Whether a sampled intensity counts as grabbing.
    #[must_use]
    pub fn is_engaged(&self, intensity: f64) -> bool {
        intensity.clamp(0.0, 1.0) >= self.engage_threshold
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        let config = GrabConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.engage_threshold, 0.5);
        assert_eq!(config.floor_margin, 0.02);
    }

    #[test]
    fn test_presets_valid() {
        assert!(GrabConfig::delicate().validate().is_ok());
        let config = GrabConfig::default();
        assert_eq!(config.break_force, DEFAULT_BREAK_FORCE);
        assert_eq!(config.break_torque, DEFAULT_BREAK_TORQUE);
    }

    #[test]
    fn test_invalid_threshold() {
        assert!(GrabConfig::default().engage_threshold(0.0).validate().is_err());
        assert!(GrabConfig::default().engage_threshold(1.5).validate().is_err());
        assert!(GrabConfig::default()
            .engage_threshold(f64::NAN)
            .validate()
            .is_err());
    }

    #[test]
    fn test_invalid_break_limits() {
        let err = GrabConfig::default()
            .break_limits(-1.0, 10.0)
            .validate()
            .unwrap_err();
        assert!(err.is_config_error());
        assert!(GrabConfig::default()
            .break_limits(10.0, f64::NAN)
            .validate()
            .is_err());
    }

    #[test]
    fn test_infinite_break_limits_rejected() {
        let err = GrabConfig::default()
            .break_limits(f64::INFINITY, 100.0)
            .validate()
            .unwrap_err();
        assert!(err.is_config_error());
        assert!(GrabConfig::default()
            .break_limits(100.0, f64::INFINITY)
            .validate()
            .is_err());
    }

    #[test]
    fn test_invalid_axes() {
        let config = GrabConfig {
            locked_axes: LockedAxes::NONE,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_is_engaged() {
        let config = GrabConfig::default();
        assert!(!config.is_engaged(0.2));
        assert!(config.is_engaged(0.5));
        assert!(config.is_engaged(0.7));
        // Out-of-range samples are clamped
        assert!(config.is_engaged(3.0));
        assert!(!config.is_engaged(-1.0));
    }
}
