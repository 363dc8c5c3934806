//! The floor calibrator state machine.

use tracing::{debug, info, warn};

use grab_types::SharedFloorHeight;

use crate::config::CalibrationConfig;
use crate::tracker::{Controller, ControllerTracker};

/// Offset differences below this are treated as converged.
const OFFSET_EPSILON: f64 = 1e-6;

/// Calibration state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CalibrationState {
    /// Not calibrating.
    #[default]
    Idle,
    /// Waiting for a controller to settle on the floor.
    Waiting,
    /// A floor height was measured.
    Calibrated,
}

/// Progress of an armed calibration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationProgress {
    /// Left controller stable time (s).
    pub left_stable: f64,
    /// Right controller stable time (s).
    pub right_stable: f64,
    /// The lower of the two controllers, the one a calibration would use.
    pub lower: Controller,
}

/// Result of one calibrator update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CalibrationStatus {
    /// Not armed.
    Inactive,
    /// Armed, no controller has settled long enough yet.
    Waiting(CalibrationProgress),
    /// Calibration finished this frame.
    Calibrated {
        /// Measured floor height.
        floor_height: f64,
    },
}

/// Measures the real floor by having the player rest a controller on it.
///
/// Writes the measured height to a [`SharedFloorHeight`] that grab
/// controllers read, and eases the rig offset so the virtual floor lines up
/// with the real one.
///
/// # Example
///
/// ```
/// use grab_floor::{CalibrationConfig, CalibrationStatus, FloorCalibrator};
/// use grab_types::{FloorHeight, SharedFloorHeight};
///
/// let floor = SharedFloorHeight::new(0.0);
/// let mut calibrator = FloorCalibrator::new(CalibrationConfig::default(), floor.clone());
///
/// let dt = 1.0 / 60.0;
/// let head = 1.7;
/// let mut left = 1.0;
/// calibrator.begin(left, 1.0);
///
/// // Lower the left controller to the floor, then hold it still
/// for _ in 0..20 {
///     left -= 0.04;
///     calibrator.update(dt, head, left, 1.0);
/// }
/// let mut status = CalibrationStatus::Inactive;
/// for _ in 0..70 {
///     if let CalibrationStatus::Calibrated { .. } = status {
///         break;
///     }
///     status = calibrator.update(dt, head, left, 1.0);
/// }
///
/// assert!(matches!(status, CalibrationStatus::Calibrated { .. }));
/// assert!((floor.floor_height() - 0.2).abs() < 1e-9);
/// ```
#[derive(Debug, Clone)]
pub struct FloorCalibrator {
    config: CalibrationConfig,
    floor: SharedFloorHeight,
    state: CalibrationState,
    left: ControllerTracker,
    right: ControllerTracker,
    rig_offset: f64,
    target_offset: f64,
}

impl FloorCalibrator {
    /// Create a calibrator writing to `floor`.
    ///
    /// An invalid configuration is reported and replaced by the default.
    pub fn new(config: CalibrationConfig, floor: SharedFloorHeight) -> Self {
        let config = match config.validate() {
            Ok(()) => config,
            Err(err) => {
                warn!(error = %err, "Invalid calibration config, using defaults");
                CalibrationConfig::default()
            }
        };

        Self {
            config,
            floor,
            state: CalibrationState::Idle,
            left: ControllerTracker::default(),
            right: ControllerTracker::default(),
            rig_offset: 0.0,
            target_offset: 0.0,
        }
    }

    /// Restore a previously saved rig offset, e.g. on startup.
    #[must_use]
    pub fn with_saved_offset(mut self, offset: f64) -> Self {
        self.apply_offset(offset);
        self
    }

    /// Arm calibration from the controllers' current heights.
    ///
    /// Re-arms from any state.
    pub fn begin(&mut self, left_height: f64, right_height: f64) {
        self.left = ControllerTracker::new(left_height);
        self.right = ControllerTracker::new(right_height);
        self.state = CalibrationState::Waiting;
        info!("Floor calibration armed, place a controller on the floor");
    }

    /// Stop waiting without calibrating.
    pub fn cancel(&mut self) {
        if self.state == CalibrationState::Waiting {
            self.state = CalibrationState::Idle;
            debug!("Floor calibration cancelled");
        }
    }

    /// Advance one frame.
    ///
    /// Heights are world Y values of the head and both controllers.
    pub fn update(
        &mut self,
        dt: f64,
        head_height: f64,
        left_height: f64,
        right_height: f64,
    ) -> CalibrationStatus {
        self.ease_offset(dt);

        if self.state != CalibrationState::Waiting {
            return CalibrationStatus::Inactive;
        }

        let left_stable = self.left.observe(left_height, head_height, dt, &self.config);
        let right_stable = self.right.observe(right_height, head_height, dt, &self.config);

        let (lower, lower_height) = if left_height < right_height {
            (Controller::Left, left_height)
        } else {
            (Controller::Right, right_height)
        };

        if left_stable >= self.config.hold_time || right_stable >= self.config.hold_time {
            self.calibrate(lower_height);
            return CalibrationStatus::Calibrated {
                floor_height: lower_height,
            };
        }

        CalibrationStatus::Waiting(CalibrationProgress {
            left_stable,
            right_stable,
            lower,
        })
    }

    /// Set the rig offset immediately, skipping the easing.
    pub fn apply_offset(&mut self, offset: f64) {
        self.target_offset = offset;
        self.rig_offset = offset;
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> CalibrationState {
        self.state
    }

    /// Current, eased rig offset.
    #[must_use]
    pub fn rig_offset(&self) -> f64 {
        self.rig_offset
    }

    /// Rig offset being eased toward. Hosts persist this value.
    #[must_use]
    pub fn target_offset(&self) -> f64 {
        self.target_offset
    }

    /// The shared floor height written on calibration.
    #[must_use]
    pub fn floor(&self) -> &SharedFloorHeight {
        &self.floor
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &CalibrationConfig {
        &self.config
    }

    /// Tracker of one controller.
    #[must_use]
    pub fn tracker(&self, controller: Controller) -> &ControllerTracker {
        match controller {
            Controller::Left => &self.left,
            Controller::Right => &self.right,
        }
    }

    fn calibrate(&mut self, height: f64) {
        self.state = CalibrationState::Calibrated;
        self.target_offset = -height;
        self.floor.set(height);
        info!(floor_height = height, "Floor calibrated");
    }

    fn ease_offset(&mut self, dt: f64) {
        if (self.rig_offset - self.target_offset).abs() <= OFFSET_EPSILON {
            return;
        }
        let t = (dt * self.config.smoothing).clamp(0.0, 1.0);
        self.rig_offset += (self.target_offset - self.rig_offset) * t;
    }
}
