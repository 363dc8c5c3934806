//! Floor height calibration for VR rigs.
//!
//! Tracking origins rarely agree with the physical floor. The
//! [`FloorCalibrator`] measures it by asking the player to put a controller
//! down: once a controller has moved downward and then rested, low and still,
//! for [`CalibrationConfig::hold_time`], the lower controller's height becomes
//! the floor.
//!
//! The result is published through a [`SharedFloorHeight`], the same cell the
//! grab controllers read to decide which objects are above the floor.
//!
//! # Layer 0
//!
//! Heights in, status out. Prompts, haptics, sounds and persistence of the
//! rig offset belong to the host.
//!
//! # States
//!
//! ```text
//! Idle --begin--> Waiting --controller settled--> Calibrated
//!   ^                |                                |
//!   +-----cancel-----+               begin re-arms from any state
//! ```
//!
//! [`SharedFloorHeight`]: grab_types::SharedFloorHeight

#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(clippy::missing_const_for_fn, clippy::missing_errors_doc)]

mod calibrator;
mod config;
mod tracker;

pub use calibrator::{CalibrationProgress, CalibrationState, CalibrationStatus, FloorCalibrator};
pub use config::CalibrationConfig;
pub use tracker::{Controller, ControllerTracker};
