//! Core types for VR hand grabbing.
//!
//! This crate provides the data shared by the grab engine, the floor
//! calibrator and whatever physics layer hosts them:
//!
//! - [`BodyId`], [`Pose`], [`Twist`], [`RigidBodyState`] - rigid body identity and state
//! - [`JointId`], [`GripJointSpec`], [`LockedAxes`] - the breakable hand-to-body joint
//! - [`GrabConfig`] - thresholds for engagement, floor clearance and joint breaking
//! - [`FloorHeight`], [`SharedFloorHeight`], [`FloorGate`] - read access to the calibrated floor
//! - [`GrabError`] - recoverable failures
//!
//! # Layer 0
//!
//! Pure data with **no engine dependencies**, usable from headless tests,
//! other engines and tooling.
//!
//! # Coordinate System
//!
//! XR convention, unlike the Z-up simulation crates:
//!
//! - X: right
//! - Y: up (floor heights are Y values)
//! - Z: toward the viewer
//! - Right-handed
//!
//! # Example
//!
//! ```
//! use grab_types::{GrabConfig, FloorHeight, SharedFloorHeight};
//!
//! let config = GrabConfig::default();
//! assert!(config.validate().is_ok());
//!
//! let floor = SharedFloorHeight::new(0.0);
//! assert!(floor.is_above(0.5, config.floor_margin));
//! assert!(!floor.is_above(0.01, config.floor_margin));
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(clippy::missing_const_for_fn, clippy::missing_errors_doc)]

mod body;
mod config;
mod error;
mod floor;
mod joint;

pub use body::{BodyId, Pose, RigidBodyState, Twist};
pub use config::{
    GrabConfig, DEFAULT_BREAK_FORCE, DEFAULT_BREAK_TORQUE, DEFAULT_ENGAGE_THRESHOLD,
    DEFAULT_FLOOR_MARGIN,
};
pub use error::GrabError;
pub use floor::{is_above_floor, FloorGate, FloorHeight, SharedFloorHeight};
pub use joint::{GripJointSpec, JointId, LockedAxes};

// Re-export math types for convenience
pub use nalgebra::{Point3, UnitQuaternion, Vector3};

/// Result type for grab operations.
pub type Result<T> = std::result::Result<T, GrabError>;
