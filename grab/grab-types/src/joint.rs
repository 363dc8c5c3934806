//! Grip joint description.
//!
//! A grip joint rigidly connects a grabbed body to the hand's kinematic body.
//! The physics layer owns the live joint; the engine describes it with a
//! [`GripJointSpec`] and refers to it by [`JointId`] afterwards.

use nalgebra::{Point3, UnitQuaternion};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::{DEFAULT_BREAK_FORCE, DEFAULT_BREAK_TORQUE};
use crate::BodyId;

/// Identifier of a joint owned by the physics layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct JointId(pub u64);

impl JointId {
    /// Create a new joint ID.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for JointId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Joint({})", self.0)
    }
}

/// Which degrees of freedom a joint locks, per axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LockedAxes {
    /// Linear X, Y, Z.
    pub linear: [bool; 3],
    /// Angular X, Y, Z.
    pub angular: [bool; 3],
}

impl LockedAxes {
    /// Every linear and angular axis locked.
    pub const ALL: Self = Self {
        linear: [true; 3],
        angular: [true; 3],
    };

    /// Nothing locked.
    pub const NONE: Self = Self {
        linear: [false; 3],
        angular: [false; 3],
    };

    /// True when all six degrees of freedom are locked.
    #[must_use]
    pub fn is_rigid(&self) -> bool {
        self.linear.iter().chain(self.angular.iter()).all(|&locked| locked)
    }

    /// Number of locked degrees of freedom.
    #[must_use]
    pub fn locked_count(&self) -> usize {
        self.linear
            .iter()
            .chain(self.angular.iter())
            .filter(|&&locked| locked)
            .count()
    }
}

impl Default for LockedAxes {
    fn default() -> Self {
        Self::ALL
    }
}

/// Description of a breakable joint between a hand and a grabbed body.
///
/// The anchor on the grabbed body is expressed in that body's frame; the
/// anchor on the hand is expressed in the hand's frame. With
/// `relative_rotation` the joint holds `body.rotation * relative_rotation ==
/// hand.rotation`, i.e. the attach frame stays aligned with the hand.
///
/// # Example
///
/// ```
/// use grab_types::{BodyId, GripJointSpec};
/// use nalgebra::Point3;
///
/// let spec = GripJointSpec::new(BodyId::new(1), BodyId::new(2))
///     .with_body_anchor(Point3::new(0.0, 0.1, 0.0))
///     .with_break_force(1500.0);
///
/// assert_eq!(spec.hand(), BodyId::new(1));
/// assert!(spec.locked_axes().is_rigid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GripJointSpec {
    hand: BodyId,
    body: BodyId,
    hand_anchor: Point3<f64>,
    body_anchor: Point3<f64>,
    relative_rotation: UnitQuaternion<f64>,
    locked_axes: LockedAxes,
    break_force: f64,
    break_torque: f64,
}

impl GripJointSpec {
    /// Rigid joint between `hand` and `body`, anchored at both origins, with
    /// the default break limits.
    #[must_use]
    pub fn new(hand: BodyId, body: BodyId) -> Self {
        Self {
            hand,
            body,
            hand_anchor: Point3::origin(),
            body_anchor: Point3::origin(),
            relative_rotation: UnitQuaternion::identity(),
            locked_axes: LockedAxes::ALL,
            break_force: DEFAULT_BREAK_FORCE,
            break_torque: DEFAULT_BREAK_TORQUE,
        }
    }

    /// Set the anchor point in the hand's frame.
    #[must_use]
    pub fn with_hand_anchor(mut self, anchor: Point3<f64>) -> Self {
        self.hand_anchor = anchor;
        self
    }

    /// Set the anchor point in the grabbed body's frame.
    #[must_use]
    pub fn with_body_anchor(mut self, anchor: Point3<f64>) -> Self {
        self.body_anchor = anchor;
        self
    }

    /// Set the attach rotation in the grabbed body's frame.
    #[must_use]
    pub fn with_relative_rotation(mut self, rotation: UnitQuaternion<f64>) -> Self {
        self.relative_rotation = rotation;
        self
    }

    /// Set which axes are locked.
    #[must_use]
    pub fn with_locked_axes(mut self, axes: LockedAxes) -> Self {
        self.locked_axes = axes;
        self
    }

    /// Set the force above which the joint breaks (N).
    #[must_use]
    pub fn with_break_force(mut self, force: f64) -> Self {
        self.break_force = force;
        self
    }

    /// Set the torque above which the joint breaks (N·m).
    #[must_use]
    pub fn with_break_torque(mut self, torque: f64) -> Self {
        self.break_torque = torque;
        self
    }

    /// The hand (connected) body.
    #[must_use]
    pub fn hand(&self) -> BodyId {
        self.hand
    }

    /// The grabbed body.
    #[must_use]
    pub fn body(&self) -> BodyId {
        self.body
    }

    /// Anchor in the hand's frame.
    #[must_use]
    pub fn hand_anchor(&self) -> &Point3<f64> {
        &self.hand_anchor
    }

    /// Anchor in the grabbed body's frame.
    #[must_use]
    pub fn body_anchor(&self) -> &Point3<f64> {
        &self.body_anchor
    }

    /// Attach rotation in the grabbed body's frame.
    #[must_use]
    pub fn relative_rotation(&self) -> &UnitQuaternion<f64> {
        &self.relative_rotation
    }

    /// Locked axes.
    #[must_use]
    pub fn locked_axes(&self) -> LockedAxes {
        self.locked_axes
    }

    /// Break force threshold.
    #[must_use]
    pub fn break_force(&self) -> f64 {
        self.break_force
    }

    /// Break torque threshold.
    #[must_use]
    pub fn break_torque(&self) -> f64 {
        self.break_torque
    }

    /// True when both thresholds are finite.
    #[must_use]
    pub fn is_breakable(&self) -> bool {
        self.break_force.is_finite() && self.break_torque.is_finite()
    }
}
