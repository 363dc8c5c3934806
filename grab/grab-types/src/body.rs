//! Rigid body identity, pose and velocity.
//!
//! Bodies are owned by the physics layer. The grab engine only ever holds
//! a [`BodyId`], which may go stale at any time when the body is destroyed.

use nalgebra::{Point3, UnitQuaternion, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Identifier of a rigid body owned by the physics layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BodyId(pub u64);

impl BodyId {
    /// Create a new body ID.
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

impl From<u64> for BodyId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for BodyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Body({})", self.0)
    }
}

/// Position and orientation in 3D space.
///
/// Used for hand poses, body poses and attach poses alike. Whether a pose is
/// expressed in world space or relative to some parent frame depends on where
/// it is stored; [`Pose::compose`] moves a local pose into its parent's space.
///
/// # Example
///
/// ```
/// use grab_types::Pose;
/// use nalgebra::Point3;
///
/// let body = Pose::from_position(Point3::new(0.0, 1.0, 0.0));
/// let handle = Pose::from_position(Point3::new(0.2, 0.0, 0.0));
///
/// let world = body.compose(&handle);
/// assert_eq!(world.position, Point3::new(0.2, 1.0, 0.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Pose {
    /// Position.
    pub position: Point3<f64>,
    /// Orientation as a unit quaternion.
    pub rotation: UnitQuaternion<f64>,
}

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}

impl Pose {
    /// Identity pose (origin, no rotation).
    #[must_use]
    pub fn identity() -> Self {
        Self {
            position: Point3::origin(),
            rotation: UnitQuaternion::identity(),
        }
    }

    /// Pose from position only (identity rotation).
    #[must_use]
    pub fn from_position(position: Point3<f64>) -> Self {
        Self {
            position,
            rotation: UnitQuaternion::identity(),
        }
    }

    /// Pose from position and rotation.
    #[must_use]
    pub const fn from_position_rotation(
        position: Point3<f64>,
        rotation: UnitQuaternion<f64>,
    ) -> Self {
        Self { position, rotation }
    }

    /// Height of the pose above the world origin (Y is up).
    #[must_use]
    pub fn height(&self) -> f64 {
        self.position.y
    }

    /// Transform a point from this frame into the parent frame.
    #[must_use]
    pub fn transform_point(&self, local: &Point3<f64>) -> Point3<f64> {
        self.position + self.rotation * local.coords
    }

    /// Transform a point from the parent frame into this frame.
    #[must_use]
    pub fn inverse_transform_point(&self, world: &Point3<f64>) -> Point3<f64> {
        Point3::from(self.rotation.inverse() * (world - self.position))
    }

    /// Express a rotation given in the parent frame relative to this frame.
    #[must_use]
    pub fn inverse_transform_rotation(
        &self,
        world: &UnitQuaternion<f64>,
    ) -> UnitQuaternion<f64> {
        self.rotation.inverse() * world
    }

    /// Inverse pose.
    #[must_use]
    pub fn inverse(&self) -> Self {
        let inv_rotation = self.rotation.inverse();
        Self {
            position: Point3::from(-(inv_rotation * self.position.coords)),
            rotation: inv_rotation,
        }
    }

    /// Compose two poses: `self * other`, with `other` expressed in `self`.
    #[must_use]
    pub fn compose(&self, other: &Self) -> Self {
        Self {
            position: self.transform_point(&other.position),
            rotation: self.rotation * other.rotation,
        }
    }
}

/// Linear and angular velocity of a rigid body.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Twist {
    /// Linear velocity (m/s).
    pub linear: Vector3<f64>,
    /// Angular velocity (rad/s).
    pub angular: Vector3<f64>,
}

impl Default for Twist {
    fn default() -> Self {
        Self::zero()
    }
}

impl Twist {
    /// Twist with the given linear and angular velocity.
    #[must_use]
    pub const fn new(linear: Vector3<f64>, angular: Vector3<f64>) -> Self {
        Self { linear, angular }
    }

    /// Zero twist (at rest).
    #[must_use]
    pub fn zero() -> Self {
        Self {
            linear: Vector3::zeros(),
            angular: Vector3::zeros(),
        }
    }

    /// True when both components are exactly zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.linear == Vector3::zeros() && self.angular == Vector3::zeros()
    }
}

/// Pose plus velocity of a rigid body.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RigidBodyState {
    /// Position and orientation.
    pub pose: Pose,
    /// Linear and angular velocity.
    pub twist: Twist,
}

impl RigidBodyState {
    /// State from pose and twist.
    #[must_use]
    pub const fn new(pose: Pose, twist: Twist) -> Self {
        Self { pose, twist }
    }

    /// State at rest at the given pose.
    #[must_use]
    pub fn at_rest(pose: Pose) -> Self {
        Self {
            pose,
            twist: Twist::zero(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_body_id_display() {
        assert_eq!(BodyId::new(7).to_string(), "Body(7)");
        assert_eq!(BodyId::from(3).raw(), 3);
    }

    #[test]
    fn test_pose_inverse_transform_point() {
        let pose = Pose::from_position_rotation(
            Point3::new(1.0, 2.0, 3.0),
            UnitQuaternion::from_euler_angles(0.3, -0.2, 1.1),
        );
        let local = Point3::new(0.4, -0.5, 0.6);

        let world = pose.transform_point(&local);
        let back = pose.inverse_transform_point(&world);

        assert_relative_eq!(back.coords, local.coords, epsilon = 1e-10);
    }

    #[test]
    fn test_pose_inverse_transform_rotation() {
        let frame = Pose::from_position_rotation(
            Point3::origin(),
            UnitQuaternion::from_euler_angles(0.0, std::f64::consts::FRAC_PI_2, 0.0),
        );
        let world = UnitQuaternion::from_euler_angles(0.1, 0.2, 0.3);

        let local = frame.inverse_transform_rotation(&world);
        let restored = frame.rotation * local;

        assert_relative_eq!(restored.angle_to(&world), 0.0, epsilon = 1e-10);
    }

    #[test]
    fn test_pose_compose_with_inverse_is_identity() {
        let pose = Pose::from_position_rotation(
            Point3::new(-1.0, 0.5, 2.0),
            UnitQuaternion::from_euler_angles(0.7, 0.1, -0.4),
        );

        let composed = pose.compose(&pose.inverse());

        assert_relative_eq!(composed.position.coords, Vector3::zeros(), epsilon = 1e-10);
        assert_relative_eq!(composed.rotation.angle(), 0.0, epsilon = 1e-10);
    }

    #[test]
    fn test_pose_height_is_y() {
        let pose = Pose::from_position(Point3::new(5.0, 1.25, -3.0));
        assert_eq!(pose.height(), 1.25);
    }

    #[test]
    fn test_twist_zero() {
        assert!(Twist::zero().is_zero());
        let moving = Twist::new(Vector3::new(0.0, -2.0, 0.0), Vector3::zeros());
        assert!(!moving.is_zero());
    }
}
