//! Snapping a grabbed body onto the hand.
//!
//! Given the hand pose `H` and the attach offset `(a, q)` of the grab point in
//! the body's frame, the body is placed at
//!
//! ```text
//! rotation = H.rotation * q⁻¹
//! position = H.position - rotation * a
//! ```
//!
//! which puts the attach point exactly on the hand, oriented like the hand.

use nalgebra::{Point3, UnitQuaternion};

use grab_types::{BodyId, GrabError, Pose, Result, Twist};

use crate::attach_point::AttachPoint;
use crate::physics::PhysicsBackend;

/// Attach point offset in its body's frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttachOffset {
    /// Attach position relative to the body origin.
    pub anchor: Point3<f64>,
    /// Attach orientation relative to the body orientation.
    pub rotation: UnitQuaternion<f64>,
}

impl Default for AttachOffset {
    fn default() -> Self {
        Self::identity()
    }
}

impl AttachOffset {
    /// No offset: the body origin is the attach point.
    #[must_use]
    pub fn identity() -> Self {
        Self {
            anchor: Point3::origin(),
            rotation: UnitQuaternion::identity(),
        }
    }

    /// Offset of `point` relative to its owning body's current pose.
    pub fn of_point<P: PhysicsBackend + ?Sized>(point: &AttachPoint, physics: &P) -> Result<Self> {
        let body = point.owning_body().ok_or(GrabError::UnboundAttachPoint)?;
        let frame = physics
            .body_pose(body)
            .ok_or(GrabError::BodyNotFound(body.raw()))?;

        Ok(Self {
            anchor: point.local_attach_point(&frame, physics)?,
            rotation: point.local_attach_rotation(&frame, physics)?,
        })
    }
}

/// Body pose that puts `offset` on `hand`.
#[must_use]
pub fn aligned_body_pose(hand: &Pose, offset: &AttachOffset) -> Pose {
    let rotation = hand.rotation * offset.rotation.inverse();
    let position = hand.position - rotation * offset.anchor.coords;
    Pose::from_position_rotation(position, rotation)
}

/// Stop `body` and teleport it so that `offset` lands on `hand`.
///
/// Returns the new body pose.
pub fn align_body_to_hand<P: PhysicsBackend + ?Sized>(
    physics: &mut P,
    body: BodyId,
    hand: &Pose,
    offset: &AttachOffset,
) -> Result<Pose> {
    let pose = aligned_body_pose(hand, offset);
    physics.set_body_twist(body, Twist::zero())?;
    physics.set_body_pose(body, pose)?;
    Ok(pose)
}
