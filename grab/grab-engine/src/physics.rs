//! The seam between the grab engine and a physics layer.

use grab_types::{BodyId, GripJointSpec, JointId, Pose, RigidBodyState, Result, Twist};

/// Synchronous access to the bodies and joints the grab engine touches.
///
/// Implemented by the host's physics engine. Body and joint ids are weak:
/// either may disappear between calls (body destroyed, joint broken), and
/// every query reports that through `None`/`false` rather than panicking.
///
/// Joint breakage must be observable through [`joint_exists`]: once a joint
/// breaks under its configured force/torque thresholds it no longer exists.
///
/// [`joint_exists`]: PhysicsBackend::joint_exists
pub trait PhysicsBackend {
    /// Current state of a body, or `None` if it was destroyed.
    fn body_state(&self, id: BodyId) -> Option<RigidBodyState>;

    /// Current pose of a body, or `None` if it was destroyed.
    fn body_pose(&self, id: BodyId) -> Option<Pose> {
        self.body_state(id).map(|state| state.pose)
    }

    /// Whether the body still exists.
    fn contains_body(&self, id: BodyId) -> bool {
        self.body_state(id).is_some()
    }

    /// Teleport a body.
    fn set_body_pose(&mut self, id: BodyId, pose: Pose) -> Result<()>;

    /// Overwrite a body's velocity.
    fn set_body_twist(&mut self, id: BodyId, twist: Twist) -> Result<()>;

    /// Create a joint from a spec.
    fn create_joint(&mut self, spec: GripJointSpec) -> Result<JointId>;

    /// Destroy a joint. Returns `false` if it no longer existed, which is
    /// expected after a break.
    fn destroy_joint(&mut self, id: JointId) -> bool;

    /// Whether the joint still exists.
    fn joint_exists(&self, id: JointId) -> bool;
}
