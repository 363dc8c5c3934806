//! In-memory physics backend.
//!
//! [`KinematicWorld`] is a small [`PhysicsBackend`] for hosts without a full
//! physics engine, and the backend the engine's own tests run against. It
//! integrates free bodies under accumulated forces, carries grabbed bodies
//! rigidly with their hand, and breaks grip joints whose transmitted load
//! exceeds the joint's thresholds.

use hashbrown::HashMap;
use nalgebra::{UnitQuaternion, Vector3};
use tracing::{debug, info};

use grab_types::{
    BodyId, GrabError, GripJointSpec, JointId, Pose, Result, RigidBodyState, Twist,
};

use crate::physics::PhysicsBackend;

/// A body in a [`KinematicWorld`].
#[derive(Debug, Clone)]
pub struct WorldBody {
    /// Unique identifier.
    pub id: BodyId,
    /// Current state (pose + twist).
    pub state: RigidBodyState,
    /// Mass in kg. Ignored for kinematic bodies.
    pub mass: f64,
    /// Kinematic bodies are moved only by the host (hands).
    pub is_kinematic: bool,
    /// Accumulated external force (cleared each step).
    pub accumulated_force: Vector3<f64>,
    /// Accumulated external torque (cleared each step).
    pub accumulated_torque: Vector3<f64>,
}

impl WorldBody {
    fn clear_forces(&mut self) {
        self.accumulated_force = Vector3::zeros();
        self.accumulated_torque = Vector3::zeros();
    }
}

/// In-memory bodies and grip joints.
///
/// # Example
///
/// ```
/// use grab_engine::{KinematicWorld, PhysicsBackend};
/// use grab_types::{GripJointSpec, Pose, RigidBodyState};
/// use nalgebra::{Point3, Vector3};
///
/// let mut world = KinematicWorld::new();
/// let hand = world.add_kinematic_body(Pose::from_position(Point3::new(0.0, 1.0, 0.0)));
/// let cup = world.add_body(RigidBodyState::default(), 0.3);
///
/// let joint = world
///     .create_joint(GripJointSpec::new(hand, cup).with_break_force(50.0))
///     .unwrap();
///
/// // Yank the cup away from the hand
/// world.apply_force(cup, Vector3::new(100.0, 0.0, 0.0));
/// let broken = world.step(1.0 / 90.0);
///
/// assert_eq!(broken, vec![joint]);
/// assert!(!world.joint_exists(joint));
/// ```
#[derive(Debug, Clone, Default)]
pub struct KinematicWorld {
    bodies: HashMap<BodyId, WorldBody>,
    joints: HashMap<JointId, GripJointSpec>,
    next_body_id: u64,
    next_joint_id: u64,
    gravity: Vector3<f64>,
    time: f64,
}

impl KinematicWorld {
    /// Create an empty world without gravity.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set gravity (m/s²) for dynamic bodies.
    #[must_use]
    pub fn with_gravity(mut self, gravity: Vector3<f64>) -> Self {
        self.gravity = gravity;
        self
    }

    /// Simulated time in seconds.
    #[must_use]
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Number of bodies.
    #[must_use]
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Number of live joints.
    #[must_use]
    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    // =========================================================================
    // Body Management
    // =========================================================================

    /// Add a dynamic body and return its ID.
    pub fn add_body(&mut self, state: RigidBodyState, mass: f64) -> BodyId {
        self.insert_body(state, mass, false)
    }

    /// Add a kinematic body (a hand) at the given pose.
    pub fn add_kinematic_body(&mut self, pose: Pose) -> BodyId {
        self.insert_body(RigidBodyState::at_rest(pose), f64::INFINITY, true)
    }

    fn insert_body(&mut self, state: RigidBodyState, mass: f64, is_kinematic: bool) -> BodyId {
        let id = BodyId::new(self.next_body_id);
        self.next_body_id += 1;

        self.bodies.insert(
            id,
            WorldBody {
                id,
                state,
                mass,
                is_kinematic,
                accumulated_force: Vector3::zeros(),
                accumulated_torque: Vector3::zeros(),
            },
        );
        id
    }

    /// Get a body by ID.
    #[must_use]
    pub fn body(&self, id: BodyId) -> Option<&WorldBody> {
        self.bodies.get(&id)
    }

    /// Remove a body and every joint attached to it.
    pub fn remove_body(&mut self, id: BodyId) -> Option<WorldBody> {
        let body = self.bodies.remove(&id)?;
        self.joints
            .retain(|_, spec| spec.body() != id && spec.hand() != id);
        Some(body)
    }

    /// Apply a force at the body's center of mass until the next step.
    pub fn apply_force(&mut self, id: BodyId, force: Vector3<f64>) {
        if let Some(body) = self.bodies.get_mut(&id) {
            body.accumulated_force += force;
        }
    }

    /// Apply a torque until the next step.
    pub fn apply_torque(&mut self, id: BodyId, torque: Vector3<f64>) {
        if let Some(body) = self.bodies.get_mut(&id) {
            body.accumulated_torque += torque;
        }
    }

    // =========================================================================
    // Joints
    // =========================================================================

    /// Get a joint spec by ID.
    #[must_use]
    pub fn joint(&self, id: JointId) -> Option<&GripJointSpec> {
        self.joints.get(&id)
    }

    /// IDs of joints holding `body`, in creation order.
    #[must_use]
    pub fn joints_on(&self, body: BodyId) -> Vec<JointId> {
        let mut ids: Vec<JointId> = self
            .joints
            .iter()
            .filter(|(_, spec)| spec.body() == body)
            .map(|(id, _)| *id)
            .collect();
        ids.sort_unstable();
        ids
    }

    // =========================================================================
    // Stepping
    // =========================================================================

    /// Advance the world by `dt` seconds.
    ///
    /// Returns the joints that broke during this step, in creation order.
    /// External loads on a held body are carried entirely by its grip joint,
    /// so a joint breaks when the body's accumulated force or torque exceeds
    /// the joint's thresholds.
    pub fn step(&mut self, dt: f64) -> Vec<JointId> {
        let broken = self.break_overloaded_joints();

        let mut joint_ids: Vec<JointId> = self.joints.keys().copied().collect();
        joint_ids.sort_unstable();

        let mut carried: HashMap<BodyId, Pose> = HashMap::new();
        for id in joint_ids {
            let Some(spec) = self.joints.get(&id) else {
                continue;
            };
            if carried.contains_key(&spec.body()) {
                continue;
            }
            if let Some(hand) = self.bodies.get(&spec.hand()) {
                carried.insert(spec.body(), held_body_pose(&hand.state.pose, spec));
            }
        }

        let gravity = self.gravity;
        for body in self.bodies.values_mut() {
            if body.is_kinematic {
                body.clear_forces();
                continue;
            }

            if let Some(pose) = carried.get(&body.id) {
                body.state = RigidBodyState::at_rest(*pose);
            } else {
                integrate(body, gravity, dt);
            }
            body.clear_forces();
        }

        self.time += dt;
        broken
    }

    fn break_overloaded_joints(&mut self) -> Vec<JointId> {
        let bodies = &self.bodies;
        let mut broken: Vec<JointId> = self
            .joints
            .iter()
            .filter(|(_, spec)| {
                bodies.get(&spec.body()).is_some_and(|body| {
                    body.accumulated_force.norm() > spec.break_force()
                        || body.accumulated_torque.norm() > spec.break_torque()
                })
            })
            .map(|(id, _)| *id)
            .collect();
        broken.sort_unstable();

        for id in &broken {
            if let Some(spec) = self.joints.remove(id) {
                info!(joint = %id, body = %spec.body(), "Grip joint broke under load");
            }
        }
        broken
    }
}

/// Pose that puts the joint's body anchor frame on the hand's anchor.
fn held_body_pose(hand: &Pose, spec: &GripJointSpec) -> Pose {
    let hand_anchor = Pose::from_position(*spec.hand_anchor());
    let body_anchor = Pose::from_position_rotation(*spec.body_anchor(), *spec.relative_rotation());
    hand.compose(&hand_anchor).compose(&body_anchor.inverse())
}

fn integrate(body: &mut WorldBody, gravity: Vector3<f64>, dt: f64) {
    if body.mass.is_finite() && body.mass > 0.0 {
        let acceleration = body.accumulated_force / body.mass + gravity;
        body.state.twist.linear += acceleration * dt;
        // Unit inertia; the grab engine never depends on rotational dynamics.
        body.state.twist.angular += body.accumulated_torque / body.mass * dt;
    }

    let twist = body.state.twist;
    body.state.pose.position += twist.linear * dt;
    body.state.pose.rotation =
        UnitQuaternion::from_scaled_axis(twist.angular * dt) * body.state.pose.rotation;
}

impl PhysicsBackend for KinematicWorld {
    fn body_state(&self, id: BodyId) -> Option<RigidBodyState> {
        self.bodies.get(&id).map(|body| body.state)
    }

    fn set_body_pose(&mut self, id: BodyId, pose: Pose) -> Result<()> {
        let body = self
            .bodies
            .get_mut(&id)
            .ok_or(GrabError::BodyNotFound(id.raw()))?;
        body.state.pose = pose;
        Ok(())
    }

    fn set_body_twist(&mut self, id: BodyId, twist: Twist) -> Result<()> {
        let body = self
            .bodies
            .get_mut(&id)
            .ok_or(GrabError::BodyNotFound(id.raw()))?;
        body.state.twist = twist;
        Ok(())
    }

    fn create_joint(&mut self, spec: GripJointSpec) -> Result<JointId> {
        if !spec.is_breakable() {
            return Err(GrabError::invalid_config(
                "grip joint break limits must be finite",
            ));
        }
        for body in [spec.hand(), spec.body()] {
            if !self.bodies.contains_key(&body) {
                return Err(GrabError::BodyNotFound(body.raw()));
            }
        }

        let id = JointId::new(self.next_joint_id);
        self.next_joint_id += 1;
        self.joints.insert(id, spec);
        debug!(joint = %id, hand = %spec.hand(), body = %spec.body(), "Created grip joint");
        Ok(id)
    }

    fn destroy_joint(&mut self, id: JointId) -> bool {
        self.joints.remove(&id).is_some()
    }

    fn joint_exists(&self, id: JointId) -> bool {
        self.joints.contains_key(&id)
    }
}
