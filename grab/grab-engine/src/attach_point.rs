//! Designed grab points on rigid bodies.
//!
//! An [`AttachPoint`] marks where and how a hand should hold a body. It moves
//! with its owning body: its poses are stored in the body's frame and turned
//! into world poses on every query, so nothing here goes stale when the body
//! is simulated.

use hashbrown::HashMap;
use nalgebra::{Point3, UnitQuaternion, Vector3};
use tracing::warn;

use grab_types::{BodyId, FloorGate, GrabError, Pose, Result};

use crate::physics::PhysicsBackend;

/// Default arbitration weight of an attach point.
pub const DEFAULT_PRIORITY: i32 = 10;

/// Identifier of an attach point in an [`AttachPoints`] store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttachPointId(pub u64);

impl AttachPointId {
    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for AttachPointId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AttachPoint({})", self.0)
    }
}

/// Highlight bubble shown on the attach point a hand would grab.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Highlight {
    visible: bool,
    scale: f64,
}

impl Highlight {
    /// Whether the highlight is currently shown.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Local scale of the highlight, compensated for the point's own scale
    /// so the bubble keeps a constant size in the world.
    #[must_use]
    pub fn scale(&self) -> f64 {
        self.scale
    }
}

/// A designed grab point on a rigid body.
///
/// # Example
///
/// ```
/// use grab_engine::{AttachPoint, KinematicWorld};
/// use grab_types::{FloorGate, Pose, RigidBodyState};
/// use nalgebra::Point3;
///
/// let mut world = KinematicWorld::new();
/// let mug = world.add_body(
///     RigidBodyState::at_rest(Pose::from_position(Point3::new(0.0, 1.0, 0.0))),
///     0.4,
/// );
///
/// // Handle sits 8 cm to the side of the mug's origin
/// let handle = AttachPoint::new(Some(mug), Pose::from_position(Point3::new(0.08, 0.0, 0.0)))
///     .with_priority(20);
///
/// let pose = handle.attach_pose(&world);
/// assert_eq!(pose.position, Point3::new(0.08, 1.0, 0.0));
/// assert!(handle.is_floor_eligible(&world, FloorGate::new(0.0, 0.02)));
/// ```
#[derive(Debug, Clone)]
pub struct AttachPoint {
    priority: i32,
    body: Option<BodyId>,
    origin: Pose,
    attach: Option<Pose>,
    lossy_scale: Vector3<f64>,
    highlight_scale: f64,
    highlight: Option<Highlight>,
}

impl AttachPoint {
    /// Create an attach point on `body`, with its own transform `origin`
    /// expressed in the body's frame.
    ///
    /// A point without an owning body is accepted but can never be grabbed.
    #[must_use]
    pub fn new(body: Option<BodyId>, origin: Pose) -> Self {
        if body.is_none() {
            warn!("Attach point has no owning rigid body and will be ignored");
        }
        Self {
            priority: DEFAULT_PRIORITY,
            body,
            origin,
            attach: None,
            lossy_scale: Vector3::new(1.0, 1.0, 1.0),
            highlight_scale: 1.0,
            highlight: None,
        }
    }

    /// Set the arbitration priority. Any value is accepted, negative included.
    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Set an explicit attach pose in the body's frame, distinct from the
    /// point's own transform.
    #[must_use]
    pub fn with_attach_pose(mut self, attach: Pose) -> Self {
        self.attach = Some(attach);
        self
    }

    /// Set the accumulated scale of the point's transform.
    #[must_use]
    pub fn with_lossy_scale(mut self, scale: Vector3<f64>) -> Self {
        self.lossy_scale = scale;
        self
    }

    /// Set the world-space size of the highlight bubble.
    #[must_use]
    pub fn with_highlight_scale(mut self, scale: f64) -> Self {
        self.highlight_scale = scale;
        self
    }

    /// Arbitration priority.
    #[must_use]
    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Owning body, if the point was bound to one.
    #[must_use]
    pub fn owning_body(&self) -> Option<BodyId> {
        self.body
    }

    /// Attach pose in the owning body's frame; the point's own transform when
    /// no explicit attach pose was configured.
    #[must_use]
    pub fn local_pose(&self) -> Pose {
        self.attach.unwrap_or(self.origin)
    }

    /// World attach pose.
    ///
    /// A point whose body is missing reports its local pose unchanged.
    #[must_use]
    pub fn attach_pose<P: PhysicsBackend + ?Sized>(&self, physics: &P) -> Pose {
        match self.body.and_then(|body| physics.body_pose(body)) {
            Some(body_pose) => body_pose.compose(&self.local_pose()),
            None => self.local_pose(),
        }
    }

    /// World attach pose, failing when the point is unbound or its body is
    /// gone.
    pub fn bound_attach_pose<P: PhysicsBackend + ?Sized>(&self, physics: &P) -> Result<Pose> {
        let body = self.body.ok_or(GrabError::UnboundAttachPoint)?;
        let body_pose = physics
            .body_pose(body)
            .ok_or(GrabError::BodyNotFound(body.raw()))?;
        Ok(body_pose.compose(&self.local_pose()))
    }

    /// Whether the point can be grabbed against the given floor: it must be
    /// bound to a live body and its attach position must clear the floor.
    #[must_use]
    pub fn is_floor_eligible<P: PhysicsBackend + ?Sized>(&self, physics: &P, gate: FloorGate) -> bool {
        self.bound_attach_pose(physics)
            .is_ok_and(|pose| gate.admits(pose.height()))
    }

    /// Attach position in the coordinate space of `frame`.
    pub fn local_attach_point<P: PhysicsBackend + ?Sized>(
        &self,
        frame: &Pose,
        physics: &P,
    ) -> Result<Point3<f64>> {
        let pose = self.bound_attach_pose(physics)?;
        Ok(frame.inverse_transform_point(&pose.position))
    }

    /// Attach orientation in the coordinate space of `frame`.
    pub fn local_attach_rotation<P: PhysicsBackend + ?Sized>(
        &self,
        frame: &Pose,
        physics: &P,
    ) -> Result<UnitQuaternion<f64>> {
        let pose = self.bound_attach_pose(physics)?;
        Ok(frame.inverse_transform_rotation(&pose.rotation))
    }

    /// Show the highlight, creating it on first use.
    ///
    /// No-op when the point is not floor eligible. Returns whether the
    /// highlight is visible afterwards.
    pub fn show<P: PhysicsBackend + ?Sized>(&mut self, physics: &P, gate: FloorGate) -> bool {
        if !self.is_floor_eligible(physics, gate) {
            return self.is_highlighted();
        }

        let scale = self.compensated_highlight_scale();
        let highlight = self.highlight.get_or_insert(Highlight {
            visible: false,
            scale,
        });
        highlight.visible = true;
        true
    }

    /// Hide the highlight if it exists.
    pub fn hide(&mut self) {
        if let Some(highlight) = &mut self.highlight {
            highlight.visible = false;
        }
    }

    /// The highlight, once it has been created.
    #[must_use]
    pub fn highlight(&self) -> Option<&Highlight> {
        self.highlight.as_ref()
    }

    /// Whether the highlight is currently shown.
    #[must_use]
    pub fn is_highlighted(&self) -> bool {
        self.highlight.is_some_and(|h| h.visible)
    }

    fn compensated_highlight_scale(&self) -> f64 {
        let largest = self.lossy_scale.abs().max();
        if largest.abs() < f64::EPSILON {
            self.highlight_scale
        } else {
            self.highlight_scale / largest
        }
    }
}

/// Store of attach points, keyed by [`AttachPointId`].
///
/// Owned by the host scene and shared by every hand. Removing a point here
/// is how a destroyed scene object leaves every hand's candidate set:
/// controllers drop ids they can no longer resolve on their next prune.
///
/// The store also records which bodies are held and by which hand. A held
/// body's points are not candidates for any hand and never show a highlight.
#[derive(Debug, Clone, Default)]
pub struct AttachPoints {
    points: HashMap<AttachPointId, AttachPoint>,
    held: HashMap<BodyId, BodyId>,
    next_id: u64,
}

impl AttachPoints {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a point and return its ID.
    pub fn insert(&mut self, point: AttachPoint) -> AttachPointId {
        let id = AttachPointId(self.next_id);
        self.next_id += 1;
        self.points.insert(id, point);
        id
    }

    /// Remove a point.
    pub fn remove(&mut self, id: AttachPointId) -> Option<AttachPoint> {
        self.points.remove(&id)
    }

    /// Remove every point owned by `body`, e.g. when the body is destroyed.
    /// Returns how many were removed.
    pub fn remove_owned_by(&mut self, body: BodyId) -> usize {
        let before = self.points.len();
        self.points.retain(|_, point| point.owning_body() != Some(body));
        before - self.points.len()
    }

    /// Get a point by ID.
    #[must_use]
    pub fn get(&self, id: AttachPointId) -> Option<&AttachPoint> {
        self.points.get(&id)
    }

    /// Get a mutable point by ID.
    #[must_use]
    pub fn get_mut(&mut self, id: AttachPointId) -> Option<&mut AttachPoint> {
        self.points.get_mut(&id)
    }

    /// Hide a point's highlight if the point still exists.
    pub fn hide(&mut self, id: AttachPointId) {
        if let Some(point) = self.points.get_mut(&id) {
            point.hide();
        }
    }

    /// Show a point's highlight. Refused for missing points and points on a
    /// held body; see [`AttachPoint::show`] for the rest.
    pub fn show<P: PhysicsBackend + ?Sized>(
        &mut self,
        id: AttachPointId,
        physics: &P,
        gate: FloorGate,
    ) -> bool {
        let Some(point) = self.points.get_mut(&id) else {
            return false;
        };
        if point.owning_body().is_some_and(|body| self.held.contains_key(&body)) {
            return false;
        }
        point.show(physics, gate)
    }

    // ========================================================================
    // Held bodies
    // ========================================================================

    /// Record that `hand` holds `body` and hide every highlight on it.
    ///
    /// Returns the previous holder, if any.
    pub fn mark_held(&mut self, body: BodyId, hand: BodyId) -> Option<BodyId> {
        for point in self.points.values_mut() {
            if point.owning_body() == Some(body) {
                point.hide();
            }
        }
        self.held.insert(body, hand)
    }

    /// Forget that `body` is held. Returns the hand that held it.
    pub fn release_held(&mut self, body: BodyId) -> Option<BodyId> {
        self.held.remove(&body)
    }

    /// Hand currently holding `body`.
    #[must_use]
    pub fn holder(&self, body: BodyId) -> Option<BodyId> {
        self.held.get(&body).copied()
    }

    /// Whether any hand holds `body`.
    #[must_use]
    pub fn is_held(&self, body: BodyId) -> bool {
        self.held.contains_key(&body)
    }

    /// Whether the point exists and its owning body is held.
    #[must_use]
    pub fn is_point_held(&self, id: AttachPointId) -> bool {
        self.points
            .get(&id)
            .and_then(AttachPoint::owning_body)
            .is_some_and(|body| self.is_held(body))
    }

    /// Number of points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Iterate over all points.
    pub fn iter(&self) -> impl Iterator<Item = (AttachPointId, &AttachPoint)> {
        self.points.iter().map(|(id, point)| (*id, point))
    }
}
