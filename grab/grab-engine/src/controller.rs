//! One hand's grab state machine.
//!
//! The controller is driven once per frame with [`GrabController::update`]
//! and fed overlap events by the host. It owns the hand's candidate set and
//! at most one [`Hold`]. A hold ends in exactly one place, whichever way it
//! ends (trigger released, joint broken, forced release), and that routine
//! consumes the `Hold`, so the joint handle can neither leak nor be destroyed
//! twice by the engine.

use tracing::{debug, info, warn};

use grab_types::{
    BodyId, FloorGate, FloorHeight, GrabConfig, GrabError, GripJointSpec, JointId, Pose, Result,
};

use crate::align::{align_body_to_hand, AttachOffset};
use crate::attach_point::{AttachPointId, AttachPoints};
use crate::candidates::{CandidateSet, GrabTarget};
use crate::physics::PhysicsBackend;
use crate::select::select_best;

/// Grab state of a hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GrabState {
    /// Not holding anything.
    #[default]
    Idle,
    /// Holding a body through a grip joint.
    Holding,
}

/// Per-frame input for a hand.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandFrame {
    /// World pose of the hand's grip anchor.
    pub pose: Pose,
    /// Sampled grab intensity, `None` when the input source is unavailable.
    pub intensity: Option<f64>,
}

impl HandFrame {
    /// Frame with a sampled intensity.
    #[must_use]
    pub fn new(pose: Pose, intensity: f64) -> Self {
        Self {
            pose,
            intensity: Some(intensity),
        }
    }

    /// Frame whose intensity source is missing.
    #[must_use]
    pub fn without_input(pose: Pose) -> Self {
        Self {
            pose,
            intensity: None,
        }
    }
}

/// An active grip: the joint handle and what it holds.
///
/// Not `Clone`: there is exactly one owner of a live joint.
#[derive(Debug, PartialEq, Eq)]
pub struct Hold {
    joint: JointId,
    body: BodyId,
    point: Option<AttachPointId>,
}

impl Hold {
    /// The grip joint.
    #[must_use]
    pub fn joint(&self) -> JointId {
        self.joint
    }

    /// The held body.
    #[must_use]
    pub fn body(&self) -> BodyId {
        self.body
    }

    /// The attach point used, `None` for a fallback grab.
    #[must_use]
    pub fn point(&self) -> Option<AttachPointId> {
        self.point
    }
}

/// Observable transitions, returned from the controller's entry points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrabEvent {
    /// A body was grabbed.
    Grabbed {
        /// Held body.
        body: BodyId,
        /// Created grip joint.
        joint: JointId,
        /// Attach point used, `None` for a fallback grab.
        point: Option<AttachPointId>,
    },
    /// The hand let go.
    Released {
        /// Body that was held.
        body: BodyId,
    },
    /// The grip joint broke under load.
    Broken {
        /// Body that was held.
        body: BodyId,
    },
}

#[derive(Debug, Clone, Copy)]
enum HoldEnd {
    Released,
    Broken,
}

/// Grab controller for one hand.
///
/// Generic over the floor height source so tests can pass a constant while
/// applications share a [`SharedFloorHeight`](grab_types::SharedFloorHeight)
/// with the floor calibrator.
///
/// # Example
///
/// ```
/// use grab_engine::{
///     AttachPoint, AttachPoints, GrabController, GrabState, GrabTarget, HandFrame,
///     KinematicWorld,
/// };
/// use grab_types::{GrabConfig, Pose, RigidBodyState};
/// use nalgebra::Point3;
///
/// let mut world = KinematicWorld::new();
/// let hand_pose = Pose::from_position(Point3::new(0.0, 1.0, 0.0));
/// let hand = world.add_kinematic_body(hand_pose);
/// let mug = world.add_body(
///     RigidBodyState::at_rest(Pose::from_position(Point3::new(0.05, 0.95, 0.0))),
///     0.3,
/// );
///
/// let mut points = AttachPoints::new();
/// let handle = points.insert(AttachPoint::new(Some(mug), Pose::identity()));
///
/// let mut controller = GrabController::new(hand, GrabConfig::default(), 0.0);
/// controller.on_overlap_enter(GrabTarget::Point(handle), &points, &world);
///
/// controller.update(&HandFrame::new(hand_pose, 0.0), &mut points, &mut world);
/// assert!(points.get(handle).unwrap().is_highlighted());
///
/// controller.update(&HandFrame::new(hand_pose, 1.0), &mut points, &mut world);
/// assert_eq!(controller.state(), GrabState::Holding);
/// ```
#[derive(Debug)]
pub struct GrabController<F: FloorHeight> {
    hand: BodyId,
    config: GrabConfig,
    floor: F,
    candidates: CandidateSet,
    hold: Option<Hold>,
    hand_pose: Pose,
    was_grabbing: bool,
    input_missing: bool,
    highlighted: Option<AttachPointId>,
}

impl<F: FloorHeight> GrabController<F> {
    /// Create a controller for the hand body `hand`.
    ///
    /// An invalid configuration is reported and replaced by the default.
    pub fn new(hand: BodyId, config: GrabConfig, floor: F) -> Self {
        let config = match config.validate() {
            Ok(()) => config,
            Err(err) => {
                warn!(hand = %hand, error = %err, "Invalid grab config, using defaults");
                GrabConfig::default()
            }
        };

        Self {
            hand,
            config,
            floor,
            candidates: CandidateSet::new(),
            hold: None,
            hand_pose: Pose::identity(),
            was_grabbing: false,
            input_missing: false,
            highlighted: None,
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// The hand body.
    #[must_use]
    pub fn hand(&self) -> BodyId {
        self.hand
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &GrabConfig {
        &self.config
    }

    /// Floor height source.
    #[must_use]
    pub fn floor(&self) -> &F {
        &self.floor
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> GrabState {
        if self.hold.is_some() {
            GrabState::Holding
        } else {
            GrabState::Idle
        }
    }

    /// The active hold.
    #[must_use]
    pub fn hold(&self) -> Option<&Hold> {
        self.hold.as_ref()
    }

    /// Candidates currently overlapping the hand.
    #[must_use]
    pub fn candidates(&self) -> &CandidateSet {
        &self.candidates
    }

    /// Attach point whose highlight this controller last showed.
    #[must_use]
    pub fn highlighted(&self) -> Option<AttachPointId> {
        self.highlighted
    }

    /// Whether the last frame had no grab intensity.
    #[must_use]
    pub fn is_input_missing(&self) -> bool {
        self.input_missing
    }

    /// Hand pose from the last update.
    #[must_use]
    pub fn hand_pose(&self) -> &Pose {
        &self.hand_pose
    }

    // ========================================================================
    // Frame update
    // ========================================================================

    /// Advance one frame.
    ///
    /// Order within the frame: detect a broken joint, prune candidates,
    /// apply the grab/release edge, refresh highlights. The floor height is
    /// read once and used for every check in the frame.
    pub fn update<P: PhysicsBackend + ?Sized>(
        &mut self,
        frame: &HandFrame,
        points: &mut AttachPoints,
        physics: &mut P,
    ) -> Option<GrabEvent> {
        self.hand_pose = frame.pose;
        let gate = self.floor_gate();

        let mut event = self.poll_joint(points, physics, gate);
        self.candidates.prune(points, &*physics, gate);

        if let Some(grabbing) = self.sample_grabbing(frame.intensity) {
            if grabbing && !self.was_grabbing && self.hold.is_none() {
                event = event.or_else(|| self.try_grab(points, physics, gate));
            } else if !grabbing {
                if let Some(hold) = self.hold.take() {
                    event = Some(self.end_hold(hold, HoldEnd::Released, points, physics, gate));
                }
            }
            self.was_grabbing = grabbing;
        }

        self.refresh_affordances(points, physics, gate);
        event
    }

    fn sample_grabbing(&mut self, intensity: Option<f64>) -> Option<bool> {
        match intensity {
            Some(value) => {
                if self.input_missing {
                    info!(hand = %self.hand, "Grab input restored");
                    self.input_missing = false;
                }
                Some(self.config.is_engaged(value))
            }
            None => {
                if !self.input_missing {
                    warn!(hand = %self.hand, "Grab input missing, grab evaluation disabled");
                    self.input_missing = true;
                }
                None
            }
        }
    }

    fn poll_joint<P: PhysicsBackend + ?Sized>(
        &mut self,
        points: &mut AttachPoints,
        physics: &mut P,
        gate: FloorGate,
    ) -> Option<GrabEvent> {
        let broken = self
            .hold
            .as_ref()
            .is_some_and(|hold| !physics.joint_exists(hold.joint));
        if !broken {
            return None;
        }
        let hold = self.hold.take()?;
        Some(self.end_hold(hold, HoldEnd::Broken, points, physics, gate))
    }

    // ========================================================================
    // Host events
    // ========================================================================

    /// Something entered the hand's trigger volume.
    ///
    /// Returns whether it was accepted as a candidate or fallback. Targets
    /// below the floor or held by any hand are refused.
    pub fn on_overlap_enter<P: PhysicsBackend + ?Sized>(
        &mut self,
        target: GrabTarget,
        points: &AttachPoints,
        physics: &P,
    ) -> bool {
        let gate = self.floor_gate();
        match target {
            GrabTarget::Point(id) => {
                let eligible = !points.is_point_held(id)
                    && points
                        .get(id)
                        .is_some_and(|point| point.is_floor_eligible(physics, gate));
                if eligible {
                    self.candidates.insert(id);
                } else {
                    debug!(hand = %self.hand, point = %id, "Ignored ineligible attach point");
                }
                eligible
            }
            GrabTarget::Body(body) => {
                if body == self.hand || points.is_held(body) {
                    return false;
                }
                let eligible = physics
                    .body_pose(body)
                    .is_some_and(|pose| gate.admits(pose.height()));
                if eligible {
                    self.candidates.set_fallback(body);
                }
                eligible
            }
        }
    }

    /// Something left the hand's trigger volume.
    pub fn on_overlap_exit(&mut self, target: GrabTarget, points: &mut AttachPoints) {
        match target {
            GrabTarget::Point(id) => {
                self.candidates.remove(id);
                points.hide(id);
                if self.highlighted == Some(id) {
                    self.highlighted = None;
                }
            }
            GrabTarget::Body(body) => {
                if self.hold.is_none() && self.candidates.fallback() == Some(body) {
                    self.candidates.clear_fallback();
                }
            }
        }
    }

    /// The host's physics reported that `joint` broke.
    ///
    /// Ends the hold if `joint` is the one this controller owns.
    pub fn on_joint_broken<P: PhysicsBackend + ?Sized>(
        &mut self,
        joint: JointId,
        points: &mut AttachPoints,
        physics: &mut P,
    ) -> Option<GrabEvent> {
        if self.hold.as_ref().map(Hold::joint) != Some(joint) {
            return None;
        }
        let hold = self.hold.take()?;
        let gate = self.floor_gate();
        Some(self.end_hold(hold, HoldEnd::Broken, points, physics, gate))
    }

    /// Let go regardless of input, e.g. when the hand is disabled.
    pub fn force_release<P: PhysicsBackend + ?Sized>(
        &mut self,
        points: &mut AttachPoints,
        physics: &mut P,
    ) -> Option<GrabEvent> {
        let hold = self.hold.take()?;
        let gate = self.floor_gate();
        Some(self.end_hold(hold, HoldEnd::Released, points, physics, gate))
    }

    // ========================================================================
    // Grab and release
    // ========================================================================

    fn try_grab<P: PhysicsBackend + ?Sized>(
        &mut self,
        points: &mut AttachPoints,
        physics: &mut P,
        gate: FloorGate,
    ) -> Option<GrabEvent> {
        let best = select_best(
            self.candidates.candidates(points, &*physics),
            &self.hand_pose.position,
        );

        if let Some(best) = best {
            match self.grab_point(best.id, points, physics, gate) {
                Ok(Some(event)) => return Some(event),
                Ok(None) => {}
                Err(err) if err.is_stale_reference() => {
                    debug!(hand = %self.hand, point = %best.id, error = %err, "Grab target vanished");
                }
                Err(err) => {
                    debug!(hand = %self.hand, point = %best.id, error = %err, "Point grab failed");
                }
            }
        }

        match self.grab_fallback(points, physics, gate) {
            Ok(event) => event,
            Err(err) => {
                debug!(hand = %self.hand, error = %err, "Fallback grab failed");
                None
            }
        }
    }

    /// Grab through an attach point. `Ok(None)` when its body is below the
    /// floor or already held.
    fn grab_point<P: PhysicsBackend + ?Sized>(
        &mut self,
        id: AttachPointId,
        points: &mut AttachPoints,
        physics: &mut P,
        gate: FloorGate,
    ) -> Result<Option<GrabEvent>> {
        let point = points
            .get(id)
            .ok_or(GrabError::AttachPointNotFound(id.raw()))?;
        let body = point.owning_body().ok_or(GrabError::UnboundAttachPoint)?;
        let body_pose = physics
            .body_pose(body)
            .ok_or(GrabError::BodyNotFound(body.raw()))?;
        if !gate.admits(body_pose.height()) || points.is_held(body) {
            return Ok(None);
        }

        let offset = AttachOffset::of_point(point, &*physics)?;
        let joint = self.attach(body, &offset, physics)?;

        for member in self.candidates.iter() {
            points.hide(member);
        }
        self.candidates.clear();
        self.highlighted = None;

        Ok(Some(self.begin_hold(joint, body, Some(id), points)))
    }

    fn grab_fallback<P: PhysicsBackend + ?Sized>(
        &mut self,
        points: &mut AttachPoints,
        physics: &mut P,
        gate: FloorGate,
    ) -> Result<Option<GrabEvent>> {
        let Some(body) = self.candidates.fallback() else {
            return Ok(None);
        };
        let body_pose = physics
            .body_pose(body)
            .ok_or(GrabError::BodyNotFound(body.raw()))?;
        if !gate.admits(body_pose.height()) || points.is_held(body) {
            return Ok(None);
        }

        let joint = self.attach(body, &AttachOffset::identity(), physics)?;
        self.candidates.clear_fallback();

        Ok(Some(self.begin_hold(joint, body, None, points)))
    }

    /// Snap `body` onto the hand and lock it there.
    fn attach<P: PhysicsBackend + ?Sized>(
        &self,
        body: BodyId,
        offset: &AttachOffset,
        physics: &mut P,
    ) -> Result<JointId> {
        let aligned = align_body_to_hand(physics, body, &self.hand_pose, offset)?;
        let attach_world = aligned.transform_point(&offset.anchor);

        let spec = GripJointSpec::new(self.hand, body)
            .with_hand_anchor(self.hand_pose.inverse_transform_point(&attach_world))
            .with_body_anchor(offset.anchor)
            .with_relative_rotation(offset.rotation)
            .with_locked_axes(self.config.locked_axes)
            .with_break_force(self.config.break_force)
            .with_break_torque(self.config.break_torque);

        physics.create_joint(spec).map_err(|err| {
            warn!(hand = %self.hand, body = %body, error = %err, "Grip joint creation failed");
            err
        })
    }

    fn begin_hold(
        &mut self,
        joint: JointId,
        body: BodyId,
        point: Option<AttachPointId>,
        points: &mut AttachPoints,
    ) -> GrabEvent {
        info!(hand = %self.hand, body = %body, joint = %joint, "Grabbed");
        points.mark_held(body, self.hand);
        self.hold = Some(Hold { joint, body, point });
        GrabEvent::Grabbed { body, joint, point }
    }

    /// The single exit from `Holding`.
    fn end_hold<P: PhysicsBackend + ?Sized>(
        &mut self,
        hold: Hold,
        end: HoldEnd,
        points: &mut AttachPoints,
        physics: &mut P,
        gate: FloorGate,
    ) -> GrabEvent {
        if !physics.destroy_joint(hold.joint) {
            debug!(hand = %self.hand, joint = %hold.joint, "Grip joint already gone");
        }
        if points.holder(hold.body) == Some(self.hand) {
            points.release_held(hold.body);
        }
        self.candidates.clear_fallback();
        self.refresh_affordances(points, &*physics, gate);

        match end {
            HoldEnd::Released => {
                info!(hand = %self.hand, body = %hold.body, "Released");
                GrabEvent::Released { body: hold.body }
            }
            HoldEnd::Broken => {
                info!(hand = %self.hand, body = %hold.body, "Grip broke");
                GrabEvent::Broken { body: hold.body }
            }
        }
    }

    // ========================================================================
    // Affordances
    // ========================================================================

    /// Show the best candidate's highlight while idle and hide every other.
    fn refresh_affordances<P: PhysicsBackend + ?Sized>(
        &mut self,
        points: &mut AttachPoints,
        physics: &P,
        gate: FloorGate,
    ) {
        let best = if self.hold.is_none() {
            select_best(
                self.candidates.candidates(points, physics),
                &self.hand_pose.position,
            )
            .map(|candidate| candidate.id)
        } else {
            None
        };

        for member in self.candidates.iter() {
            if Some(member) != best {
                points.hide(member);
            }
        }
        if let Some(previous) = self.highlighted {
            if Some(previous) != best {
                points.hide(previous);
            }
        }

        self.highlighted = best.filter(|id| points.show(*id, physics, gate));
    }

    fn floor_gate(&self) -> FloorGate {
        FloorGate::sample(&self.floor, self.config.floor_margin)
    }
}
