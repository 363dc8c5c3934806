//! Per-hand candidate tracking.

use tracing::debug;

use grab_types::{BodyId, FloorGate};

use crate::attach_point::{AttachPointId, AttachPoints};
use crate::physics::PhysicsBackend;
use crate::select::Candidate;

/// Something a hand's trigger volume can overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GrabTarget {
    /// A designed attach point.
    Point(AttachPointId),
    /// A plain rigid body without attach points.
    Body(BodyId),
}

impl From<AttachPointId> for GrabTarget {
    fn from(id: AttachPointId) -> Self {
        Self::Point(id)
    }
}

impl From<BodyId> for GrabTarget {
    fn from(id: BodyId) -> Self {
        Self::Body(id)
    }
}

/// Attach points currently overlapping one hand, plus a single fallback body.
///
/// Members are unique and kept in insertion order, which makes best-candidate
/// selection reproducible on exact ties.
#[derive(Debug, Clone, Default)]
pub struct CandidateSet {
    members: Vec<AttachPointId>,
    fallback: Option<BodyId>,
}

impl CandidateSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a member. Returns `false` if it was already present.
    pub fn insert(&mut self, id: AttachPointId) -> bool {
        if self.members.contains(&id) {
            return false;
        }
        self.members.push(id);
        true
    }

    /// Remove a member. Returns `false` if it was not present.
    pub fn remove(&mut self, id: AttachPointId) -> bool {
        let before = self.members.len();
        self.members.retain(|member| *member != id);
        self.members.len() != before
    }

    /// Whether `id` is a member.
    #[must_use]
    pub fn contains(&self, id: AttachPointId) -> bool {
        self.members.contains(&id)
    }

    /// Iterate over members in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = AttachPointId> + '_ {
        self.members.iter().copied()
    }

    /// Number of members, not counting the fallback.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether there are no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Remove all members. The fallback is kept.
    pub fn clear(&mut self) {
        self.members.clear();
    }

    /// The fallback body.
    #[must_use]
    pub fn fallback(&self) -> Option<BodyId> {
        self.fallback
    }

    /// Replace the fallback body.
    pub fn set_fallback(&mut self, body: BodyId) {
        self.fallback = Some(body);
    }

    /// Clear the fallback body, returning it.
    pub fn clear_fallback(&mut self) -> Option<BodyId> {
        self.fallback.take()
    }

    /// Drop members that can no longer be grabbed: removed from the store,
    /// unbound, owning body destroyed, below the floor, or held by any hand.
    /// Pruned members have their highlight hidden. A destroyed or held
    /// fallback body is dropped too.
    ///
    /// Returns the number of members removed.
    pub fn prune<P: PhysicsBackend + ?Sized>(
        &mut self,
        points: &mut AttachPoints,
        physics: &P,
        gate: FloorGate,
    ) -> usize {
        let before = self.members.len();

        self.members.retain(|id| {
            let Some(point) = points.get(*id) else {
                debug!(point = %id, "Pruned candidate removed from the scene");
                return false;
            };
            if !point.is_floor_eligible(physics, gate) {
                points.hide(*id);
                debug!(point = %id, "Pruned ineligible candidate");
                return false;
            }
            if points.is_point_held(*id) {
                points.hide(*id);
                debug!(point = %id, "Pruned candidate on a held body");
                return false;
            }
            true
        });

        if let Some(body) = self.fallback {
            if !physics.contains_body(body) {
                debug!(body = %body, "Dropped destroyed fallback body");
                self.fallback = None;
            } else if points.is_held(body) {
                debug!(body = %body, "Dropped held fallback body");
                self.fallback = None;
            }
        }

        before - self.members.len()
    }

    /// Resolve members into [`Candidate`]s, in insertion order.
    ///
    /// Members that cannot be resolved or whose body is held are skipped;
    /// they are removed on the next [`prune`](Self::prune).
    pub fn candidates<'a, P: PhysicsBackend + ?Sized>(
        &'a self,
        points: &'a AttachPoints,
        physics: &'a P,
    ) -> impl Iterator<Item = Candidate> + 'a {
        self.members.iter().filter_map(move |id| {
            let point = points.get(*id)?;
            if points.is_point_held(*id) {
                return None;
            }
            let pose = point.bound_attach_pose(physics).ok()?;
            Some(Candidate::new(*id, point.priority(), pose.position))
        })
    }
}
