//! Grab engine for VR hands.
//!
//! Decides what a hand grabs and attaches it with a breakable rigid joint:
//!
//! - [`AttachPoint`] / [`AttachPoints`] - designed grab points on rigid bodies,
//!   each with a priority and a highlight
//! - [`CandidateSet`] - attach points overlapping one hand, plus a fallback body
//! - [`select_best`] - priority first, then proximity to the hand
//! - [`align_body_to_hand`] - snaps a body so its attach point sits on the hand
//! - [`GrabController`] - per-hand state machine driving all of the above
//! - [`PhysicsBackend`] - the seam to the host's physics engine, with
//!   [`KinematicWorld`] as an in-memory implementation
//!
//! # Layer 0
//!
//! No rendering, input or engine dependencies. The host feeds overlap events,
//! a per-frame [`HandFrame`] and a physics backend; the engine returns
//! [`GrabEvent`]s and leaves highlight state on each [`AttachPoint`] for the
//! host to render.
//!
//! # Frame Order
//!
//! Each [`GrabController::update`]:
//!
//! 1. Ends the hold if the backend no longer has its joint
//! 2. Prunes candidates that were removed, lost their body or fell below
//!    the floor
//! 3. Grabs on a rising edge of the grab input, releases on a falling edge
//! 4. Shows the best candidate's highlight while idle, hides all others
//!
//! # Example
//!
//! ```
//! use grab_engine::{
//!     AttachPoint, AttachPoints, GrabController, GrabEvent, GrabTarget, HandFrame,
//!     KinematicWorld,
//! };
//! use grab_types::{GrabConfig, Pose, RigidBodyState, SharedFloorHeight};
//! use nalgebra::{Point3, Vector3};
//!
//! let mut world = KinematicWorld::new();
//! let hand_pose = Pose::from_position(Point3::new(0.0, 1.2, 0.3));
//! let hand = world.add_kinematic_body(hand_pose);
//! let crate_body = world.add_body(
//!     RigidBodyState::at_rest(Pose::from_position(Point3::new(0.0, 1.1, 0.3))),
//!     2.0,
//! );
//!
//! let mut points = AttachPoints::new();
//! let lid = points.insert(
//!     AttachPoint::new(Some(crate_body), Pose::from_position(Point3::new(0.0, 0.1, 0.0)))
//!         .with_priority(20),
//! );
//!
//! let floor = SharedFloorHeight::new(0.0);
//! let mut controller = GrabController::new(hand, GrabConfig::default(), floor);
//! controller.on_overlap_enter(GrabTarget::Point(lid), &points, &world);
//!
//! controller.update(&HandFrame::new(hand_pose, 0.0), &mut points, &mut world);
//! let grabbed = controller.update(&HandFrame::new(hand_pose, 1.0), &mut points, &mut world);
//! assert!(matches!(grabbed, Some(GrabEvent::Grabbed { .. })));
//!
//! // Pull harder than the grip holds
//! world.apply_force(crate_body, Vector3::new(0.0, -5000.0, 0.0));
//! world.step(1.0 / 90.0);
//!
//! let broken = controller.update(&HandFrame::new(hand_pose, 1.0), &mut points, &mut world);
//! assert_eq!(broken, Some(GrabEvent::Broken { body: crate_body }));
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(clippy::missing_const_for_fn, clippy::missing_errors_doc)]

mod align;
mod attach_point;
mod candidates;
mod controller;
mod physics;
mod select;
mod world;

pub use align::{align_body_to_hand, aligned_body_pose, AttachOffset};
pub use attach_point::{AttachPoint, AttachPointId, AttachPoints, Highlight, DEFAULT_PRIORITY};
pub use candidates::{CandidateSet, GrabTarget};
pub use controller::{GrabController, GrabEvent, GrabState, HandFrame, Hold};
pub use physics::PhysicsBackend;
pub use select::{select_best, Candidate};
pub use world::{KinematicWorld, WorldBody};

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use grab_types::{BodyId, Pose, RigidBodyState};
    use nalgebra::Point3;

    #[test]
    fn test_backend_is_object_safe() {
        let mut world = KinematicWorld::new();
        let body = world.add_body(RigidBodyState::default(), 1.0);
        let backend: &dyn PhysicsBackend = &world;

        assert!(backend.contains_body(body));
        assert!(!backend.contains_body(BodyId::new(99)));
    }

    #[test]
    fn test_controller_over_dyn_backend() {
        let mut world = KinematicWorld::new();
        let hand_pose = Pose::from_position(Point3::new(0.0, 1.0, 0.0));
        let hand = world.add_kinematic_body(hand_pose);
        let body = world.add_body(RigidBodyState::at_rest(hand_pose), 1.0);

        let mut points = AttachPoints::new();
        let mut controller = GrabController::new(hand, grab_types::GrabConfig::default(), 0.0);
        let backend: &mut dyn PhysicsBackend = &mut world;

        controller.on_overlap_enter(GrabTarget::Body(body), &points, &*backend);
        controller.update(&HandFrame::new(hand_pose, 0.0), &mut points, backend);
        let event = controller.update(&HandFrame::new(hand_pose, 1.0), &mut points, backend);

        assert!(matches!(event, Some(GrabEvent::Grabbed { point: None, .. })));
    }
}
