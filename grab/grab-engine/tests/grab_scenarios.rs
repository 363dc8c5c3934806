//! End-to-end grab scenarios.
//!
//! Each test drives a [`GrabController`] against a [`KinematicWorld`] the way
//! a host would: overlap events, one `update` per frame, and `step` to let
//! physics run.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]

use approx::assert_relative_eq;
use grab_engine::{
    AttachPoint, AttachPointId, AttachPoints, GrabController, GrabEvent, GrabState, GrabTarget,
    HandFrame, KinematicWorld, PhysicsBackend,
};
use grab_types::{BodyId, GrabConfig, Pose, RigidBodyState, SharedFloorHeight};
use nalgebra::{Point3, UnitQuaternion, Vector3};

const DT: f64 = 1.0 / 90.0;

struct Scene {
    world: KinematicWorld,
    points: AttachPoints,
    floor: SharedFloorHeight,
    hand: BodyId,
    hand_pose: Pose,
}

impl Scene {
    fn new() -> Self {
        let mut world = KinematicWorld::new().with_gravity(Vector3::new(0.0, -9.81, 0.0));
        let hand_pose = Pose::from_position(Point3::new(0.0, 1.0, 0.0));
        let hand = world.add_kinematic_body(hand_pose);
        Self {
            world,
            points: AttachPoints::new(),
            floor: SharedFloorHeight::new(0.0),
            hand,
            hand_pose,
        }
    }

    fn controller(&self) -> GrabController<SharedFloorHeight> {
        GrabController::new(self.hand, GrabConfig::default(), self.floor.clone())
    }

    fn body(&mut self, position: Point3<f64>) -> BodyId {
        self.world
            .add_body(RigidBodyState::at_rest(Pose::from_position(position)), 1.0)
    }

    /// A point on a fresh body, `distance` metres from the hand along +X.
    fn point_at(&mut self, priority: i32, distance: f64) -> (BodyId, AttachPointId) {
        let position = self.hand_pose.position + Vector3::new(distance, 0.0, 0.0);
        let body = self.body(position);
        let id = self
            .points
            .insert(AttachPoint::new(Some(body), Pose::identity()).with_priority(priority));
        (body, id)
    }

    fn enter(&self, controller: &mut GrabController<SharedFloorHeight>, target: GrabTarget) -> bool {
        controller.on_overlap_enter(target, &self.points, &self.world)
    }

    fn frame(
        &mut self,
        controller: &mut GrabController<SharedFloorHeight>,
        intensity: f64,
    ) -> Option<GrabEvent> {
        self.world
            .set_body_pose(self.hand, self.hand_pose)
            .expect("hand body");
        let event = controller.update(
            &HandFrame::new(self.hand_pose, intensity),
            &mut self.points,
            &mut self.world,
        );
        self.world.step(DT);
        event
    }

    fn highlighted(&self, id: AttachPointId) -> bool {
        self.points.get(id).is_some_and(AttachPoint::is_highlighted)
    }
}

/// Test: equal priorities resolve to the nearer point.
#[test]
fn equal_priority_prefers_nearer_point() {
    let mut scene = Scene::new();
    let mut controller = scene.controller();
    let (_, far) = scene.point_at(5, 3.0);
    let (near_body, near) = scene.point_at(5, 1.0);

    scene.enter(&mut controller, GrabTarget::Point(far));
    scene.enter(&mut controller, GrabTarget::Point(near));
    scene.frame(&mut controller, 0.0);

    assert!(scene.highlighted(near));
    assert!(!scene.highlighted(far));

    let event = scene.frame(&mut controller, 1.0).expect("grab");
    assert!(matches!(event, GrabEvent::Grabbed { body, .. } if body == near_body));
}

/// Test: priority wins over distance.
#[test]
fn priority_beats_proximity() {
    let mut scene = Scene::new();
    let mut controller = scene.controller();
    let (heavy_body, heavy) = scene.point_at(10, 100.0);
    let (_, light) = scene.point_at(1, 0.1);

    scene.enter(&mut controller, GrabTarget::Point(light));
    scene.enter(&mut controller, GrabTarget::Point(heavy));
    scene.frame(&mut controller, 0.0);

    assert_eq!(controller.highlighted(), Some(heavy));
    let event = scene.frame(&mut controller, 1.0).expect("grab");
    assert!(matches!(event, GrabEvent::Grabbed { body, point: Some(p), .. } if body == heavy_body && p == heavy));
}

/// Test: crossing the threshold grabs, creates a joint and clears candidates.
#[test]
fn rising_intensity_grabs() {
    let mut scene = Scene::new();
    let mut controller = scene.controller();
    let (body, point) = scene.point_at(10, 0.05);
    scene.enter(&mut controller, GrabTarget::Point(point));

    assert_eq!(scene.frame(&mut controller, 0.2), None);
    assert_eq!(controller.state(), GrabState::Idle);

    let event = scene.frame(&mut controller, 0.7).expect("grab");
    let hold = controller.hold().expect("hold");

    assert_eq!(controller.state(), GrabState::Holding);
    assert_eq!(hold.body(), body);
    assert!(scene.world.joint_exists(hold.joint()));
    assert!(controller.candidates().is_empty());
    assert!(!scene.highlighted(point));
    assert!(matches!(event, GrabEvent::Grabbed { .. }));
}

/// Test: a held body follows the hand and drops once released.
#[test]
fn held_body_follows_hand_until_release() {
    let mut scene = Scene::new();
    let mut controller = scene.controller();
    let (body, point) = scene.point_at(10, 0.05);
    scene.enter(&mut controller, GrabTarget::Point(point));
    scene.frame(&mut controller, 0.0);
    scene.frame(&mut controller, 1.0);

    scene.hand_pose = Pose::from_position_rotation(
        Point3::new(0.4, 1.3, -0.2),
        UnitQuaternion::from_euler_angles(0.0, 0.5, 0.0),
    );
    for _ in 0..10 {
        scene.frame(&mut controller, 1.0);
    }

    let held = scene.world.body_pose(body).expect("body");
    assert_relative_eq!(held.position, scene.hand_pose.position, epsilon = 1e-9);

    let event = scene.frame(&mut controller, 0.0);
    assert_eq!(event, Some(GrabEvent::Released { body }));
    assert_eq!(scene.world.joint_count(), 0);

    let before = scene.world.body_pose(body).expect("body").position.y;
    for _ in 0..10 {
        scene.frame(&mut controller, 0.0);
    }
    let after = scene.world.body_pose(body).expect("body").position.y;
    assert!(after < before, "released body should fall, {before} -> {after}");
}

/// Test: overload breaks the joint, the hand goes idle and the best remaining
/// candidate is highlighted again.
#[test]
fn overload_breaks_grip() {
    let mut scene = Scene::new();
    let mut controller = scene.controller();
    let (body, point) = scene.point_at(10, 0.05);
    let (_, other) = scene.point_at(3, 0.2);
    let plain = scene.body(Point3::new(0.0, 1.1, 0.0));

    scene.enter(&mut controller, GrabTarget::Point(point));
    scene.enter(&mut controller, GrabTarget::Point(other));
    scene.frame(&mut controller, 0.0);
    scene.frame(&mut controller, 1.0);
    assert_eq!(controller.state(), GrabState::Holding);

    // Overlaps keep arriving while holding
    scene.enter(&mut controller, GrabTarget::Point(other));
    scene.enter(&mut controller, GrabTarget::Body(plain));
    scene.frame(&mut controller, 1.0);
    assert!(!scene.highlighted(other));

    scene.world.apply_force(body, Vector3::new(0.0, 0.0, 2500.0));
    scene.world.step(DT);

    let event = scene.frame(&mut controller, 1.0);
    assert_eq!(event, Some(GrabEvent::Broken { body }));
    assert_eq!(controller.state(), GrabState::Idle);
    assert_eq!(controller.candidates().fallback(), None);
    assert!(scene.highlighted(other));
}

/// Test: a force below the break threshold keeps the grip.
#[test]
fn moderate_force_keeps_grip() {
    let mut scene = Scene::new();
    let mut controller = scene.controller();
    let (body, point) = scene.point_at(10, 0.05);
    scene.enter(&mut controller, GrabTarget::Point(point));
    scene.frame(&mut controller, 0.0);
    scene.frame(&mut controller, 1.0);

    scene.world.apply_force(body, Vector3::new(0.0, 0.0, 1500.0));
    assert_eq!(scene.frame(&mut controller, 1.0), None);
    assert_eq!(scene.frame(&mut controller, 1.0), None);
    assert_eq!(controller.state(), GrabState::Holding);
}

/// Test: a point below the floor margin is never a candidate.
#[test]
fn below_floor_never_added() {
    let mut scene = Scene::new();
    let mut controller = scene.controller();
    let body = scene.body(Point3::new(0.0, 0.019, 0.0));
    let point = scene.points.insert(AttachPoint::new(Some(body), Pose::identity()));

    assert!(!scene.enter(&mut controller, GrabTarget::Point(point)));
    assert!(!scene.enter(&mut controller, GrabTarget::Body(body)));
    assert!(controller.candidates().is_empty());
    assert_eq!(controller.candidates().fallback(), None);
}

/// Test: raising the floor prunes candidates and hides their highlight.
#[test]
fn recalibrated_floor_prunes() {
    let mut scene = Scene::new();
    let mut controller = scene.controller();
    let (_, point) = scene.point_at(10, 0.05);
    scene.enter(&mut controller, GrabTarget::Point(point));
    scene.frame(&mut controller, 0.0);
    assert!(scene.highlighted(point));

    scene.floor.set(1.5);
    scene.frame(&mut controller, 0.0);

    assert!(!controller.candidates().contains(point));
    assert!(!scene.highlighted(point));
    assert_eq!(scene.frame(&mut controller, 1.0), None);
}

/// Test: a body destroyed after its point was selected yields no grab.
#[test]
fn destroyed_body_between_frames() {
    let mut scene = Scene::new();
    let mut controller = scene.controller();
    let (body, point) = scene.point_at(10, 0.05);
    scene.enter(&mut controller, GrabTarget::Point(point));
    scene.frame(&mut controller, 0.0);
    assert_eq!(controller.highlighted(), Some(point));

    scene.world.remove_body(body);

    assert_eq!(scene.frame(&mut controller, 1.0), None);
    assert_eq!(controller.state(), GrabState::Idle);
    assert!(controller.candidates().is_empty());
}

/// Test: removing the point from the scene drops it from the hand.
#[test]
fn removed_point_is_pruned() {
    let mut scene = Scene::new();
    let mut controller = scene.controller();
    let (body, point) = scene.point_at(10, 0.05);
    scene.enter(&mut controller, GrabTarget::Point(point));

    assert_eq!(scene.points.remove_owned_by(body), 1);
    scene.frame(&mut controller, 0.0);

    assert!(controller.candidates().is_empty());
    assert_eq!(controller.highlighted(), None);
}

/// Test: the grab input disappearing is survivable.
#[test]
fn missing_input_is_not_fatal() {
    let mut scene = Scene::new();
    let mut controller = scene.controller();
    let (_, point) = scene.point_at(10, 0.05);
    scene.enter(&mut controller, GrabTarget::Point(point));

    for _ in 0..3 {
        let event = controller.update(
            &HandFrame::without_input(scene.hand_pose),
            &mut scene.points,
            &mut scene.world,
        );
        assert_eq!(event, None);
    }
    assert!(controller.is_input_missing());
    assert!(scene.highlighted(point));

    scene.frame(&mut controller, 0.0);
    assert!(matches!(scene.frame(&mut controller, 1.0), Some(GrabEvent::Grabbed { .. })));
}

/// Test: a point held by one hand is neither highlighted nor grabbed by
/// another hand that still overlaps it.
#[test]
fn held_point_is_off_limits_to_other_hand() {
    let mut scene = Scene::new();
    let other_hand = scene.world.add_kinematic_body(scene.hand_pose);
    let mut left = scene.controller();
    let mut right = GrabController::new(other_hand, GrabConfig::default(), scene.floor.clone());
    let (body, point) = scene.point_at(10, 0.05);

    assert!(scene.enter(&mut left, GrabTarget::Point(point)));
    assert!(scene.enter(&mut right, GrabTarget::Point(point)));
    scene.frame(&mut left, 0.0);
    assert!(scene.frame(&mut left, 1.0).is_some());

    assert_eq!(scene.frame(&mut right, 0.0), None);
    assert!(!scene.highlighted(point));
    assert_eq!(right.highlighted(), None);

    assert_eq!(scene.frame(&mut right, 1.0), None);
    assert_eq!(right.state(), GrabState::Idle);
    assert_eq!(scene.world.joints_on(body).len(), 1);
    assert!(right.candidates().is_empty());
}

/// Test: a plain body held by one hand cannot be taken as the other hand's
/// fallback.
#[test]
fn held_fallback_is_off_limits_to_other_hand() {
    let mut scene = Scene::new();
    let other_hand = scene.world.add_kinematic_body(scene.hand_pose);
    let mut left = scene.controller();
    let mut right = GrabController::new(other_hand, GrabConfig::default(), scene.floor.clone());
    let crate_body = scene.body(Point3::new(0.0, 1.1, 0.0));

    assert!(scene.enter(&mut left, GrabTarget::Body(crate_body)));
    assert!(scene.enter(&mut right, GrabTarget::Body(crate_body)));
    scene.frame(&mut left, 0.0);
    scene.frame(&mut right, 0.0);
    assert!(scene.frame(&mut left, 1.0).is_some());

    assert_eq!(scene.frame(&mut right, 1.0), None);
    assert_eq!(right.candidates().fallback(), None);
    assert_eq!(scene.world.joints_on(crate_body).len(), 1);

    // Once released, the body can be picked up again on a fresh overlap
    assert!(matches!(scene.frame(&mut left, 0.0), Some(GrabEvent::Released { .. })));
    assert!(scene.enter(&mut right, GrabTarget::Body(crate_body)));
    scene.frame(&mut right, 0.0);
    assert!(matches!(
        scene.frame(&mut right, 1.0),
        Some(GrabEvent::Grabbed { body, .. }) if body == crate_body
    ));
}
