//! Camera rig and scripted camera path
//!
//! The camera looks at the origin from `direction * distance`. Distance is a
//! [`BoundedConvergence`], so neither the path nor zoom input can push it out
//! of range.
//!
//! A [`CameraPath`] is a list of waypoints played once per cycle. Each leg is
//! driven by a 0→1 progress tween: when the leg activates (after its delay)
//! the rig captures its live pose, and every tick writes the interpolation
//! between that pose and the waypoint. Input received in the middle of a leg
//! rebases the rest of the leg on the perturbed pose, so the leg still ends
//! exactly on its waypoint. The last waypoint is always the home pose.

use river_animation::{
    BoundedConvergence, Easing, Interpolate, JoinBarrier, RegistryHandle, Tween, TweenGroup,
};
use river_core::Vec3;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Camera direction and distance, interpolated as one 4-tuple
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CameraPose {
    pub direction: Vec3,
    pub distance: f32,
}

impl CameraPose {
    pub fn new(direction: Vec3, distance: f32) -> Self {
        Self {
            direction,
            distance,
        }
    }

    /// World position of the camera
    pub fn position(&self) -> Vec3 {
        self.direction.normalize() * self.distance
    }
}

impl Interpolate for CameraPose {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        Self {
            direction: self.direction.lerp(&other.direction, t),
            distance: Interpolate::lerp(&self.distance, &other.distance, t),
        }
    }

    fn approx_eq(&self, other: &Self, epsilon: f32) -> bool {
        self.direction.approx_eq(other.direction, epsilon)
            && (self.distance - other.distance).abs() < epsilon
    }
}

/// One stop of the camera path
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    /// Target viewing direction, normalized on construction
    pub direction: Vec3,
    pub distance: f32,
    /// Length of the transition into this waypoint
    pub duration_ms: u32,
    /// Pause before the transition starts
    #[serde(default)]
    pub delay_ms: u32,
}

impl Waypoint {
    pub fn new(direction: Vec3, distance: f32, duration_ms: u32, delay_ms: u32) -> Self {
        Self {
            direction: direction.normalize(),
            distance,
            duration_ms,
            delay_ms,
        }
    }

    pub fn pose(&self) -> CameraPose {
        CameraPose::new(self.direction, self.distance)
    }

    fn is_valid(&self) -> bool {
        self.direction.is_finite() && self.direction.length() > 0.0 && self.distance.is_finite()
    }
}

/// Authored tour followed by a leg back to the home pose
#[derive(Clone, Debug)]
pub struct CameraPath {
    waypoints: Vec<Waypoint>,
    easing: Easing,
}

impl CameraPath {
    /// Build a path that plays `tour` and then returns along `home`
    ///
    /// Returns `None` if a waypoint has a zero or non-finite direction.
    pub fn new(tour: Vec<Waypoint>, home: Waypoint, easing: Easing) -> Option<Self> {
        let mut waypoints: Vec<Waypoint> = tour
            .into_iter()
            .map(|w| Waypoint::new(w.direction, w.distance, w.duration_ms, w.delay_ms))
            .collect();
        waypoints.push(Waypoint::new(
            home.direction,
            home.distance,
            home.duration_ms,
            home.delay_ms,
        ));

        if waypoints.iter().all(Waypoint::is_valid) {
            Some(Self { waypoints, easing })
        } else {
            None
        }
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    /// Pose the path ends on
    pub fn home(&self) -> Option<CameraPose> {
        self.waypoints.last().map(Waypoint::pose)
    }

    pub fn easing(&self) -> Easing {
        self.easing
    }

    /// Total length including delays
    pub fn duration_ms(&self) -> u64 {
        self.waypoints
            .iter()
            .map(|w| w.delay_ms as u64 + w.duration_ms as u64)
            .sum()
    }
}

struct Leg {
    target: CameraPose,
    /// Pose the remainder of the leg starts from; `None` until activation
    origin: Option<CameraPose>,
    /// Eased progress at which `origin` was captured
    origin_progress: f32,
    progress: f32,
}

/// Live camera state
pub struct CameraRig {
    direction: Vec3,
    distance: BoundedConvergence,
    leg: Option<Leg>,
    perturbations: u64,
}

impl CameraRig {
    /// Create a rig at `pose`, distance bounded to `[min_distance, max_distance]`
    pub fn new(
        handle: RegistryHandle,
        pose: CameraPose,
        min_distance: f32,
        max_distance: f32,
    ) -> Self {
        Self {
            direction: pose.direction.normalize(),
            distance: BoundedConvergence::new(handle, pose.distance, min_distance, max_distance),
            leg: None,
            perturbations: 0,
        }
    }

    pub fn pose(&self) -> CameraPose {
        CameraPose::new(self.direction, self.distance.value())
    }

    pub fn distance(&self) -> &BoundedConvergence {
        &self.distance
    }

    /// Check if a path leg is interpolating right now
    pub fn is_leg_active(&self) -> bool {
        self.leg.as_ref().is_some_and(|leg| leg.origin.is_some())
    }

    /// Number of inputs applied so far
    pub fn perturbations(&self) -> u64 {
        self.perturbations
    }

    /// Apply a user-chosen viewing direction
    ///
    /// Returns false and leaves the camera unchanged for a zero or
    /// non-finite direction.
    pub fn apply_input(&mut self, direction: Vec3) -> bool {
        if !direction.is_finite() || direction.length() == 0.0 {
            tracing::warn!("CameraRig: ignoring invalid direction {:?}", direction);
            return false;
        }
        self.direction = direction.normalize();
        self.perturbed();
        true
    }

    /// Apply a user-chosen distance
    ///
    /// Converges smoothly when no leg is running; during a leg it jumps and
    /// the leg carries on from there.
    pub fn apply_zoom(&mut self, distance: f32, duration_ms: u32, easing: Easing) -> bool {
        if !distance.is_finite() {
            tracing::warn!("CameraRig: ignoring invalid distance {}", distance);
            return false;
        }
        if self.is_leg_active() {
            self.distance.set(distance);
            self.perturbed();
        } else {
            self.distance.animate_to(distance, duration_ms, easing);
            self.perturbations += 1;
        }
        true
    }

    /// Stop any leg or zoom in progress, keeping the current pose
    pub fn halt(&mut self) {
        self.leg = None;
        let distance = self.distance.value();
        self.distance.set(distance);
    }

    fn begin_leg(&mut self, target: CameraPose) {
        self.leg = Some(Leg {
            target,
            origin: None,
            origin_progress: 0.0,
            progress: 0.0,
        });
    }

    fn drive_leg(&mut self, eased: f32) {
        let live = self.pose();
        let Some(leg) = self.leg.as_mut() else {
            return;
        };
        let origin = *leg.origin.get_or_insert(live);
        leg.progress = eased;

        let remaining = 1.0 - leg.origin_progress;
        let local = if remaining <= f32::EPSILON {
            1.0
        } else {
            ((eased - leg.origin_progress) / remaining).clamp(0.0, 1.0)
        };
        let pose = origin.lerp(&leg.target, local);
        self.write(pose);
    }

    fn end_leg(&mut self) {
        if let Some(leg) = self.leg.take() {
            self.write(leg.target);
        }
    }

    fn perturbed(&mut self) {
        self.perturbations += 1;
        let live = self.pose();
        if let Some(leg) = self.leg.as_mut() {
            if leg.origin.is_some() {
                leg.origin = Some(live);
                leg.origin_progress = leg.progress;
            }
        }
    }

    fn write(&mut self, pose: CameraPose) {
        self.direction = pose.direction;
        self.distance.set(pose.distance);
    }
}

/// Play `path` on `rig`, arriving once on `barrier` after the last leg
pub fn play_path(
    path: &Rc<CameraPath>,
    rig: &Rc<RefCell<CameraRig>>,
    group: &TweenGroup,
    barrier: &JoinBarrier,
) -> river_animation::Result<()> {
    barrier.expect(1)?;
    start_leg(
        Rc::clone(path),
        Rc::downgrade(rig),
        group.clone(),
        barrier.clone(),
        0,
    )
}

fn start_leg(
    path: Rc<CameraPath>,
    rig: Weak<RefCell<CameraRig>>,
    group: TweenGroup,
    barrier: JoinBarrier,
    index: usize,
) -> river_animation::Result<()> {
    let Some(waypoint) = path.waypoints.get(index).copied() else {
        return barrier.arrive().map(|_| ());
    };

    if let Some(live) = rig.upgrade() {
        live.borrow_mut().begin_leg(waypoint.pose());
    }
    tracing::debug!(
        "Camera leg {} towards {:?} at {} (delay {}ms)",
        index,
        waypoint.direction,
        waypoint.distance,
        waypoint.delay_ms
    );

    let driven = rig.clone();
    let next_group = group.clone();
    let tween = Tween::new(0.0f32, 1.0, waypoint.duration_ms)
        .label(format!("camera-leg[{index}]"))
        .delay(waypoint.delay_ms)
        .easing(path.easing)
        .on_update(move |eased: &f32| {
            if let Some(live) = driven.upgrade() {
                live.borrow_mut().drive_leg(*eased);
            }
        })
        .try_on_complete(move || {
            if let Some(live) = rig.upgrade() {
                live.borrow_mut().end_leg();
            }
            start_leg(path, rig, next_group, barrier, index + 1)
        });

    group.try_schedule(tween).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use river_animation::AnimationRegistry;
    use std::cell::Cell;

    const HOME: CameraPose = CameraPose {
        direction: Vec3::BACK,
        distance: 30.0,
    };

    fn path() -> Rc<CameraPath> {
        let tour = vec![Waypoint::new(Vec3::new(1.0, 0.0, 0.0), 50.0, 1000, 500)];
        let home = Waypoint::new(HOME.direction, HOME.distance, 1000, 200);
        Rc::new(CameraPath::new(tour, home, Easing::Linear).unwrap())
    }

    struct Fixture {
        registry: AnimationRegistry,
        rig: Rc<RefCell<CameraRig>>,
        group: TweenGroup,
        done: Rc<Cell<bool>>,
    }

    fn play() -> Fixture {
        let registry = AnimationRegistry::new();
        let rig = Rc::new(RefCell::new(CameraRig::new(registry.handle(), HOME, 1.0, 100.0)));
        let group = TweenGroup::new(registry.handle());
        let done = Rc::new(Cell::new(false));
        let flag = Rc::clone(&done);
        let barrier = JoinBarrier::new("camera", move || {
            flag.set(true);
            Ok(())
        });

        registry.tick(0.0);
        play_path(&path(), &rig, &group, &barrier).unwrap();
        barrier.seal().unwrap();

        Fixture {
            registry,
            rig,
            group,
            done,
        }
    }

    fn pose(fixture: &Fixture) -> CameraPose {
        fixture.rig.borrow().pose()
    }

    #[test]
    fn test_pose_lerp() {
        let a = CameraPose::new(Vec3::new(0.0, 0.0, 1.0), 10.0);
        let b = CameraPose::new(Vec3::new(1.0, 0.0, 0.0), 20.0);
        let mid = a.lerp(&b, 0.5);
        assert_eq!(mid, CameraPose::new(Vec3::new(0.5, 0.0, 0.5), 15.0));
        assert_eq!(a.lerp(&b, 1.0), b);
    }

    #[test]
    fn test_path_always_ends_home() {
        let path = path();
        assert_eq!(path.waypoints().len(), 2);
        assert_eq!(path.home(), Some(HOME));
        assert_eq!(path.duration_ms(), 2700);
    }

    #[test]
    fn test_invalid_waypoint_rejected() {
        let tour = vec![Waypoint::new(Vec3::ZERO, 50.0, 1000, 0)];
        let home = Waypoint::new(Vec3::BACK, 30.0, 1000, 0);
        assert!(CameraPath::new(tour, home, Easing::Linear).is_none());
    }

    #[test]
    fn test_delay_holds_pose() {
        let fixture = play();
        fixture.registry.tick(400.0);
        assert_eq!(pose(&fixture), HOME);
        assert!(!fixture.rig.borrow().is_leg_active());
    }

    #[test]
    fn test_leg_interpolates_from_live_pose() {
        let fixture = play();
        fixture.registry.tick(500.0);
        fixture.registry.tick(1000.0);
        assert_eq!(
            pose(&fixture),
            CameraPose::new(Vec3::new(0.5, 0.0, 0.5), 40.0)
        );

        fixture.registry.tick(1500.0);
        assert_eq!(pose(&fixture), CameraPose::new(Vec3::new(1.0, 0.0, 0.0), 50.0));
    }

    #[test]
    fn test_path_completes_on_home_pose() {
        let fixture = play();
        for step in 1..=30 {
            fixture.registry.tick(step as f64 * 100.0);
        }
        assert!(fixture.done.get());
        assert_eq!(pose(&fixture), HOME);
        assert_eq!(fixture.group.live_count(), 0);
    }

    #[test]
    fn test_input_mid_leg_rebases_remainder() {
        let fixture = play();
        fixture.registry.tick(500.0);
        fixture.registry.tick(1000.0);

        assert!(fixture.rig.borrow_mut().apply_input(Vec3::UP));
        assert_eq!(pose(&fixture).direction, Vec3::UP);

        // Half of the remaining progress
        fixture.registry.tick(1250.0);
        let rebased = pose(&fixture);
        assert!(rebased
            .direction
            .approx_eq(Vec3::new(0.5, 0.5, 0.0), 1e-5));
        assert!((rebased.distance - 45.0).abs() < 1e-4);

        fixture.registry.tick(1500.0);
        assert_eq!(pose(&fixture), CameraPose::new(Vec3::new(1.0, 0.0, 0.0), 50.0));
    }

    #[test]
    fn test_perturbed_path_still_returns_home() {
        let fixture = play();
        for step in 1..=30 {
            let now = step as f64 * 100.0;
            fixture.registry.tick(now);
            if step == 8 {
                fixture
                    .rig
                    .borrow_mut()
                    .apply_input(Vec3::new(0.3, -0.8, 0.2));
            }
            if step == 22 {
                fixture
                    .rig
                    .borrow_mut()
                    .apply_zoom(90.0, 1000, Easing::EaseOut);
            }
        }
        assert!(fixture.done.get());
        assert_eq!(pose(&fixture), HOME);
        assert_eq!(fixture.rig.borrow().perturbations(), 2);
    }

    #[test]
    fn test_input_during_pause_is_next_baseline() {
        let fixture = play();
        fixture.registry.tick(1500.0);
        fixture.registry.tick(1600.0);
        assert!(!fixture.rig.borrow().is_leg_active());

        fixture.rig.borrow_mut().apply_input(Vec3::UP);
        fixture.registry.tick(1700.0);
        fixture.registry.tick(2200.0);
        let mid = pose(&fixture);
        assert!(mid.direction.approx_eq(Vec3::new(0.0, 0.5, 0.5), 1e-5));
        assert!((mid.distance - 40.0).abs() < 1e-4);
    }

    #[test]
    fn test_out_of_range_waypoint_is_clamped() {
        let registry = AnimationRegistry::new();
        let rig = Rc::new(RefCell::new(CameraRig::new(registry.handle(), HOME, 1.0, 100.0)));
        let group = TweenGroup::new(registry.handle());
        let done = Rc::new(Cell::new(false));
        let flag = Rc::clone(&done);
        let barrier = JoinBarrier::new("camera", move || {
            flag.set(true);
            Ok(())
        });
        let tour = vec![
            Waypoint::new(Vec3::UP, 400.0, 1000, 0),
            Waypoint::new(Vec3::new(1.0, 0.0, 0.0), 50.0, 1000, 0),
        ];
        let home = Waypoint::new(HOME.direction, HOME.distance, 1000, 0);
        let path = Rc::new(CameraPath::new(tour, home, Easing::Linear).unwrap());

        registry.tick(0.0);
        play_path(&path, &rig, &group, &barrier).unwrap();
        barrier.seal().unwrap();

        for step in 1..=60 {
            let now = step as f64 * 50.0;
            registry.tick(now);
            let pose = rig.borrow().pose();
            assert!(pose.distance <= 100.0, "distance {} at {}ms", pose.distance, now);

            if step == 20 {
                assert_eq!(pose, CameraPose::new(Vec3::UP, 100.0));
            }
            // Halfway through the next leg, measured from 100 rather than 400
            if step == 30 {
                assert!(pose.direction.approx_eq(Vec3::new(0.5, 0.5, 0.0), 1e-5));
                assert!((pose.distance - 75.0).abs() < 1e-4);
            }
        }

        assert!(done.get());
        assert_eq!(rig.borrow().pose(), HOME);
    }

    #[test]
    fn test_zoom_when_idle_converges_and_clamps() {
        let registry = AnimationRegistry::new();
        let mut rig = CameraRig::new(registry.handle(), HOME, 1.0, 100.0);

        registry.tick(0.0);
        assert!(rig.apply_zoom(500.0, 1000, Easing::EaseOut));
        registry.tick(500.0);
        let halfway = rig.pose().distance;
        assert!(halfway > 30.0 && halfway <= 100.0);

        registry.tick(1000.0);
        assert_eq!(rig.pose().distance, 100.0);
    }

    #[test]
    fn test_invalid_input_ignored() {
        let registry = AnimationRegistry::new();
        let mut rig = CameraRig::new(registry.handle(), HOME, 1.0, 100.0);
        assert!(!rig.apply_input(Vec3::ZERO));
        assert!(!rig.apply_zoom(f32::NAN, 1000, Easing::EaseOut));
        assert_eq!(rig.pose(), HOME);
        assert_eq!(rig.perturbations(), 0);
    }
}
