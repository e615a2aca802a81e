//! Flow choreographer
//!
//! Runs the endless animation cycle of the river:
//!
//! ```text
//!          ┌──────────────────────── recycle barrier ───────────────────────┐
//!          ▼                                                                 │
//!   CameraAndFlow ── camera path + every flow/fade chain arrived ──► Recycle ┘
//!          │
//!          └── shutdown ──► Stopped
//! ```
//!
//! Each phase owns one [`JoinBarrier`]. The barrier is armed with every
//! participant before it is sealed, and its release callback starts the next
//! phase. Tweens are scheduled through one [`TweenGroup`], so shutdown
//! cancels exactly the choreographer's own animations.

use crate::camera::{play_path, CameraPath, CameraPose, CameraRig};
use crate::config::RiverConfig;
use crate::error::{Result, SceneError};
use crate::geometry::SegmentGeometry;
use crate::segment::SegmentRing;
use river_animation::{Easing, JoinBarrier, RegistryHandle, TweenGroup};
use river_core::Vec3;
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::sync::Arc;

/// Phase of the choreography cycle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CyclePhase {
    /// Constructed, not started yet
    Idle,
    /// Camera path and segment flow running in parallel
    CameraAndFlow,
    /// Faded segments returning to their vacant slots
    Recycle,
    /// Torn down; no further transitions
    Stopped,
}

/// Flow timing shared by every cycle
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlowSettings {
    pub duration_ms: u32,
    pub repeat_count: u32,
}

/// Zoom convergence applied outside of path legs
#[derive(Clone, Copy, Debug, PartialEq)]
struct ZoomSettings {
    duration_ms: u32,
    easing: Easing,
}

struct ChoreoState {
    phase: CyclePhase,
    cycle: u64,
    ring: SegmentRing,
    rig: Rc<RefCell<CameraRig>>,
    path: Rc<CameraPath>,
    group: TweenGroup,
    flow: FlowSettings,
}

/// What a phase transition needs, cloned out of the state borrow
struct PhaseContext {
    cycle: u64,
    ring: SegmentRing,
    rig: Rc<RefCell<CameraRig>>,
    path: Rc<CameraPath>,
    group: TweenGroup,
    flow: FlowSettings,
}

/// Orchestrates the camera path and the segment ring
pub struct FlowChoreographer {
    state: Rc<RefCell<ChoreoState>>,
    zoom: ZoomSettings,
}

impl FlowChoreographer {
    /// Build the ring and camera from configuration
    pub fn new(
        handle: RegistryHandle,
        geometry: Arc<SegmentGeometry>,
        config: &RiverConfig,
    ) -> Result<Self> {
        let group = TweenGroup::new(handle.clone());
        let ring = SegmentRing::new(geometry, config.ring.lo, config.ring.hi, group.clone())?;
        let camera = &config.camera;
        let rig = CameraRig::new(
            handle,
            camera.home(),
            camera.min_distance,
            camera.max_distance,
        );
        let path = camera.path()?;

        Ok(Self {
            state: Rc::new(RefCell::new(ChoreoState {
                phase: CyclePhase::Idle,
                cycle: 0,
                ring,
                rig: Rc::new(RefCell::new(rig)),
                path: Rc::new(path),
                group,
                flow: FlowSettings {
                    duration_ms: config.ring.flow_duration_ms,
                    repeat_count: config.ring.repeat_count,
                },
            })),
            zoom: ZoomSettings {
                duration_ms: camera.zoom_duration_ms,
                easing: camera.zoom_easing,
            },
        })
    }

    /// Enter the first `CameraAndFlow` phase
    pub fn start(&self) -> Result<()> {
        let phase = self.phase();
        if phase != CyclePhase::Idle {
            return Err(SceneError::InvalidState(format!(
                "cannot start choreography in phase {:?}",
                phase
            )));
        }
        begin_cycle(&self.state)?;
        Ok(())
    }

    /// Cancel every tween the choreographer owns and stop cycling
    ///
    /// Returns the number of cancelled tweens. Safe to call repeatedly.
    pub fn shutdown(&self) -> usize {
        let (group, rig) = {
            let mut state = self.state.borrow_mut();
            if state.phase == CyclePhase::Stopped {
                return 0;
            }
            state.phase = CyclePhase::Stopped;
            (state.group.clone(), Rc::clone(&state.rig))
        };
        let cancelled = group.cancel_all();
        rig.borrow_mut().halt();
        tracing::info!("Choreography stopped, cancelled {} tweens", cancelled);
        cancelled
    }

    pub fn phase(&self) -> CyclePhase {
        self.state.borrow().phase
    }

    /// Number of `CameraAndFlow` phases entered so far
    pub fn cycle(&self) -> u64 {
        self.state.borrow().cycle
    }

    pub fn is_running(&self) -> bool {
        matches!(
            self.phase(),
            CyclePhase::CameraAndFlow | CyclePhase::Recycle
        )
    }

    pub fn ring(&self) -> SegmentRing {
        self.state.borrow().ring.clone()
    }

    pub fn camera_pose(&self) -> CameraPose {
        self.state.borrow().rig.borrow().pose()
    }

    pub fn camera_path(&self) -> Rc<CameraPath> {
        Rc::clone(&self.state.borrow().path)
    }

    /// Tweens currently owned by the choreographer
    pub fn live_tweens(&self) -> usize {
        self.state.borrow().group.live_count()
    }

    /// Forward a user-chosen camera direction
    pub fn apply_input(&self, direction: Vec3) -> bool {
        let rig = Rc::clone(&self.state.borrow().rig);
        let applied = rig.borrow_mut().apply_input(direction);
        applied
    }

    /// Forward a user-chosen camera distance
    pub fn apply_zoom(&self, distance: f32) -> bool {
        let rig = Rc::clone(&self.state.borrow().rig);
        let applied = rig
            .borrow_mut()
            .apply_zoom(distance, self.zoom.duration_ms, self.zoom.easing);
        applied
    }
}

impl Drop for FlowChoreographer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Move into `phase` and clone out what the phase needs
///
/// Returns `None` once stopped.
fn enter(state: &Rc<RefCell<ChoreoState>>, phase: CyclePhase) -> Option<PhaseContext> {
    let mut state = state.borrow_mut();
    if state.phase == CyclePhase::Stopped {
        return None;
    }
    state.phase = phase;
    if phase == CyclePhase::CameraAndFlow {
        state.cycle += 1;
    }
    Some(PhaseContext {
        cycle: state.cycle,
        ring: state.ring.clone(),
        rig: Rc::clone(&state.rig),
        path: Rc::clone(&state.path),
        group: state.group.clone(),
        flow: state.flow,
    })
}

fn begin_cycle(state: &Rc<RefCell<ChoreoState>>) -> river_animation::Result<()> {
    let Some(ctx) = enter(state, CyclePhase::CameraAndFlow) else {
        return Ok(());
    };
    tracing::info!(
        "Cycle {} started: {} segments flowing, camera path of {}ms",
        ctx.cycle,
        ctx.ring.len(),
        ctx.path.duration_ms()
    );

    let weak = Rc::downgrade(state);
    let barrier = JoinBarrier::new(format!("camera-and-flow#{}", ctx.cycle), move || {
        with_state(&weak, begin_recycle)
    });

    play_path(&ctx.path, &ctx.rig, &ctx.group, &barrier)?;
    ctx.ring
        .flow(ctx.flow.duration_ms, ctx.flow.repeat_count, &barrier)?;
    barrier.seal()
}

fn begin_recycle(state: &Rc<RefCell<ChoreoState>>) -> river_animation::Result<()> {
    let Some(ctx) = enter(state, CyclePhase::Recycle) else {
        return Ok(());
    };

    ctx.ring.advance();

    let weak = Rc::downgrade(state);
    let barrier = JoinBarrier::new(format!("recycle#{}", ctx.cycle), move || {
        with_state(&weak, begin_cycle)
    });
    let recycled = ctx.ring.recycle(ctx.flow.duration_ms, &barrier)?;
    tracing::debug!("Cycle {}: recycling {} segments", ctx.cycle, recycled);
    barrier.seal()
}

fn with_state(
    weak: &Weak<RefCell<ChoreoState>>,
    transition: fn(&Rc<RefCell<ChoreoState>>) -> river_animation::Result<()>,
) -> river_animation::Result<()> {
    match weak.upgrade() {
        Some(state) => transition(&state),
        None => Ok(()),
    }
}
