//! River scene
//!
//! Ties the frame clock, the choreographer and a rendering backend together.
//! One call to [`RiverScene::frame`] is one display refresh: tick every
//! tween, then push state to the backend and render only if something
//! visible changed.

use crate::backend::{RenderBackend, SegmentHandle};
use crate::choreographer::{CyclePhase, FlowChoreographer};
use crate::config::RiverConfig;
use crate::dataset::DatasetProvider;
use crate::error::{Result, SceneError};
use crate::geometry::SegmentGeometry;
use river_animation::{ClockSource, FrameClock, MonotonicClock};
use river_core::Vec3;
use std::sync::Arc;

/// A running data river
pub struct RiverScene<B: RenderBackend, C: ClockSource = MonotonicClock> {
    backend: B,
    geometry: Arc<SegmentGeometry>,
    /// Backend handle of each segment, indexed by segment id
    handles: Vec<SegmentHandle>,
    choreographer: FlowChoreographer,
    clock: FrameClock<C>,
    viewport: (f32, f32),
    rendered_frames: u64,
}

impl<B: RenderBackend, C: ClockSource> RiverScene<B, C> {
    /// Load the dataset and build the ring
    ///
    /// Fails with [`SceneError::Init`] if the dataset cannot be loaded; no
    /// segment is created in that case.
    pub fn new(
        dataset: &dyn DatasetProvider,
        mut backend: B,
        source: C,
        config: &RiverConfig,
    ) -> Result<Self> {
        config.validate()?;

        let cloud = dataset.load().map_err(SceneError::Init)?;
        tracing::info!(
            "Dataset loaded: {} points, bounds {:?}",
            cloud.len(),
            cloud.bounds().size()
        );
        let geometry = Arc::new(SegmentGeometry::from_cloud(cloud));

        let clock = FrameClock::new(source);
        let choreographer = FlowChoreographer::new(clock.handle(), Arc::clone(&geometry), config)?;

        let handles = choreographer
            .ring()
            .segments()
            .iter()
            .map(|_| backend.create_segment(&geometry))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            backend,
            geometry,
            handles,
            choreographer,
            clock,
            viewport: (0.0, 0.0),
            rendered_frames: 0,
        })
    }

    /// Start the animation cycle at the clock's current time
    pub fn start(&mut self) -> Result<()> {
        self.clock.tick();
        self.choreographer.start()
    }

    /// Run one frame at the clock source's current time
    ///
    /// Returns true if a frame was rendered.
    pub fn frame(&mut self) -> Result<bool> {
        let now = self.clock.now_ms();
        self.frame_at(now)
    }

    /// Run one frame at an explicit timestamp
    pub fn frame_at(&mut self, now_ms: f64) -> Result<bool> {
        self.clock.tick_at(now_ms);
        if !self.clock.take_needs_redraw() {
            return Ok(false);
        }
        self.sync()?;
        self.backend.render()?;
        self.rendered_frames += 1;
        Ok(true)
    }

    /// Push segment transforms and the camera pose to the backend
    fn sync(&mut self) -> Result<()> {
        for segment in self.choreographer.ring().segments() {
            let handle = self.handles[segment.id()];
            self.backend
                .set_position(handle, Vec3::new(segment.offset(), 0.0, 0.0))?;
            self.backend.set_opacity(handle, segment.opacity())?;
        }
        let pose = self.choreographer.camera_pose();
        self.backend
            .set_camera_pose(pose.direction.normalize(), pose.distance)
    }

    /// Forward a camera direction from the input collaborator
    pub fn handle_input(&mut self, direction: Vec3) {
        if self.choreographer.apply_input(direction) {
            self.clock.request_redraw();
        }
    }

    /// Forward a camera distance from the input collaborator
    pub fn handle_zoom(&mut self, distance: f32) {
        if self.choreographer.apply_zoom(distance) {
            self.clock.request_redraw();
        }
    }

    /// Propagate a viewport change
    pub fn resize(&mut self, width: f32, height: f32, pixel_ratio: f32) -> Result<()> {
        self.viewport = (width, height);
        if self.geometry.is_resolution_dependent() {
            let (w, h) = (width * pixel_ratio, height * pixel_ratio);
            for handle in &self.handles {
                self.backend.set_resolution(*handle, w, h)?;
            }
        }
        tracing::debug!("Viewport resized to {}x{} @{}", width, height, pixel_ratio);
        self.clock.request_redraw();
        Ok(())
    }

    /// Stop the choreography; no callback fires afterwards
    pub fn teardown(&mut self) {
        let cancelled = self.choreographer.shutdown();
        tracing::debug!(
            "Scene torn down after {} frames ({} tweens cancelled)",
            self.rendered_frames,
            cancelled
        );
    }

    pub fn phase(&self) -> CyclePhase {
        self.choreographer.phase()
    }

    pub fn choreographer(&self) -> &FlowChoreographer {
        &self.choreographer
    }

    pub fn clock(&self) -> &FrameClock<C> {
        &self.clock
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn geometry(&self) -> &Arc<SegmentGeometry> {
        &self.geometry
    }

    pub fn viewport(&self) -> (f32, f32) {
        self.viewport
    }

    /// Frames actually rendered (ticks with nothing visible are skipped)
    pub fn rendered_frames(&self) -> u64 {
        self.rendered_frames
    }
}
