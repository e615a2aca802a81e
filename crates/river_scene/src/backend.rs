//! Rendering backend interface
//!
//! The scene never draws by itself. It pushes segment transforms and the
//! camera pose into a [`RenderBackend`] and asks it to render when the frame
//! clock reports a visible change.

use crate::error::{Result, SceneError};
use crate::geometry::SegmentGeometry;
use river_core::Vec3;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Handle to a segment object owned by the backend
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SegmentHandle(pub u32);

/// Rendering backend trait
///
/// Implement this trait to drive a concrete renderer.
pub trait RenderBackend {
    /// Create the drawable for one segment of the ring
    fn create_segment(&mut self, geometry: &Arc<SegmentGeometry>) -> Result<SegmentHandle>;

    /// Place a segment
    fn set_position(&mut self, segment: SegmentHandle, position: Vec3) -> Result<()>;

    /// Set a segment's opacity in `[0, 1]`
    fn set_opacity(&mut self, segment: SegmentHandle, opacity: f32) -> Result<()>;

    /// Point the camera along `direction` (normalized) at `distance` from the origin
    fn set_camera_pose(&mut self, direction: Vec3, distance: f32) -> Result<()>;

    /// Update the viewport size of a resolution dependent segment
    fn set_resolution(&mut self, segment: SegmentHandle, width: f32, height: f32) -> Result<()>;

    /// Draw one frame
    fn render(&mut self) -> Result<()>;
}

/// A backend call captured by [`RecordingBackend`]
#[derive(Clone, Debug, PartialEq)]
pub enum BackendCall {
    /// A new segment and the number of points it draws
    CreateSegment(SegmentHandle, usize),
    SetPosition(SegmentHandle, Vec3),
    SetOpacity(SegmentHandle, f32),
    SetCameraPose { direction: Vec3, distance: f32 },
    SetResolution(SegmentHandle, f32, f32),
    Render,
}

/// Latest state pushed for one segment
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SegmentState {
    pub position: Vec3,
    pub opacity: f32,
}

impl Default for SegmentState {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            opacity: 1.0,
        }
    }
}

/// A backend that records calls instead of drawing
///
/// Used by tests and by the headless CLI driver.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    calls: Vec<BackendCall>,
    segments: FxHashMap<SegmentHandle, SegmentState>,
    camera: Option<(Vec3, f32)>,
    next_handle: u32,
    render_count: u64,
    record_calls: bool,
}

impl RecordingBackend {
    /// Create a backend that keeps the full call log
    pub fn new() -> Self {
        Self {
            record_calls: true,
            ..Default::default()
        }
    }

    /// Create a backend that only tracks the latest state
    ///
    /// Long simulated runs would otherwise grow the call log without bound.
    pub fn state_only() -> Self {
        Self::default()
    }

    /// Get the recorded calls
    pub fn calls(&self) -> &[BackendCall] {
        &self.calls
    }

    /// Take the recorded calls
    pub fn take_calls(&mut self) -> Vec<BackendCall> {
        std::mem::take(&mut self.calls)
    }

    /// Latest state of a segment
    pub fn segment(&self, handle: SegmentHandle) -> Option<SegmentState> {
        self.segments.get(&handle).copied()
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Latest camera direction and distance
    pub fn camera(&self) -> Option<(Vec3, f32)> {
        self.camera
    }

    /// Number of frames rendered
    pub fn render_count(&self) -> u64 {
        self.render_count
    }

    fn record(&mut self, call: BackendCall) {
        if self.record_calls {
            self.calls.push(call);
        }
    }

    fn state_mut(&mut self, handle: SegmentHandle) -> Result<&mut SegmentState> {
        self.segments
            .get_mut(&handle)
            .ok_or_else(|| SceneError::Backend(format!("Unknown segment {:?}", handle)))
    }
}

impl RenderBackend for RecordingBackend {
    fn create_segment(&mut self, geometry: &Arc<SegmentGeometry>) -> Result<SegmentHandle> {
        let handle = SegmentHandle(self.next_handle);
        self.next_handle += 1;
        self.segments.insert(handle, SegmentState::default());
        self.record(BackendCall::CreateSegment(handle, geometry.cloud().len()));
        Ok(handle)
    }

    fn set_position(&mut self, segment: SegmentHandle, position: Vec3) -> Result<()> {
        self.state_mut(segment)?.position = position;
        self.record(BackendCall::SetPosition(segment, position));
        Ok(())
    }

    fn set_opacity(&mut self, segment: SegmentHandle, opacity: f32) -> Result<()> {
        self.state_mut(segment)?.opacity = opacity;
        self.record(BackendCall::SetOpacity(segment, opacity));
        Ok(())
    }

    fn set_camera_pose(&mut self, direction: Vec3, distance: f32) -> Result<()> {
        self.camera = Some((direction, distance));
        self.record(BackendCall::SetCameraPose {
            direction,
            distance,
        });
        Ok(())
    }

    fn set_resolution(&mut self, segment: SegmentHandle, width: f32, height: f32) -> Result<()> {
        self.state_mut(segment)?;
        self.record(BackendCall::SetResolution(segment, width, height));
        Ok(())
    }

    fn render(&mut self) -> Result<()> {
        self.render_count += 1;
        self.record(BackendCall::Render);
        Ok(())
    }
}
