//! Common imports for driving a river scene

pub use crate::backend::{RecordingBackend, RenderBackend, SegmentHandle};
pub use crate::camera::{CameraPose, Waypoint};
pub use crate::choreographer::{CyclePhase, FlowChoreographer};
pub use crate::config::RiverConfig;
pub use crate::dataset::{DatasetProvider, FileDataset, InlineDataset, PointCloud};
pub use crate::error::{Result, SceneError};
pub use crate::geometry::SegmentGeometry;
pub use crate::scene::RiverScene;

pub use river_animation::{ClockSource, Easing, ManualClock, MonotonicClock};
pub use river_core::Vec3;
