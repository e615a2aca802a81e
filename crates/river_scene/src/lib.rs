//! # River Scene
//!
//! The flow choreography engine behind the data river visualization.
//!
//! A dataset is loaded once, tiled into a fixed ring of segments and set in
//! motion: every cycle the segments flow one footprint towards the camera,
//! the ones crossing the seam dissolve, and a scripted camera tour plays in
//! parallel. When both are done the faded segments are recycled into the
//! vacant slots and the cycle starts over, indefinitely.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use river_scene::prelude::*;
//!
//! let config = RiverConfig::load("river.toml")?;
//! let dataset = FileDataset::new("assets/data.txt");
//! let mut scene = RiverScene::new(&dataset, RecordingBackend::new(), MonotonicClock::new(), &config)?;
//! scene.start()?;
//! loop {
//!     scene.frame()?;
//! }
//! ```

pub mod backend;
pub mod camera;
pub mod choreographer;
pub mod config;
pub mod dataset;
pub mod error;
pub mod geometry;
pub mod scene;
pub mod segment;

pub mod prelude;

pub use backend::{BackendCall, RecordingBackend, RenderBackend, SegmentHandle, SegmentState};
pub use camera::{play_path, CameraPath, CameraPose, CameraRig, Waypoint};
pub use choreographer::{CyclePhase, FlowChoreographer, FlowSettings};
pub use config::{CameraConfig, ClockConfig, RingConfig, RiverConfig};
pub use dataset::{parse_grid, DatasetProvider, FileDataset, InlineDataset, PointCloud};
pub use error::{DatasetError, Result, SceneError};
pub use geometry::SegmentGeometry;
pub use scene::RiverScene;
pub use segment::{
    Segment, SegmentRing, SegmentTransform, FADE_DURATION_SCALE, FADE_FOOTPRINT_MULTIPLIER,
    RECYCLE_DURATION_FRACTION,
};
