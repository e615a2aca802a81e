//! River Core
//!
//! Foundational math primitives shared by the river crates:
//!
//! - **Vec3**: plain 3D vector used for positions and camera directions
//! - **BoundingBox**: axis-aligned bounds of a point cloud
//! - **Scalar helpers**: clamping and division-safe ratios

pub mod bounds;
pub mod math;
pub mod vec;

pub use bounds::BoundingBox;
pub use math::{clamp, safe_ratio};
pub use vec::Vec3;
