//! Shared segment geometry
//!
//! Every segment of the ring draws the same immutable geometry. It is built
//! once from the dataset and shared by `Arc`; segments only differ by their
//! translation and opacity.

use crate::dataset::PointCloud;
use river_core::{BoundingBox, Vec3};

/// Immutable geometry drawn by every segment
#[derive(Clone, Debug)]
pub struct SegmentGeometry {
    cloud: PointCloud,
    scale: Vec3,
    resolution_dependent: bool,
}

impl SegmentGeometry {
    /// Wrap a point cloud, stretching Y and Z to the X extent
    pub fn from_cloud(cloud: PointCloud) -> Self {
        let scale = cloud.bounds().aspect_scale();
        Self {
            cloud,
            scale,
            resolution_dependent: false,
        }
    }

    /// Mark geometry whose material needs the viewport size (screen-space lines)
    pub fn with_resolution_dependent(mut self, dependent: bool) -> Self {
        self.resolution_dependent = dependent;
        self
    }

    pub fn cloud(&self) -> &PointCloud {
        &self.cloud
    }

    /// Bounds of the unscaled cloud
    pub fn bounds(&self) -> BoundingBox {
        self.cloud.bounds()
    }

    /// Per-axis scale applied when drawing
    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    /// Extent of one tile along the flow axis
    pub fn footprint(&self) -> f32 {
        self.cloud.bounds().size().x
    }

    pub fn is_resolution_dependent(&self) -> bool {
        self.resolution_dependent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::parse_grid;

    #[test]
    fn test_scale_matches_x_extent() {
        let cloud = parse_grid("z\\x,0,10,20\n0,1,2,3\n4,3,2,1\n").unwrap();
        let geometry = SegmentGeometry::from_cloud(cloud);

        assert_eq!(geometry.footprint(), 20.0);
        assert_eq!(geometry.scale(), Vec3::new(1.0, 10.0, 5.0));
        assert!(!geometry.is_resolution_dependent());
    }

    #[test]
    fn test_flat_dataset_scales_by_one() {
        let cloud = parse_grid("z\\x,0,10\n0,1,1\n").unwrap();
        let geometry = SegmentGeometry::from_cloud(cloud).with_resolution_dependent(true);

        assert_eq!(geometry.scale(), Vec3::new(1.0, 1.0, 1.0));
        assert!(geometry.is_resolution_dependent());
    }
}
