//! Axis-aligned bounding box of a point cloud

use crate::math::safe_ratio;
use crate::vec::Vec3;
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::empty()
    }
}

impl BoundingBox {
    /// Create an empty bounding box
    pub fn empty() -> Self {
        Self {
            min: Vec3::new(f32::INFINITY, f32::INFINITY, f32::INFINITY),
            max: Vec3::new(f32::NEG_INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY),
        }
    }

    /// Create from min and max points
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Smallest box containing every point (empty for no points)
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Vec3>) -> Self {
        let mut bbox = Self::empty();
        for point in points {
            bbox.expand_to_include(*point);
        }
        bbox
    }

    /// Check if the bounding box is empty
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Get the center point
    pub fn center(&self) -> Vec3 {
        Vec3::new(
            (self.min.x + self.max.x) * 0.5,
            (self.min.y + self.max.y) * 0.5,
            (self.min.z + self.max.z) * 0.5,
        )
    }

    /// Get the size (width, height, depth)
    pub fn size(&self) -> Vec3 {
        Vec3::new(
            self.max.x - self.min.x,
            self.max.y - self.min.y,
            self.max.z - self.min.z,
        )
    }

    /// Expand to include a point
    pub fn expand_to_include(&mut self, point: Vec3) {
        self.min.x = self.min.x.min(point.x);
        self.min.y = self.min.y.min(point.y);
        self.min.z = self.min.z.min(point.z);
        self.max.x = self.max.x.max(point.x);
        self.max.y = self.max.y.max(point.y);
        self.max.z = self.max.z.max(point.z);
    }

    /// Scale factors that stretch the Y and Z extents to match the X extent.
    ///
    /// A zero-extent axis gets ratio 1 so a flat dataset is drawn undistorted
    /// instead of pushing NaN or infinity into segment transforms.
    pub fn aspect_scale(&self) -> Vec3 {
        let size = self.size();
        Vec3::new(
            1.0,
            safe_ratio(size.x, size.y),
            safe_ratio(size.x, size.z),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounding_box() {
        let bbox = BoundingBox::new(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0));

        let center = bbox.center();
        assert!((center.x - 0.0).abs() < 1e-5);
        assert!((center.y - 0.0).abs() < 1e-5);
        assert!((center.z - 0.0).abs() < 1e-5);
    }

    #[test]
    fn test_from_points() {
        let points = [
            Vec3::new(0.0, 5.0, -2.0),
            Vec3::new(4.0, 1.0, 2.0),
            Vec3::new(2.0, 3.0, 0.0),
        ];
        let bbox = BoundingBox::from_points(&points);
        assert_eq!(bbox.min, Vec3::new(0.0, 1.0, -2.0));
        assert_eq!(bbox.max, Vec3::new(4.0, 5.0, 2.0));
        assert_eq!(bbox.size(), Vec3::new(4.0, 4.0, 4.0));
    }

    #[test]
    fn test_empty_box() {
        assert!(BoundingBox::empty().is_empty());
        assert!(BoundingBox::from_points(&Vec::<Vec3>::new()).is_empty());
    }

    #[test]
    fn test_aspect_scale() {
        let bbox = BoundingBox::new(Vec3::ZERO, Vec3::new(10.0, 2.0, 5.0));
        assert_eq!(bbox.aspect_scale(), Vec3::new(1.0, 5.0, 2.0));
    }

    #[test]
    fn test_aspect_scale_degenerate_axis() {
        // Flat in Y: every sample has the same value
        let bbox = BoundingBox::new(Vec3::ZERO, Vec3::new(10.0, 0.0, 5.0));
        let scale = bbox.aspect_scale();
        assert_eq!(scale.y, 1.0);
        assert!(scale.is_finite());
    }
}
