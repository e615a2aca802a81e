//! Animatable value types
//!
//! Provides the trait for values that can be tweened, with implementations
//! for scalars and vectors.

use river_core::Vec3;

/// Trait for values that can be linearly interpolated
pub trait Interpolate: Clone + 'static {
    /// Linearly interpolate between self and other by factor t (0.0 to 1.0)
    fn lerp(&self, other: &Self, t: f32) -> Self;

    /// Check if two values are approximately equal
    fn approx_eq(&self, other: &Self, epsilon: f32) -> bool;
}

// ============================================================================
// f32 Implementation
// ============================================================================

impl Interpolate for f32 {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        self + (other - self) * t
    }

    fn approx_eq(&self, other: &Self, epsilon: f32) -> bool {
        (self - other).abs() < epsilon
    }
}

// ============================================================================
// Vec3 Implementation
// ============================================================================

impl Interpolate for Vec3 {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        Vec3::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
            self.z + (other.z - self.z) * t,
        )
    }

    fn approx_eq(&self, other: &Self, epsilon: f32) -> bool {
        Vec3::approx_eq(self, *other, epsilon)
    }
}

// ============================================================================
// Fixed-size tuples
// ============================================================================

impl<const N: usize> Interpolate for [f32; N] {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        let mut out = *self;
        for (value, target) in out.iter_mut().zip(other.iter()) {
            *value += (target - *value) * t;
        }
        out
    }

    fn approx_eq(&self, other: &Self, epsilon: f32) -> bool {
        self.iter()
            .zip(other.iter())
            .all(|(a, b)| (a - b).abs() < epsilon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_f32_lerp() {
        assert_eq!(0.0f32.lerp(&10.0, 0.0), 0.0);
        assert_eq!(0.0f32.lerp(&10.0, 0.5), 5.0);
        assert_eq!(0.0f32.lerp(&10.0, 1.0), 10.0);
    }

    #[test]
    fn test_vec3_lerp() {
        let a = Vec3::new(0.0, 0.0, 1.0);
        let b = Vec3::new(1.0, 0.0, 0.0);
        let mid = a.lerp(&b, 0.5);
        assert!(Interpolate::approx_eq(&mid, &Vec3::new(0.5, 0.0, 0.5), 1e-6));
    }

    #[test]
    fn test_array_lerp_is_component_wise() {
        let a = [0.0, 0.0, 1.0, 30.0];
        let b = [1.0, 0.0, 0.0, 50.0];
        let mid = a.lerp(&b, 0.25);
        assert!(mid.approx_eq(&[0.25, 0.0, 0.75, 35.0], 1e-6));
    }
}
