//! Scalar helpers

/// Clamp `value` into `[min, max]`
///
/// Unlike `f32::clamp` this never panics on inverted bounds; `min` wins.
pub fn clamp(value: f32, min: f32, max: f32) -> f32 {
    if value <= min {
        min
    } else if value >= max {
        max
    } else {
        value
    }
}

/// `numerator / denominator`, or 1 when the result would not be finite
pub fn safe_ratio(numerator: f32, denominator: f32) -> f32 {
    let ratio = numerator / denominator;
    if denominator == 0.0 || !ratio.is_finite() {
        1.0
    } else {
        ratio
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(5.0, 1.0, 100.0), 5.0);
        assert_eq!(clamp(-3.0, 1.0, 100.0), 1.0);
        assert_eq!(clamp(300.0, 1.0, 100.0), 100.0);
    }

    #[test]
    fn test_safe_ratio() {
        assert_eq!(safe_ratio(10.0, 2.0), 5.0);
        assert_eq!(safe_ratio(10.0, 0.0), 1.0);
        assert_eq!(safe_ratio(0.0, 0.0), 1.0);
    }
}
