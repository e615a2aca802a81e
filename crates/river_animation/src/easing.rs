//! Easing functions
//!
//! Shape normalized progress before interpolation. Every curve maps
//! `[0, 1]` onto `[0, 1]` with `f(0) = 0` and `f(1) = 1`.

use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

/// Easing curve applied to normalized tween progress
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    #[default]
    Linear,
    /// Quadratic acceleration
    EaseIn,
    /// Quadratic deceleration
    EaseOut,
    /// Quadratic acceleration then deceleration
    EaseInOut,
    EaseInCubic,
    EaseOutCubic,
    EaseInOutCubic,
    /// Sinusoidal acceleration then deceleration
    EaseInOutSine,
}

impl Easing {
    /// Apply the curve to progress `t` (clamped into `[0, 1]`)
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::EaseIn => t * t,
            Easing::EaseOut => 1.0 - (1.0 - t) * (1.0 - t),
            Easing::EaseInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
            Easing::EaseInCubic => t * t * t,
            Easing::EaseOutCubic => 1.0 - (1.0 - t).powi(3),
            Easing::EaseInOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
            Easing::EaseInOutSine => -((PI * t).cos() - 1.0) / 2.0,
        }
    }

    /// All curves, in declaration order
    pub const ALL: [Easing; 8] = [
        Easing::Linear,
        Easing::EaseIn,
        Easing::EaseOut,
        Easing::EaseInOut,
        Easing::EaseInCubic,
        Easing::EaseOutCubic,
        Easing::EaseInOutCubic,
        Easing::EaseInOutSine,
    ];
}
