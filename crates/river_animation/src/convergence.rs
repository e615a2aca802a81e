//! Bounded convergence
//!
//! An animated scalar whose exposed value is always clamped into a closed
//! range. Used for quantities such as camera distance, where chained
//! waypoints or user zoom must never leave the valid range.
//!
//! # Example
//!
//! ```ignore
//! let mut distance = BoundedConvergence::new(registry.handle(), 30.0, 1.0, 100.0);
//! distance.animate_to(250.0, 1000, Easing::EaseOut); // settles at 100.0
//! let current = distance.value();
//! ```

use crate::easing::Easing;
use crate::registry::{RegistryHandle, TweenId};
use crate::tween::Tween;
use river_core::clamp;
use std::cell::Cell;
use std::rc::Rc;

/// Animated scalar clamped into `[min, max]`
pub struct BoundedConvergence {
    handle: RegistryHandle,
    value: Rc<Cell<f32>>,
    /// Bumped on every retarget so superseded tweens stop writing
    generation: Rc<Cell<u64>>,
    in_flight: Option<TweenId>,
    target: f32,
    min: f32,
    max: f32,
}

impl BoundedConvergence {
    /// Create a convergence resting at `initial` (clamped)
    pub fn new(handle: RegistryHandle, initial: f32, min: f32, max: f32) -> Self {
        let initial = clamp(initial, min, max);
        Self {
            handle,
            value: Rc::new(Cell::new(initial)),
            generation: Rc::new(Cell::new(0)),
            in_flight: None,
            target: initial,
            min,
            max,
        }
    }

    /// Current value, always inside the bounds
    pub fn value(&self) -> f32 {
        self.value.get()
    }

    /// Most recently requested target, clamped
    pub fn target(&self) -> f32 {
        self.target
    }

    pub fn bounds(&self) -> (f32, f32) {
        (self.min, self.max)
    }

    /// Check if a convergence tween is still running
    pub fn is_animating(&self) -> bool {
        self.in_flight
            .map(|id| self.handle.contains(id))
            .unwrap_or(false)
    }

    /// Animate from the current value towards `target`
    ///
    /// Cancels any convergence already in flight on this quantity.
    pub fn animate_to(&mut self, target: f32, duration_ms: u32, easing: Easing) {
        self.cancel();
        self.target = clamp(target, self.min, self.max);

        let generation = self.generation.get();
        let value = Rc::clone(&self.value);
        let current = Rc::clone(&self.generation);
        let (min, max) = (self.min, self.max);

        let tween = Tween::new(self.value.get(), target, duration_ms)
            .label("bounded-convergence")
            .easing(easing)
            .on_update(move |v: &f32| {
                if current.get() == generation {
                    value.set(clamp(*v, min, max));
                }
            });
        self.in_flight = self.handle.schedule(tween);
    }

    /// Jump to `value` (clamped), cancelling any convergence in flight
    pub fn set(&mut self, value: f32) {
        self.cancel();
        let value = clamp(value, self.min, self.max);
        self.target = value;
        self.value.set(value);
    }

    fn cancel(&mut self) {
        self.generation.set(self.generation.get().wrapping_add(1));
        if let Some(id) = self.in_flight.take() {
            self.handle.cancel(id);
        }
    }
}

impl Drop for BoundedConvergence {
    fn drop(&mut self) {
        if let Some(id) = self.in_flight.take() {
            self.handle.cancel(id);
        }
    }
}
