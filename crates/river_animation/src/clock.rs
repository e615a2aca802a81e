//! Frame clock
//!
//! Drives one registry tick per display refresh and keeps the
//! render-on-demand flag. The render step checks
//! [`FrameClock::take_needs_redraw`] after each tick and only draws when it
//! returns true.

use crate::registry::{AnimationRegistry, RegistryHandle};
use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

/// Source of monotonic timestamps, in milliseconds
pub trait ClockSource {
    fn now_ms(&self) -> f64;
}

/// Wall clock measured from construction
#[derive(Clone, Copy, Debug)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockSource for MonotonicClock {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// Hand-driven clock for tests and simulated runs
///
/// Clones share the same time.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    now: Rc<Cell<f64>>,
}

impl ManualClock {
    pub fn new(start_ms: f64) -> Self {
        Self {
            now: Rc::new(Cell::new(start_ms)),
        }
    }

    pub fn set(&self, now_ms: f64) {
        self.now.set(now_ms);
    }

    pub fn advance(&self, delta_ms: f64) {
        self.now.set(self.now.get() + delta_ms);
    }
}

impl ClockSource for ManualClock {
    fn now_ms(&self) -> f64 {
        self.now.get()
    }
}

/// Ticks the animation registry and tracks whether a redraw is needed
pub struct FrameClock<C: ClockSource = MonotonicClock> {
    source: C,
    registry: AnimationRegistry,
    /// Set when something visible changed; cleared by the render step
    needs_redraw: Cell<bool>,
    frame_count: Cell<u64>,
}

impl<C: ClockSource> FrameClock<C> {
    /// Create a clock owning a fresh registry
    ///
    /// The first frame always needs a redraw.
    pub fn new(source: C) -> Self {
        Self {
            source,
            registry: AnimationRegistry::new(),
            needs_redraw: Cell::new(true),
            frame_count: Cell::new(0),
        }
    }

    pub fn registry(&self) -> &AnimationRegistry {
        &self.registry
    }

    /// Get a handle to the registry for passing to components
    pub fn handle(&self) -> RegistryHandle {
        self.registry.handle()
    }

    pub fn source(&self) -> &C {
        &self.source
    }

    /// Current timestamp from the clock source
    pub fn now_ms(&self) -> f64 {
        self.source.now_ms()
    }

    /// Tick at the clock source's current time
    pub fn tick(&self) -> bool {
        self.tick_at(self.source.now_ms())
    }

    /// Tick at an explicit timestamp
    ///
    /// Returns true if any tween advanced. Sets the redraw flag in that case.
    pub fn tick_at(&self, now_ms: f64) -> bool {
        let dirty = self.registry.tick(now_ms);
        self.frame_count.set(self.frame_count.get() + 1);

        if dirty {
            self.needs_redraw.set(true);
        }

        if self.frame_count.get() % 120 == 0 {
            tracing::trace!(
                "FrameClock: frame {} at {:.1}ms, {} live tweens, dirty={}",
                self.frame_count.get(),
                now_ms,
                self.registry.len(),
                dirty
            );
        }
        dirty
    }

    /// Check the redraw flag without clearing it
    pub fn needs_redraw(&self) -> bool {
        self.needs_redraw.get()
    }

    /// Check and clear the redraw flag
    pub fn take_needs_redraw(&self) -> bool {
        self.needs_redraw.replace(false)
    }

    /// Manually request a redraw (input, resize)
    pub fn request_redraw(&self) {
        self.needs_redraw.set(true);
    }

    /// Number of ticks processed
    pub fn frame_count(&self) -> u64 {
        self.frame_count.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tween::Tween;

    #[test]
    fn test_first_frame_needs_redraw() {
        let clock = FrameClock::new(ManualClock::new(0.0));
        assert!(clock.take_needs_redraw());
        assert!(!clock.needs_redraw());
    }

    #[test]
    fn test_idle_tick_stays_clean() {
        let clock = FrameClock::new(ManualClock::new(0.0));
        clock.take_needs_redraw();

        clock.source().advance(16.0);
        assert!(!clock.tick());
        assert!(!clock.take_needs_redraw());
    }

    #[test]
    fn test_scheduled_tween_sets_flag_on_active_tick() {
        let source = ManualClock::new(0.0);
        let clock = FrameClock::new(source.clone());
        clock.tick();
        clock.take_needs_redraw();

        clock.registry().schedule(Tween::new(0.0f32, 1.0, 100).delay(32));

        source.advance(16.0);
        clock.tick();
        assert!(!clock.take_needs_redraw());

        source.advance(16.0);
        clock.tick();
        assert!(clock.take_needs_redraw());
    }

    #[test]
    fn test_request_redraw() {
        let clock = FrameClock::new(ManualClock::new(0.0));
        clock.take_needs_redraw();
        clock.request_redraw();
        assert!(clock.needs_redraw());
        assert_eq!(clock.frame_count(), 0);
    }

    #[test]
    fn test_monotonic_clock_advances() {
        let clock = MonotonicClock::new();
        let a = clock.now_ms();
        let b = clock.now_ms();
        assert!(b >= a);
    }
}
