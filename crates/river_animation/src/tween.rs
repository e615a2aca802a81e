//! Tween - a single timed interpolation task
//!
//! A tween moves a value from `from` to `to` over `duration_ms`, optionally
//! after a start delay, shaped by an easing curve and replayed `repeat` extra
//! times. It is built with a builder API and handed to the
//! [`AnimationRegistry`](crate::AnimationRegistry), which advances it once per
//! frame tick.
//!
//! ```ignore
//! let id = registry.schedule(
//!     Tween::new(0.0, 100.0, 500)
//!         .delay(250)
//!         .easing(Easing::EaseOut)
//!         .on_update(|v| println!("{v}"))
//!         .on_complete(|| println!("done")),
//! );
//! ```

use crate::easing::Easing;
use crate::error::{AnimationError, Result};
use crate::values::Interpolate;

/// Callback receiving the interpolated value every active tick
pub type UpdateFn<T> = Box<dyn FnMut(&T) -> Result<()>>;

/// Callback invoked once after the final play-through
pub type CompleteFn = Box<dyn FnOnce() -> Result<()>>;

/// Lifecycle of a tween. Transitions only move forward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum TweenPhase {
    /// Scheduled, waiting for its delay to elapse
    Pending,
    /// Interpolating
    Active,
    /// All play-throughs done; removed from the registry
    Finished,
}

/// Outcome of advancing a tween by one tick
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Advance {
    /// Still pending, nothing visible changed
    Waiting,
    /// Interpolated a new value
    Updated,
    /// Reached the end of a play-through and restarted
    Repeated,
    /// Reached the end of the final play-through
    Finished,
}

/// A timed interpolation task between two values
pub struct Tween<T: Interpolate> {
    label: String,
    from: T,
    to: T,
    duration_ms: u32,
    delay_ms: u32,
    easing: Easing,
    repeats_remaining: u32,
    on_update: Option<UpdateFn<T>>,
    on_complete: Option<CompleteFn>,
    phase: TweenPhase,
    /// Timestamp the delay is measured from
    anchor_ms: Option<f64>,
    /// Timestamp the current play-through started
    active_start_ms: f64,
}

impl<T: Interpolate> Tween<T> {
    /// Create a tween from `from` to `to` lasting `duration_ms`
    pub fn new(from: T, to: T, duration_ms: u32) -> Self {
        Self {
            label: String::from("tween"),
            from,
            to,
            duration_ms,
            delay_ms: 0,
            easing: Easing::Linear,
            repeats_remaining: 0,
            on_update: None,
            on_complete: None,
            phase: TweenPhase::Pending,
            anchor_ms: None,
            active_start_ms: 0.0,
        }
    }

    /// Name used in log output
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Wait `delay_ms` after scheduling before interpolating
    pub fn delay(mut self, delay_ms: u32) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    /// Set the easing curve
    pub fn easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    /// Replay from `from` this many extra times (0 = play once)
    pub fn repeat(mut self, count: u32) -> Self {
        self.repeats_remaining = count;
        self
    }

    /// Set an infallible update callback
    pub fn on_update<F>(self, mut f: F) -> Self
    where
        F: FnMut(&T) + 'static,
    {
        self.try_on_update(move |value| {
            f(value);
            Ok(())
        })
    }

    /// Set a fallible update callback
    ///
    /// An error finishes the tween early; its completion callback still runs.
    pub fn try_on_update<F>(mut self, f: F) -> Self
    where
        F: FnMut(&T) -> Result<()> + 'static,
    {
        self.on_update = Some(Box::new(f));
        self
    }

    /// Set an infallible completion callback
    pub fn on_complete<F>(self, f: F) -> Self
    where
        F: FnOnce() + 'static,
    {
        self.try_on_complete(move || {
            f();
            Ok(())
        })
    }

    /// Set a fallible completion callback
    pub fn try_on_complete<F>(mut self, f: F) -> Self
    where
        F: FnOnce() -> Result<()> + 'static,
    {
        self.on_complete = Some(Box::new(f));
        self
    }

    pub fn from_value(&self) -> &T {
        &self.from
    }

    pub fn to_value(&self) -> &T {
        &self.to
    }

    pub fn duration_ms(&self) -> u32 {
        self.duration_ms
    }

    pub fn delay_ms(&self) -> u32 {
        self.delay_ms
    }

    pub fn phase(&self) -> TweenPhase {
        self.phase
    }

    /// Value at normalized progress `t`, after easing
    pub fn value_at(&self, t: f32) -> T {
        self.from.lerp(&self.to, self.easing.apply(t))
    }

    /// Normalized progress of the current play-through at `now_ms`
    fn progress(&self, now_ms: f64) -> f32 {
        if self.duration_ms == 0 {
            return 1.0;
        }
        let elapsed = now_ms - self.active_start_ms;
        (elapsed / self.duration_ms as f64).clamp(0.0, 1.0) as f32
    }

    fn emit(&mut self, value: &T) -> Result<()> {
        match self.on_update.as_mut() {
            Some(update) => update(value),
            None => Ok(()),
        }
    }
}

/// Type-erased tween as stored by the registry
pub(crate) trait AnyTween {
    fn label(&self) -> &str;

    fn phase(&self) -> TweenPhase;

    /// Fix the timestamp the delay is measured from, if not already fixed
    fn anchor(&mut self, now_ms: f64);

    /// Advance to `now_ms`, invoking the update callback when active
    fn advance(&mut self, now_ms: f64) -> Result<Advance>;

    /// Mark finished and run the completion callback
    fn finish(self: Box<Self>) -> Result<()>;
}

impl<T: Interpolate> AnyTween for Tween<T> {
    fn label(&self) -> &str {
        &self.label
    }

    fn phase(&self) -> TweenPhase {
        self.phase
    }

    fn anchor(&mut self, now_ms: f64) {
        if self.anchor_ms.is_none() {
            self.anchor_ms = Some(now_ms);
        }
    }

    fn advance(&mut self, now_ms: f64) -> Result<Advance> {
        match self.phase {
            TweenPhase::Finished => return Ok(Advance::Finished),
            TweenPhase::Pending => {
                self.anchor(now_ms);
                let start = self.anchor_ms.unwrap_or(now_ms) + self.delay_ms as f64;
                if now_ms < start {
                    return Ok(Advance::Waiting);
                }
                self.phase = TweenPhase::Active;
                self.active_start_ms = start;
            }
            TweenPhase::Active => {}
        }

        let progress = self.progress(now_ms);
        let value = self.value_at(progress);
        self.emit(&value)?;

        if progress < 1.0 {
            return Ok(Advance::Updated);
        }

        if self.repeats_remaining > 0 {
            self.repeats_remaining -= 1;
            self.active_start_ms = now_ms;
            return Ok(Advance::Repeated);
        }

        self.phase = TweenPhase::Finished;
        Ok(Advance::Finished)
    }

    fn finish(mut self: Box<Self>) -> Result<()> {
        self.phase = TweenPhase::Finished;
        match self.on_complete.take() {
            Some(complete) => complete().map_err(|err| match err {
                AnimationError::Callback { .. } => err,
                other => AnimationError::callback(self.label.clone(), other),
            }),
            None => Ok(()),
        }
    }
}
