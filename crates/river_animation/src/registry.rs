//! Animation registry
//!
//! Holds every live tween and advances them once per frame tick.
//! Tweens are registered with [`AnimationRegistry::schedule`] (or through a
//! [`RegistryHandle`] from inside callbacks) and removed automatically when
//! they finish or are cancelled.
//!
//! A tick works on a snapshot of the ids alive when it starts. Each tween is
//! taken out of its slot while it advances, so callbacks are free to schedule
//! or cancel through a handle. Tweens scheduled during a tick first advance
//! on the next tick.

use crate::error::AnimationError;
use crate::tween::{Advance, AnyTween, Tween, TweenPhase};
use crate::values::Interpolate;
use rustc_hash::FxHashSet;
use slotmap::{new_key_type, SlotMap};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

new_key_type! {
    /// Handle to a scheduled tween
    pub struct TweenId;
}

/// A registry slot. `None` while the tween is out being advanced.
type Slot = Option<Box<dyn AnyTween>>;

/// Internal state of the registry
struct RegistryInner {
    tweens: SlotMap<TweenId, Slot>,
    /// Timestamp of the tick being processed, or of the last one
    now_ms: Option<f64>,
    tick_count: u64,
}

impl RegistryInner {
    fn insert(&mut self, mut tween: Box<dyn AnyTween>) -> TweenId {
        if let Some(now) = self.now_ms {
            tween.anchor(now);
        }
        self.tweens.insert(Some(tween))
    }
}

/// The registry that ticks all live tweens
///
/// Owned explicitly by whoever drives the frame loop (usually a
/// [`FrameClock`](crate::FrameClock)); subsystems get a weak
/// [`RegistryHandle`].
pub struct AnimationRegistry {
    inner: Rc<RefCell<RegistryInner>>,
}

impl AnimationRegistry {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(RegistryInner {
                tweens: SlotMap::with_key(),
                now_ms: None,
                tick_count: 0,
            })),
        }
    }

    /// Get a handle to this registry for passing to components
    pub fn handle(&self) -> RegistryHandle {
        RegistryHandle {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Register a tween in pending state
    ///
    /// Its delay is measured from the current tick's timestamp, or from the
    /// first tick if none has run yet.
    pub fn schedule<T: Interpolate>(&self, tween: Tween<T>) -> TweenId {
        self.inner.borrow_mut().insert(Box::new(tween))
    }

    /// Remove a tween without running its completion callback
    ///
    /// Returns `false` if the tween already finished or was cancelled.
    pub fn cancel(&self, id: TweenId) -> bool {
        let removed = self.inner.borrow_mut().tweens.remove(id);
        removed.is_some()
    }

    /// Remove every tween without running completion callbacks
    pub fn cancel_all(&self) -> usize {
        let drained: Vec<Slot> = {
            let mut inner = self.inner.borrow_mut();
            inner.tweens.drain().map(|(_, slot)| slot).collect()
        };
        drained.len()
    }

    /// Check if a tween is still registered (pending or active)
    pub fn contains(&self, id: TweenId) -> bool {
        self.inner.borrow().tweens.contains_key(id)
    }

    /// Lifecycle phase of a registered tween
    pub fn phase(&self, id: TweenId) -> Option<TweenPhase> {
        let inner = self.inner.borrow();
        match inner.tweens.get(id) {
            Some(Some(tween)) => Some(tween.phase()),
            // Out of its slot: it is being advanced right now
            Some(None) => Some(TweenPhase::Active),
            None => None,
        }
    }

    /// Number of registered tweens
    pub fn len(&self) -> usize {
        self.inner.borrow().tweens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().tweens.is_empty()
    }

    /// Check if any tween is interpolating (pending ones don't count)
    pub fn has_active(&self) -> bool {
        self.inner.borrow().tweens.values().any(|slot| match slot {
            Some(tween) => tween.phase() == TweenPhase::Active,
            None => true,
        })
    }

    /// Timestamp of the most recent tick
    pub fn now_ms(&self) -> Option<f64> {
        self.inner.borrow().now_ms
    }

    /// Number of ticks processed
    pub fn tick_count(&self) -> u64 {
        self.inner.borrow().tick_count
    }

    /// Advance every tween to `now_ms`
    ///
    /// Returns true if any tween advanced (interpolated or finished) this tick.
    pub fn tick(&self, now_ms: f64) -> bool {
        let ids: Vec<TweenId> = {
            let mut inner = self.inner.borrow_mut();
            inner.now_ms = Some(now_ms);
            inner.tick_count += 1;
            inner.tweens.keys().collect()
        };

        let mut dirty = false;

        for id in ids {
            let taken = self
                .inner
                .borrow_mut()
                .tweens
                .get_mut(id)
                .and_then(Option::take);
            // Cancelled earlier in this tick
            let Some(mut tween) = taken else {
                continue;
            };

            let outcome = tween.advance(now_ms);

            // A callback may have cancelled this very tween
            if !self.inner.borrow().tweens.contains_key(id) {
                continue;
            }

            match outcome {
                Ok(Advance::Waiting) => self.restore(id, tween),
                Ok(Advance::Updated) | Ok(Advance::Repeated) => {
                    dirty = true;
                    self.restore(id, tween);
                }
                Ok(Advance::Finished) => {
                    dirty = true;
                    self.complete(id, tween);
                }
                Err(err) => {
                    tracing::error!(
                        "Tween '{}' failed during update, finishing it early: {}",
                        tween.label(),
                        err
                    );
                    dirty = true;
                    self.complete(id, tween);
                }
            }
        }

        dirty
    }

    fn restore(&self, id: TweenId, tween: Box<dyn AnyTween>) {
        let mut inner = self.inner.borrow_mut();
        if let Some(slot) = inner.tweens.get_mut(id) {
            *slot = Some(tween);
        }
    }

    fn complete(&self, id: TweenId, tween: Box<dyn AnyTween>) {
        self.inner.borrow_mut().tweens.remove(id);
        let label = tween.label().to_owned();
        if let Err(err) = tween.finish() {
            report_completion_error(&label, &err);
        }
    }
}

fn report_completion_error(label: &str, err: &AnimationError) {
    tracing::error!("Completion callback of tween '{}' failed: {}", label, err);
}

impl Default for AnimationRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for AnimationRegistry {
    fn drop(&mut self) {
        // Drop tweens (and the closures they own) outside of the borrow
        let count = self.cancel_all();
        if count > 0 {
            tracing::debug!("AnimationRegistry dropped with {} live tweens", count);
        }
    }
}

/// A weak handle to the animation registry
///
/// Captured by callbacks that schedule follow-up tweens. It won't keep the
/// registry alive; every operation becomes a no-op once it is gone.
#[derive(Clone)]
pub struct RegistryHandle {
    inner: Weak<RefCell<RegistryInner>>,
}

impl RegistryHandle {
    /// Register a tween, or `None` if the registry is gone
    pub fn schedule<T: Interpolate>(&self, tween: Tween<T>) -> Option<TweenId> {
        self.inner
            .upgrade()
            .map(|inner| inner.borrow_mut().insert(Box::new(tween)))
    }

    /// Register a tween, failing if the registry is gone
    pub fn try_schedule<T: Interpolate>(&self, tween: Tween<T>) -> crate::Result<TweenId> {
        self.schedule(tween).ok_or(AnimationError::RegistryGone)
    }

    /// Cancel a tween without running its completion callback
    pub fn cancel(&self, id: TweenId) -> bool {
        match self.inner.upgrade() {
            Some(inner) => {
                let removed = inner.borrow_mut().tweens.remove(id);
                removed.is_some()
            }
            None => false,
        }
    }

    /// Check if a tween is still registered
    pub fn contains(&self, id: TweenId) -> bool {
        self.inner
            .upgrade()
            .map(|inner| inner.borrow().tweens.contains_key(id))
            .unwrap_or(false)
    }

    /// Timestamp of the most recent tick
    pub fn now_ms(&self) -> Option<f64> {
        self.inner.upgrade().and_then(|inner| inner.borrow().now_ms)
    }

    /// Check if the registry is still alive
    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }
}

/// Tracks the tweens scheduled by one owner
///
/// Lets a subsystem cancel its own animations on teardown without touching
/// tweens that belong to anyone else sharing the registry. Clones share the
/// same membership.
#[derive(Clone)]
pub struct TweenGroup {
    handle: RegistryHandle,
    members: Rc<RefCell<FxHashSet<TweenId>>>,
}

impl TweenGroup {
    pub fn new(handle: RegistryHandle) -> Self {
        Self {
            handle,
            members: Rc::new(RefCell::new(FxHashSet::default())),
        }
    }

    /// Schedule a tween and record it as a member
    pub fn schedule<T: Interpolate>(&self, tween: Tween<T>) -> Option<TweenId> {
        let id = self.handle.schedule(tween)?;
        let mut members = self.members.borrow_mut();
        members.retain(|member| self.handle.contains(*member));
        members.insert(id);
        Some(id)
    }

    /// Schedule a tween, failing if the registry is gone
    pub fn try_schedule<T: Interpolate>(&self, tween: Tween<T>) -> crate::Result<TweenId> {
        self.schedule(tween).ok_or(AnimationError::RegistryGone)
    }

    /// Cancel every live member; returns how many were cancelled
    pub fn cancel_all(&self) -> usize {
        let members: Vec<TweenId> = self.members.borrow_mut().drain().collect();
        members
            .into_iter()
            .filter(|id| self.handle.cancel(*id))
            .count()
    }

    /// Number of members still registered
    pub fn live_count(&self) -> usize {
        self.members
            .borrow()
            .iter()
            .filter(|id| self.handle.contains(**id))
            .count()
    }

    pub fn handle(&self) -> &RegistryHandle {
        &self.handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::easing::Easing;
    use std::cell::Cell;

    #[test]
    fn test_registry_tick() {
        let registry = AnimationRegistry::new();
        let value = Rc::new(Cell::new(0.0f32));
        let sink = Rc::clone(&value);

        registry.tick(0.0);
        let id = registry.schedule(Tween::new(0.0f32, 100.0, 1000).on_update(move |v| sink.set(*v)));
        assert!(registry.contains(id));

        assert!(registry.tick(500.0));
        assert_eq!(value.get(), 50.0);

        assert!(registry.tick(1000.0));
        assert_eq!(value.get(), 100.0);
        assert!(!registry.contains(id));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_first_tick_anchors_early_schedules() {
        let registry = AnimationRegistry::new();
        let value = Rc::new(Cell::new(-1.0f32));
        let sink = Rc::clone(&value);
        registry.schedule(Tween::new(0.0f32, 10.0, 100).on_update(move |v| sink.set(*v)));

        // Anchored at 5000, not at 0
        registry.tick(5000.0);
        assert_eq!(value.get(), 0.0);
        registry.tick(5050.0);
        assert_eq!(value.get(), 5.0);
    }

    #[test]
    fn test_repeat_fires_completion_once() {
        let registry = AnimationRegistry::new();
        let plays = Rc::new(Cell::new(0));
        let completions = Rc::new(Cell::new(0));
        let p = Rc::clone(&plays);
        let c = Rc::clone(&completions);

        registry.tick(0.0);
        registry.schedule(
            Tween::new(0.0f32, 1.0, 100)
                .repeat(2)
                .on_update(move |v| {
                    if *v == 1.0 {
                        p.set(p.get() + 1);
                    }
                })
                .on_complete(move || c.set(c.get() + 1)),
        );

        let mut now = 0.0;
        while now <= 1000.0 {
            now += 25.0;
            registry.tick(now);
        }

        assert_eq!(plays.get(), 3);
        assert_eq!(completions.get(), 1);
    }

    #[test]
    fn test_monotonic_values_with_easing() {
        let registry = AnimationRegistry::new();
        let samples = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&samples);

        registry.tick(0.0);
        registry.schedule(
            Tween::new(3.0f32, -7.0, 400)
                .easing(Easing::EaseInOutCubic)
                .on_update(move |v| sink.borrow_mut().push(*v)),
        );
        for step in 0..=40 {
            registry.tick(step as f64 * 10.0);
        }

        let samples = samples.borrow();
        assert_eq!(samples.first().copied(), Some(3.0));
        assert_eq!(samples.last().copied(), Some(-7.0));
        assert!(samples.windows(2).all(|w| w[1] <= w[0]));
    }

    #[test]
    fn test_chained_tween_starts_next_tick() {
        let registry = AnimationRegistry::new();
        let handle = registry.handle();
        let second_values = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&second_values);

        registry.tick(0.0);
        registry.schedule(Tween::new(0.0f32, 1.0, 100).on_complete(move || {
            let sink = Rc::clone(&sink);
            handle.schedule(
                Tween::new(10.0f32, 20.0, 100).on_update(move |v| sink.borrow_mut().push(*v)),
            );
        }));

        registry.tick(100.0);
        // Follow-up was scheduled during this tick but has not advanced yet
        assert!(second_values.borrow().is_empty());
        assert_eq!(registry.len(), 1);

        // Anchored at the completing tick's timestamp
        registry.tick(150.0);
        assert_eq!(second_values.borrow().as_slice(), &[15.0]);
    }

    #[test]
    fn test_cancel_skips_completion() {
        let registry = AnimationRegistry::new();
        let completed = Rc::new(Cell::new(false));
        let flag = Rc::clone(&completed);

        let id = registry.schedule(Tween::new(0.0f32, 1.0, 100).on_complete(move || flag.set(true)));
        assert!(registry.cancel(id));
        assert!(!registry.cancel(id));

        registry.tick(0.0);
        registry.tick(200.0);
        assert!(!completed.get());
    }

    #[test]
    fn test_cancel_from_sibling_callback() {
        let registry = AnimationRegistry::new();
        let handle = registry.handle();
        let victim_ran = Rc::new(Cell::new(false));
        let flag = Rc::clone(&victim_ran);

        registry.tick(0.0);
        let victim = Rc::new(Cell::new(None));
        let victim_slot = Rc::clone(&victim);
        registry.schedule(Tween::new(0.0f32, 1.0, 0).on_complete(move || {
            if let Some(id) = victim_slot.get() {
                handle.cancel(id);
            }
        }));
        victim.set(Some(registry.schedule(
            Tween::new(0.0f32, 1.0, 0).on_update(move |_| flag.set(true)),
        )));

        registry.tick(10.0);
        // Slot-map order is insertion order here: the canceller runs first
        assert!(!victim_ran.get());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_failing_update_is_isolated() {
        let registry = AnimationRegistry::new();
        let completed = Rc::new(Cell::new(false));
        let healthy = Rc::new(Cell::new(0.0f32));
        let flag = Rc::clone(&completed);
        let sink = Rc::clone(&healthy);

        registry.tick(0.0);
        registry.schedule(
            Tween::new(0.0f32, 1.0, 100)
                .label("broken")
                .try_on_update(|_| Err(AnimationError::Other("boom".into())))
                .on_complete(move || flag.set(true)),
        );
        registry.schedule(Tween::new(0.0f32, 1.0, 100).on_update(move |v| sink.set(*v)));

        assert!(registry.tick(50.0));
        assert!(completed.get());
        assert_eq!(healthy.get(), 0.5);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_pending_tween_is_not_dirty() {
        let registry = AnimationRegistry::new();
        registry.tick(0.0);
        registry.schedule(Tween::new(0.0f32, 1.0, 100).delay(500));

        assert!(!registry.tick(100.0));
        assert!(!registry.has_active());
        assert!(registry.tick(500.0));
        assert!(registry.has_active());
    }

    #[test]
    fn test_handle_weak_reference() {
        let handle = {
            let registry = AnimationRegistry::new();
            registry.handle()
        };

        assert!(!handle.is_alive());
        assert!(handle.schedule(Tween::new(0.0f32, 1.0, 10)).is_none());
        assert!(matches!(
            handle.try_schedule(Tween::new(0.0f32, 1.0, 10)),
            Err(AnimationError::RegistryGone)
        ));
    }

    #[test]
    fn test_group_cancels_only_members() {
        let registry = AnimationRegistry::new();
        let group = TweenGroup::new(registry.handle());

        let outsider = registry.schedule(Tween::new(0.0f32, 1.0, 100));
        group.schedule(Tween::new(0.0f32, 1.0, 100));
        group.schedule(Tween::new(0.0f32, 1.0, 100));
        assert_eq!(group.live_count(), 2);

        assert_eq!(group.cancel_all(), 2);
        assert_eq!(group.live_count(), 0);
        assert!(registry.contains(outsider));
    }
}
