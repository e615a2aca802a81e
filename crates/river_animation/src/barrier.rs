//! Counted join barrier
//!
//! Gates a phase transition on the completion of a group of tweens.
//! Participants are announced with [`JoinBarrier::expect`], the barrier is
//! [sealed](JoinBarrier::seal) once every participant is known, and each
//! participant calls [`JoinBarrier::arrive`] from its completion callback.
//! The release callback runs exactly once, on the arrival that brings the
//! outstanding count to zero after sealing.

use crate::error::{AnimationError, Result};
use std::cell::RefCell;
use std::rc::Rc;

type ReleaseFn = Box<dyn FnOnce() -> Result<()>>;

struct BarrierInner {
    name: String,
    expected: usize,
    arrived: usize,
    sealed: bool,
    on_release: Option<ReleaseFn>,
}

impl BarrierInner {
    fn ready(&self) -> bool {
        self.sealed && self.arrived >= self.expected
    }
}

/// Join barrier over a group of completions
///
/// Clones share the same counters.
#[derive(Clone)]
pub struct JoinBarrier {
    inner: Rc<RefCell<BarrierInner>>,
}

impl JoinBarrier {
    /// Create an unsealed barrier with no participants
    pub fn new<F>(name: impl Into<String>, on_release: F) -> Self
    where
        F: FnOnce() -> Result<()> + 'static,
    {
        Self {
            inner: Rc::new(RefCell::new(BarrierInner {
                name: name.into(),
                expected: 0,
                arrived: 0,
                sealed: false,
                on_release: Some(Box::new(on_release)),
            })),
        }
    }

    /// Announce `count` more participants
    pub fn expect(&self, count: usize) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        if inner.sealed {
            return Err(AnimationError::Other(format!(
                "Barrier '{}' is sealed; cannot add participants",
                inner.name
            )));
        }
        inner.expected += count;
        Ok(())
    }

    /// Stop accepting participants; releases immediately if all already arrived
    pub fn seal(&self) -> Result<()> {
        let release = {
            let mut inner = self.inner.borrow_mut();
            inner.sealed = true;
            if inner.ready() {
                inner.on_release.take()
            } else {
                None
            }
        };
        self.run(release)
    }

    /// Record one participant's completion
    ///
    /// Returns `true` if this arrival released the barrier.
    pub fn arrive(&self) -> Result<bool> {
        let release = {
            let mut inner = self.inner.borrow_mut();
            if inner.on_release.is_none() {
                return Err(AnimationError::BarrierReleased(inner.name.clone()));
            }
            inner.arrived += 1;
            if inner.ready() {
                inner.on_release.take()
            } else {
                None
            }
        };
        let released = release.is_some();
        self.run(release)?;
        Ok(released)
    }

    fn run(&self, release: Option<ReleaseFn>) -> Result<()> {
        match release {
            Some(release) => {
                tracing::debug!("Barrier '{}' released", self.name());
                release()
            }
            None => Ok(()),
        }
    }

    /// Participants still outstanding
    pub fn remaining(&self) -> usize {
        let inner = self.inner.borrow();
        inner.expected.saturating_sub(inner.arrived)
    }

    pub fn is_released(&self) -> bool {
        self.inner.borrow().on_release.is_none()
    }

    pub fn is_sealed(&self) -> bool {
        self.inner.borrow().sealed
    }

    pub fn name(&self) -> String {
        self.inner.borrow().name.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn counting_barrier(name: &str) -> (JoinBarrier, Rc<Cell<u32>>) {
        let releases = Rc::new(Cell::new(0));
        let counter = Rc::clone(&releases);
        let barrier = JoinBarrier::new(name, move || {
            counter.set(counter.get() + 1);
            Ok(())
        });
        (barrier, releases)
    }

    #[test]
    fn test_releases_on_last_arrival() {
        let (barrier, releases) = counting_barrier("flow");
        barrier.expect(3).unwrap();
        barrier.seal().unwrap();

        assert!(!barrier.arrive().unwrap());
        assert!(!barrier.arrive().unwrap());
        assert_eq!(barrier.remaining(), 1);
        assert!(barrier.arrive().unwrap());
        assert_eq!(releases.get(), 1);
        assert!(barrier.is_released());
    }

    #[test]
    fn test_unsealed_barrier_waits() {
        let (barrier, releases) = counting_barrier("camera");
        barrier.expect(1).unwrap();
        barrier.arrive().unwrap();
        assert_eq!(releases.get(), 0);

        barrier.seal().unwrap();
        assert_eq!(releases.get(), 1);
    }

    #[test]
    fn test_empty_barrier_releases_on_seal() {
        let (barrier, releases) = counting_barrier("recycle");
        barrier.seal().unwrap();
        assert_eq!(releases.get(), 1);
    }

    #[test]
    fn test_arrival_after_release_is_an_error() {
        let (barrier, _) = counting_barrier("late");
        barrier.expect(1).unwrap();
        barrier.seal().unwrap();
        barrier.arrive().unwrap();
        assert!(matches!(
            barrier.arrive(),
            Err(AnimationError::BarrierReleased(_))
        ));
    }

    #[test]
    fn test_sealed_barrier_rejects_participants() {
        let (barrier, _) = counting_barrier("sealed");
        barrier.expect(1).unwrap();
        barrier.seal().unwrap();
        assert!(barrier.expect(1).is_err());
    }
}
