//! River Animation System
//!
//! Timed interpolation tasks and the frame-driven machinery that advances them.
//!
//! # Features
//!
//! - **Tweens**: from/to interpolation with delay, easing, repeats and callbacks
//! - **Registry**: explicitly owned set of live tweens, advanced once per tick
//! - **Groups**: per-owner tracking so a subsystem can cancel only its own tweens
//! - **Join Barriers**: counted completion gates for phase orchestration
//! - **Bounded Convergence**: animated scalars clamped into a closed range
//! - **Frame Clock**: one tick per display refresh with a render-on-demand flag
//!
//! Everything here is single-threaded. Shared state lives in `Rc<RefCell<_>>`
//! and callbacks hold weak handles, so nothing outlives its owner.

pub mod barrier;
pub mod clock;
pub mod convergence;
pub mod easing;
pub mod error;
pub mod registry;
pub mod tween;
pub mod values;

pub use barrier::JoinBarrier;
pub use clock::{ClockSource, FrameClock, ManualClock, MonotonicClock};
pub use convergence::BoundedConvergence;
pub use easing::Easing;
pub use error::{AnimationError, Result};
pub use registry::{AnimationRegistry, RegistryHandle, TweenGroup, TweenId};
pub use tween::{Tween, TweenPhase};
pub use values::Interpolate;
