#![deny(missing_docs)]
//! Host capability types shared between the step scheduler and host runtimes.
//!
//! This crate defines the boundary between the scheduler (layer 05) and the
//! host environments that deliver timing signals (layer 02), with no
//! scheduler or platform dependencies. Everything here is single-threaded:
//! callbacks are reference counted with [`Rc`] and are never sent across
//! threads.

mod handle;
mod target;

pub use handle::CancelHandle;
pub use target::{StepTarget, TickInterval, FALLBACK_TICK_INTERVAL_MS};

use std::rc::Rc;

/// Shared callback invoked by a scheduling primitive.
///
/// The scheduler builds its callbacks once and hands out clones of the same
/// `Rc` on every subscription, so callback identity survives restarts.
pub type Callback = Rc<dyn Fn()>;

/// Display-refresh scheduling primitive.
///
/// Invokes `callback` once per display refresh until the returned handle is
/// cancelled. Implementations resubmit themselves after every invocation.
pub trait DisplaySync {
    /// Subscribes `callback` to every subsequent display refresh.
    fn schedule(&self, callback: Callback) -> CancelHandle;
}

/// Fixed-interval scheduling primitive.
///
/// Invokes `callback` every `interval_ms` milliseconds until the returned
/// handle is cancelled. Invocations never overlap.
pub trait PeriodicTimer {
    /// Subscribes `callback` to a repeating timer with the given interval.
    fn schedule(&self, callback: Callback, interval_ms: f64) -> CancelHandle;
}

impl<T: DisplaySync + ?Sized> DisplaySync for Rc<T> {
    fn schedule(&self, callback: Callback) -> CancelHandle {
        (**self).schedule(callback)
    }
}

impl<T: PeriodicTimer + ?Sized> PeriodicTimer for Rc<T> {
    fn schedule(&self, callback: Callback, interval_ms: f64) -> CancelHandle {
        (**self).schedule(callback, interval_ms)
    }
}
