//! Deterministic host primitives and engines for scheduler tests.
//!
//! [`RecordingHost`] implements both [`DisplaySync`] and [`PeriodicTimer`]
//! without any clock. It records every subscription so tests can assert on
//! the exact set of live sources, and fires callbacks only when asked.

use host_abi::{Callback, CancelHandle, DisplaySync, PeriodicTimer, StepTarget, TickInterval};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Which primitive a subscription was made through.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceKind {
    DisplaySync,
    Timer,
}

/// Subscribe and cancel actions in the order the host saw them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HostEvent {
    Subscribed(u64),
    Cancelled(u64),
}

/// Recorded view of one subscription.
#[derive(Clone)]
pub struct Subscription {
    /// Monotonic subscription id, starting at 0.
    pub id: u64,
    pub kind: SourceKind,
    /// Timer period; `None` for display-sync subscriptions.
    pub interval_ms: Option<f64>,
    /// The exact callback handed to the primitive.
    pub callback: Callback,
    pub cancelled: bool,
    /// How many times the release action ran.
    pub cancel_calls: u32,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("interval_ms", &self.interval_ms)
            .field("cancelled", &self.cancelled)
            .field("cancel_calls", &self.cancel_calls)
            .finish()
    }
}

#[derive(Default)]
struct Recorder {
    next_id: u64,
    subscriptions: Vec<Subscription>,
    events: Vec<HostEvent>,
}

/// Clock-free fake for both scheduling primitives.
///
/// Clones share the same recording.
#[derive(Clone, Default)]
pub struct RecordingHost {
    inner: Rc<RefCell<Recorder>>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every subscription ever made, in order.
    pub fn subscriptions(&self) -> Vec<Subscription> {
        self.inner.borrow().subscriptions.clone()
    }

    /// Subscriptions that have not been cancelled.
    pub fn live(&self) -> Vec<Subscription> {
        self.inner
            .borrow()
            .subscriptions
            .iter()
            .filter(|sub| !sub.cancelled)
            .cloned()
            .collect()
    }

    pub fn live_count(&self, kind: SourceKind) -> usize {
        self.live().iter().filter(|sub| sub.kind == kind).count()
    }

    /// Periods of the live timers, in subscription order.
    pub fn live_timer_intervals(&self) -> Vec<f64> {
        self.live()
            .iter()
            .filter_map(|sub| sub.interval_ms)
            .collect()
    }

    /// Every subscribe and cancel, in order.
    pub fn events(&self) -> Vec<HostEvent> {
        self.inner.borrow().events.clone()
    }

    pub fn total_subscriptions(&self) -> usize {
        self.inner.borrow().subscriptions.len()
    }

    /// Invokes every live display-sync callback once, as one refresh would.
    ///
    /// Returns the number of callbacks invoked.
    pub fn fire_display(&self) -> usize {
        self.fire(SourceKind::DisplaySync)
    }

    /// Invokes every live timer callback once. Returns the number invoked.
    pub fn fire_timers(&self) -> usize {
        self.fire(SourceKind::Timer)
    }

    fn fire(&self, kind: SourceKind) -> usize {
        let due: Vec<(u64, Callback)> = self
            .live()
            .into_iter()
            .filter(|sub| sub.kind == kind)
            .map(|sub| (sub.id, sub.callback))
            .collect();

        let mut fired = 0;
        for (id, callback) in due {
            // A callback earlier in the batch may have cancelled this one.
            if self.is_live(id) {
                callback();
                fired += 1;
            }
        }
        fired
    }

    fn is_live(&self, id: u64) -> bool {
        self.inner
            .borrow()
            .subscriptions
            .iter()
            .any(|sub| sub.id == id && !sub.cancelled)
    }

    fn record(
        &self,
        kind: SourceKind,
        callback: Callback,
        interval_ms: Option<f64>,
    ) -> CancelHandle {
        let id = {
            let mut inner = self.inner.borrow_mut();
            let id = inner.next_id;
            inner.next_id += 1;
            inner.subscriptions.push(Subscription {
                id,
                kind,
                interval_ms,
                callback,
                cancelled: false,
                cancel_calls: 0,
            });
            inner.events.push(HostEvent::Subscribed(id));
            id
        };

        let recorder = Rc::downgrade(&self.inner);
        CancelHandle::new(move || {
            if let Some(recorder) = recorder.upgrade() {
                let mut inner = recorder.borrow_mut();
                if let Some(sub) = inner.subscriptions.iter_mut().find(|sub| sub.id == id) {
                    sub.cancelled = true;
                    sub.cancel_calls += 1;
                }
                inner.events.push(HostEvent::Cancelled(id));
            }
        })
    }
}

impl DisplaySync for RecordingHost {
    fn schedule(&self, callback: Callback) -> CancelHandle {
        self.record(SourceKind::DisplaySync, callback, None)
    }
}

impl PeriodicTimer for RecordingHost {
    fn schedule(&self, callback: Callback, interval_ms: f64) -> CancelHandle {
        self.record(SourceKind::Timer, callback, Some(interval_ms))
    }
}

/// One engine callback, in invocation order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineEvent {
    Step,
    Render,
}

/// Engine that only counts what the scheduler asks of it.
#[derive(Debug, Default)]
pub struct CountingEngine {
    pub steps: u64,
    pub renders: u64,
    pub events: Vec<EngineEvent>,
    tick_interval: TickInterval,
}

impl CountingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience constructor for the `Rc<RefCell<_>>` the scheduler binds to.
    pub fn shared() -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self::new()))
    }

    /// Milliseconds per tick most recently published by the scheduler.
    pub fn tick_interval_ms(&self) -> f64 {
        self.tick_interval.get()
    }
}

impl StepTarget for CountingEngine {
    fn step(&mut self) {
        self.steps += 1;
        self.events.push(EngineEvent::Step);
    }

    fn render_interpolated(&mut self) {
        self.renders += 1;
        self.events.push(EngineEvent::Render);
    }

    fn tick_interval(&self) -> TickInterval {
        self.tick_interval.clone()
    }
}
