//! Single-threaded cooperative event loop for native hosts.
//!
//! Timers and display refreshes are processed strictly in time order on the
//! thread that owns the loop. No internal borrow is held while a callback
//! runs, so callbacks may subscribe or cancel freely, including cancelling
//! themselves or a sibling due in the same batch.

use std::cell::RefCell;
use std::ops::ControlFlow;
use std::rc::{Rc, Weak};
use std::time::{Duration, Instant};

use host_abi::{Callback, CancelHandle, DisplaySync, PeriodicTimer};
use log::{debug, trace, warn};
use smallvec::SmallVec;

use crate::mailbox::Mailbox;

/// Refresh rate used by [`HostLoop::default`].
pub const DEFAULT_REFRESH_HZ: f64 = 60.0;

/// Shortest timer period the loop honours, matching browser clamping.
pub const MIN_TIMER_INTERVAL_MS: f64 = 1.0;

const TIME_EPSILON_MS: f64 = 1e-6;

#[derive(Clone, Copy, Debug)]
enum Clock {
    Virtual,
    Wall(Instant),
}

/// How a [`HostLoop::run_for`] call ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    /// The requested duration elapsed.
    Elapsed,
    /// A message handler asked the loop to stop early.
    Interrupted,
}

struct TimerEntry {
    id: u64,
    interval_ms: f64,
    origin_ms: f64,
    /// Index of the next period to fire; due at `origin + period * interval`.
    period: u64,
    callback: Callback,
}

impl TimerEntry {
    fn due_ms(&self) -> f64 {
        self.origin_ms + self.period as f64 * self.interval_ms
    }

    /// Moves to the first period strictly after `now`, skipping missed ones.
    fn advance_past(&mut self, now_ms: f64) {
        let elapsed = ((now_ms - self.origin_ms) / self.interval_ms + TIME_EPSILON_MS).floor();
        let next = if elapsed.is_finite() && elapsed >= 0.0 {
            elapsed as u64 + 1
        } else {
            self.period + 1
        };
        self.period = next.max(self.period + 1);
    }
}

struct DisplayEntry {
    id: u64,
    /// First refresh this subscription takes part in.
    first_refresh: u64,
    callback: Callback,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum BatchKind {
    Timers,
    Refresh,
}

struct Batch {
    kind: BatchKind,
    due: SmallVec<[(u64, Callback); 4]>,
}

struct LoopState {
    now_ms: f64,
    next_id: u64,
    timers: Vec<TimerEntry>,
    displays: Vec<DisplayEntry>,
    refresh_interval_ms: f64,
    refresh_period: u64,
    refreshes: u64,
}

impl LoopState {
    fn new(refresh_interval_ms: f64) -> Self {
        Self {
            now_ms: 0.0,
            next_id: 0,
            timers: Vec::new(),
            displays: Vec::new(),
            refresh_interval_ms,
            refresh_period: 1,
            refreshes: 0,
        }
    }

    fn alloc_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn next_refresh_ms(&self) -> f64 {
        self.refresh_period as f64 * self.refresh_interval_ms
    }

    fn next_timer_ms(&self) -> Option<f64> {
        self.timers
            .iter()
            .map(TimerEntry::due_ms)
            .min_by(|a, b| a.total_cmp(b))
    }

    fn next_event_ms(&self) -> f64 {
        let refresh = self.next_refresh_ms();
        match self.next_timer_ms() {
            Some(timer) => timer.min(refresh),
            None => refresh,
        }
    }

    /// Collects the batch due at `now_ms`. Timers win ties with the refresh.
    fn collect_due(&mut self, now_ms: f64) -> Batch {
        let mut due = SmallVec::new();
        for timer in &mut self.timers {
            if timer.due_ms() <= now_ms + TIME_EPSILON_MS {
                timer.advance_past(now_ms);
                due.push((timer.id, Rc::clone(&timer.callback)));
            }
        }
        if !due.is_empty() {
            return Batch {
                kind: BatchKind::Timers,
                due,
            };
        }

        self.refreshes += 1;
        let elapsed = (now_ms / self.refresh_interval_ms + TIME_EPSILON_MS).floor();
        self.refresh_period = (elapsed.max(0.0) as u64 + 1).max(self.refresh_period + 1);
        let refresh = self.refreshes;
        for entry in &self.displays {
            if entry.first_refresh <= refresh {
                due.push((entry.id, Rc::clone(&entry.callback)));
            }
        }
        Batch {
            kind: BatchKind::Refresh,
            due,
        }
    }

    fn is_live(&self, kind: BatchKind, id: u64) -> bool {
        match kind {
            BatchKind::Timers => self.timers.iter().any(|timer| timer.id == id),
            BatchKind::Refresh => self.displays.iter().any(|entry| entry.id == id),
        }
    }

    fn remove_timer(&mut self, id: u64) -> Option<TimerEntry> {
        let idx = self.timers.iter().position(|timer| timer.id == id)?;
        Some(self.timers.remove(idx))
    }

    fn remove_display(&mut self, id: u64) -> Option<DisplayEntry> {
        let idx = self.displays.iter().position(|entry| entry.id == id)?;
        Some(self.displays.remove(idx))
    }
}

/// Cooperative host loop providing both scheduling primitives.
///
/// Clones share the same loop. A virtual-time loop only moves when
/// [`advance`](Self::advance) or [`run_for`](Self::run_for) is called, which
/// makes it a deterministic stand-in for a real display and timer. A
/// wall-clock loop follows [`Instant`] and skips periods it fell behind on
/// instead of bursting to catch up.
#[derive(Clone)]
pub struct HostLoop {
    state: Rc<RefCell<LoopState>>,
    clock: Clock,
}

impl HostLoop {
    /// Creates a deterministic loop starting at time zero.
    pub fn virtual_time(refresh_hz: f64) -> Self {
        Self::with_clock(refresh_hz, Clock::Virtual)
    }

    /// Creates a loop that follows the system monotonic clock.
    pub fn wall_clock(refresh_hz: f64) -> Self {
        Self::with_clock(refresh_hz, Clock::Wall(Instant::now()))
    }

    fn with_clock(refresh_hz: f64, clock: Clock) -> Self {
        let refresh_hz = if refresh_hz.is_finite() && refresh_hz > 0.0 {
            refresh_hz
        } else {
            warn!("invalid refresh rate {refresh_hz}; using {DEFAULT_REFRESH_HZ} Hz");
            DEFAULT_REFRESH_HZ
        };
        Self {
            state: Rc::new(RefCell::new(LoopState::new(1000.0 / refresh_hz))),
            clock,
        }
    }

    /// Returns `true` for loops driven by [`advance`](Self::advance).
    pub fn is_virtual(&self) -> bool {
        matches!(self.clock, Clock::Virtual)
    }

    /// Current loop time in milliseconds since creation.
    pub fn now_ms(&self) -> f64 {
        match self.clock {
            Clock::Virtual => self.state.borrow().now_ms,
            Clock::Wall(origin) => origin.elapsed().as_secs_f64() * 1000.0,
        }
    }

    /// Milliseconds between display refreshes.
    pub fn refresh_interval_ms(&self) -> f64 {
        self.state.borrow().refresh_interval_ms
    }

    /// Number of display refreshes processed so far.
    pub fn refreshes(&self) -> u64 {
        self.state.borrow().refreshes
    }

    /// Number of timers that have not been cancelled.
    pub fn live_timers(&self) -> usize {
        self.state.borrow().timers.len()
    }

    /// Number of display subscriptions that have not been cancelled.
    pub fn live_display_subscriptions(&self) -> usize {
        self.state.borrow().displays.len()
    }

    /// Moves virtual time forward by `ms`, running everything that falls due.
    ///
    /// Returns the number of callbacks invoked. Wall-clock loops cannot be
    /// advanced manually and return `0`.
    pub fn advance(&self, ms: f64) -> usize {
        if !self.is_virtual() {
            warn!("advance({ms}) ignored on a wall-clock loop");
            return 0;
        }
        let target = self.state.borrow().now_ms + ms.max(0.0);
        self.run_until(target)
    }

    /// Runs the loop for `duration`, dispatching mailbox messages on this
    /// thread between event batches.
    ///
    /// Virtual loops complete instantly; wall-clock loops sleep until the
    /// next deadline or message. Returning [`ControlFlow::Break`] from
    /// `on_message` ends the run early.
    pub fn run_for<M>(
        &self,
        mailbox: &Mailbox<M>,
        duration: Duration,
        mut on_message: impl FnMut(M) -> ControlFlow<()>,
    ) -> RunOutcome {
        let deadline = self.now_ms() + duration.as_secs_f64() * 1000.0;
        loop {
            for msg in mailbox.drain() {
                if on_message(msg).is_break() {
                    debug!("host loop interrupted at {:.2} ms", self.now_ms());
                    return RunOutcome::Interrupted;
                }
            }

            let next = self.state.borrow().next_event_ms().min(deadline);
            match self.clock {
                Clock::Virtual => {
                    self.run_until(next);
                }
                Clock::Wall(_) => {
                    let now = self.now_ms();
                    if next > now {
                        mailbox.wait_timeout(Duration::from_secs_f64((next - now) / 1000.0));
                    }
                    self.run_until(self.now_ms().min(deadline));
                }
            }

            if self.now_ms() + TIME_EPSILON_MS >= deadline {
                return RunOutcome::Elapsed;
            }
        }
    }

    fn run_until(&self, target_ms: f64) -> usize {
        let mut invoked = 0;
        loop {
            let batch = {
                let mut state = self.state.borrow_mut();
                let at = state.next_event_ms();
                if at > target_ms + TIME_EPSILON_MS {
                    break;
                }
                let now = match self.clock {
                    Clock::Virtual => at.max(state.now_ms),
                    Clock::Wall(_) => target_ms,
                };
                state.now_ms = now;
                state.collect_due(now)
            };
            invoked += self.dispatch(batch);
        }

        let mut state = self.state.borrow_mut();
        if target_ms > state.now_ms {
            state.now_ms = target_ms;
        }
        invoked
    }

    fn dispatch(&self, batch: Batch) -> usize {
        trace!(
            "host loop {:?} batch: {} due at {:.3} ms",
            batch.kind,
            batch.due.len(),
            self.state.borrow().now_ms
        );
        let mut invoked = 0;
        for (id, callback) in batch.due {
            let live = self.state.borrow().is_live(batch.kind, id);
            if live {
                callback();
                invoked += 1;
            }
        }
        invoked
    }

    fn downgrade(&self) -> Weak<RefCell<LoopState>> {
        Rc::downgrade(&self.state)
    }
}

impl Default for HostLoop {
    fn default() -> Self {
        Self::virtual_time(DEFAULT_REFRESH_HZ)
    }
}

impl DisplaySync for HostLoop {
    fn schedule(&self, callback: Callback) -> CancelHandle {
        let id = {
            let mut state = self.state.borrow_mut();
            let id = state.alloc_id();
            let first_refresh = state.refreshes + 1;
            state.displays.push(DisplayEntry {
                id,
                first_refresh,
                callback,
            });
            id
        };
        debug!("display subscription {id} registered");

        let state = self.downgrade();
        CancelHandle::new(move || {
            if let Some(state) = state.upgrade() {
                let removed = state.borrow_mut().remove_display(id);
                if removed.is_some() {
                    debug!("display subscription {id} cancelled");
                }
            }
        })
    }
}

impl PeriodicTimer for HostLoop {
    fn schedule(&self, callback: Callback, interval_ms: f64) -> CancelHandle {
        let interval_ms = interval_ms.max(MIN_TIMER_INTERVAL_MS);
        let origin_ms = self.now_ms();
        let id = {
            let mut state = self.state.borrow_mut();
            let id = state.alloc_id();
            state.timers.push(TimerEntry {
                id,
                interval_ms,
                origin_ms,
                period: 1,
                callback,
            });
            id
        };
        debug!("timer {id} registered every {interval_ms:.3} ms");

        let state = self.downgrade();
        CancelHandle::new(move || {
            if let Some(state) = state.upgrade() {
                let removed = state.borrow_mut().remove_timer(id);
                if removed.is_some() {
                    debug!("timer {id} cancelled");
                }
            }
        })
    }
}
