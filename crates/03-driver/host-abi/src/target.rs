//! Engine-side contract consumed by the step scheduler.

use std::cell::Cell;
use std::rc::Rc;

/// Tick interval published while the scheduler is tied to the display.
///
/// Engines still need a nominal elapsed time per tick for physics and timer
/// math when stepping once per refresh, so this assumes a 60 Hz display.
pub const FALLBACK_TICK_INTERVAL_MS: f64 = 1000.0 / 60.0;

/// Shared milliseconds-per-tick field owned by the engine.
///
/// The engine reads it for its own elapsed-time bookkeeping; the scheduler
/// writes it on every rate change. Clones share the same cell.
#[derive(Clone, Debug)]
pub struct TickInterval(Rc<Cell<f64>>);

impl TickInterval {
    /// Creates a field initialised to `ms`.
    pub fn new(ms: f64) -> Self {
        Self(Rc::new(Cell::new(ms)))
    }

    /// Current milliseconds per tick.
    pub fn get(&self) -> f64 {
        self.0.get()
    }

    /// Publishes a new milliseconds-per-tick value.
    pub fn set(&self, ms: f64) {
        self.0.set(ms);
    }
}

impl Default for TickInterval {
    fn default() -> Self {
        Self::new(FALLBACK_TICK_INTERVAL_MS)
    }
}

/// The simulation engine driven by the scheduler.
///
/// The scheduler decides only *when* these run. Panics raised inside either
/// callback are not caught; they propagate to the host.
pub trait StepTarget {
    /// Advances the simulation by one logical tick.
    fn step(&mut self);

    /// Renders an estimate of the world between the last tick and the next.
    fn render_interpolated(&mut self);

    /// Returns the engine's shared tick interval field.
    fn tick_interval(&self) -> TickInterval;
}
