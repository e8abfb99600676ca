//! Lifecycle state and handle bookkeeping owned by the scheduler.

use host_abi::CancelHandle;

/// Running flag plus the live subscription handles.
///
/// A slot is always emptied and its handle cancelled before a new handle is
/// installed, so at most one subscription per role is ever live.
#[derive(Debug)]
pub struct SchedulerState {
    running: bool,
    step_handle: Option<CancelHandle>,
    interpolation_handle: Option<CancelHandle>,
    tick_interval_ms: f64,
}

impl SchedulerState {
    pub(crate) fn new(tick_interval_ms: f64) -> Self {
        Self {
            running: false,
            step_handle: None,
            interpolation_handle: None,
            tick_interval_ms,
        }
    }

    pub fn running(&self) -> bool {
        self.running
    }

    pub fn tick_interval_ms(&self) -> f64 {
        self.tick_interval_ms
    }

    /// Whether a step subscription is currently held.
    pub fn step_source_live(&self) -> bool {
        self.step_handle.is_some()
    }

    /// Whether an interpolation subscription is currently held.
    pub fn interpolation_source_live(&self) -> bool {
        self.interpolation_handle.is_some()
    }

    pub(crate) fn set_running(&mut self, running: bool) {
        self.running = running;
    }

    pub(crate) fn set_tick_interval_ms(&mut self, ms: f64) {
        self.tick_interval_ms = ms;
    }

    /// Stores the step handle. The slot must already be empty.
    pub(crate) fn install_step(&mut self, handle: CancelHandle) {
        debug_assert!(self.step_handle.is_none(), "step handle still live");
        install(&mut self.step_handle, handle);
    }

    /// Stores the interpolation handle. The slot must already be empty.
    pub(crate) fn install_interpolation(&mut self, handle: CancelHandle) {
        debug_assert!(
            self.interpolation_handle.is_none(),
            "interpolation handle still live"
        );
        install(&mut self.interpolation_handle, handle);
    }

    /// Cancels and clears both handles.
    pub(crate) fn cancel_all(&mut self) {
        if let Some(mut handle) = self.step_handle.take() {
            handle.cancel();
        }
        if let Some(mut handle) = self.interpolation_handle.take() {
            handle.cancel();
        }
    }
}

fn install(slot: &mut Option<CancelHandle>, handle: CancelHandle) {
    if let Some(mut old) = slot.replace(handle) {
        old.cancel();
    }
}
