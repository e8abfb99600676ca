//! Browser entry points for the VM step scheduler.
//!
//! The page hands over an engine object exposing `step()`,
//! `renderInterpolated()` and a writable `tickIntervalMs` property, then
//! drives the scheduler through the `vm_*` exports. Scheduling runs on
//! `requestAnimationFrame` and `setInterval`.

#![allow(missing_docs)]

mod binding;
#[cfg(target_arch = "wasm32")]
mod ui;

#[cfg(target_arch = "wasm32")]
pub use ui::{
    vm_running, vm_scheduler_init, vm_set_interpolation, vm_set_target_rate, vm_snapshot,
    vm_start, vm_stop, vm_tick_interval_ms,
};
