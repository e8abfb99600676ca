//! Step scheduler for a virtual machine's simulation tick.
//!
//! The scheduler decides *when* the engine steps and when it renders an
//! interpolated frame; the engine decides *what* those do. Three timing
//! regimes are supported:
//!
//! | target rate | interpolation | step source        | interpolation source |
//! |-------------|---------------|--------------------|----------------------|
//! | `0`         | any           | display sync       | none                 |
//! | `> 0`       | off           | timer, `1000/rate` | none                 |
//! | `> 0`       | on            | timer, `1000/rate` | display sync         |
//!
//! Everything runs on one logical thread: the host primitives deliver
//! callbacks on the thread that calls the scheduler API, and the scheduler is
//! deliberately `!Send`.

pub mod config;
mod error;
pub mod mode;
mod scheduler;
mod snapshot;
mod state;

pub use crate::config::{tick_interval_ms, validate_rate, SchedulerConfig, DEFAULT_TARGET_RATE};
pub use crate::error::{SchedulerError, SchedulerResult};
pub use crate::mode::{StepMode, StepSource};
pub use crate::scheduler::StepScheduler;
pub use crate::snapshot::SchedulerSnapshot;
pub use crate::state::SchedulerState;

pub use host_abi::{
    Callback, CancelHandle, DisplaySync, PeriodicTimer, StepTarget, TickInterval,
    FALLBACK_TICK_INTERVAL_MS,
};
