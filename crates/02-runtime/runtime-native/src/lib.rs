#![deny(missing_docs)]
//! Native host runtime shared by integration tests and demos.
//!
//! Provides a cooperative [`HostLoop`] that implements both scheduling
//! primitives from `host-abi` on a single thread, and a [`Mailbox`] through
//! which other threads hand work to that thread.

mod host_loop;
mod mailbox;

pub use host_loop::{HostLoop, RunOutcome, DEFAULT_REFRESH_HZ, MIN_TIMER_INTERVAL_MS};
pub use mailbox::{Mailbox, Remote};
