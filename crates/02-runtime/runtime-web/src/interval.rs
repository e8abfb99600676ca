//! `setInterval`-backed periodic timer.

/// Longest delay `setInterval` honours; browsers treat larger delays as 0.
pub const MAX_INTERVAL_MS: u32 = i32::MAX as u32;

/// Converts a fractional period into the whole milliseconds `setInterval`
/// accepts, between 1 ms and [`MAX_INTERVAL_MS`].
///
/// A 60 Hz target (16.67 ms) therefore runs at 17 ms, roughly 58.8 Hz.
pub fn interval_millis(interval_ms: f64) -> u32 {
    if !interval_ms.is_finite() {
        return if interval_ms > 0.0 { MAX_INTERVAL_MS } else { 1 };
    }
    interval_ms.round().clamp(1.0, MAX_INTERVAL_MS as f64) as u32
}

#[cfg(target_arch = "wasm32")]
mod timer {
    use gloo_timers::callback::Interval;
    use host_abi::{Callback, CancelHandle, PeriodicTimer};

    use super::interval_millis;

    /// Periodic timer over `window.setInterval`.
    ///
    /// Dropping the underlying [`Interval`] clears it, so the cancel handle
    /// simply owns it.
    #[derive(Clone, Copy, Debug, Default)]
    pub struct IntervalTimer;

    impl IntervalTimer {
        /// Creates the timer primitive.
        pub fn new() -> Self {
            Self
        }
    }

    impl PeriodicTimer for IntervalTimer {
        fn schedule(&self, callback: Callback, interval_ms: f64) -> CancelHandle {
            let interval = Interval::new(interval_millis(interval_ms), move || callback());
            CancelHandle::new(move || drop(interval))
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub use timer::IntervalTimer;
