#![deny(missing_docs)]
//! Browser implementations of the host scheduling primitives.
//!
//! [`AnimationFrameSync`] drives display-sync subscriptions from
//! `requestAnimationFrame`; [`IntervalTimer`] drives periodic timers from
//! `setInterval`. Both only exist on wasm32; the interval rounding helper is
//! available everywhere so it can be unit tested natively.

#[cfg(target_arch = "wasm32")]
mod animation_frame;
mod interval;

#[cfg(target_arch = "wasm32")]
pub use animation_frame::AnimationFrameSync;
#[cfg(target_arch = "wasm32")]
pub use interval::IntervalTimer;
pub use interval::{interval_millis, MAX_INTERVAL_MS};
