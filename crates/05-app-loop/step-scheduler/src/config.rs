//! Scheduler configuration and rate validation.

use host_abi::FALLBACK_TICK_INTERVAL_MS;
use serde::{Deserialize, Serialize};

use crate::error::{SchedulerError, SchedulerResult};

/// Target rate used when a config omits one.
pub const DEFAULT_TARGET_RATE: f64 = 60.0;

/// User-facing timing configuration.
///
/// A `target_rate` of `0` is the display-tied sentinel: the step callback runs
/// once per display refresh instead of on a fixed timer, and
/// `interpolation_enabled` has no effect.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SchedulerConfig {
    /// Logical ticks per second, or `0` for display-tied stepping.
    pub target_rate: f64,
    /// Whether to render interpolated frames between fixed-rate ticks.
    pub interpolation_enabled: bool,
}

impl SchedulerConfig {
    /// Classic 30 Hz tick rate without interpolation.
    pub const COMPATIBILITY: Self = Self {
        target_rate: 30.0,
        interpolation_enabled: false,
    };

    /// Step once per display refresh.
    pub const DISPLAY_TIED: Self = Self {
        target_rate: 0.0,
        interpolation_enabled: false,
    };

    /// Creates a config from its two knobs without validating it.
    pub const fn new(target_rate: f64, interpolation_enabled: bool) -> Self {
        Self {
            target_rate,
            interpolation_enabled,
        }
    }

    /// Parses and validates a JSON config such as
    /// `{"targetRate": 30, "interpolationEnabled": true}`.
    pub fn from_json(json: &str) -> SchedulerResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects rates the scheduler cannot honour.
    pub fn validate(&self) -> SchedulerResult<()> {
        validate_rate(self.target_rate).map(|_| ())
    }

    /// Returns `true` when stepping is tied to the display refresh.
    pub fn is_display_tied(&self) -> bool {
        self.target_rate == 0.0
    }

    /// Milliseconds per logical tick as seen by the engine.
    pub fn tick_interval_ms(&self) -> f64 {
        tick_interval_ms(self.target_rate)
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            target_rate: DEFAULT_TARGET_RATE,
            interpolation_enabled: false,
        }
    }
}

/// Checks that `rate` is non-negative, finite, and yields a finite interval.
pub fn validate_rate(rate: f64) -> SchedulerResult<f64> {
    let valid = rate.is_finite()
        && rate >= 0.0
        && (rate == 0.0 || (1000.0 / rate).is_finite());
    if valid {
        Ok(rate)
    } else {
        Err(SchedulerError::InvalidRate { rate })
    }
}

/// Milliseconds per tick for `rate`, falling back to a 60 Hz display when
/// the rate is display-tied.
pub fn tick_interval_ms(rate: f64) -> f64 {
    if rate > 0.0 {
        1000.0 / rate
    } else {
        FALLBACK_TICK_INTERVAL_MS
    }
}
