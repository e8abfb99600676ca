//! Mode table mapping a config onto scheduling primitives.

use std::fmt;

use crate::config::SchedulerConfig;

/// Which primitive drives the step callback.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StepSource {
    /// One step per display refresh.
    DisplaySync,
    /// One step per timer period.
    Timer { interval_ms: f64 },
}

/// Concrete subscription plan for one running configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StepMode {
    /// Step on every display refresh; interpolation would be redundant.
    DisplayTied,
    /// Step on a fixed timer with no interpolation pass.
    Fixed { interval_ms: f64 },
    /// Step on a fixed timer and render interpolated frames on refresh.
    FixedInterpolated { interval_ms: f64 },
}

impl StepMode {
    /// Applies the mode table to `config`.
    pub fn select(config: &SchedulerConfig) -> Self {
        if config.is_display_tied() {
            return StepMode::DisplayTied;
        }
        let interval_ms = config.tick_interval_ms();
        if config.interpolation_enabled {
            StepMode::FixedInterpolated { interval_ms }
        } else {
            StepMode::Fixed { interval_ms }
        }
    }

    /// Primitive the step callback subscribes to.
    pub fn step_source(&self) -> StepSource {
        match *self {
            StepMode::DisplayTied => StepSource::DisplaySync,
            StepMode::Fixed { interval_ms } | StepMode::FixedInterpolated { interval_ms } => {
                StepSource::Timer { interval_ms }
            }
        }
    }

    /// Whether a display-sync render subscription accompanies the step.
    pub fn has_interpolation(&self) -> bool {
        matches!(self, StepMode::FixedInterpolated { .. })
    }

    /// Timer period in milliseconds, or `None` when display-tied.
    pub fn interval_ms(&self) -> Option<f64> {
        match self.step_source() {
            StepSource::DisplaySync => None,
            StepSource::Timer { interval_ms } => Some(interval_ms),
        }
    }

    /// Short label used in logs and snapshots.
    pub fn label(&self) -> &'static str {
        match self {
            StepMode::DisplayTied => "display-tied",
            StepMode::Fixed { .. } => "fixed",
            StepMode::FixedInterpolated { .. } => "fixed+interpolated",
        }
    }
}

impl fmt::Display for StepMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.interval_ms() {
            Some(ms) => write!(f, "{} @ {ms:.2} ms", self.label()),
            None => f.write_str(self.label()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_rate_is_display_tied_regardless_of_interpolation() {
        for interpolation in [false, true] {
            let mode = StepMode::select(&SchedulerConfig::new(0.0, interpolation));
            assert_eq!(mode, StepMode::DisplayTied);
            assert_eq!(mode.step_source(), StepSource::DisplaySync);
            assert!(!mode.has_interpolation());
            assert_eq!(mode.interval_ms(), None);
        }
    }

    #[test]
    fn positive_rate_uses_timer() {
        let mode = StepMode::select(&SchedulerConfig::new(60.0, false));
        assert!(matches!(mode, StepMode::Fixed { .. }));
        assert!(!mode.has_interpolation());
        let interval = mode.interval_ms().unwrap();
        assert!((interval - 16.667).abs() < 1e-3);
    }

    #[test]
    fn interpolation_adds_display_pass() {
        let mode = StepMode::select(&SchedulerConfig::new(30.0, true));
        assert!(mode.has_interpolation());
        match mode.step_source() {
            StepSource::Timer { interval_ms } => assert!((interval_ms - 33.333).abs() < 1e-3),
            other => panic!("unexpected step source {other:?}"),
        }
    }

    #[test]
    fn display_formats_interval() {
        let mode = StepMode::select(&SchedulerConfig::new(50.0, true));
        assert_eq!(mode.to_string(), "fixed+interpolated @ 20.00 ms");
        assert_eq!(StepMode::DisplayTied.to_string(), "display-tied");
    }
}
