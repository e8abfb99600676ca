//! The step scheduler state machine.

use std::cell::RefCell;
use std::rc::Rc;

use host_abi::{Callback, DisplaySync, PeriodicTimer, StepTarget, TickInterval};
use log::debug;

use crate::config::{tick_interval_ms, validate_rate, SchedulerConfig};
use crate::error::SchedulerResult;
use crate::mode::{StepMode, StepSource};
use crate::snapshot::SchedulerSnapshot;
use crate::state::SchedulerState;

/// Drives an engine's `step` and `render_interpolated` callbacks from a
/// display-sync primitive and a periodic timer.
///
/// The scheduler has two states, stopped (initial) and running. Every
/// configuration change made while running is applied as a stop followed by
/// a start inside the same call, so no callback can observe the intermediate
/// stopped state. Calling [`start`](Self::start) while already running is a
/// no-op.
///
/// Dropping the scheduler stops it.
pub struct StepScheduler<D: DisplaySync, T: PeriodicTimer> {
    config: SchedulerConfig,
    state: SchedulerState,
    display: D,
    timer: T,
    step: Callback,
    render: Callback,
    tick_interval: TickInterval,
    restarts: u64,
}

impl<D: DisplaySync, T: PeriodicTimer> StepScheduler<D, T> {
    /// Binds a scheduler to `engine` for its whole life.
    pub fn new<E>(
        engine: Rc<RefCell<E>>,
        display: D,
        timer: T,
        config: SchedulerConfig,
    ) -> SchedulerResult<Self>
    where
        E: StepTarget + 'static,
    {
        let tick_interval = engine.borrow().tick_interval();
        let step: Callback = {
            let engine = Rc::clone(&engine);
            Rc::new(move || engine.borrow_mut().step())
        };
        let render: Callback = Rc::new(move || engine.borrow_mut().render_interpolated());
        Self::with_callbacks(step, render, tick_interval, display, timer, config)
    }

    /// Builds a scheduler from pre-made callbacks.
    ///
    /// Used by hosts whose engine is not a Rust [`StepTarget`], such as a
    /// script object behind an FFI boundary.
    pub fn with_callbacks(
        step: Callback,
        render: Callback,
        tick_interval: TickInterval,
        display: D,
        timer: T,
        config: SchedulerConfig,
    ) -> SchedulerResult<Self> {
        config.validate()?;
        let interval_ms = config.tick_interval_ms();
        tick_interval.set(interval_ms);
        Ok(Self {
            config,
            state: SchedulerState::new(interval_ms),
            display,
            timer,
            step,
            render,
            tick_interval,
            restarts: 0,
        })
    }

    /// Stores a new target rate, restarting if running.
    ///
    /// Invalid rates are rejected and leave the scheduler untouched.
    pub fn set_target_rate(&mut self, rate: f64) -> SchedulerResult<()> {
        validate_rate(rate)?;
        self.config.target_rate = rate;
        self.publish_tick_interval();
        self.restart_if_running();
        Ok(())
    }

    /// Stores the interpolation flag, restarting if running.
    ///
    /// The flag is kept while display-tied so it applies again as soon as a
    /// fixed rate is restored.
    pub fn set_interpolation(&mut self, enabled: bool) {
        self.config.interpolation_enabled = enabled;
        self.restart_if_running();
    }

    /// Replaces the whole config with a single restart.
    pub fn configure(&mut self, config: SchedulerConfig) -> SchedulerResult<()> {
        config.validate()?;
        self.config = config;
        self.publish_tick_interval();
        self.restart_if_running();
        Ok(())
    }

    /// Subscribes the step source and, when enabled, the interpolation source.
    pub fn start(&mut self) {
        if self.state.running() {
            debug!("start ignored: already running ({})", self.mode());
            return;
        }

        let mode = self.mode();
        self.state.set_running(true);
        self.state.cancel_all();

        let step_handle = match mode.step_source() {
            StepSource::DisplaySync => self.display.schedule(Rc::clone(&self.step)),
            StepSource::Timer { interval_ms } => {
                self.timer.schedule(Rc::clone(&self.step), interval_ms)
            }
        };
        self.state.install_step(step_handle);

        if mode.has_interpolation() {
            let handle = self.display.schedule(Rc::clone(&self.render));
            self.state.install_interpolation(handle);
        }

        debug!("step scheduler started ({mode})");
    }

    /// Cancels every live subscription. Safe to call when stopped.
    pub fn stop(&mut self) {
        let was_running = self.state.running();
        self.state.set_running(false);
        self.state.cancel_all();
        if was_running {
            debug!("step scheduler stopped");
        }
    }

    /// Returns `true` between [`start`](Self::start) and [`stop`](Self::stop).
    pub fn is_running(&self) -> bool {
        self.state.running()
    }

    /// Current configuration, including a stored but inactive interpolation flag.
    pub fn config(&self) -> SchedulerConfig {
        self.config
    }

    /// Running flag and live handle bookkeeping.
    pub fn state(&self) -> &SchedulerState {
        &self.state
    }

    /// Mode the next (or current) run uses.
    pub fn mode(&self) -> StepMode {
        StepMode::select(&self.config)
    }

    pub fn tick_interval_ms(&self) -> f64 {
        self.state.tick_interval_ms()
    }

    /// The callback passed to the step source on every start.
    pub fn step_callback(&self) -> &Callback {
        &self.step
    }

    /// The callback passed to the interpolation source on every start.
    pub fn render_callback(&self) -> &Callback {
        &self.render
    }

    /// Number of reconfiguration restarts performed while running.
    pub fn restarts(&self) -> u64 {
        self.restarts
    }

    /// Captures a serializable view of config and state.
    pub fn snapshot(&self) -> SchedulerSnapshot {
        SchedulerSnapshot {
            running: self.state.running(),
            target_rate: self.config.target_rate,
            interpolation_enabled: self.config.interpolation_enabled,
            tick_interval_ms: self.state.tick_interval_ms(),
            mode: self.mode().label(),
            step_source_live: self.state.step_source_live(),
            interpolation_source_live: self.state.interpolation_source_live(),
            restarts: self.restarts,
        }
    }

    fn publish_tick_interval(&mut self) {
        let ms = tick_interval_ms(self.config.target_rate);
        self.state.set_tick_interval_ms(ms);
        self.tick_interval.set(ms);
    }

    fn restart_if_running(&mut self) {
        if !self.state.running() {
            return;
        }
        self.stop();
        self.start();
        self.restarts += 1;
    }
}

impl<D: DisplaySync, T: PeriodicTimer> Drop for StepScheduler<D, T> {
    fn drop(&mut self) {
        self.stop();
    }
}
