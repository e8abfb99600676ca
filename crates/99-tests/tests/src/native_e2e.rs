//! Step scheduler driven by the native host loop on a virtual clock.

use mock::CountingEngine;
use runtime_native::HostLoop;
use std::cell::RefCell;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;
use step_scheduler::{SchedulerConfig, StepScheduler, StepTarget, TickInterval};

type NativeScheduler = StepScheduler<HostLoop, HostLoop>;

fn setup(config: SchedulerConfig) -> (HostLoop, Rc<RefCell<CountingEngine>>, NativeScheduler) {
    let _ = env_logger::builder().is_test(true).try_init();
    let host = HostLoop::virtual_time(60.0);
    let engine = CountingEngine::shared();
    let scheduler = StepScheduler::new(Rc::clone(&engine), host.clone(), host.clone(), config)
        .expect("valid config");
    (host, engine, scheduler)
}

/// A 60 Hz fixed rate steps sixty times a second and never interpolates.
#[test]
fn fixed_rate_steps_at_target() {
    let (host, engine, mut scheduler) = setup(SchedulerConfig::new(60.0, false));
    scheduler.start();
    host.advance(1000.0);

    let engine = engine.borrow();
    assert_eq!(engine.steps, 60);
    assert_eq!(engine.renders, 0);
    assert_eq!(host.live_timers(), 1);
    assert_eq!(host.live_display_subscriptions(), 0);
}

/// Interpolation renders once per refresh on top of the fixed-rate steps.
#[test]
fn interpolated_rate_renders_every_refresh() {
    let (host, engine, mut scheduler) = setup(SchedulerConfig::new(30.0, true));
    scheduler.start();
    host.advance(1000.0);

    let engine = engine.borrow();
    assert_eq!(engine.steps, 30);
    assert_eq!(engine.renders, host.refreshes());
    assert_eq!(engine.renders, 60);
}

/// Display-tied stepping follows the refresh and ignores the interpolation flag.
#[test]
fn display_tied_steps_every_refresh() {
    let (host, engine, mut scheduler) = setup(SchedulerConfig::new(0.0, true));
    scheduler.start();
    host.advance(500.0);

    let engine = engine.borrow();
    assert_eq!(engine.steps, 30);
    assert_eq!(engine.renders, 0);
    assert_eq!(host.live_timers(), 0);
    assert_eq!(host.live_display_subscriptions(), 1);
    assert!((engine.tick_interval_ms() - 1000.0 / 60.0).abs() < 1e-9);
}

/// Changing the rate mid-run restarts the timer from the current instant.
#[test]
fn rate_change_restarts_timer_from_now() {
    let (host, engine, mut scheduler) = setup(SchedulerConfig::new(60.0, false));
    scheduler.start();
    host.advance(500.0);
    assert_eq!(engine.borrow().steps, 30);

    scheduler.set_target_rate(20.0).unwrap();
    assert_eq!(engine.borrow().tick_interval_ms(), 50.0);
    host.advance(500.0);

    assert_eq!(engine.borrow().steps, 40);
    assert_eq!(host.live_timers(), 1);
    assert_eq!(scheduler.restarts(), 1);
}

/// Turning interpolation off while running removes its display subscription.
#[test]
fn disabling_interpolation_stops_renders() {
    let (host, engine, mut scheduler) = setup(SchedulerConfig::new(30.0, true));
    scheduler.start();
    host.advance(100.0);
    let renders = engine.borrow().renders;
    assert!(renders > 0);

    scheduler.set_interpolation(false);
    host.advance(1000.0);
    assert_eq!(engine.borrow().renders, renders);
    assert_eq!(host.live_display_subscriptions(), 0);
    assert_eq!(host.live_timers(), 1);
}

/// Stop leaves nothing subscribed and the engine idle.
#[test]
fn stop_releases_host_subscriptions() {
    let (host, engine, mut scheduler) = setup(SchedulerConfig::new(60.0, true));
    scheduler.start();
    host.advance(100.0);
    scheduler.stop();
    scheduler.stop();

    let (steps, renders) = {
        let engine = engine.borrow();
        (engine.steps, engine.renders)
    };
    host.advance(1000.0);
    assert_eq!(host.live_timers(), 0);
    assert_eq!(host.live_display_subscriptions(), 0);
    assert_eq!(engine.borrow().steps, steps);
    assert_eq!(engine.borrow().renders, renders);
}

/// Dropping a running scheduler unsubscribes it from the host.
#[test]
fn dropping_scheduler_unsubscribes() {
    let (host, _engine, mut scheduler) = setup(SchedulerConfig::new(60.0, true));
    scheduler.start();
    drop(scheduler);
    assert_eq!(host.live_timers(), 0);
    assert_eq!(host.live_display_subscriptions(), 0);
}

/// Engine whose `step` panics on one chosen call.
#[derive(Default)]
struct FaultyEngine {
    steps: u64,
    renders: u64,
    panic_on_step: u64,
    tick_interval: TickInterval,
}

impl StepTarget for FaultyEngine {
    fn step(&mut self) {
        self.steps += 1;
        if self.steps == self.panic_on_step {
            panic!("step {} failed", self.steps);
        }
    }

    fn render_interpolated(&mut self) {
        self.renders += 1;
    }

    fn tick_interval(&self) -> TickInterval {
        self.tick_interval.clone()
    }
}

/// A panic inside `step` reaches the host but leaves the scheduler usable.
#[test]
fn panicking_step_leaves_scheduler_usable() {
    let _ = env_logger::builder().is_test(true).try_init();
    let host = HostLoop::virtual_time(60.0);
    let engine = Rc::new(RefCell::new(FaultyEngine {
        panic_on_step: 2,
        ..FaultyEngine::default()
    }));
    let mut scheduler = StepScheduler::new(
        Rc::clone(&engine),
        host.clone(),
        host.clone(),
        SchedulerConfig::new(60.0, true),
    )
    .expect("valid config");
    scheduler.start();

    let result = panic::catch_unwind(AssertUnwindSafe(|| host.advance(100.0)));
    assert!(result.is_err(), "step panic should reach the host");
    assert_eq!(engine.borrow().steps, 2);
    assert!(scheduler.is_running());
    assert_eq!(host.live_timers(), 1);
    assert_eq!(host.live_display_subscriptions(), 1);

    host.advance(100.0);
    assert!(engine.borrow().steps > 2);
    assert!(engine.borrow().renders > 0);

    scheduler.set_target_rate(30.0).unwrap();
    assert_eq!(host.live_timers(), 1);
    assert_eq!(host.live_display_subscriptions(), 1);

    scheduler.stop();
    assert_eq!(host.live_timers(), 0);
    assert_eq!(host.live_display_subscriptions(), 0);
}
