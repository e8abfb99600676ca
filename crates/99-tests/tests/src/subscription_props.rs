//! Random control sequences never leave duplicate or stray subscriptions.

use host_abi::FALLBACK_TICK_INTERVAL_MS;
use mock::{CountingEngine, RecordingHost, SourceKind};
use proptest::collection;
use proptest::prelude::*;
use std::rc::Rc;
use step_scheduler::{SchedulerConfig, StepScheduler};

const RATES: [f64; 6] = [0.0, 1.0, 30.0, 60.0, 144.0, 1000.0];

#[derive(Clone, Debug)]
enum Op {
    Rate(f64),
    Interpolation(bool),
    Start,
    Stop,
    FireTimers,
    FireDisplay,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..RATES.len()).prop_map(|idx| Op::Rate(RATES[idx])),
        any::<bool>().prop_map(Op::Interpolation),
        Just(Op::Start),
        Just(Op::Stop),
        Just(Op::FireTimers),
        Just(Op::FireDisplay),
    ]
}

proptest! {
    /// After every operation the live subscriptions match the mode table exactly.
    #[test]
    fn live_sources_match_mode(ops in collection::vec(op(), 1..120)) {
        let host = RecordingHost::new();
        let engine = CountingEngine::shared();
        let mut scheduler = StepScheduler::new(
            Rc::clone(&engine),
            host.clone(),
            host.clone(),
            SchedulerConfig::default(),
        ).expect("default config is valid");

        for op in ops {
            match op {
                Op::Rate(rate) => scheduler.set_target_rate(rate).expect("rate from table"),
                Op::Interpolation(enabled) => scheduler.set_interpolation(enabled),
                Op::Start => scheduler.start(),
                Op::Stop => scheduler.stop(),
                Op::FireTimers => {
                    host.fire_timers();
                }
                Op::FireDisplay => {
                    host.fire_display();
                }
            }

            let config = scheduler.config();
            let (timers, displays) = match (scheduler.is_running(), config.target_rate > 0.0) {
                (false, _) => (0, 0),
                (true, false) => (0, 1),
                (true, true) => (1, usize::from(config.interpolation_enabled)),
            };
            prop_assert_eq!(host.live_count(SourceKind::Timer), timers);
            prop_assert_eq!(host.live_count(SourceKind::DisplaySync), displays);
            if timers == 1 {
                prop_assert_eq!(
                    host.live_timer_intervals(),
                    vec![1000.0 / config.target_rate]
                );
            }

            let expected_interval = if config.target_rate > 0.0 {
                1000.0 / config.target_rate
            } else {
                FALLBACK_TICK_INTERVAL_MS
            };
            prop_assert_eq!(engine.borrow().tick_interval_ms(), expected_interval);
            prop_assert_eq!(scheduler.tick_interval_ms(), expected_interval);

            for sub in host.subscriptions() {
                prop_assert!(sub.cancel_calls <= 1, "released twice: {:?}", sub);
                prop_assert!(Rc::ptr_eq(&sub.callback, scheduler.step_callback())
                    || Rc::ptr_eq(&sub.callback, scheduler.render_callback()));
            }
        }

        drop(scheduler);
        prop_assert_eq!(host.live_count(SourceKind::Timer), 0);
        prop_assert_eq!(host.live_count(SourceKind::DisplaySync), 0);
    }
}
