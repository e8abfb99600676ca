//! WASM exports driving the step scheduler (wasm32 only).

use js_sys::{Function, Object, Reflect, JSON};
use runtime_web::{AnimationFrameSync, IntervalTimer};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use step_scheduler::{Callback, SchedulerConfig, SchedulerError, StepScheduler, TickInterval};
use wasm_bindgen::prelude::*;
use web_sys::console;

use crate::binding::rebind;

type BrowserScheduler = StepScheduler<AnimationFrameSync, IntervalTimer>;

struct Session {
    scheduler: BrowserScheduler,
    engine: Object,
}

impl Session {
    /// Copies the scheduler's tick interval onto `engine.tickIntervalMs`.
    fn mirror_tick_interval(&self) -> Result<(), JsValue> {
        Reflect::set(
            &self.engine,
            &"tickIntervalMs".into(),
            &JsValue::from_f64(self.scheduler.tick_interval_ms()),
        )?;
        Ok(())
    }
}

thread_local! {
    static CTX: RefCell<Option<Session>> = RefCell::new(None);
    static IN_EXPORT: Cell<bool> = Cell::new(false);
}

fn with_guard<F, R>(f: F) -> Result<R, JsValue>
where
    F: FnOnce() -> Result<R, JsValue>,
{
    IN_EXPORT.with(|g| {
        if g.get() {
            return Err(JsValue::from_str("reentrant export call"));
        }
        g.set(true);
        let r = f();
        g.set(false);
        r
    })
}

fn with_session<F, R>(f: F) -> Result<R, JsValue>
where
    F: FnOnce(&mut Session) -> Result<R, JsValue>,
{
    with_guard(|| {
        CTX.with(|c| {
            let mut opt = c.borrow_mut();
            let session = opt
                .as_mut()
                .ok_or_else(|| JsValue::from_str("not inited"))?;
            f(session)
        })
    })
}

fn to_js(err: SchedulerError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn engine_method(engine: &Object, name: &str) -> Result<Function, JsValue> {
    Reflect::get(engine, &name.into())?
        .dyn_into::<Function>()
        .map_err(|_| JsValue::from_str(&format!("engine.{name} is not a function")))
}

fn engine_callback(engine: &Object, name: &'static str) -> Result<Callback, JsValue> {
    let method = engine_method(engine, name)?;
    let this = engine.clone();
    Ok(Rc::new(move || {
        if let Err(err) = method.call0(&this) {
            console::error_2(&format!("engine.{name} threw").into(), &err);
        }
    }))
}

/// Binds the scheduler to `engine`, replacing any previous binding.
///
/// `config_json` follows `{"targetRate": 60, "interpolationEnabled": false}`;
/// missing fields take their defaults. The scheduler starts stopped. If the
/// engine or config is rejected the previous binding stays in place.
#[wasm_bindgen]
pub fn vm_scheduler_init(engine: JsValue, config_json: Option<String>) -> Result<(), JsValue> {
    console::log_1(&"vm_scheduler_init: binding engine".into());
    with_guard(|| {
        let engine: Object = engine
            .dyn_into()
            .map_err(|_| JsValue::from_str("engine must be an object"))?;
        let config = match config_json {
            Some(json) => SchedulerConfig::from_json(&json).map_err(to_js)?,
            None => SchedulerConfig::default(),
        };

        CTX.with(|c| {
            rebind(c, || {
                let step = engine_callback(&engine, "step")?;
                let render = engine_callback(&engine, "renderInterpolated")?;
                let scheduler = StepScheduler::with_callbacks(
                    step,
                    render,
                    TickInterval::default(),
                    AnimationFrameSync::new(),
                    IntervalTimer::new(),
                    config,
                )
                .map_err(to_js)?;

                let session = Session { scheduler, engine };
                session.mirror_tick_interval()?;
                let mode = session.scheduler.mode();
                console::log_1(&format!("vm_scheduler_init: {mode}").into());
                Ok(session)
            })
        })?;
        Ok(())
    })
}

#[wasm_bindgen]
pub fn vm_set_target_rate(rate: f64) -> Result<(), JsValue> {
    with_session(|session| {
        session.scheduler.set_target_rate(rate).map_err(to_js)?;
        session.mirror_tick_interval()
    })
}

#[wasm_bindgen]
pub fn vm_set_interpolation(enabled: bool) -> Result<(), JsValue> {
    with_session(|session| {
        session.scheduler.set_interpolation(enabled);
        Ok(())
    })
}

#[wasm_bindgen]
pub fn vm_start() -> Result<(), JsValue> {
    with_session(|session| {
        session.scheduler.start();
        console::log_1(&format!("vm_start: {}", session.scheduler.mode()).into());
        Ok(())
    })
}

#[wasm_bindgen]
pub fn vm_stop() -> Result<(), JsValue> {
    with_session(|session| {
        session.scheduler.stop();
        Ok(())
    })
}

#[wasm_bindgen]
pub fn vm_running() -> Result<bool, JsValue> {
    with_session(|session| Ok(session.scheduler.is_running()))
}

#[wasm_bindgen]
pub fn vm_tick_interval_ms() -> Result<f64, JsValue> {
    with_session(|session| Ok(session.scheduler.tick_interval_ms()))
}

/// Returns the scheduler snapshot as a plain object.
#[wasm_bindgen]
pub fn vm_snapshot() -> Result<JsValue, JsValue> {
    with_session(|session| JSON::parse(&session.scheduler.snapshot().to_json()))
}
