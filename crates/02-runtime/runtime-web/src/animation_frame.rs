//! `requestAnimationFrame`-backed display sync.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use host_abi::{Callback, CancelHandle, DisplaySync};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{console, Window};

/// Display sync over `window.requestAnimationFrame`.
///
/// Each subscription re-requests a frame after every invocation until its
/// handle is cancelled. Cancelling also clears the outstanding frame request.
#[derive(Clone, Copy, Debug, Default)]
pub struct AnimationFrameSync;

impl AnimationFrameSync {
    /// Creates the display-sync primitive.
    pub fn new() -> Self {
        Self
    }
}

impl DisplaySync for AnimationFrameSync {
    fn schedule(&self, callback: Callback) -> CancelHandle {
        let Some(window) = web_sys::window() else {
            console::warn_1(&JsValue::from_str("display sync: no window, subscription inert"));
            return CancelHandle::noop();
        };

        let frames = FrameLoop::new(window, callback);
        frames.request();
        CancelHandle::new(move || frames.cancel())
    }
}

struct FrameLoop {
    window: Window,
    callback: Callback,
    closure: RefCell<Option<Closure<dyn FnMut(f64)>>>,
    pending: Cell<Option<i32>>,
    cancelled: Cell<bool>,
}

impl FrameLoop {
    fn new(window: Window, callback: Callback) -> Rc<Self> {
        let frames = Rc::new(Self {
            window,
            callback,
            closure: RefCell::new(None),
            pending: Cell::new(None),
            cancelled: Cell::new(false),
        });

        let weak: Weak<Self> = Rc::downgrade(&frames);
        let closure = Closure::wrap(Box::new(move |_timestamp: f64| {
            if let Some(frames) = weak.upgrade() {
                frames.on_frame();
            }
        }) as Box<dyn FnMut(f64)>);
        *frames.closure.borrow_mut() = Some(closure);
        frames
    }

    fn on_frame(&self) {
        self.pending.set(None);
        if self.cancelled.get() {
            return;
        }
        (self.callback)();
        if !self.cancelled.get() {
            self.request();
        }
    }

    fn request(&self) {
        let closure = self.closure.borrow();
        let Some(closure) = closure.as_ref() else {
            return;
        };
        match self
            .window
            .request_animation_frame(closure.as_ref().unchecked_ref())
        {
            Ok(id) => self.pending.set(Some(id)),
            Err(err) => {
                console::error_2(&JsValue::from_str("requestAnimationFrame failed"), &err)
            }
        }
    }

    fn cancel(&self) {
        self.cancelled.set(true);
        if let Some(id) = self.pending.take() {
            if let Err(err) = self.window.cancel_animation_frame(id) {
                console::error_2(&JsValue::from_str("cancelAnimationFrame failed"), &err);
            }
        }
        // Dropping while the closure is mid-invocation is deferred by the
        // bindings until it returns.
        self.closure.borrow_mut().take();
    }
}
