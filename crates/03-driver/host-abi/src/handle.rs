//! Cancellation handles returned by scheduling primitives.

use std::fmt;

/// Owns the right to stop a scheduled subscription.
///
/// Cancellation is idempotent: the release action runs at most once no matter
/// how many times [`CancelHandle::cancel`] is called. Dropping a live handle
/// cancels it, so a handle can never outlive the subscription it guards
/// without stopping it.
pub struct CancelHandle {
    release: Option<Box<dyn FnOnce()>>,
    cancelled: bool,
}

impl CancelHandle {
    /// Creates a handle that runs `release` on first cancellation.
    pub fn new(release: impl FnOnce() + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
            cancelled: false,
        }
    }

    /// Creates a handle with nothing to release.
    ///
    /// Hosts return this when a subscription could not be established.
    pub fn noop() -> Self {
        Self {
            release: None,
            cancelled: false,
        }
    }

    /// Stops the subscription. Later calls do nothing.
    pub fn cancel(&mut self) {
        if self.cancelled {
            return;
        }
        self.cancelled = true;
        if let Some(release) = self.release.take() {
            release();
        }
    }

    /// Returns `true` once [`cancel`](Self::cancel) has run.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}

impl Drop for CancelHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl fmt::Debug for CancelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelHandle")
            .field("cancelled", &self.cancelled)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn cancel_runs_release_once() {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let mut handle = CancelHandle::new(move || counter.set(counter.get() + 1));

        assert!(!handle.is_cancelled());
        handle.cancel();
        handle.cancel();
        assert!(handle.is_cancelled());
        assert_eq!(calls.get(), 1);

        drop(handle);
        assert_eq!(calls.get(), 1, "drop after cancel must not release again");
    }

    #[test]
    fn drop_cancels_live_handle() {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let handle = CancelHandle::new(move || counter.set(counter.get() + 1));
        drop(handle);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn noop_handle_reports_cancellation() {
        let mut handle = CancelHandle::noop();
        handle.cancel();
        assert!(handle.is_cancelled());
    }
}
