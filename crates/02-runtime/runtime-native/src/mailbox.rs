//! Cross-thread message queue feeding the loop thread.
//!
//! The scheduler and its callbacks are confined to the loop thread. Other
//! threads reach it only by posting messages through a [`Remote`]; the loop
//! drains them between event batches and wakes early when one arrives.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

struct Shared<M> {
    queue: Mutex<VecDeque<M>>,
    ready: Condvar,
}

/// Receiving end, owned by the loop thread.
pub struct Mailbox<M> {
    shared: Arc<Shared<M>>,
}

/// Sending end. Cheap to clone and `Send` when `M` is.
pub struct Remote<M> {
    shared: Arc<Shared<M>>,
}

impl<M> Mailbox<M> {
    /// Creates an empty mailbox.
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                queue: Mutex::new(VecDeque::new()),
                ready: Condvar::new(),
            }),
        }
    }

    /// Returns a sending end for other threads.
    pub fn remote(&self) -> Remote<M> {
        Remote {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Takes every queued message in arrival order.
    pub fn drain(&self) -> Vec<M> {
        self.shared.queue.lock().drain(..).collect()
    }

    /// Returns `true` when no message is queued.
    pub fn is_empty(&self) -> bool {
        self.shared.queue.lock().is_empty()
    }

    /// Blocks for up to `timeout` unless a message is already queued or
    /// arrives meanwhile.
    pub fn wait_timeout(&self, timeout: Duration) {
        let mut queue = self.shared.queue.lock();
        if queue.is_empty() {
            let _ = self.shared.ready.wait_for(&mut queue, timeout);
        }
    }
}

impl<M> Default for Mailbox<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> Remote<M> {
    /// Queues `msg` and wakes the loop thread.
    pub fn post(&self, msg: M) {
        self.shared.queue.lock().push_back(msg);
        self.shared.ready.notify_one();
    }
}

impl<M> Clone for Remote<M> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}
