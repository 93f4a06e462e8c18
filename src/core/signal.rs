//! Broadcast-once completion signal.
//!
//! A [`CompletionSignal`] starts unfired and transitions to fired exactly
//! once. Any number of waiters may await it; once fired, current and future
//! waiters return immediately.

use std::sync::Arc;
use tokio::sync::watch;

/// One-shot broadcast marker shared between a task and everything waiting on it.
///
/// Clones share the same underlying state.
#[derive(Debug, Clone)]
pub struct CompletionSignal {
    tx: Arc<watch::Sender<bool>>,
}

impl CompletionSignal {
    /// Create a new, unfired signal.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Fire the signal, waking every waiter.
    ///
    /// Returns `true` only for the call that actually fired it; later calls
    /// are no-ops returning `false`.
    pub fn fire(&self) -> bool {
        self.tx.send_if_modified(|fired| {
            if *fired {
                false
            } else {
                *fired = true;
                true
            }
        })
    }

    /// Check whether the signal has fired.
    pub fn is_fired(&self) -> bool {
        *self.tx.borrow()
    }

    /// Wait until the signal has fired.
    pub async fn wait(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives as long as `self`, so this cannot observe a closed channel.
        let _ = rx.wait_for(|fired| *fired).await;
    }
}

impl Default for CompletionSignal {
    fn default() -> Self {
        Self::new()
    }
}
