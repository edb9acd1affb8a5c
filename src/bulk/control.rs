//! Cooperative cancellation for bulk jobs

use tokio::sync::watch;

/// Cancellation signal shared between a running job and whoever started it.
///
/// The executor polls it between items; an in-flight transfer is never
/// interrupted.
#[derive(Debug)]
pub struct JobControl {
    cancel_tx: watch::Sender<bool>,
    cancel_rx: watch::Receiver<bool>,
}

impl JobControl {
    pub fn new() -> Self {
        let (cancel_tx, cancel_rx) = watch::channel(false);
        Self {
            cancel_tx,
            cancel_rx,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancel_rx.borrow()
    }

    pub fn cancel(&self) {
        let _ = self.cancel_tx.send(true);
    }

    /// Get a receiver for waiting on cancellation
    pub fn subscribe_cancellation(&self) -> watch::Receiver<bool> {
        self.cancel_rx.clone()
    }
}

impl Default for JobControl {
    fn default() -> Self {
        Self::new()
    }
}
