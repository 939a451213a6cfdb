//! Cancellation scope shared by the background supervision tasks

use tokio::sync::watch;

/// Owner side of a cancellation scope
///
/// Dropping the scope cancels it as well.
#[derive(Debug)]
pub struct CancelScope {
    tx: watch::Sender<bool>,
}

/// Observer side handed to each background task
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelScope {
    /// Create a scope that has not been cancelled
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    /// Hand out a token observing this scope
    pub fn token(&self) -> CancelToken {
        CancelToken {
            rx: self.tx.subscribe(),
        }
    }

    /// Trigger the scope; returns false if it was already triggered
    pub fn cancel(&self) -> bool {
        !self.tx.send_replace(true)
    }
}

impl Default for CancelScope {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelToken {
    /// Resolve once the scope is cancelled or dropped
    pub async fn cancelled(&mut self) {
        // An error means the scope is gone, which counts as cancelled.
        let _ = self.rx.wait_for(|cancelled| *cancelled).await;
    }
}
