//! Start/stop control surface.
//!
//! A stop request halts the monitor loop before its next iteration and is
//! checked between per-account operations inside an attempt; session cleanup
//! still runs on the way out.

use tokio::sync::watch;
use tracing::info;

/// Owner side of the stop signal
#[derive(Debug)]
pub struct StopController {
    tx: watch::Sender<bool>,
}

/// Observer side, cloned into every long-running task
#[derive(Debug, Clone)]
pub struct StopSignal {
    rx: watch::Receiver<bool>,
}

impl StopController {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    pub fn signal(&self) -> StopSignal {
        StopSignal {
            rx: self.tx.subscribe(),
        }
    }

    /// Request a stop. Idempotent.
    pub fn stop(&self) {
        if !*self.tx.borrow() {
            info!("Stop requested");
            let _ = self.tx.send(true);
        }
    }
}

impl Default for StopController {
    fn default() -> Self {
        Self::new()
    }
}

impl StopSignal {
    /// Never-stopping signal for one-shot invocations
    pub fn never() -> Self {
        let (tx, rx) = watch::channel(false);
        // Keep the sender alive so the channel never reports closed
        std::mem::forget(tx);
        Self { rx }
    }

    pub fn is_stopped(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once a stop has been requested
    pub async fn stopped(&mut self) {
        while !*self.rx.borrow() {
            if self.rx.changed().await.is_err() {
                // Controller dropped; treat as a stop
                return;
            }
        }
    }
}
