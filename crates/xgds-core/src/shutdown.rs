//! Cooperative shutdown for long-running workers.
//!
//! Workers hold a [`ShutdownSignal`] and check it between queue operations;
//! the binary keeps the [`ShutdownTrigger`] and fires it on Ctrl-C.

use std::sync::Arc;

use tokio::sync::watch;

#[derive(Debug)]
pub struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
    // Only set by `never()`, keeps the channel open without a trigger.
    _sender: Option<Arc<watch::Sender<bool>>>,
}

pub fn channel() -> (ShutdownTrigger, ShutdownSignal) {
    let (tx, rx) = watch::channel(false);
    (
        ShutdownTrigger { tx },
        ShutdownSignal { rx, _sender: None },
    )
}

impl ShutdownTrigger {
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }
}

impl ShutdownSignal {
    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once shutdown has been requested (or the trigger dropped).
    pub async fn wait(&mut self) {
        while !*self.rx.borrow_and_update() {
            if self.rx.changed().await.is_err() {
                return;
            }
        }
    }

    /// A signal that never fires, for one-shot tools and tests.
    pub fn never() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            rx,
            _sender: Some(Arc::new(tx)),
        }
    }
}

/// Fire `trigger` when the process receives Ctrl-C.
pub async fn trigger_on_ctrl_c(trigger: ShutdownTrigger) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
        return;
    }
    tracing::info!("shutdown requested");
    trigger.trigger();
}
