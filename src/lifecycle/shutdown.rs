//! Shutdown coordination for the gateway.
//!
//! Two signals with different audiences:
//! - [`Shutdown`] tells the server to stop accepting and start draining.
//! - [`Cancellation`] tells requests still in flight at the drain deadline
//!   to give up.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::{broadcast, watch};

/// Coordinator for graceful shutdown.
///
/// Provides a broadcast channel that the server (and anything else long
/// running) subscribes to. Cloning yields another handle to the same channel.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Trigger the shutdown signal. Idempotent; late subscribers miss it.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// One-way switch that aborts in-flight requests.
///
/// Once [`cancel`](Self::cancel) is called every pending and future
/// [`cancelled`](Self::cancelled) future resolves.
#[derive(Debug, Clone)]
pub struct Cancellation {
    tx: Arc<watch::Sender<bool>>,
}

impl Cancellation {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    /// Resolves once cancelled. Owns its receiver, so it can outlive `self`.
    pub fn cancelled(&self) -> impl Future<Output = ()> + Send + 'static {
        let mut rx = self.tx.subscribe();
        async move {
            let closed = rx.wait_for(|cancelled| *cancelled).await.is_err();
            if closed {
                // Every handle is gone, nothing can cancel any more.
                std::future::pending::<()>().await;
            }
        }
    }
}

impl Default for Cancellation {
    fn default() -> Self {
        Self::new()
    }
}
