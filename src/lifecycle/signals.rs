//! OS signal handling.
//!
//! # Responsibilities
//! - Wait for SIGTERM / SIGINT
//! - Translate the first one into a shutdown trigger
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - There is no reload signal; configuration is fixed for the process lifetime

use crate::lifecycle::Shutdown;

/// Resolve once a termination signal arrives, returning its name.
pub async fn terminate() -> &'static str {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install SIGTERM handler, using Ctrl+C only");
                return ctrl_c().await;
            }
        };

        tokio::select! {
            name = ctrl_c() => name,
            _ = sigterm.recv() => "SIGTERM",
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c().await
    }
}

async fn ctrl_c() -> &'static str {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    "SIGINT"
}

/// Spawn a task that triggers `shutdown` on the first termination signal.
pub fn spawn_listener(shutdown: Shutdown) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let signal = terminate().await;
        tracing::info!(signal, "Shutdown signal received");
        shutdown.trigger();
    })
}
