use anyhow::{Context, Result};
use axum_server::Handle;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info};

/// Time given to in-flight requests once a stop signal arrives.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Spawns a task that drains `handle` on Ctrl+C or SIGTERM.
pub fn on_signal(handle: Handle<SocketAddr>) {
    tokio::spawn(async move {
        match wait().await {
            Ok(signal) => {
                info!(signal, "Stopping, draining open connections");
                handle.graceful_shutdown(Some(DRAIN_TIMEOUT));
            }
            Err(e) => error!("Signal handler failed: {e:#}"),
        }
    });
}

async fn wait() -> Result<&'static str> {
    #[cfg(unix)]
    {
        let mut term = signal::unix::signal(signal::unix::SignalKind::terminate())
            .context("Installing SIGTERM handler")?;
        tokio::select! {
            res = signal::ctrl_c() => res.context("Installing Ctrl+C handler").map(|()| "SIGINT"),
            _ = term.recv() => Ok("SIGTERM"),
        }
    }
    #[cfg(not(unix))]
    {
        signal::ctrl_c().await.context("Installing Ctrl+C handler")?;
        Ok("SIGINT")
    }
}
