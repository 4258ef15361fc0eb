//! # Cardly Server
//!
//! Binds the `cardly` platform to a socket. [`Server::builder`] validates TLS files,
//! migrates the database and builds every feature slice; [`Server::run`] serves the
//! router over HTTP or HTTPS until Ctrl+C or SIGTERM.
//!
//! ```no_run
//! use cardly_server::Server;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     Server::builder().port(4583).build().await?.run().await
//! }
//! ```

mod bootstrap;
mod router;
mod shutdown;
mod tls;

use anyhow::{Context, Result};
use axum_server::Handle;
use cardly::domain::config::ApiConfig;
use cardly::kernel::server::ApiState;
use std::net::SocketAddr;
use tracing::info;

#[must_use = "builders do nothing unless you call .build()"]
#[derive(Debug, Default)]
pub struct ServerBuilder {
    config: ApiConfig,
}

impl ServerBuilder {
    pub fn config(mut self, config: ApiConfig) -> Self {
        self.config = config;
        self
    }

    /// Overrides `server.port`.
    pub fn port(mut self, port: u16) -> Self {
        self.config.server.port = port;
        self
    }

    /// Validates TLS files, then connects storage backends and builds every slice.
    ///
    /// # Errors
    /// Missing TLS files, an unreachable database, a failed migration, an
    /// unwritable upload directory or an unusable JWT configuration.
    pub async fn build(self) -> Result<Server> {
        if let Some(ssl) = &self.config.server.ssl {
            tls::verify(ssl)?;
        }
        let address = SocketAddr::new(self.config.server.address, self.config.server.port);
        info!(%address, db = %self.config.database.url, "Building server");

        let state = bootstrap::assemble(self.config).await?;
        Ok(Server { address, state })
    }
}

/// A built server; nothing listens until [`Server::run`].
#[must_use = "call .run().await to start the server"]
#[derive(Debug)]
pub struct Server {
    address: SocketAddr,
    state: ApiState,
}

impl Server {
    pub fn builder() -> ServerBuilder {
        ServerBuilder::default()
    }

    #[must_use]
    pub const fn state(&self) -> &ApiState {
        &self.state
    }

    /// Serves until a stop signal, then closes the event bus.
    ///
    /// # Errors
    /// Bind failures and TLS setup errors.
    pub async fn run(self) -> Result<()> {
        let Self { address, state } = self;
        let ssl = state.config.server.ssl.clone();
        let events = state.events.clone();
        let app = router::init(state).into_make_service();

        let handle = Handle::<SocketAddr>::new();
        shutdown::on_signal(handle.clone());

        match ssl {
            Some(ssl) => {
                let rustls = tls::load(&ssl).await?;
                info!("Listening on https://{address}");
                axum_server::bind_rustls(address, rustls)
                    .handle(handle)
                    .serve(app)
                    .await
                    .context("HTTPS listener failed")?;
            }
            None => {
                info!("Listening on http://{address}");
                axum_server::bind(address)
                    .handle(handle)
                    .serve(app)
                    .await
                    .context("HTTP listener failed")?;
            }
        }

        info!(channels = events.shutdown(), "Server stopped");
        Ok(())
    }
}
