//! `RelayServer` builder and serve loop.

use std::sync::Arc;

use beamlink_store::StoreConfig;
use beamlink_sweep::{spawn_sweeper, SweepConfig};
use tokio::net::TcpListener;

use crate::routes::router;
use crate::{AppState, RelayError};

/// Builder for configuring and starting a relay server.
///
/// # Example
///
/// ```rust,no_run
/// use beamlink::RelayServer;
///
/// # async fn run() -> Result<(), beamlink::RelayError> {
/// let server = RelayServer::builder()
///     .bind("0.0.0.0:3000")
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct RelayServerBuilder {
    bind_addr: String,
    store_config: StoreConfig,
    sweep_config: SweepConfig,
}

impl RelayServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".to_string(),
            store_config: StoreConfig::default(),
            sweep_config: SweepConfig::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the store configuration.
    pub fn store_config(mut self, config: StoreConfig) -> Self {
        self.store_config = config;
        self
    }

    /// Sets the sweeper configuration.
    pub fn sweep_config(mut self, config: SweepConfig) -> Self {
        self.sweep_config = config;
        self
    }

    /// Binds the listener and builds the server.
    pub async fn build(self) -> Result<RelayServer, RelayError> {
        let listener = TcpListener::bind(&self.bind_addr).await?;
        Ok(RelayServer {
            listener,
            state: Arc::new(AppState::new(self.store_config)),
            sweep_config: self.sweep_config,
        })
    }
}

impl Default for RelayServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A relay server that is bound and ready to serve.
///
/// Call [`run()`](Self::run) to start the sweeper and accept requests.
pub struct RelayServer {
    listener: TcpListener,
    state: Arc<AppState>,
    sweep_config: SweepConfig,
}

impl RelayServer {
    /// Creates a new builder.
    pub fn builder() -> RelayServerBuilder {
        RelayServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// Serves requests until the process is terminated.
    ///
    /// The expiry sweeper runs as a sibling task for the server's whole
    /// lifetime; it is stopped if serving ever returns.
    pub async fn run(self) -> Result<(), RelayError> {
        let sweeper =
            spawn_sweeper(self.state.store(), self.sweep_config);

        tracing::info!(
            addr = %self.listener.local_addr()?,
            "beamlink relay listening"
        );

        let result = axum::serve(self.listener, router(self.state)).await;
        sweeper.shutdown().await;
        result.map_err(RelayError::from)
    }
}
