use beamlink::{Config, RelayError, RelayServer};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), RelayError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::load();
    let server = RelayServer::builder()
        .bind(&config.socket_addr())
        .build()
        .await?;

    server.run().await
}
