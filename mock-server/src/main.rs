use std::error::Error;

use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let port = std::env::var("PORT").ok();
    let addr = mock_server::listen_addr(port.as_deref()).map_err(|e| {
        error!(port = ?port, "invalid PORT: {e}");
        e
    })?;

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "mock server ready");
    mock_server::run(listener).await?;
    Ok(())
}
