use std::sync::Arc;

use fourline_server::{EngineConfig, Server};
use fourline_store::{LogSink, MemoryStore};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let addr =
        std::env::var("FOURLINE_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

    let server = Server::bind(
        &addr,
        EngineConfig::default(),
        Arc::new(MemoryStore::new()),
        Arc::new(LogSink),
    )
    .await?;

    server.run().await?;
    Ok(())
}
