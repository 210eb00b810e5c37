use sketchrelay::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,sketchrelay=debug")),
        )
        .init();

    let config = ServerConfig::load()?;
    tracing::info!(bind = %config.bind, rooms = ?config.rooms, "configuration loaded");

    let server = SketchRelayServerBuilder::from_config(&config).build().await?;
    if let Ok(addr) = server.local_addr() {
        tracing::info!(%addr, "listening");
    }
    server.run().await
}
