use clap::Parser;
use log::{error, info};
use server::config::ServerConfig;
use server::network::Server;
use server::persistence::SnapshotStore;
use server::service::GameService;
use std::sync::Arc;

/// Main-method of the application.
/// Loads the catalog and any saved matches, then serves until Ctrl+C.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = ServerConfig::parse();
    let catalog = config.load_catalog()?;

    let store = SnapshotStore::open(&config.snapshot_dir)?;
    let restored = store.rehydrate()?;
    info!(
        "Rehydrated {} match(es) from {}",
        restored.len(),
        store.dir().display()
    );

    let service = Arc::new(GameService::new(&config, catalog, Some(store)));
    service.restore_matches(restored).await;

    let server = Server::bind(
        &config.address(),
        Arc::clone(&service),
        config.heartbeat_interval(),
    )
    .await?;

    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                error!("Server stopped: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down gracefully...");
        }
    }

    service.checkpoint_all().await;
    Ok(())
}
