use std::path::PathBuf;
use std::sync::Arc;

use tokio::signal;
use tracing::info;

use crate::store::QdrantStore;
use crate::sweeper::TtlSweeper;

/// Run the TTL sweeper, either once or as a recurring daemon.
pub async fn run(
    config_path: Option<PathBuf>,
    collections: Vec<String>,
    once: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_required_config(config_path)?;

    let targets = if collections.is_empty() {
        config.sweep_targets()
    } else {
        collections
    };

    if targets.is_empty() {
        eprintln!("No collections to sweep: none are configured with a TTL.");
        eprintln!("Declare a collection with a `ttl` in the config, or pass --collection.");
        std::process::exit(1);
    }

    let store = Arc::new(QdrantStore::new(&config.store)?);
    let sweeper = TtlSweeper::new(store, targets, config.sweep.interval);

    if once {
        let removed = sweeper.sweep_all().await;
        info!(removed, "Sweep complete");
        return Ok(());
    }

    info!(
        interval = ?config.sweep.interval,
        collections = ?sweeper.collections(),
        "TTL sweeper started"
    );

    tokio::select! {
        _ = sweeper.run() => {}
        _ = signal::ctrl_c() => {
            info!("TTL sweeper stopped");
        }
    }

    Ok(())
}
