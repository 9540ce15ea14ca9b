use std::path::PathBuf;
use std::time::Duration;

use chrono::Utc;

use crate::store::{QdrantStore, VectorStore};

/// Poll the vector store and report reachability and collection names.
pub async fn run(
    config_path: Option<PathBuf>,
    once: bool,
    interval: Duration,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_required_config(config_path)?;
    let store = QdrantStore::new(&config.store)?;

    loop {
        let now = Utc::now().to_rfc3339();
        match store.list_collections().await {
            Ok(collections) => {
                println!(
                    "[{}] store healthy, {} collections: {}",
                    now,
                    collections.len(),
                    collections.join(", ")
                );
            }
            Err(e) => {
                println!("[{}] store unreachable: {}", now, e);
            }
        }

        if once {
            break;
        }
        tokio::time::sleep(interval).await;
    }

    Ok(())
}
