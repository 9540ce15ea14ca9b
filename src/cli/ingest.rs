use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use futures::{Stream, StreamExt};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tracing::{info, warn};

use crate::embedding::FastEmbedder;
use crate::pipeline::IngestionPipeline;
use crate::store::QdrantStore;

/// Run the ingestion pipeline over stdin until end-of-stream or Ctrl+C.
pub async fn run(
    config_path: Option<PathBuf>,
    collection: String,
    ttl_override: Option<Duration>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_required_config(config_path)?;

    let mut collection_config = config.collection(&collection);
    if let Some(ttl) = ttl_override {
        collection_config.ttl = Some(ttl);
    }

    info!(
        collection = %collection,
        batch_size = config.batch.size,
        idle_timeout = ?config.batch.idle_timeout,
        ttl = ?collection_config.ttl,
        "Starting ingestion"
    );

    let store = Arc::new(QdrantStore::new(&config.store)?);

    info!("Loading embedding model");
    let embedder = Arc::new(FastEmbedder::new()?);

    let pipeline = IngestionPipeline::new(
        embedder,
        store,
        collection.as_str(),
        collection_config,
        config.batch.clone(),
    );

    // Ctrl+C ends the line stream rather than cancelling the pipeline, so
    // the batcher still performs its final drain before exiting.
    let lines = stdin_lines().take_until(Box::pin(async {
        let _ = signal::ctrl_c().await;
        info!("Shutdown signal received, draining buffer");
    }));

    let stats = pipeline.run(Box::pin(lines)).await?;

    let elapsed = stats.elapsed.as_secs_f64();
    info!(
        processed = stats.processed,
        records_stored = stats.records_stored,
        elapsed = format_args!("{:.1}s", elapsed),
        rate = format_args!("{:.1}/s", stats.processed as f64 / elapsed.max(f64::EPSILON)),
        "Ingestion stopped"
    );
    if stats.failed_batches > 0 {
        warn!(
            failed_batches = stats.failed_batches,
            "Batches were dropped after failed submission"
        );
    }

    Ok(())
}

/// Lines from stdin as a stream. End-of-input and broken pipes both end the
/// stream; they are normal termination, not errors.
fn stdin_lines() -> impl Stream<Item = String> {
    let lines = BufReader::new(tokio::io::stdin()).lines();
    futures::stream::unfold(lines, |mut lines| async move {
        match lines.next_line().await {
            Ok(Some(line)) => Some((line, lines)),
            Ok(None) | Err(_) => None,
        }
    })
}
