use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::Stream;
use tokio::sync::mpsc;
use tracing::info;

use crate::config::{BatchConfig, CollectionConfig};
use crate::embedding::Embedder;
use crate::expiry::ExpiryPolicy;
use crate::parser::LineParser;
use crate::store::{Distance, VectorStore};

use super::batcher::run_batcher;
use super::submitter::run_submitter;
use super::PipelineError;

/// Completed batches waiting for embedding/upsert. Small on purpose: once
/// the submitter falls this far behind, the read loop blocks instead of
/// buffering without bound.
const BATCH_CHANNEL_CAPACITY: usize = 8;

#[derive(Debug, Clone, Copy)]
pub struct PipelineStats {
    pub processed: u64,
    pub batches: u64,
    pub records_stored: u64,
    pub failed_batches: u64,
    pub elapsed: Duration,
}

/// Orchestrates one ingestion run: a batcher task that owns the buffer and
/// both flush triggers, and a submitter task that embeds and upserts
/// completed batches.
///
/// The embedding and store collaborators are injected here; the pipeline
/// holds no global state and connects to nothing on its own.
pub struct IngestionPipeline {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    collection: String,
    collection_config: CollectionConfig,
    batch_config: BatchConfig,
    source_label: String,
}

impl IngestionPipeline {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        collection: impl Into<String>,
        collection_config: CollectionConfig,
        batch_config: BatchConfig,
    ) -> Self {
        Self {
            embedder,
            store,
            collection: collection.into(),
            collection_config,
            batch_config,
            source_label: "stdin".to_string(),
        }
    }

    /// Origin label attached to plain-text records (defaults to "stdin").
    pub fn with_source_label(mut self, label: impl Into<String>) -> Self {
        self.source_label = label.into();
        self
    }

    /// Consume the line stream until it ends, then drain and wait for all
    /// in-flight batches to settle.
    pub async fn run<S>(self, lines: S) -> Result<PipelineStats, PipelineError>
    where
        S: Stream<Item = String> + Unpin,
    {
        let started = Instant::now();

        self.store
            .ensure_collection(
                &self.collection,
                self.collection_config.vector_size,
                Distance::Cosine,
                self.collection_config.ttl.is_some(),
            )
            .await?;

        let (batch_tx, batch_rx) = mpsc::channel(BATCH_CHANNEL_CAPACITY);

        let submitter = tokio::spawn(run_submitter(
            batch_rx,
            Arc::clone(&self.embedder),
            Arc::clone(&self.store),
            self.collection.clone(),
            self.collection_config.ttl,
        ));

        let parser = LineParser::new(self.source_label.as_str());
        let expiry = ExpiryPolicy::new(self.collection_config.ttl);

        // The batcher owns batch_tx; when it returns, the channel closes and
        // the submitter drains whatever is still in flight before exiting.
        let batcher_stats = run_batcher(
            lines,
            batch_tx,
            parser,
            expiry,
            self.batch_config.clone(),
        )
        .await?;

        let submitter_stats = submitter.await?;

        let stats = PipelineStats {
            processed: batcher_stats.processed,
            batches: batcher_stats.batches,
            records_stored: submitter_stats.records,
            failed_batches: submitter_stats.failed_batches,
            elapsed: started.elapsed(),
        };

        info!(
            processed = stats.processed,
            batches = stats.batches,
            records_stored = stats.records_stored,
            failed_batches = stats.failed_batches,
            "Ingestion pipeline finished"
        );

        Ok(stats)
    }
}
