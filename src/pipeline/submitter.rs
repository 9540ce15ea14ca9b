use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::embedding::Embedder;
use crate::record::Batch;
use crate::store::{PointRecord, VectorStore};

use super::PipelineError;

/// Backoff before the single retry of a failed embed or upsert.
const RETRY_BACKOFF: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, Default)]
pub struct SubmitterStats {
    pub batches: u64,
    pub records: u64,
    pub failed_batches: u64,
}

/// Consumes completed batches: embeds the messages, assigns ids, and bulk
/// upserts the (id, vector, payload) triples.
///
/// Embed and upsert each get one retry with a short backoff; after that the
/// batch is reported and dropped, never retried indefinitely. Ids are the
/// flush time in microseconds plus the record's position in the batch, with
/// a monotonicity guard so ids stay strictly increasing even when two
/// flushes land in the same microsecond.
pub async fn run_submitter(
    mut batch_rx: mpsc::Receiver<Batch>,
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    collection: String,
    ttl: Option<Duration>,
) -> SubmitterStats {
    let mut stats = SubmitterStats::default();
    let mut last_id: u64 = 0;

    while let Some(batch) = batch_rx.recv().await {
        let count = batch.len();
        match submit_batch(&*embedder, &*store, &collection, ttl, &batch, &mut last_id).await {
            Ok(()) => {
                stats.batches += 1;
                stats.records += count as u64;
                info!(
                    collection = %collection,
                    count,
                    trigger = batch.trigger.as_str(),
                    "Saved batch"
                );
            }
            Err(e) => {
                stats.failed_batches += 1;
                error!(
                    batch_id = %batch.batch_id,
                    count,
                    error = %e,
                    "Dropping batch after failed submission"
                );
            }
        }
    }

    stats
}

async fn submit_batch(
    embedder: &dyn Embedder,
    store: &dyn VectorStore,
    collection: &str,
    ttl: Option<Duration>,
    batch: &Batch,
    last_id: &mut u64,
) -> Result<(), PipelineError> {
    let messages: Vec<String> = batch.records.iter().map(|r| r.message.clone()).collect();

    let vectors = with_retry(|| embedder.embed(messages.clone())).await?;

    let processed_at = Utc::now();
    let mut base = processed_at.timestamp_micros() as u64;
    if base <= *last_id {
        base = *last_id + 1;
    }

    let points: Vec<PointRecord> = batch
        .records
        .iter()
        .zip(vectors)
        .enumerate()
        .map(|(position, (record, vector))| PointRecord {
            id: base + position as u64,
            vector,
            payload: record.payload(processed_at, batch.len(), ttl),
        })
        .collect();
    *last_id = base + batch.len() as u64 - 1;

    with_retry(|| store.upsert(collection, points.clone())).await?;
    Ok(())
}

/// One bounded retry with backoff; the second failure is returned to the
/// caller, who decides what the batch's fate is.
async fn with_retry<T, E, F, Fut>(mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    match operation().await {
        Ok(value) => Ok(value),
        Err(e) => {
            warn!(
                error = %e,
                backoff_ms = RETRY_BACKOFF.as_millis(),
                "Submission step failed, retrying once"
            );
            tokio::time::sleep(RETRY_BACKOFF).await;
            operation().await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn with_retry_succeeds_on_second_attempt() {
        let attempts = AtomicU32::new(0);
        let result: Result<u32, String> = with_retry(|| {
            let attempt = attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt == 0 {
                    Err("transient".to_string())
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn with_retry_gives_up_after_one_retry() {
        let attempts = AtomicU32::new(0);
        let result: Result<u32, String> = with_retry(|| {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err("persistent".to_string()) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }
}
