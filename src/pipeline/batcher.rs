use std::time::Instant;

use chrono::Utc;
use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::config::BatchConfig;
use crate::expiry::ExpiryPolicy;
use crate::parser::LineParser;
use crate::record::{Batch, FlushTrigger, LogRecord};

use super::PipelineError;

/// Progress is reported every this many processed lines.
const PROGRESS_EVERY: u64 = 100;

/// Accumulator for records between two flushes.
///
/// Idle when empty, accumulating otherwise. The size trigger fires inside
/// the `append` call that crosses the threshold; the idle trigger lives in
/// [`run_batcher`], which owns both and serializes them, so the buffer
/// itself needs no locking.
pub struct BatchBuffer {
    records: Vec<LogRecord>,
    size_threshold: usize,
}

impl BatchBuffer {
    pub fn new(size_threshold: usize) -> Self {
        Self {
            records: Vec::with_capacity(size_threshold),
            size_threshold,
        }
    }

    /// Append one record, preserving arrival order. Returns the full batch
    /// when this append crossed the size threshold, leaving the buffer
    /// empty.
    pub fn append(&mut self, record: LogRecord) -> Option<Vec<LogRecord>> {
        self.records.push(record);
        if self.records.len() >= self.size_threshold {
            Some(std::mem::take(&mut self.records))
        } else {
            None
        }
    }

    /// Drain everything held. `None` when the buffer is empty, making a
    /// flush of an empty buffer a no-op.
    pub fn drain(&mut self) -> Option<Vec<LogRecord>> {
        if self.records.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.records))
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BatcherStats {
    pub processed: u64,
    pub batches: u64,
}

/// Read loop: parse each non-blank line, stamp its expiry, and append it to
/// the buffer. Both flush triggers are delivered to this single task (the
/// size trigger synchronously from `append`, the idle trigger from a timer
/// that every append rearms), so they can never drain the same records
/// twice. Completed batches are handed to the submitter over `batch_tx`,
/// which keeps the slow embed/upsert path off this loop; appends continue
/// while a flush is in flight.
///
/// When the stream ends the buffer is drained one final, unconditional
/// time before returning.
pub async fn run_batcher<S>(
    mut lines: S,
    batch_tx: mpsc::Sender<Batch>,
    parser: LineParser,
    expiry: ExpiryPolicy,
    config: BatchConfig,
) -> Result<BatcherStats, PipelineError>
where
    S: Stream<Item = String> + Unpin,
{
    let mut buffer = BatchBuffer::new(config.size);
    let mut stats = BatcherStats {
        processed: 0,
        batches: 0,
    };
    let started = Instant::now();

    let idle = tokio::time::sleep(config.idle_timeout);
    tokio::pin!(idle);

    loop {
        tokio::select! {
            line = lines.next() => {
                match line {
                    Some(line) => {
                        if line.trim().is_empty() {
                            continue;
                        }

                        let now = Utc::now();
                        let mut record = parser.parse(&line, now);
                        record.expires_at = expiry.expires_at(now);

                        let full = buffer.append(record);
                        // Every append rearms the idle timer: the timeout
                        // measures time since the last append.
                        idle.as_mut()
                            .reset(tokio::time::Instant::now() + config.idle_timeout);

                        if let Some(records) = full {
                            send_batch(&batch_tx, records, FlushTrigger::Size).await?;
                            stats.batches += 1;
                        }

                        stats.processed += 1;
                        if stats.processed % PROGRESS_EVERY == 0 {
                            let rate = stats.processed as f64
                                / started.elapsed().as_secs_f64().max(f64::EPSILON);
                            info!(
                                processed = stats.processed,
                                rate = format_args!("{:.1}/s", rate),
                                "Ingestion progress"
                            );
                        }
                    }
                    None => break,
                }
            }

            _ = &mut idle, if !buffer.is_empty() => {
                if let Some(records) = buffer.drain() {
                    send_batch(&batch_tx, records, FlushTrigger::Idle).await?;
                    stats.batches += 1;
                }
            }
        }
    }

    // Stream ended or was interrupted: final unconditional drain so no
    // buffered record is lost on graceful shutdown.
    if let Some(records) = buffer.drain() {
        send_batch(&batch_tx, records, FlushTrigger::Shutdown).await?;
        stats.batches += 1;
    }

    Ok(stats)
}

async fn send_batch(
    batch_tx: &mpsc::Sender<Batch>,
    records: Vec<LogRecord>,
    trigger: FlushTrigger,
) -> Result<(), PipelineError> {
    let batch = Batch::new(records, trigger);
    debug!(
        batch_id = %batch.batch_id,
        count = batch.len(),
        trigger = trigger.as_str(),
        "Flushing batch"
    );
    batch_tx
        .send(batch)
        .await
        .map_err(|_| PipelineError::ChannelClosed)
}
