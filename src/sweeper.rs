use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, error, info};

use crate::store::{StoreError, VectorStore};

/// Recurring cleanup job that deletes expired records per collection.
///
/// Each cycle counts the points whose expiry has passed and, only when the
/// count is nonzero, issues one bulk delete with the same predicate. A cycle
/// with nothing to remove is a no-op, and a failed cycle just defers the
/// cleanup to the next one; expiry is never enforced at read time, so an
/// expired record can linger for at most one interval past its TTL.
pub struct TtlSweeper {
    store: Arc<dyn VectorStore>,
    collections: Vec<String>,
    interval: Duration,
}

impl TtlSweeper {
    pub fn new(store: Arc<dyn VectorStore>, collections: Vec<String>, interval: Duration) -> Self {
        Self {
            store,
            collections,
            interval,
        }
    }

    pub fn collections(&self) -> &[String] {
        &self.collections
    }

    /// One sweep of one collection. Returns how many expired points were
    /// removed.
    pub async fn sweep_collection(&self, collection: &str) -> Result<u64, StoreError> {
        let now = Utc::now();

        let expired = self.store.count_expired(collection, now).await?;
        if expired == 0 {
            debug!(collection, "No expired points");
            return Ok(0);
        }

        self.store.delete_expired(collection, now).await?;
        info!(collection, expired, "Removed expired points");
        Ok(expired)
    }

    /// One pass over every configured collection. Store failures are
    /// reported and deferred to the next cycle rather than propagated.
    pub async fn sweep_all(&self) -> u64 {
        let mut total = 0;
        for collection in &self.collections {
            match self.sweep_collection(collection).await {
                Ok(removed) => total += removed,
                Err(e) => {
                    error!(
                        collection = %collection,
                        error = %e,
                        "Sweep failed, deferring to next cycle"
                    );
                }
            }
        }
        total
    }

    /// Recurring loop: one pass immediately, then one per interval.
    pub async fn run(&self) {
        let mut ticker = tokio::time::interval(self.interval);
        loop {
            ticker.tick().await;
            info!(
                collections = self.collections.len(),
                "Running TTL sweep"
            );
            let removed = self.sweep_all().await;
            info!(removed, "TTL sweep complete");
        }
    }
}
