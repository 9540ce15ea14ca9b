use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub mod qdrant;

pub use qdrant::QdrantStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("store returned error status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("unexpected store response: {0}")]
    Response(String),
}

/// Distance metric used when a collection is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Distance {
    Cosine,
    Euclid,
    Dot,
}

/// One (id, vector, payload) triple for bulk upsert.
#[derive(Debug, Clone, Serialize)]
pub struct PointRecord {
    pub id: u64,
    pub vector: Vec<f32>,
    pub payload: Value,
}

/// One ranked search result.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchHit {
    pub id: u64,
    pub score: f32,
    #[serde(default)]
    pub payload: Value,
}

/// A stored point fetched by id, with its vector.
#[derive(Debug, Clone)]
pub struct RetrievedPoint {
    pub id: u64,
    pub vector: Vec<f32>,
    pub payload: Value,
}

/// Must-style conditions applied to a search.
#[derive(Debug, Clone, Default)]
pub struct SearchFilter {
    pub level: Option<String>,
    pub source: Option<String>,
    pub since: Option<DateTime<Utc>>,
}

impl SearchFilter {
    pub fn is_empty(&self) -> bool {
        self.level.is_none() && self.source.is_none() && self.since.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct CollectionStats {
    pub points_count: u64,
    pub status: String,
}

/// Vector store collaborator.
///
/// Implementations are injected into the pipeline and the sweeper through
/// constructor parameters; tests swap in an in-memory implementation.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Create the collection if it does not exist. Returns `true` when this
    /// call created it. When `index_expiry` is set, a datetime payload index
    /// on the expiry field is requested at creation time.
    async fn ensure_collection(
        &self,
        collection: &str,
        vector_size: usize,
        distance: Distance,
        index_expiry: bool,
    ) -> Result<bool, StoreError>;

    /// Bulk write; treated as all-or-nothing by callers.
    async fn upsert(&self, collection: &str, points: Vec<PointRecord>) -> Result<(), StoreError>;

    /// Count points whose expiry is at or before `now`.
    async fn count_expired(&self, collection: &str, now: DateTime<Utc>)
        -> Result<u64, StoreError>;

    /// Delete points whose expiry is at or before `now`.
    async fn delete_expired(&self, collection: &str, now: DateTime<Utc>)
        -> Result<(), StoreError>;

    /// Fetch one point with its vector; `None` when absent.
    async fn retrieve(
        &self,
        collection: &str,
        id: u64,
    ) -> Result<Option<RetrievedPoint>, StoreError>;

    async fn search(
        &self,
        collection: &str,
        vector: Vec<f32>,
        limit: usize,
        filter: &SearchFilter,
        score_threshold: Option<f32>,
    ) -> Result<Vec<SearchHit>, StoreError>;

    async fn list_collections(&self) -> Result<Vec<String>, StoreError>;

    async fn collection_stats(&self, collection: &str) -> Result<CollectionStats, StoreError>;
}
