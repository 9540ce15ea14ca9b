//! In-memory collaborator implementations shared by the integration tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;

use vectail::embedding::{EmbedError, Embedder};
use vectail::store::{
    CollectionStats, Distance, PointRecord, RetrievedPoint, SearchFilter, SearchHit, StoreError,
    VectorStore,
};

/// Deterministic embedder: the first component of each vector is the
/// message length, the rest zeros. Can be primed to fail a number of times
/// to exercise the retry path.
pub struct MockEmbedder {
    dimension: usize,
    fail_remaining: Mutex<u32>,
}

impl MockEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            fail_remaining: Mutex::new(0),
        }
    }

    pub fn failing(dimension: usize, failures: u32) -> Self {
        Self {
            dimension,
            fail_remaining: Mutex::new(failures),
        }
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    async fn embed(&self, messages: Vec<String>) -> Result<Vec<Vec<f32>>, EmbedError> {
        {
            let mut remaining = self.fail_remaining.lock().unwrap();
            if *remaining > 0 {
                *remaining -= 1;
                return Err(EmbedError::Model("synthetic embedding failure".to_string()));
            }
        }

        Ok(messages
            .iter()
            .map(|message| {
                let mut vector = vec![0.0_f32; self.dimension];
                vector[0] = message.len() as f32;
                vector
            })
            .collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

#[derive(Debug, Clone)]
pub struct CreatedCollection {
    pub name: String,
    pub vector_size: usize,
    pub index_expiry: bool,
}

/// In-memory vector store recording every call.
#[derive(Default)]
pub struct MockStore {
    pub points: Mutex<HashMap<String, Vec<PointRecord>>>,
    pub upserts: Mutex<Vec<(String, Vec<PointRecord>)>>,
    pub created: Mutex<Vec<CreatedCollection>>,
    pub delete_calls: Mutex<u32>,
    pub fail_collections: Mutex<HashSet<String>>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every store call against `collection` fail.
    pub fn fail_collection(&self, collection: &str) {
        self.fail_collections
            .lock()
            .unwrap()
            .insert(collection.to_string());
    }

    pub fn insert_point(&self, collection: &str, id: u64, expires_at: Option<DateTime<Utc>>) {
        let mut payload = json!({ "message": format!("point {}", id) });
        if let Some(expires_at) = expires_at {
            payload["expires_at"] = json!(expires_at.to_rfc3339());
        }
        self.points
            .lock()
            .unwrap()
            .entry(collection.to_string())
            .or_default()
            .push(PointRecord {
                id,
                vector: vec![0.0],
                payload,
            });
    }

    pub fn upsert_count(&self) -> usize {
        self.upserts.lock().unwrap().len()
    }

    pub fn upsert_sizes(&self) -> Vec<usize> {
        self.upserts
            .lock()
            .unwrap()
            .iter()
            .map(|(_, points)| points.len())
            .collect()
    }

    pub fn ids(&self, collection: &str) -> Vec<u64> {
        self.points
            .lock()
            .unwrap()
            .get(collection)
            .map(|points| points.iter().map(|p| p.id).collect())
            .unwrap_or_default()
    }

    pub fn messages(&self, collection: &str) -> Vec<String> {
        self.points
            .lock()
            .unwrap()
            .get(collection)
            .map(|points| {
                points
                    .iter()
                    .filter_map(|p| p.payload["message"].as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn check_failure(&self, collection: &str) -> Result<(), StoreError> {
        if self.fail_collections.lock().unwrap().contains(collection) {
            Err(StoreError::Api {
                status: 500,
                message: "synthetic store failure".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

fn expires_at_of(point: &PointRecord) -> Option<DateTime<Utc>> {
    point
        .payload
        .get("expires_at")
        .and_then(|v| v.as_str())
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

#[async_trait]
impl VectorStore for MockStore {
    async fn ensure_collection(
        &self,
        collection: &str,
        vector_size: usize,
        _distance: Distance,
        index_expiry: bool,
    ) -> Result<bool, StoreError> {
        self.check_failure(collection)?;
        let mut points = self.points.lock().unwrap();
        let created = !points.contains_key(collection);
        points.entry(collection.to_string()).or_default();
        if created {
            self.created.lock().unwrap().push(CreatedCollection {
                name: collection.to_string(),
                vector_size,
                index_expiry,
            });
        }
        Ok(created)
    }

    async fn upsert(&self, collection: &str, points: Vec<PointRecord>) -> Result<(), StoreError> {
        self.check_failure(collection)?;
        self.upserts
            .lock()
            .unwrap()
            .push((collection.to_string(), points.clone()));
        self.points
            .lock()
            .unwrap()
            .entry(collection.to_string())
            .or_default()
            .extend(points);
        Ok(())
    }

    async fn count_expired(
        &self,
        collection: &str,
        now: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        self.check_failure(collection)?;
        let points = self.points.lock().unwrap();
        let count = points
            .get(collection)
            .map(|points| {
                points
                    .iter()
                    .filter(|p| expires_at_of(p).is_some_and(|at| at <= now))
                    .count() as u64
            })
            .unwrap_or(0);
        Ok(count)
    }

    async fn delete_expired(
        &self,
        collection: &str,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.check_failure(collection)?;
        *self.delete_calls.lock().unwrap() += 1;
        if let Some(points) = self.points.lock().unwrap().get_mut(collection) {
            points.retain(|p| !expires_at_of(p).is_some_and(|at| at <= now));
        }
        Ok(())
    }

    async fn retrieve(
        &self,
        collection: &str,
        id: u64,
    ) -> Result<Option<RetrievedPoint>, StoreError> {
        self.check_failure(collection)?;
        let points = self.points.lock().unwrap();
        Ok(points.get(collection).and_then(|points| {
            points.iter().find(|p| p.id == id).map(|p| RetrievedPoint {
                id: p.id,
                vector: p.vector.clone(),
                payload: p.payload.clone(),
            })
        }))
    }

    async fn search(
        &self,
        collection: &str,
        _vector: Vec<f32>,
        limit: usize,
        _filter: &SearchFilter,
        _score_threshold: Option<f32>,
    ) -> Result<Vec<SearchHit>, StoreError> {
        self.check_failure(collection)?;
        let points = self.points.lock().unwrap();
        Ok(points
            .get(collection)
            .map(|points| {
                points
                    .iter()
                    .take(limit)
                    .map(|p| SearchHit {
                        id: p.id,
                        score: 1.0,
                        payload: p.payload.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn list_collections(&self) -> Result<Vec<String>, StoreError> {
        let mut names: Vec<String> = self.points.lock().unwrap().keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn collection_stats(&self, collection: &str) -> Result<CollectionStats, StoreError> {
        self.check_failure(collection)?;
        let points = self.points.lock().unwrap();
        Ok(CollectionStats {
            points_count: points.get(collection).map(|p| p.len() as u64).unwrap_or(0),
            status: "green".to_string(),
        })
    }
}
