use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::StoreConfig;

use super::{
    CollectionStats, Distance, PointRecord, RetrievedPoint, SearchFilter, SearchHit, StoreError,
    VectorStore,
};

/// Payload field holding the expiration timestamp.
const EXPIRES_AT_FIELD: &str = "expires_at";

/// Qdrant client over its HTTP API.
#[derive(Debug)]
pub struct QdrantStore {
    base_url: String,
    client: reqwest::Client,
}

/// Qdrant wraps every response body in `{"result": ..., "status": ...}`.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    result: T,
}

#[derive(Debug, Deserialize)]
struct CountResult {
    count: u64,
}

#[derive(Debug, Deserialize)]
struct CollectionList {
    collections: Vec<CollectionEntry>,
}

#[derive(Debug, Deserialize)]
struct CollectionEntry {
    name: String,
}

#[derive(Debug, Deserialize)]
struct CollectionInfo {
    status: String,
    #[serde(default)]
    points_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct PointResult {
    id: u64,
    #[serde(default)]
    vector: Option<Vec<f32>>,
    #[serde(default)]
    payload: Option<Value>,
}

impl QdrantStore {
    pub fn new(config: &StoreConfig) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            base_url: config.url.trim_end_matches('/').to_string(),
            client,
        })
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            Err(StoreError::Api { status, message })
        }
    }

    /// Filter matching every point whose expiry is at or before `now`.
    fn expiry_filter(now: DateTime<Utc>) -> Value {
        json!({
            "must": [{
                "key": EXPIRES_AT_FIELD,
                "range": { "lte": now.to_rfc3339() }
            }]
        })
    }

    fn search_filter(filter: &SearchFilter) -> Option<Value> {
        let mut must = Vec::new();

        if let Some(level) = &filter.level {
            must.push(json!({ "key": "level", "match": { "value": level } }));
        }
        if let Some(source) = &filter.source {
            must.push(json!({ "key": "source", "match": { "value": source } }));
        }
        if let Some(since) = filter.since {
            must.push(json!({ "key": "timestamp", "range": { "gte": since.to_rfc3339() } }));
        }

        if must.is_empty() {
            None
        } else {
            Some(json!({ "must": must }))
        }
    }
}

#[async_trait]
impl VectorStore for QdrantStore {
    async fn ensure_collection(
        &self,
        collection: &str,
        vector_size: usize,
        distance: Distance,
        index_expiry: bool,
    ) -> Result<bool, StoreError> {
        let url = format!("{}/collections/{}", self.base_url, collection);

        let response = self.client.get(&url).send().await?;
        if response.status().is_success() {
            return Ok(false);
        }
        if response.status() != reqwest::StatusCode::NOT_FOUND {
            return Err(StoreError::Api {
                status: response.status().as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let body = json!({
            "vectors": { "size": vector_size, "distance": distance }
        });
        Self::check(self.client.put(&url).json(&body).send().await?).await?;

        if index_expiry {
            // Datetime index keeps the sweep filter cheap.
            let index_url = format!("{}/collections/{}/index", self.base_url, collection);
            let body = json!({
                "field_name": EXPIRES_AT_FIELD,
                "field_schema": "datetime"
            });
            Self::check(self.client.put(&index_url).json(&body).send().await?).await?;
        }

        tracing::info!(collection, vector_size, "Created collection");
        Ok(true)
    }

    async fn upsert(&self, collection: &str, points: Vec<PointRecord>) -> Result<(), StoreError> {
        let url = format!(
            "{}/collections/{}/points?wait=true",
            self.base_url, collection
        );
        let body = json!({ "points": points });

        Self::check(self.client.put(&url).json(&body).send().await?).await?;
        Ok(())
    }

    async fn count_expired(
        &self,
        collection: &str,
        now: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        let url = format!("{}/collections/{}/points/count", self.base_url, collection);
        let body = json!({ "filter": Self::expiry_filter(now), "exact": true });

        let response = Self::check(self.client.post(&url).json(&body).send().await?).await?;
        let parsed: ApiResponse<CountResult> = response.json().await?;
        Ok(parsed.result.count)
    }

    async fn delete_expired(
        &self,
        collection: &str,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let url = format!(
            "{}/collections/{}/points/delete?wait=true",
            self.base_url, collection
        );
        let body = json!({ "filter": Self::expiry_filter(now) });

        Self::check(self.client.post(&url).json(&body).send().await?).await?;
        Ok(())
    }

    async fn retrieve(
        &self,
        collection: &str,
        id: u64,
    ) -> Result<Option<RetrievedPoint>, StoreError> {
        let url = format!("{}/collections/{}/points/{}", self.base_url, collection, id);

        let response = self.client.get(&url).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = Self::check(response).await?;
        let parsed: ApiResponse<PointResult> = response.json().await?;

        let vector = parsed.result.vector.ok_or_else(|| {
            StoreError::Response(format!("point {} returned without a vector", id))
        })?;

        Ok(Some(RetrievedPoint {
            id: parsed.result.id,
            vector,
            payload: parsed.result.payload.unwrap_or(Value::Null),
        }))
    }

    async fn search(
        &self,
        collection: &str,
        vector: Vec<f32>,
        limit: usize,
        filter: &SearchFilter,
        score_threshold: Option<f32>,
    ) -> Result<Vec<SearchHit>, StoreError> {
        let url = format!("{}/collections/{}/points/search", self.base_url, collection);

        let mut body = json!({
            "vector": vector,
            "limit": limit,
            "with_payload": true
        });
        if let Some(filter) = Self::search_filter(filter) {
            body["filter"] = filter;
        }
        if let Some(threshold) = score_threshold {
            body["score_threshold"] = json!(threshold);
        }

        let response = Self::check(self.client.post(&url).json(&body).send().await?).await?;
        let parsed: ApiResponse<Vec<SearchHit>> = response.json().await?;
        Ok(parsed.result)
    }

    async fn list_collections(&self) -> Result<Vec<String>, StoreError> {
        let url = format!("{}/collections", self.base_url);

        let response = Self::check(self.client.get(&url).send().await?).await?;
        let parsed: ApiResponse<CollectionList> = response.json().await?;
        Ok(parsed
            .result
            .collections
            .into_iter()
            .map(|entry| entry.name)
            .collect())
    }

    async fn collection_stats(&self, collection: &str) -> Result<CollectionStats, StoreError> {
        let url = format!("{}/collections/{}", self.base_url, collection);

        let response = Self::check(self.client.get(&url).send().await?).await?;
        let parsed: ApiResponse<CollectionInfo> = response.json().await?;
        Ok(CollectionStats {
            points_count: parsed.result.points_count.unwrap_or(0),
            status: parsed.result.status,
        })
    }
}
