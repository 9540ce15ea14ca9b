use std::path::PathBuf;

use chrono::Utc;
use tracing::info;

use crate::embedding::{Embedder, FastEmbedder};
use crate::record::LogLevel;
use crate::store::{QdrantStore, SearchFilter, SearchHit, VectorStore};

pub struct SearchRequest {
    pub query: Option<String>,
    pub collection: String,
    pub limit: usize,
    pub min_score: f32,
    pub level: Option<String>,
    pub source: Option<String>,
    pub hours: Option<u64>,
    pub similar_to: Option<u64>,
    pub stats: bool,
}

/// Semantic search over ingested logs, plus collection stats and
/// find-similar-by-id lookups.
pub async fn run(
    config_path: Option<PathBuf>,
    request: SearchRequest,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_required_config(config_path)?;
    let store = QdrantStore::new(&config.store)?;

    if request.stats {
        let stats = store.collection_stats(&request.collection).await?;
        println!(
            "Collection {}: {} points, status {}",
            request.collection, stats.points_count, stats.status
        );
        return Ok(());
    }

    if let Some(id) = request.similar_to {
        let point = match store.retrieve(&request.collection, id).await? {
            Some(point) => point,
            None => {
                eprintln!("No point with id {} in '{}'", id, request.collection);
                std::process::exit(1);
            }
        };

        // The query point matches itself with a perfect score; fetch one
        // extra hit and drop it.
        let hits = store
            .search(
                &request.collection,
                point.vector,
                request.limit + 1,
                &SearchFilter::default(),
                None,
            )
            .await?;
        let hits: Vec<SearchHit> = hits
            .into_iter()
            .filter(|hit| hit.id != id)
            .take(request.limit)
            .collect();

        println!("Logs similar to id {} ({} hits)", id, hits.len());
        print_hits(&hits);
        return Ok(());
    }

    let query = match request.query {
        Some(query) => query,
        None => {
            eprintln!("A search query is required (or use --stats / --similar-to).");
            std::process::exit(1);
        }
    };

    let level = match &request.level {
        Some(token) => match LogLevel::from_token(token) {
            Some(level) => Some(level.as_str().to_string()),
            None => {
                eprintln!(
                    "Invalid level '{}': expected ERROR, WARN, INFO, or DEBUG",
                    token
                );
                std::process::exit(1);
            }
        },
        None => None,
    };

    let filter = SearchFilter {
        level,
        source: request.source,
        since: request
            .hours
            .map(|hours| Utc::now() - chrono::Duration::hours(hours as i64)),
    };

    info!("Loading embedding model");
    let embedder = FastEmbedder::new()?;
    let mut vectors = embedder.embed(vec![query.clone()]).await?;
    let vector = vectors
        .pop()
        .ok_or("embedder returned no vector for the query")?;

    let hits = store
        .search(
            &request.collection,
            vector,
            request.limit,
            &filter,
            Some(request.min_score),
        )
        .await?;

    println!(
        "Results for '{}' in {} ({} hits)",
        query,
        request.collection,
        hits.len()
    );
    print_hits(&hits);

    Ok(())
}

fn print_hits(hits: &[SearchHit]) {
    for (rank, hit) in hits.iter().enumerate() {
        let level = hit.payload["level"].as_str().unwrap_or("UNKNOWN");
        let message = hit.payload["message"].as_str().unwrap_or("");
        let source = hit.payload["source"].as_str().unwrap_or("unknown");
        let timestamp = hit.payload["timestamp"].as_str().unwrap_or("-");

        println!("{}. [{}] {}", rank + 1, level, message);
        println!(
            "   {} | {} | score {:.3} | id {}",
            source, timestamp, hit.score, hit.id
        );
    }
}
