use std::sync::Arc;

use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};

use super::{EmbedError, Embedder};

/// Dimensionality of the all-MiniLM-L6-v2 model.
const MINILM_DIMENSION: usize = 384;

/// Local embedding backend running all-MiniLM-L6-v2 in-process.
///
/// Inference is CPU-bound, so it runs under `spawn_blocking` to keep the
/// runtime's worker threads free while a batch is being embedded.
pub struct FastEmbedder {
    model: Arc<TextEmbedding>,
}

impl FastEmbedder {
    pub fn new() -> Result<Self, EmbedError> {
        let model = TextEmbedding::try_new(InitOptions::new(EmbeddingModel::AllMiniLML6V2))
            .map_err(|e| EmbedError::Model(e.to_string()))?;

        Ok(Self {
            model: Arc::new(model),
        })
    }
}

#[async_trait]
impl Embedder for FastEmbedder {
    async fn embed(&self, messages: Vec<String>) -> Result<Vec<Vec<f32>>, EmbedError> {
        let expected = messages.len();
        let model = Arc::clone(&self.model);

        let vectors = tokio::task::spawn_blocking(move || {
            model
                .embed(messages, None)
                .map_err(|e| EmbedError::Model(e.to_string()))
        })
        .await??;

        if vectors.len() != expected {
            return Err(EmbedError::CountMismatch {
                expected,
                got: vectors.len(),
            });
        }

        Ok(vectors)
    }

    fn dimension(&self) -> usize {
        MINILM_DIMENSION
    }
}
