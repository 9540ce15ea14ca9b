use async_trait::async_trait;
use thiserror::Error;

pub mod fastembed;

pub use self::fastembed::FastEmbedder;

#[derive(Debug, Error)]
pub enum EmbedError {
    #[error("embedding model error: {0}")]
    Model(String),

    #[error("embedding task join error: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("embedder returned {got} vectors for {expected} messages")]
    CountMismatch { expected: usize, got: usize },
}

/// Turns message text into fixed-dimension vectors.
///
/// The output preserves the order and count of the input; callers rely on
/// `vectors[i]` belonging to `messages[i]`.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, messages: Vec<String>) -> Result<Vec<Vec<f32>>, EmbedError>;

    /// Dimensionality of every vector this embedder produces.
    fn dimension(&self) -> usize;
}
