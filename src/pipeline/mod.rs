use thiserror::Error;

pub mod batcher;
pub mod runner;
pub mod submitter;

pub use batcher::{run_batcher, BatchBuffer, BatcherStats};
pub use runner::{IngestionPipeline, PipelineStats};
pub use submitter::{run_submitter, SubmitterStats};

use crate::embedding::EmbedError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("embedding error: {0}")]
    Embed(#[from] EmbedError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("batch channel closed")]
    ChannelClosed,

    #[error("task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}
