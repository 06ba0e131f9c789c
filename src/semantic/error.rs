use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("Embedding provider failed: {0}")]
    Provider(String),

    #[error("Embedding already stored for {0}")]
    DuplicateKey(String),

    #[error("No embedding stored for {0}")]
    MissingKey(String),

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Failed to access vector store {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to (de)serialize vector store: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type EmbeddingResult<T> = Result<T, EmbeddingError>;
