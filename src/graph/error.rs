use std::path::PathBuf;
use thiserror::Error;

use crate::source::SourceError;

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Failed to read index {}: {source}", path.display())]
    IndexRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode index {}: {source}", path.display())]
    IndexDecode {
        path: PathBuf,
        #[source]
        source: prost::DecodeError,
    },

    #[error("Graph integrity violated: {0}")]
    Integrity(String),

    #[error("Symbol not in graph: {0}")]
    SymbolNotFound(String),

    #[error("Symbol has no defining file: {0}")]
    NoDefinition(String),

    #[error("Source span unavailable for {0}")]
    Unresolvable(String),

    #[error("Source resolver error: {0}")]
    Source(#[from] SourceError),
}

pub type GraphResult<T> = Result<T, GraphError>;
