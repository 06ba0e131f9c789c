use thiserror::Error;

use crate::graph::GraphError;
use crate::rank::RankError;
use crate::semantic::EmbeddingError;
use crate::source::SourceError;
use crate::symbol::SymbolParseError;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error(transparent)]
    Symbol(#[from] SymbolParseError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Rank(#[from] RankError),

    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    #[error(transparent)]
    Source(#[from] SourceError),
}

pub type SearchResult<T> = Result<T, SearchError>;
