use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RankError {
    #[error("Invalid SymbolRank configuration: {0}")]
    InvalidConfig(String),

    #[error("SymbolRank did not converge within {max_iterations} iterations")]
    NotConverged { max_iterations: usize },

    #[error("Invalid personalization weights: {0}")]
    InvalidWeights(String),
}

pub type RankResult<T> = Result<T, RankError>;
