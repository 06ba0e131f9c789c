pub mod config;
pub mod graph;
pub mod index;
pub mod logging;
pub mod rank;
pub mod search;
pub mod semantic;
pub mod source;
pub mod symbol;
pub mod types;

pub use config::Settings;
pub use graph::{GraphBuilder, GraphError, GraphNavigator, SubgraphDirection, SymbolGraph};
pub use index::{IndexLoader, scip};
pub use rank::{RankError, RankGraph, SymbolRank, SymbolRankConfig};
pub use search::{SearchError, SearchQuery, SearchResponse, SymbolSearch};
pub use semantic::{
    EmbeddingError, EmbeddingProvider, JsonVectorStore, NormType, SymbolEmbeddingHandler,
    SymbolSimilarityCalculator, VectorStore,
};
pub use source::{IndexSourceResolver, SourceResolver};
pub use symbol::{Symbol, SymbolKind, SymbolParseError};
pub use types::{Range, SymbolFile, SymbolReference, SymbolRoles};
