//! Search facade.
//!
//! [`SymbolSearch`] is the query surface over one built graph: structural
//! lookups go to the navigator, free-text queries go through embedding
//! similarity into SymbolRank, and literal queries scan module text.

mod error;
mod query;

pub use error::{SearchError, SearchResult};
pub use query::SearchQuery;

use indexmap::{IndexMap, IndexSet};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use tracing::{debug, info};

use crate::graph::{GraphNavigator, SubgraphDirection, SymbolGraph};
use crate::rank::{SymbolRank, SymbolRankConfig};
use crate::semantic::{
    EmbeddingSlot, SymbolEmbeddingHandler, SymbolSimilarityCalculator, shifted_z_score,
};
use crate::source::SourceResolver;
use crate::symbol::Symbol;
use crate::types::SymbolReference;

pub const DEFAULT_Z_SCORE_POWER: f64 = 2.0;

/// Result of [`SymbolSearch::dispatch`], one variant per query kind.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchResponse {
    References(IndexMap<String, Vec<SymbolReference>>),
    Ranking(Vec<(Symbol, f64)>),
    Exact(IndexMap<String, Vec<usize>>),
    Source(Option<String>),
}

pub struct SymbolSearch {
    navigator: GraphNavigator,
    resolver: Arc<dyn SourceResolver>,
    rank_config: SymbolRankConfig,
    embeddings: Arc<SymbolEmbeddingHandler>,
    similarity: SymbolSimilarityCalculator,
    z_score_power: f64,
    /// Built on first ranked query; never rebuilt for this facade.
    symbol_rank: OnceLock<SymbolRank>,
}

impl SymbolSearch {
    pub fn new(
        graph: Arc<SymbolGraph>,
        resolver: Arc<dyn SourceResolver>,
        rank_config: SymbolRankConfig,
        embeddings: Arc<SymbolEmbeddingHandler>,
        similarity: SymbolSimilarityCalculator,
    ) -> Self {
        Self {
            navigator: GraphNavigator::new(graph, Arc::clone(&resolver)),
            resolver,
            rank_config,
            embeddings,
            similarity,
            z_score_power: DEFAULT_Z_SCORE_POWER,
            symbol_rank: OnceLock::new(),
        }
    }

    pub fn with_z_score_power(mut self, power: f64) -> Self {
        self.z_score_power = power;
        self
    }

    pub fn navigator(&self) -> &GraphNavigator {
        &self.navigator
    }

    /// Every rankable symbol ordered by relevance to `query`.
    ///
    /// Only code embeddings personalize the ranking. The query is embedded
    /// before the store is locked.
    pub fn rank_search(&self, query: &str) -> SearchResult<Vec<(Symbol, f64)>> {
        let query_vector = self.similarity.query_vector(query)?;
        let scores = self
            .embeddings
            .with_ordered_embeddings(EmbeddingSlot::Code, |entries| {
                self.similarity.score_vector(entries, &query_vector)
            })?;

        let values: Vec<f64> = scores.values().copied().collect();
        let personalization: HashMap<Symbol, f64> = scores
            .into_keys()
            .zip(shifted_z_score(&values, self.z_score_power))
            .collect();

        let rank = self.symbol_rank();
        let ranked = if personalization.is_empty() {
            debug!(target: "search", "no embeddings stored, ranking without personalization");
            rank.rank(None)?
        } else {
            rank.rank(Some(&personalization))?
        };
        debug!(target: "search", "rank_search({query:?}) -> {} results", ranked.len());
        Ok(ranked)
    }

    pub fn symbol_rank_search_top(
        &self,
        query: &str,
        k: usize,
    ) -> SearchResult<Vec<(Symbol, f64)>> {
        let mut ranked = self.rank_search(query)?;
        ranked.truncate(k);
        Ok(ranked)
    }

    /// Ranking with uniform personalization, no embeddings involved.
    pub fn uniform_rank(&self) -> SearchResult<Vec<(Symbol, f64)>> {
        Ok(self.symbol_rank().rank(None)?)
    }

    pub fn references(&self, uri: &str) -> SearchResult<IndexMap<String, Vec<SymbolReference>>> {
        let symbol = Symbol::parse(uri)?;
        Ok(self.navigator.references(&symbol)?)
    }

    /// Source text of the symbol, or `None` if it cannot be located.
    pub fn source(&self, uri: &str) -> SearchResult<Option<String>> {
        let symbol = Symbol::parse(uri)?;
        Ok(self.resolver.source(&symbol)?.map(|source| source.text))
    }

    /// 1-based line numbers of every line containing `pattern`, per module.
    /// Modules without a match are left out.
    pub fn exact_search(&self, pattern: &str) -> SearchResult<IndexMap<String, Vec<usize>>> {
        if pattern.is_empty() {
            return Err(SearchError::InvalidQuery("empty exact-search pattern".to_string()));
        }
        let mut matches = IndexMap::new();
        for (path, text) in self.resolver.modules() {
            let lines: Vec<usize> = text
                .lines()
                .enumerate()
                .filter(|(_, line)| line.contains(pattern))
                .map(|(number, _)| number + 1)
                .collect();
            if !lines.is_empty() {
                matches.insert(path.to_string(), lines);
            }
        }
        Ok(matches)
    }

    pub fn callers(&self, uri: &str) -> SearchResult<IndexSet<Symbol>> {
        let symbol = Symbol::parse(uri)?;
        Ok(self.navigator.callers(&symbol)?)
    }

    pub fn callees(&self, uri: &str) -> SearchResult<IndexSet<Symbol>> {
        let symbol = Symbol::parse(uri)?;
        Ok(self.navigator.callees(&symbol)?)
    }

    /// Route a `type:<kind> <text>` command.
    pub fn dispatch(&self, query: &str) -> SearchResult<SearchResponse> {
        let parsed: SearchQuery = query.parse()?;
        debug!(target: "search", "dispatching {}", parsed.kind());
        match parsed {
            SearchQuery::SymbolReferences(uri) => {
                Ok(SearchResponse::References(self.references(&uri)?))
            }
            SearchQuery::SymbolRank(text) => Ok(SearchResponse::Ranking(self.rank_search(&text)?)),
            SearchQuery::Exact(pattern) => Ok(SearchResponse::Exact(self.exact_search(&pattern)?)),
            SearchQuery::Source(uri) => Ok(SearchResponse::Source(self.source(&uri)?)),
        }
    }

    fn symbol_rank(&self) -> &SymbolRank {
        self.symbol_rank.get_or_init(|| {
            let subgraph = self
                .navigator
                .rankable_subgraph(SubgraphDirection::default(), None);
            info!(
                target: "search",
                "Building SymbolRank over {} rankable symbols",
                subgraph.node_count()
            );
            SymbolRank::new(&subgraph, self.rank_config.clone())
        })
    }
}
