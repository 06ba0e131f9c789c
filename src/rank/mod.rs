//! SymbolRank: personalized PageRank over a symbol graph.
//!
//! The graph is flattened once into row-stochastic adjacency lists. Each call
//! to [`SymbolRank::rank_with`] then iterates
//!
//! ```text
//! r'[m] = alpha * sum(r[n] * w(n -> m))
//!       + alpha * sum(r[d] for dangling d) * dangling[m]
//!       + (1 - alpha) * similarity[m]
//! ```
//!
//! until the L1 change drops below `node_count * tolerance`. Every term keeps
//! the total mass at 1, so the returned scores sum to 1.

mod config;
mod error;

pub use config::{
    DEFAULT_ALPHA, DEFAULT_MAX_ITERATIONS, DEFAULT_TOLERANCE, DEFAULT_WEIGHT_KEY,
    SymbolRankConfig,
};
pub use error::{RankError, RankResult};

use std::collections::HashMap;

use petgraph::EdgeType;
use petgraph::graph::{DiGraph, Graph};
use petgraph::visit::EdgeRef;
use tracing::{debug, warn};

use crate::symbol::Symbol;

/// Weight lookup on an edge payload.
pub trait EdgeWeight {
    fn weight(&self, key: &str) -> f64;
}

/// Named numeric attributes on a rank edge. Missing keys weigh 1.0.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EdgeAttributes(HashMap<String, f64>);

impl EdgeAttributes {
    pub fn with(mut self, key: impl Into<String>, value: f64) -> Self {
        self.0.insert(key.into(), value);
        self
    }
}

impl EdgeWeight for EdgeAttributes {
    fn weight(&self, key: &str) -> f64 {
        self.0.get(key).copied().unwrap_or(1.0)
    }
}

impl EdgeWeight for f64 {
    fn weight(&self, _key: &str) -> f64 {
        *self
    }
}

impl EdgeWeight for () {
    fn weight(&self, _key: &str) -> f64 {
        1.0
    }
}

/// Graph consumed by SymbolRank, as produced by the navigator.
pub type RankGraph = DiGraph<Symbol, EdgeAttributes>;

/// Optional per-symbol weight maps. Symbols absent from a map weigh 0.
///
/// `None` means uniform. `dangling` falls back to `similarity`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RankWeights<'a> {
    pub similarity: Option<&'a HashMap<Symbol, f64>>,
    pub initial: Option<&'a HashMap<Symbol, f64>>,
    pub dangling: Option<&'a HashMap<Symbol, f64>>,
}

#[derive(Debug)]
pub struct SymbolRank {
    config: SymbolRankConfig,
    nodes: Vec<Symbol>,
    /// Row-stochastic successor lists; empty for dangling nodes.
    successors: Vec<Vec<(usize, f64)>>,
    dangling: Vec<usize>,
}

impl SymbolRank {
    /// Flatten `graph` for ranking. Undirected graphs contribute each edge in
    /// both directions; parallel edges add their weights.
    pub fn new<E, Ty>(graph: &Graph<Symbol, E, Ty>, config: SymbolRankConfig) -> Self
    where
        E: EdgeWeight,
        Ty: EdgeType,
    {
        let nodes: Vec<Symbol> = graph.node_weights().cloned().collect();
        let mut outgoing: Vec<HashMap<usize, f64>> = vec![HashMap::new(); nodes.len()];

        for edge in graph.edge_references() {
            let weight = edge.weight().weight(config.weight_key());
            let (source, target) = (edge.source().index(), edge.target().index());
            *outgoing[source].entry(target).or_default() += weight;
            if !graph.is_directed() && source != target {
                *outgoing[target].entry(source).or_default() += weight;
            }
        }

        let mut successors = Vec::with_capacity(nodes.len());
        let mut dangling = Vec::new();
        for (node, targets) in outgoing.into_iter().enumerate() {
            let total: f64 = targets.values().filter(|w| **w > 0.0).sum();
            if total <= 0.0 {
                dangling.push(node);
                successors.push(Vec::new());
                continue;
            }
            let mut row: Vec<(usize, f64)> = targets
                .into_iter()
                .filter(|(_, w)| *w > 0.0)
                .map(|(target, w)| (target, w / total))
                .collect();
            row.sort_by_key(|(target, _)| *target);
            successors.push(row);
        }

        debug!(
            target: "rank",
            "SymbolRank over {} nodes ({} dangling)",
            nodes.len(),
            dangling.len()
        );
        Self {
            config,
            nodes,
            successors,
            dangling,
        }
    }

    pub fn config(&self) -> &SymbolRankConfig {
        &self.config
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Rank with an optional personalization vector.
    pub fn rank(
        &self,
        similarity: Option<&HashMap<Symbol, f64>>,
    ) -> RankResult<Vec<(Symbol, f64)>> {
        self.rank_with(RankWeights {
            similarity,
            ..Default::default()
        })
    }

    /// Scores sorted descending; equal scores are ordered by ascending uri.
    pub fn rank_with(&self, weights: RankWeights<'_>) -> RankResult<Vec<(Symbol, f64)>> {
        let n = self.nodes.len();
        if n == 0 {
            return Ok(Vec::new());
        }

        let similarity = self.normalized(weights.similarity, "similarity")?;
        let mut rank = self.normalized(weights.initial, "initial")?;
        let dangling_weights = match weights.dangling {
            Some(map) => self.normalized(Some(map), "dangling")?,
            None => similarity.clone(),
        };

        let alpha = self.config.alpha();
        let threshold = n as f64 * self.config.tolerance();

        for iteration in 0..self.config.max_iterations() {
            let last = rank;
            rank = vec![0.0; n];

            let dangling_sum = alpha * self.dangling.iter().map(|&d| last[d]).sum::<f64>();
            for (node, row) in self.successors.iter().enumerate() {
                for &(target, weight) in row {
                    rank[target] += alpha * last[node] * weight;
                }
            }
            for (node, value) in rank.iter_mut().enumerate() {
                *value += dangling_sum * dangling_weights[node] + (1.0 - alpha) * similarity[node];
            }

            let err: f64 = rank.iter().zip(&last).map(|(a, b)| (a - b).abs()).sum();
            if err < threshold {
                debug!(target: "rank", "converged after {} iterations", iteration + 1);
                return Ok(self.sorted(rank));
            }
        }

        Err(RankError::NotConverged {
            max_iterations: self.config.max_iterations(),
        })
    }

    /// Dense vector summing to 1, uniform when `weights` is `None`.
    fn normalized(
        &self,
        weights: Option<&HashMap<Symbol, f64>>,
        name: &str,
    ) -> RankResult<Vec<f64>> {
        let n = self.nodes.len();
        let uniform = vec![1.0 / n as f64; n];
        let Some(weights) = weights else {
            return Ok(uniform);
        };

        let mut dense = Vec::with_capacity(n);
        for symbol in &self.nodes {
            let value = weights.get(symbol).copied().unwrap_or(0.0);
            if !value.is_finite() || value < 0.0 {
                return Err(RankError::InvalidWeights(format!(
                    "{name} weight for {symbol} is {value}"
                )));
            }
            dense.push(value);
        }

        let total: f64 = dense.iter().sum();
        if total <= 0.0 {
            warn!(target: "rank", "{name} weights sum to zero, using uniform weights");
            return Ok(uniform);
        }
        Ok(dense.into_iter().map(|v| v / total).collect())
    }

    fn sorted(&self, scores: Vec<f64>) -> Vec<(Symbol, f64)> {
        let mut ranked: Vec<(Symbol, f64)> = self.nodes.iter().cloned().zip(scores).collect();
        ranked.sort_by(|(a, sa), (b, sb)| sb.total_cmp(sa).then_with(|| a.cmp(b)));
        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use petgraph::graph::UnGraph;

    fn symbol(name: &str) -> Symbol {
        Symbol::parse(&format!("scip-python python demo 1 `demo`/{name}().")).unwrap()
    }

    fn cycle() -> DiGraph<Symbol, ()> {
        let mut graph = DiGraph::new();
        let a = graph.add_node(symbol("a"));
        let b = graph.add_node(symbol("b"));
        let c = graph.add_node(symbol("c"));
        graph.add_edge(a, b, ());
        graph.add_edge(b, c, ());
        graph.add_edge(c, a, ());
        graph
    }

    fn total(ranked: &[(Symbol, f64)]) -> f64 {
        ranked.iter().map(|(_, s)| s).sum()
    }

    #[test]
    fn test_empty_graph_ranks_nothing() {
        let graph: RankGraph = DiGraph::new();
        let rank = SymbolRank::new(&graph, SymbolRankConfig::default());
        assert!(rank.rank(None).unwrap().is_empty());
    }

    #[test]
    fn test_cycle_is_uniform() {
        let rank = SymbolRank::new(&cycle(), SymbolRankConfig::default());
        let ranked = rank.rank(None).unwrap();

        assert_eq!(ranked.len(), 3);
        for (_, score) in &ranked {
            assert!((score - 1.0 / 3.0).abs() < 1e-9);
        }
        // Equal scores fall back to uri order.
        let names: Vec<&str> = ranked.iter().map(|(s, _)| s.display_name()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_sink_collects_mass() {
        let mut graph = DiGraph::new();
        let a = graph.add_node(symbol("a"));
        let b = graph.add_node(symbol("b"));
        let hub = graph.add_node(symbol("hub"));
        graph.add_edge(a, hub, ());
        graph.add_edge(b, hub, ());

        let config = SymbolRankConfig::new(0.85, 100, 1e-6, "weight").unwrap();
        let ranked = SymbolRank::new(&graph, config).rank(None).unwrap();

        assert_eq!(ranked[0].0, symbol("hub"));
        assert!((total(&ranked) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_personalization_biases_scores() {
        let graph = cycle();
        let similarity = HashMap::from([(symbol("b"), 1.0)]);

        let ranked = SymbolRank::new(&graph, SymbolRankConfig::default())
            .rank(Some(&similarity))
            .unwrap();

        assert_eq!(ranked[0].0, symbol("b"));
        assert!((total(&ranked) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_personalization_falls_back_to_uniform() {
        let graph = cycle();
        let zeros = HashMap::from([(symbol("a"), 0.0)]);

        let ranked = SymbolRank::new(&graph, SymbolRankConfig::default())
            .rank(Some(&zeros))
            .unwrap();
        for (_, score) in &ranked {
            assert!((score - 1.0 / 3.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_negative_weights_rejected() {
        let graph = cycle();
        let negative = HashMap::from([(symbol("a"), -1.0)]);

        let result = SymbolRank::new(&graph, SymbolRankConfig::default()).rank(Some(&negative));
        assert!(matches!(result, Err(RankError::InvalidWeights(_))));
    }

    #[test]
    fn test_edge_weights_split_mass() {
        let mut graph = RankGraph::new();
        let a = graph.add_node(symbol("a"));
        let heavy = graph.add_node(symbol("heavy"));
        let light = graph.add_node(symbol("light"));
        graph.add_edge(a, heavy, EdgeAttributes::default().with("weight", 9.0));
        graph.add_edge(a, light, EdgeAttributes::default());

        let config = SymbolRankConfig::new(0.85, 100, 1e-6, "weight").unwrap();
        let ranked = SymbolRank::new(&graph, config).rank(None).unwrap();
        let score = |name: &str| {
            ranked
                .iter()
                .find(|(s, _)| s.display_name() == name)
                .map(|(_, score)| *score)
                .unwrap()
        };

        assert!(score("heavy") > score("light"));
    }

    #[test]
    fn test_undirected_graph_is_symmetric() {
        let mut graph = UnGraph::new_undirected();
        let a = graph.add_node(symbol("a"));
        let b = graph.add_node(symbol("b"));
        graph.add_edge(a, b, 1.0);

        let ranked = SymbolRank::new(&graph, SymbolRankConfig::default())
            .rank(None)
            .unwrap();
        assert!((ranked[0].1 - ranked[1].1).abs() < 1e-12);
    }

    #[test]
    fn test_zero_iterations_never_converges() {
        let config = SymbolRankConfig::new(0.25, 0, 1e-6, "weight").unwrap();
        let result = SymbolRank::new(&cycle(), config).rank(None);
        assert_eq!(result, Err(RankError::NotConverged { max_iterations: 0 }));
    }
}
