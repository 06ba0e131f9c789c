use indexmap::{IndexMap, IndexSet};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{GraphError, GraphResult, SymbolGraph};
use crate::rank::{EdgeAttributes, RankGraph};
use crate::source::SourceResolver;
use crate::symbol::{Symbol, SymbolKind};
use crate::types::{SymbolFile, SymbolReference};

/// Edge orientation for [`GraphNavigator::rankable_subgraph`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SubgraphDirection {
    /// symbol -> each of its dependencies
    ToDependents,
    /// each dependency -> symbol
    FromDependents,
    #[default]
    Bidirectional,
}

/// Read-only queries over a built [`SymbolGraph`].
#[derive(Clone)]
pub struct GraphNavigator {
    graph: Arc<SymbolGraph>,
    resolver: Arc<dyn SourceResolver>,
}

impl GraphNavigator {
    pub fn new(graph: Arc<SymbolGraph>, resolver: Arc<dyn SourceResolver>) -> Self {
        Self { graph, resolver }
    }

    pub fn graph(&self) -> &SymbolGraph {
        &self.graph
    }

    pub fn all_symbols(&self) -> Vec<Symbol> {
        self.graph.symbols().cloned().collect()
    }

    pub fn all_files(&self) -> Vec<SymbolFile> {
        self.graph.files().collect()
    }

    /// Every reference recorded inside the symbol's definition span, in the
    /// file that defines it.
    pub fn references_in_scope(&self, symbol: &Symbol) -> GraphResult<Vec<SymbolReference>> {
        if !self.graph.contains_symbol(symbol) {
            return Err(GraphError::SymbolNotFound(symbol.uri().to_string()));
        }
        let file = self
            .graph
            .defining_file(symbol)
            .ok_or_else(|| GraphError::NoDefinition(symbol.uri().to_string()))?;
        let mut span = self
            .resolver
            .span(symbol)?
            .ok_or_else(|| GraphError::Unresolvable(symbol.uri().to_string()))?;
        span.path = file.path;

        Ok(self.graph.references_in_span(&span))
    }

    /// Symbols referenced inside this symbol's definition, excluding itself.
    pub fn dependencies(&self, symbol: &Symbol) -> GraphResult<IndexSet<Symbol>> {
        Ok(self
            .references_in_scope(symbol)?
            .into_iter()
            .map(|reference| reference.symbol)
            .filter(|dependency| dependency != symbol)
            .collect())
    }

    pub fn relationships(&self, symbol: &Symbol) -> GraphResult<IndexSet<Symbol>> {
        self.graph.relationships(symbol)
    }

    pub fn references(
        &self,
        symbol: &Symbol,
    ) -> GraphResult<IndexMap<String, Vec<SymbolReference>>> {
        self.graph.references(symbol)
    }

    /// Potential callers. Lexical co-occurrence, so false positives are expected.
    pub fn callers(&self, symbol: &Symbol) -> GraphResult<IndexSet<Symbol>> {
        self.graph.callers(symbol)
    }

    pub fn callees(&self, symbol: &Symbol) -> GraphResult<IndexSet<Symbol>> {
        self.graph.callees(symbol)
    }

    /// Methods and classes outside generated modules, in graph order.
    pub fn rankable_symbols(&self, path_filter: Option<&str>) -> Vec<Symbol> {
        self.graph
            .symbols()
            .filter(|symbol| is_rankable(symbol, path_filter))
            .cloned()
            .collect()
    }

    /// Simple directed graph over rankable symbols, linked by their
    /// dependencies and relationships.
    ///
    /// With a `path_filter`, only symbols whose dotted path starts with it are
    /// kept. Symbols whose dependencies cannot be resolved keep their node but
    /// contribute no edges.
    pub fn rankable_subgraph(
        &self,
        direction: SubgraphDirection,
        path_filter: Option<&str>,
    ) -> RankGraph {
        let mut rank_graph = RankGraph::new();
        let mut nodes = HashMap::new();
        for symbol in self.rankable_symbols(path_filter) {
            let idx = rank_graph.add_node(symbol.clone());
            nodes.insert(symbol, idx);
        }

        let mut skipped = 0usize;
        for symbol in self.graph.symbols() {
            let Some(&source) = nodes.get(symbol) else {
                continue;
            };
            let targets = match self.linked_symbols(symbol) {
                Ok(targets) => targets,
                Err(err @ GraphError::NoDefinition(_)) => {
                    debug!(target: "graph", "{err}");
                    skipped += 1;
                    continue;
                }
                Err(err) => {
                    warn!(target: "graph", "skipping {symbol} in rankable subgraph: {err}");
                    skipped += 1;
                    continue;
                }
            };

            for target in &targets {
                let Some(&target) = nodes.get(target) else {
                    continue;
                };
                if target == source {
                    continue;
                }
                match direction {
                    SubgraphDirection::ToDependents => {
                        rank_graph.update_edge(source, target, EdgeAttributes::default());
                    }
                    SubgraphDirection::FromDependents => {
                        rank_graph.update_edge(target, source, EdgeAttributes::default());
                    }
                    SubgraphDirection::Bidirectional => {
                        rank_graph.update_edge(source, target, EdgeAttributes::default());
                        rank_graph.update_edge(target, source, EdgeAttributes::default());
                    }
                }
            }
        }

        info!(
            target: "graph",
            "Rankable subgraph: {} nodes, {} edges ({skipped} symbols without edges)",
            rank_graph.node_count(),
            rank_graph.edge_count()
        );
        rank_graph
    }

    fn linked_symbols(&self, symbol: &Symbol) -> GraphResult<IndexSet<Symbol>> {
        let mut linked = self.dependencies(symbol)?;
        linked.extend(self.relationships(symbol)?);
        Ok(linked)
    }
}

fn is_rankable(symbol: &Symbol, path_filter: Option<&str>) -> bool {
    if !matches!(symbol.kind(), SymbolKind::Method | SymbolKind::Class) {
        return false;
    }
    if symbol.is_generated() || symbol.is_local() || symbol.is_meta() || symbol.is_parameter() {
        return false;
    }
    path_filter.is_none_or(|prefix| symbol.dotpath().starts_with(prefix))
}
