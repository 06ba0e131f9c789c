//! Symbol graph.
//!
//! A directed multigraph over two disjoint node kinds, source files and
//! symbols. Edges are a tagged union so every consumer matches on the edge kind
//! instead of comparing labels:
//!
//! - `Contains` file -> symbol, one per defined symbol
//! - `Relationship` symbol -> symbol, declared by the indexer
//! - `Reference` symbol -> file, one per occurrence
//! - `Caller` / `Callee` symbol -> symbol, always inserted as a reciprocal pair
//!
//! The graph is built once by [`GraphBuilder`] and is read-only afterwards.

mod builder;
mod error;
mod navigator;

pub use builder::GraphBuilder;
pub use error::{GraphError, GraphResult};
pub use navigator::{GraphNavigator, SubgraphDirection};

use indexmap::{IndexMap, IndexSet};
use petgraph::Direction;
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;

use crate::source::SourceSpan;
use crate::symbol::Symbol;
use crate::types::{RelationshipKinds, SymbolFile, SymbolReference, SymbolRoles};

#[derive(Debug, Clone)]
pub enum GraphNode {
    File(SymbolFile),
    Symbol(Symbol),
}

/// Position payload shared by reference and call edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Site {
    pub line: u32,
    pub column: u32,
    pub roles: SymbolRoles,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphEdge {
    Contains,
    Relationship(RelationshipKinds),
    Reference(Site),
    /// Source is a potential caller of the target.
    Caller(Site),
    /// Source is potentially called by the target.
    Callee(Site),
}

/// Node and edge counts, per edge kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GraphStats {
    pub files: usize,
    pub symbols: usize,
    pub contains: usize,
    pub relationships: usize,
    pub references: usize,
    pub caller_pairs: usize,
}

#[derive(Debug, Default)]
pub struct SymbolGraph {
    graph: StableDiGraph<GraphNode, GraphEdge>,
    symbols: IndexMap<Symbol, NodeIndex>,
    files: IndexMap<String, NodeIndex>,
}

impl SymbolGraph {
    pub(crate) fn add_file(&mut self, path: &str) -> NodeIndex {
        if let Some(&idx) = self.files.get(path) {
            return idx;
        }
        let idx = self.graph.add_node(GraphNode::File(SymbolFile::new(path)));
        self.files.insert(path.to_string(), idx);
        idx
    }

    pub(crate) fn add_symbol(&mut self, symbol: &Symbol) -> NodeIndex {
        if let Some(&idx) = self.symbols.get(symbol) {
            return idx;
        }
        let idx = self.graph.add_node(GraphNode::Symbol(symbol.clone()));
        self.symbols.insert(symbol.clone(), idx);
        idx
    }

    pub(crate) fn add_edge(
        &mut self,
        from: NodeIndex,
        to: NodeIndex,
        edge: GraphEdge,
    ) -> EdgeIndex {
        self.graph.add_edge(from, to, edge)
    }

    /// Point the symbol's single `Contains` edge at `file`, dropping any
    /// earlier definition site.
    pub(crate) fn set_definition(&mut self, symbol: NodeIndex, file: NodeIndex) {
        let stale: Vec<EdgeIndex> = self
            .graph
            .edges_directed(symbol, Direction::Incoming)
            .filter(|edge| matches!(edge.weight(), GraphEdge::Contains))
            .map(|edge| edge.id())
            .collect();
        for edge in stale {
            self.graph.remove_edge(edge);
        }
        self.graph.add_edge(file, symbol, GraphEdge::Contains);
    }

    /// Fails if any symbol ended up with more than one `Contains` edge, or if
    /// a symbol some document declared ended up with none.
    pub(crate) fn verify(&self, declared: &IndexSet<Symbol>) -> GraphResult<()> {
        for (symbol, &idx) in &self.symbols {
            let contains = self
                .graph
                .edges_directed(idx, Direction::Incoming)
                .filter(|edge| matches!(edge.weight(), GraphEdge::Contains))
                .count();
            if contains > 1 || (contains == 0 && declared.contains(symbol)) {
                return Err(GraphError::Integrity(format!(
                    "{symbol} has {contains} contains edges"
                )));
            }
        }
        Ok(())
    }

    pub fn contains_symbol(&self, symbol: &Symbol) -> bool {
        self.symbols.contains_key(symbol)
    }

    /// Symbols in insertion order.
    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> + '_ {
        self.symbols.keys()
    }

    /// Files in insertion order.
    pub fn files(&self) -> impl Iterator<Item = SymbolFile> + '_ {
        self.files.keys().map(|path| SymbolFile::new(path.as_str()))
    }

    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn stats(&self) -> GraphStats {
        let mut stats = GraphStats {
            files: self.files.len(),
            symbols: self.symbols.len(),
            ..Default::default()
        };
        for edge in self.graph.edge_indices() {
            match self.graph.edge_weight(edge) {
                Some(GraphEdge::Contains) => stats.contains += 1,
                Some(GraphEdge::Relationship(_)) => stats.relationships += 1,
                Some(GraphEdge::Reference(_)) => stats.references += 1,
                Some(GraphEdge::Caller(_)) => stats.caller_pairs += 1,
                Some(GraphEdge::Callee(_)) | None => {}
            }
        }
        stats
    }

    pub fn defining_file(&self, symbol: &Symbol) -> Option<SymbolFile> {
        let &idx = self.symbols.get(symbol)?;
        self.graph
            .edges_directed(idx, Direction::Incoming)
            .find(|edge| matches!(edge.weight(), GraphEdge::Contains))
            .and_then(|edge| match self.graph.node_weight(edge.source()) {
                Some(GraphNode::File(file)) => Some(file.clone()),
                _ => None,
            })
    }

    /// Number of `Contains` edges pointing at the symbol.
    pub fn definition_count(&self, symbol: &Symbol) -> usize {
        let Some(&idx) = self.symbols.get(symbol) else {
            return 0;
        };
        self.graph
            .edges_directed(idx, Direction::Incoming)
            .filter(|edge| matches!(edge.weight(), GraphEdge::Contains))
            .count()
    }

    /// Targets of the symbol's outgoing `Relationship` edges.
    pub fn relationships(&self, symbol: &Symbol) -> GraphResult<IndexSet<Symbol>> {
        self.symbol_targets(symbol, |edge| matches!(edge, GraphEdge::Relationship(_)))
    }

    /// Every occurrence of the symbol, grouped by file.
    pub fn references(
        &self,
        symbol: &Symbol,
    ) -> GraphResult<IndexMap<String, Vec<SymbolReference>>> {
        let idx = self.node_of(symbol)?;
        let mut grouped: IndexMap<String, Vec<SymbolReference>> = IndexMap::new();
        for edge in self.graph.edges_directed(idx, Direction::Outgoing) {
            let GraphEdge::Reference(site) = edge.weight() else {
                continue;
            };
            if let Some(GraphNode::File(file)) = self.graph.node_weight(edge.target()) {
                grouped.entry(file.path.clone()).or_default().push(SymbolReference::new(
                    symbol.clone(),
                    site.line,
                    site.column,
                    site.roles,
                ));
            }
        }
        for references in grouped.values_mut() {
            references.sort_by_key(|r| (r.line, r.column));
            references.dedup();
        }
        grouped.sort_keys();
        Ok(grouped)
    }

    /// Potential callers: symbols whose body mentions this symbol.
    pub fn callers(&self, symbol: &Symbol) -> GraphResult<IndexSet<Symbol>> {
        self.symbol_targets(symbol, |edge| matches!(edge, GraphEdge::Callee(_)))
    }

    /// Potential callees: symbols mentioned inside this symbol's body.
    pub fn callees(&self, symbol: &Symbol) -> GraphResult<IndexSet<Symbol>> {
        self.symbol_targets(symbol, |edge| matches!(edge, GraphEdge::Caller(_)))
    }

    /// Every reference recorded in `span.path` that falls inside the span.
    pub fn references_in_span(&self, span: &SourceSpan) -> Vec<SymbolReference> {
        let Some(&file) = self.files.get(&span.path) else {
            return Vec::new();
        };
        let mut references: Vec<SymbolReference> = self
            .graph
            .edges_directed(file, Direction::Incoming)
            .filter_map(|edge| {
                let GraphEdge::Reference(site) = edge.weight() else {
                    return None;
                };
                if !span.encloses(site.line, site.column) {
                    return None;
                }
                match self.graph.node_weight(edge.source()) {
                    Some(GraphNode::Symbol(symbol)) => Some(SymbolReference::new(
                        symbol.clone(),
                        site.line,
                        site.column,
                        site.roles,
                    )),
                    _ => None,
                }
            })
            .collect();
        references
            .sort_by(|a, b| (a.line, a.column, &a.symbol).cmp(&(b.line, b.column, &b.symbol)));
        references.dedup();
        references
    }

    fn node_of(&self, symbol: &Symbol) -> GraphResult<NodeIndex> {
        self.symbols
            .get(symbol)
            .copied()
            .ok_or_else(|| GraphError::SymbolNotFound(symbol.uri().to_string()))
    }

    fn symbol_targets(
        &self,
        symbol: &Symbol,
        wanted: impl Fn(&GraphEdge) -> bool,
    ) -> GraphResult<IndexSet<Symbol>> {
        let idx = self.node_of(symbol)?;
        let mut targets: Vec<(EdgeIndex, Symbol)> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .filter(|edge| wanted(edge.weight()))
            .filter_map(|edge| match self.graph.node_weight(edge.target()) {
                Some(GraphNode::Symbol(target)) => Some((edge.id(), target.clone())),
                _ => None,
            })
            .collect();
        // Adjacency lists iterate newest-first; sort by edge index for a stable order.
        targets.sort_by_key(|(edge, _)| *edge);
        Ok(targets.into_iter().map(|(_, symbol)| symbol).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symbol(name: &str) -> Symbol {
        Symbol::parse(&format!("scip-python python demo 1 `demo`/{name}")).unwrap()
    }

    fn site(line: u32, column: u32) -> Site {
        Site {
            line,
            column,
            roles: SymbolRoles::READ_ACCESS,
        }
    }

    #[test]
    fn test_add_symbol_is_idempotent() {
        let mut graph = SymbolGraph::default();
        let a = symbol("A#");

        let first = graph.add_symbol(&a);
        let second = graph.add_symbol(&a);

        assert_eq!(first, second);
        assert_eq!(graph.symbol_count(), 1);
    }

    #[test]
    fn test_set_definition_replaces_contains_edge() {
        let mut graph = SymbolGraph::default();
        let a = symbol("A#");
        let node = graph.add_symbol(&a);
        let first = graph.add_file("one.py");
        let second = graph.add_file("two.py");

        graph.set_definition(node, first);
        graph.set_definition(node, second);

        assert_eq!(graph.definition_count(&a), 1);
        assert_eq!(graph.defining_file(&a), Some(SymbolFile::new("two.py")));
        assert!(graph.verify(&IndexSet::from([a])).is_ok());
    }

    #[test]
    fn test_verify_detects_duplicate_contains() {
        let mut graph = SymbolGraph::default();
        let a = symbol("A#");
        let node = graph.add_symbol(&a);
        let file = graph.add_file("one.py");
        graph.add_edge(file, node, GraphEdge::Contains);
        graph.add_edge(file, node, GraphEdge::Contains);

        assert!(matches!(graph.verify(&IndexSet::new()), Err(GraphError::Integrity(_))));
    }

    #[test]
    fn test_verify_detects_uncontained_declared_symbol() {
        let mut graph = SymbolGraph::default();
        let a = symbol("A#");
        graph.add_symbol(&a);

        assert!(matches!(
            graph.verify(&IndexSet::from([a])),
            Err(GraphError::Integrity(_))
        ));
        assert!(graph.verify(&IndexSet::new()).is_ok());
    }

    #[test]
    fn test_references_grouped_by_file() {
        let mut graph = SymbolGraph::default();
        let a = symbol("A#");
        let node = graph.add_symbol(&a);
        let one = graph.add_file("one.py");
        let two = graph.add_file("two.py");
        graph.add_edge(node, one, GraphEdge::Reference(site(9, 1)));
        graph.add_edge(node, one, GraphEdge::Reference(site(2, 4)));
        graph.add_edge(node, two, GraphEdge::Reference(site(0, 0)));

        let grouped = graph.references(&a).unwrap();
        assert_eq!(grouped.len(), 2);
        let lines: Vec<u32> = grouped["one.py"].iter().map(|r| r.line).collect();
        assert_eq!(lines, vec![2, 9]);
        assert_eq!(grouped["two.py"].len(), 1);
    }

    #[test]
    fn test_references_in_span() {
        let mut graph = SymbolGraph::default();
        let a = symbol("A#");
        let b = symbol("B#");
        let na = graph.add_symbol(&a);
        let nb = graph.add_symbol(&b);
        let file = graph.add_file("one.py");
        graph.add_edge(na, file, GraphEdge::Reference(site(3, 2)));
        graph.add_edge(nb, file, GraphEdge::Reference(site(4, 8)));
        graph.add_edge(nb, file, GraphEdge::Reference(site(10, 0)));

        let span = SourceSpan {
            path: "one.py".to_string(),
            start_line: 3,
            start_column: 4,
            end_line: 5,
        };
        let found = graph.references_in_span(&span);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].symbol, b);
        assert_eq!(found[0].line, 4);
    }

    #[test]
    fn test_unknown_symbol_is_an_error() {
        let graph = SymbolGraph::default();
        assert!(matches!(
            graph.relationships(&symbol("A#")),
            Err(GraphError::SymbolNotFound(_))
        ));
    }
}
