use indexmap::IndexSet;
use tracing::{debug, info, warn};

use super::{GraphEdge, GraphResult, Site, SymbolGraph};
use crate::index::scip;
use crate::source::SourceResolver;
use crate::symbol::{Symbol, SymbolKind};
use crate::types::{Range, SymbolRoles};

/// Builds a [`SymbolGraph`] from a loaded index snapshot.
///
/// Documents are processed in index order. Within a document, file and symbol
/// nodes come first, then occurrences, then (optionally) caller/callee pairs.
/// A symbol declared by a document is contained in that document until a later
/// definition occurrence of the same symbol moves its `Contains` edge.
///
/// Individual items that fail to parse are logged and skipped. The build only
/// fails when the finished graph breaks a structural invariant.
pub struct GraphBuilder<'a> {
    index: &'a scip::Index,
    resolver: Option<&'a dyn SourceResolver>,
    graph: SymbolGraph,
    declared: IndexSet<Symbol>,
    skipped: usize,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(index: &'a scip::Index) -> Self {
        Self {
            index,
            resolver: None,
            graph: SymbolGraph::default(),
            declared: IndexSet::new(),
            skipped: 0,
        }
    }

    /// Also emit `Caller`/`Callee` pairs for every method, using `resolver`
    /// to find method bodies. Cost grows with references per method.
    pub fn with_caller_relations(mut self, resolver: &'a dyn SourceResolver) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn build(mut self) -> GraphResult<SymbolGraph> {
        let index = self.index;
        for document in &index.documents {
            self.add_document(document);
        }
        for info in &index.external_symbols {
            self.add_symbol_information(info);
        }

        self.graph.verify(&self.declared)?;

        let stats = self.graph.stats();
        info!(
            target: "graph",
            "Built symbol graph: {} files, {} symbols, {} references, {} caller pairs \
             ({} items skipped)",
            stats.files, stats.symbols, stats.references, stats.caller_pairs, self.skipped
        );
        Ok(self.graph)
    }

    fn add_document(&mut self, document: &scip::Document) {
        let file = self.graph.add_file(&document.relative_path);

        let mut defined = Vec::new();
        for info in &document.symbols {
            if let Some(symbol) = self.add_symbol_information(info) {
                let node = self.graph.add_symbol(&symbol);
                self.graph.set_definition(node, file);
                self.declared.insert(symbol.clone());
                defined.push(symbol);
            }
        }

        for occurrence in &document.occurrences {
            let Some(symbol) = self.parse_or_skip(&occurrence.symbol) else {
                continue;
            };
            let Some(range) = Range::from_scip(&occurrence.range) else {
                warn!(
                    target: "graph",
                    "skipping occurrence of {symbol} in {} with invalid range {:?}",
                    document.relative_path, occurrence.range
                );
                self.skipped += 1;
                continue;
            };

            let roles = SymbolRoles::from_scip(occurrence.symbol_roles);
            let node = self.graph.add_symbol(&symbol);
            self.graph.add_edge(
                node,
                file,
                GraphEdge::Reference(Site {
                    line: range.start_line,
                    column: range.start_column,
                    roles,
                }),
            );
            if roles.contains(SymbolRoles::DEFINITION) {
                self.graph.set_definition(node, file);
            }
        }

        if let Some(resolver) = self.resolver {
            for method in defined.iter().filter(|s| s.kind() == SymbolKind::Method) {
                self.add_call_edges(resolver, method);
            }
        }
    }

    fn add_symbol_information(&mut self, info: &scip::SymbolInformation) -> Option<Symbol> {
        let symbol = self.parse_or_skip(&info.symbol)?;
        let node = self.graph.add_symbol(&symbol);

        for relationship in &info.relationships {
            let Some(target) = self.parse_or_skip(&relationship.symbol) else {
                continue;
            };
            let target = self.graph.add_symbol(&target);
            self.graph
                .add_edge(node, target, GraphEdge::Relationship(relationship.kinds()));
        }
        Some(symbol)
    }

    /// Link `method` with every method or class mentioned inside its body.
    ///
    /// Mentions are lexical, so the result over-approximates real calls.
    fn add_call_edges(&mut self, resolver: &dyn SourceResolver, method: &Symbol) {
        let span = match resolver.span(method) {
            Ok(Some(span)) => span,
            Ok(None) => {
                debug!(target: "graph", "no source span for {method}, skipping callees");
                return;
            }
            Err(err) => {
                warn!(target: "graph", "failed to resolve {method}: {err}");
                self.skipped += 1;
                return;
            }
        };

        let caller = self.graph.add_symbol(method);
        for reference in self.graph.references_in_span(&span) {
            if &reference.symbol == method
                || !matches!(reference.symbol.kind(), SymbolKind::Method | SymbolKind::Class)
            {
                continue;
            }
            let site = Site {
                line: reference.line,
                column: reference.column,
                roles: reference.roles,
            };
            let callee = self.graph.add_symbol(&reference.symbol);
            self.graph.add_edge(caller, callee, GraphEdge::Caller(site));
            self.graph.add_edge(callee, caller, GraphEdge::Callee(site));
        }
    }

    fn parse_or_skip(&mut self, uri: &str) -> Option<Symbol> {
        match Symbol::parse(uri) {
            Ok(symbol) => Some(symbol),
            Err(err) => {
                warn!(target: "graph", "skipping malformed symbol: {err}");
                self.skipped += 1;
                None
            }
        }
    }
}
