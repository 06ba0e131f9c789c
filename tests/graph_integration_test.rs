//! Load an encoded index from disk, build the graph and navigate it.

use prost::Message;
use std::sync::Arc;
use tempfile::TempDir;

use symdex::{
    GraphBuilder, GraphNavigator, IndexLoader, IndexSourceResolver, SubgraphDirection, Symbol,
    SymbolRoles, scip,
};

const PKG: &str = "scip-python python shop 0.1";

const MODELS: &str = "\
class Cart:
    def add(self, item):
        self.items.append(item)
        return Total(self.items)

class Total:
    def __init__(self, items):
        self.value = sum(items)
";

const SERVICE: &str = "\
from shop.models import Cart

def checkout(cart):
    cart.add(1)
    return cart
";

fn uri(descriptors: &str) -> String {
    format!("{PKG} {descriptors}")
}

fn symbol(descriptors: &str) -> Symbol {
    Symbol::parse(&uri(descriptors)).unwrap()
}

fn occurrence(descriptors: &str, range: [i32; 3], roles: SymbolRoles) -> scip::Occurrence {
    scip::Occurrence {
        range: range.to_vec(),
        symbol: uri(descriptors),
        symbol_roles: roles.bits() as i32,
        ..Default::default()
    }
}

fn info(descriptors: &str) -> scip::SymbolInformation {
    scip::SymbolInformation {
        symbol: uri(descriptors),
        ..Default::default()
    }
}

fn shop_index() -> scip::Index {
    let mut total = info("`shop.models`/Total#");
    total.relationships.push(scip::Relationship {
        symbol: uri("`shop.models`/Cart#"),
        is_reference: true,
        ..Default::default()
    });

    scip::Index {
        metadata: Some(scip::Metadata {
            version: 0,
            tool_info: Some(scip::ToolInfo {
                name: "scip-python".to_string(),
                version: "0.6.0".to_string(),
                arguments: Vec::new(),
            }),
            project_root: "file:///work/shop".to_string(),
            text_document_encoding: 0,
        }),
        documents: vec![
            scip::Document {
                relative_path: "shop/models.py".to_string(),
                language: "python".to_string(),
                text: MODELS.to_string(),
                symbols: vec![
                    info("`shop.models`/Cart#"),
                    info("`shop.models`/Cart#add()."),
                    total,
                    info("`shop.models`/Total#__init__()."),
                ],
                occurrences: vec![
                    occurrence("`shop.models`/Cart#", [0, 6, 10], SymbolRoles::DEFINITION),
                    occurrence("`shop.models`/Cart#add().", [1, 8, 11], SymbolRoles::DEFINITION),
                    occurrence("`shop.models`/Total#", [3, 15, 20], SymbolRoles::READ_ACCESS),
                    occurrence("`shop.models`/Total#", [5, 6, 11], SymbolRoles::DEFINITION),
                    occurrence(
                        "`shop.models`/Total#__init__().",
                        [6, 8, 16],
                        SymbolRoles::DEFINITION,
                    ),
                ],
                ..Default::default()
            },
            scip::Document {
                relative_path: "shop/service.py".to_string(),
                language: "python".to_string(),
                text: SERVICE.to_string(),
                symbols: vec![info("`shop.service`/checkout().")],
                occurrences: vec![
                    occurrence("`shop.models`/Cart#", [0, 24, 28], SymbolRoles::IMPORT),
                    occurrence("`shop.service`/checkout().", [2, 4, 12], SymbolRoles::DEFINITION),
                    occurrence("`shop.models`/Cart#add().", [3, 9, 12], SymbolRoles::READ_ACCESS),
                    // Dropped: malformed symbol and a bad range.
                    scip::Occurrence {
                        range: vec![3, 0, 1],
                        symbol: "broken".to_string(),
                        ..Default::default()
                    },
                    scip::Occurrence {
                        range: vec![1],
                        symbol: uri("`shop.service`/checkout()."),
                        ..Default::default()
                    },
                ],
                ..Default::default()
            },
        ],
        external_symbols: vec![info("builtins/sum().")],
    }
}

fn load_from_disk() -> (TempDir, scip::Index) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("index.scip");
    std::fs::write(&path, shop_index().encode_to_vec()).unwrap();

    let index = IndexLoader::load(&path).unwrap();
    (temp_dir, index)
}

fn navigator(index: &scip::Index) -> GraphNavigator {
    let resolver = Arc::new(IndexSourceResolver::from_index(index));
    let graph = GraphBuilder::new(index)
        .with_caller_relations(resolver.as_ref())
        .build()
        .unwrap();
    GraphNavigator::new(Arc::new(graph), resolver)
}

#[test]
fn test_load_round_trips_through_disk() {
    let (_dir, index) = load_from_disk();
    assert_eq!(index, shop_index());
    assert_eq!(index.project_root(), Some("/work/shop"));
}

#[test]
fn test_every_defined_symbol_has_one_contains_edge() {
    let (_dir, index) = load_from_disk();
    let navigator = navigator(&index);
    let graph = navigator.graph();

    for descriptors in [
        "`shop.models`/Cart#",
        "`shop.models`/Cart#add().",
        "`shop.models`/Total#",
        "`shop.models`/Total#__init__().",
        "`shop.service`/checkout().",
    ] {
        assert_eq!(graph.definition_count(&symbol(descriptors)), 1, "{descriptors}");
    }
    assert_eq!(graph.definition_count(&symbol("builtins/sum().")), 0);
    assert_eq!(graph.file_count(), 2);
    assert!(!graph.contains_symbol(&symbol("broken/")));
}

#[test]
fn test_references_grouped_by_file() {
    let (_dir, index) = load_from_disk();
    let navigator = navigator(&index);

    let references = navigator.references(&symbol("`shop.models`/Cart#")).unwrap();
    let files: Vec<&str> = references.keys().map(String::as_str).collect();
    assert_eq!(files, vec!["shop/models.py", "shop/service.py"]);
    assert!(references["shop/models.py"][0].is_definition());
    assert_eq!(references["shop/service.py"][0].line, 0);
}

#[test]
fn test_dependencies_and_relationships() {
    let (_dir, index) = load_from_disk();
    let navigator = navigator(&index);

    let deps = navigator.dependencies(&symbol("`shop.models`/Cart#add().")).unwrap();
    assert_eq!(deps.len(), 1);
    assert!(deps.contains(&symbol("`shop.models`/Total#")));

    let related = navigator.relationships(&symbol("`shop.models`/Total#")).unwrap();
    assert!(related.contains(&symbol("`shop.models`/Cart#")));
}

#[test]
fn test_callers_are_potential_and_reciprocal() {
    let (_dir, index) = load_from_disk();
    let navigator = navigator(&index);

    let add = symbol("`shop.models`/Cart#add().");
    let checkout = symbol("`shop.service`/checkout().");

    assert!(navigator.callees(&checkout).unwrap().contains(&add));
    assert!(navigator.callers(&add).unwrap().contains(&checkout));
    // The class reference inside `add` counts as a potential call.
    assert!(navigator
        .callees(&add)
        .unwrap()
        .contains(&symbol("`shop.models`/Total#")));
}

#[test]
fn test_rankable_subgraph_over_loaded_index() {
    let (_dir, index) = load_from_disk();
    let navigator = navigator(&index);

    let graph = navigator.rankable_subgraph(SubgraphDirection::ToDependents, Some("shop.models"));
    assert_eq!(graph.node_count(), 4);

    let find = |descriptors: &str| {
        let target = symbol(descriptors);
        graph.node_indices().find(|&idx| graph[idx] == target).unwrap()
    };
    assert!(graph.contains_edge(find("`shop.models`/Cart#add()."), find("`shop.models`/Total#")));
    assert!(graph.contains_edge(find("`shop.models`/Total#"), find("`shop.models`/Cart#")));
}
