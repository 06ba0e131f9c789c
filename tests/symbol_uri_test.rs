//! Symbol uri parse/unparse behavior across the grammar.

use symdex::symbol::{DescriptorKind, SymbolParseError};
use symdex::{Symbol, SymbolKind};

const CANONICAL: &[&str] = &[
    "scip-python python automata 7548269 `automata.core.agent.agent`/AutomataAgent#run().",
    "scip-python python automata 7548269 `automata.core.agent.agent`/AutomataAgent#",
    "scip-python python automata 7548269 `automata.core`/__init__:",
    "scip-python python automata 7548269 `automata.config`/CONFIG.",
    "scip-python python automata 7548269 `automata.core`/Agent#run().(self)",
    "scip-python python automata 7548269 `automata.core`/Box#[T]",
    "scip-python python python-stdlib 3.11 builtins/str#join().",
    "rust-analyzer cargo symdex 0.3.0 rank/SymbolRank#rank_with(+1).",
    "rust-analyzer cargo symdex 0.3.0 log_event!",
    "scip-typescript npm `@types/node` 18.0.0 `fs.d.ts`/`we``ird`#",
    "my  scheme npm pkg 1.0 Thing#",
    "scip-java maven . . com/example/Main#main().",
    "local 42",
    "local x_1",
];

#[test]
fn test_round_trip_canonical_uris() {
    for uri in CANONICAL {
        let symbol = Symbol::parse(uri).unwrap_or_else(|e| panic!("{uri}: {e}"));
        assert_eq!(symbol.unparse(), *uri);

        let reparsed = Symbol::parse(&symbol.unparse()).unwrap();
        assert_eq!(reparsed, symbol);
        assert_eq!(reparsed.descriptors(), symbol.descriptors());
    }
}

#[test]
fn test_redundant_escapes_survive_round_trip() {
    let uri = "scip-python python demo 1 `demo`/`Greeter`#`greet`().";
    let symbol = Symbol::parse(uri).unwrap();

    assert_eq!(symbol.unparse(), uri);
    assert_eq!(Symbol::parse(&symbol.unparse()).unwrap(), symbol);
    assert_eq!(symbol.display_name(), "greet");
    assert_eq!(
        symbol.canonical_uri(),
        "scip-python python demo 1 demo/Greeter#greet()."
    );

    // Identity stays textual: the canonical spelling is a different symbol.
    let canonical = Symbol::parse(&symbol.canonical_uri()).unwrap();
    assert_ne!(canonical, symbol);
    assert_eq!(canonical.dotpath(), symbol.dotpath());
}

#[test]
fn test_kinds_follow_last_descriptor() {
    let cases = [
        (CANONICAL[0], SymbolKind::Method),
        (CANONICAL[1], SymbolKind::Class),
        (CANONICAL[2], SymbolKind::Meta),
        (CANONICAL[3], SymbolKind::Value),
        (CANONICAL[4], SymbolKind::Parameter),
        (CANONICAL[5], SymbolKind::TypeParameter),
        (CANONICAL[8], SymbolKind::Macro),
        (CANONICAL[12], SymbolKind::Local),
    ];
    for (uri, kind) in cases {
        assert_eq!(Symbol::parse(uri).unwrap().kind(), kind, "{uri}");
    }
}

#[test]
fn test_classification_predicates() {
    let local = Symbol::parse("local 7").unwrap();
    assert!(local.is_local());
    assert!(!local.is_meta());

    let meta = Symbol::parse(CANONICAL[2]).unwrap();
    assert!(meta.is_meta());

    let param = Symbol::parse(CANONICAL[4]).unwrap();
    assert!(param.is_parameter());

    let generated =
        Symbol::parse("scip-python python svc 1 `svc.api_pb2`/Request#").unwrap();
    assert!(generated.is_generated());
    let grpc = Symbol::parse("scip-python python svc 1 `svc.api_pb2_grpc`/Stub#").unwrap();
    assert!(grpc.is_generated());
    assert!(!Symbol::parse(CANONICAL[1]).unwrap().is_generated());
}

#[test]
fn test_parent_drops_last_descriptor() {
    let method = Symbol::parse(CANONICAL[0]).unwrap();
    let class = method.parent().unwrap();
    assert_eq!(class.uri(), CANONICAL[1]);
    assert_eq!(class.kind(), SymbolKind::Class);

    let module = class.parent().unwrap();
    assert_eq!(module.descriptors().len(), 1);
    assert_eq!(module.descriptors()[0].kind, DescriptorKind::Namespace);
    assert!(module.parent().is_none());
}

#[test]
fn test_identity_is_uri() {
    let a = Symbol::parse(CANONICAL[0]).unwrap();
    let b: Symbol = CANONICAL[0].parse().unwrap();
    assert_eq!(a, b);

    let mut set = std::collections::HashSet::new();
    set.insert(a);
    assert!(set.contains(&b));
}

#[test]
fn test_malformed_uris() {
    assert_eq!(Symbol::parse(""), Err(SymbolParseError::Empty));

    let cases = [
        "scip-python python",
        "scip-python python automata 1 ",
        "scip-python python automata 1 Foo",
        "scip-python python automata 1 Foo?",
        "scip-python python automata 1 `unterminated/",
        "scip-python python automata 1 Foo#bar(",
        "local not valid",
    ];
    for uri in cases {
        assert!(Symbol::parse(uri).is_err(), "{uri:?} parsed");
    }
}
