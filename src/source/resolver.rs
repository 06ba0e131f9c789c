use indexmap::IndexMap;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

use super::{SourceResolver, SourceResult, SourceSpan, SymbolSource};
use crate::index::scip;
use crate::symbol::Symbol;
use crate::types::{Range, SymbolRoles};

#[derive(Debug, Clone)]
struct DefinitionSite {
    path: String,
    range: Range,
    enclosing: Option<Range>,
}

/// Resolves symbol sources from definition occurrences in a SCIP index.
///
/// Spans come from the occurrence's enclosing range when the indexer recorded
/// one. Otherwise the span is the indentation block opened by the definition
/// line, which matches how Python-like sources nest bodies.
#[derive(Debug, Default)]
pub struct IndexSourceResolver {
    modules: IndexMap<String, String>,
    definitions: HashMap<String, DefinitionSite>,
}

impl IndexSourceResolver {
    /// Build from an index, reading missing module text relative to the
    /// project root recorded in the index metadata.
    pub fn from_index(index: &scip::Index) -> Self {
        let root = index.project_root().map(Path::new);
        Self::with_project_root(index, root)
    }

    pub fn with_project_root(index: &scip::Index, root: Option<&Path>) -> Self {
        let mut resolver = Self::default();

        for document in &index.documents {
            match load_module_text(document, root) {
                Some(text) => {
                    resolver
                        .modules
                        .insert(document.relative_path.clone(), text);
                }
                None => debug!(
                    target: "source",
                    "no text available for {}", document.relative_path
                ),
            }

            for occurrence in &document.occurrences {
                if !SymbolRoles::from_scip(occurrence.symbol_roles)
                    .contains(SymbolRoles::DEFINITION)
                {
                    continue;
                }
                let Some(range) = Range::from_scip(&occurrence.range) else {
                    warn!(
                        target: "source",
                        "skipping definition of {} with invalid range {:?}",
                        occurrence.symbol, occurrence.range
                    );
                    continue;
                };
                resolver.definitions.insert(
                    occurrence.symbol.clone(),
                    DefinitionSite {
                        path: document.relative_path.clone(),
                        range,
                        enclosing: Range::from_scip(&occurrence.enclosing_range),
                    },
                );
            }
        }

        debug!(
            target: "source",
            "resolver ready: {} modules, {} definitions",
            resolver.modules.len(),
            resolver.definitions.len()
        );
        resolver
    }

    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    fn span_of(&self, site: &DefinitionSite) -> SourceSpan {
        if let Some(enclosing) = site.enclosing {
            return SourceSpan {
                path: site.path.clone(),
                start_line: enclosing.start_line,
                start_column: enclosing.start_column,
                end_line: enclosing.end_line,
            };
        }

        if let Some(text) = self.modules.get(&site.path) {
            if let Some((start_column, end_line)) = indentation_block(text, site.range.start_line) {
                return SourceSpan {
                    path: site.path.clone(),
                    start_line: site.range.start_line,
                    start_column,
                    end_line: end_line.max(site.range.end_line),
                };
            }
        }

        SourceSpan {
            path: site.path.clone(),
            start_line: site.range.start_line,
            start_column: site.range.start_column,
            end_line: site.range.end_line,
        }
    }
}

impl SourceResolver for IndexSourceResolver {
    fn span(&self, symbol: &Symbol) -> SourceResult<Option<SourceSpan>> {
        Ok(self
            .definitions
            .get(symbol.uri())
            .map(|site| self.span_of(site)))
    }

    fn source(&self, symbol: &Symbol) -> SourceResult<Option<SymbolSource>> {
        let Some(span) = self.span(symbol)? else {
            return Ok(None);
        };
        let Some(module) = self.modules.get(&span.path) else {
            return Ok(None);
        };
        let Some(height) = span.end_line.checked_sub(span.start_line) else {
            return Ok(None);
        };

        let text = module
            .lines()
            .skip(span.start_line as usize)
            .take(height as usize + 1)
            .collect::<Vec<_>>()
            .join("\n");
        Ok(Some(SymbolSource { span, text }))
    }

    fn modules(&self) -> Box<dyn Iterator<Item = (&str, &str)> + '_> {
        Box::new(
            self.modules
                .iter()
                .map(|(path, text)| (path.as_str(), text.as_str())),
        )
    }
}

fn load_module_text(document: &scip::Document, root: Option<&Path>) -> Option<String> {
    if !document.text.is_empty() {
        return Some(document.text.clone());
    }
    let path = root?.join(&document.relative_path);
    match std::fs::read_to_string(&path) {
        Ok(text) => Some(text),
        Err(err) => {
            warn!(target: "source", "failed to read {}: {err}", path.display());
            None
        }
    }
}

fn indent_width(line: &str) -> usize {
    line.chars().take_while(|c| *c == ' ' || *c == '\t').count()
}

/// Start column and last line of the block opened at `line`.
///
/// The block continues while non-blank lines are indented deeper than the
/// opening line; blank lines inside the block do not end it.
fn indentation_block(text: &str, line: u32) -> Option<(u32, u32)> {
    let lines: Vec<&str> = text.lines().collect();
    let start = line as usize;
    let opening = lines.get(start)?;
    let base = indent_width(opening);

    let mut end = start;
    for (offset, candidate) in lines.iter().enumerate().skip(start + 1) {
        if candidate.trim().is_empty() {
            continue;
        }
        if indent_width(candidate) <= base {
            break;
        }
        end = offset;
    }
    Some((base as u32, end as u32))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const MODULE: &str = "\
class Greeter:
    def greet(self, name):
        message = name

        return message

def main():
    pass
";

    const CLASS: &str = "scip-python python demo 1 `demo`/Greeter#";
    const GREET: &str = "scip-python python demo 1 `demo`/Greeter#greet().";

    fn definition(symbol: &str, range: Vec<i32>) -> scip::Occurrence {
        scip::Occurrence {
            range,
            symbol: symbol.to_string(),
            symbol_roles: SymbolRoles::DEFINITION.bits() as i32,
            ..Default::default()
        }
    }

    fn index_with_text(text: &str) -> scip::Index {
        scip::Index {
            documents: vec![scip::Document {
                relative_path: "demo.py".to_string(),
                text: text.to_string(),
                occurrences: vec![
                    definition(CLASS, vec![0, 6, 13]),
                    definition(GREET, vec![1, 8, 13]),
                ],
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_indentation_block() {
        assert_eq!(indentation_block(MODULE, 0), Some((0, 4)));
        assert_eq!(indentation_block(MODULE, 1), Some((4, 4)));
        assert_eq!(indentation_block(MODULE, 6), Some((0, 7)));
        assert_eq!(indentation_block(MODULE, 99), None);
    }

    #[test]
    fn test_source_from_embedded_text() {
        let resolver = IndexSourceResolver::from_index(&index_with_text(MODULE));
        let greet = Symbol::parse(GREET).unwrap();

        let source = resolver.source(&greet).unwrap().unwrap();
        assert_eq!(source.span.path, "demo.py");
        assert_eq!(source.span.start_line, 1);
        assert_eq!(source.span.end_line, 4);
        assert!(source.text.starts_with("    def greet"));
        assert!(source.text.ends_with("return message"));
    }

    #[test]
    fn test_enclosing_range_wins() {
        let mut index = index_with_text(MODULE);
        index.documents[0].occurrences[1].enclosing_range = vec![1, 4, 2, 22];
        let resolver = IndexSourceResolver::from_index(&index);

        let span = resolver
            .span(&Symbol::parse(GREET).unwrap())
            .unwrap()
            .unwrap();
        assert_eq!((span.start_line, span.start_column, span.end_line), (1, 4, 2));
    }

    #[test]
    fn test_inverted_enclosing_range_is_ignored() {
        let mut index = index_with_text(MODULE);
        index.documents[0].occurrences[1].enclosing_range = vec![1, 0, 0, 5];
        let resolver = IndexSourceResolver::from_index(&index);
        let greet = Symbol::parse(GREET).unwrap();

        let source = resolver.source(&greet).unwrap().unwrap();
        assert_eq!(
            (source.span.start_line, source.span.start_column, source.span.end_line),
            (1, 4, 4)
        );
        assert!(source.text.starts_with("    def greet"));
    }

    #[test]
    fn test_unknown_symbol_resolves_to_none() {
        let resolver = IndexSourceResolver::from_index(&index_with_text(MODULE));
        let unknown = Symbol::parse("scip-python python demo 1 `demo`/Nope#").unwrap();
        assert!(resolver.source(&unknown).unwrap().is_none());
    }

    #[test]
    fn test_text_read_from_project_root() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("demo.py"), MODULE).unwrap();

        let index = index_with_text("");
        let resolver = IndexSourceResolver::with_project_root(&index, Some(temp_dir.path()));

        assert_eq!(resolver.module_count(), 1);
        let (path, text) = resolver.modules().next().unwrap();
        assert_eq!(path, "demo.py");
        assert_eq!(text, MODULE);
    }

    #[test]
    fn test_missing_text_falls_back_to_definition_range() {
        let resolver = IndexSourceResolver::from_index(&index_with_text(""));
        let span = resolver
            .span(&Symbol::parse(CLASS).unwrap())
            .unwrap()
            .unwrap();
        assert_eq!((span.start_line, span.start_column, span.end_line), (0, 6, 0));
        assert!(resolver.source(&Symbol::parse(CLASS).unwrap()).unwrap().is_none());
    }
}
