//! Source locations for symbols.
//!
//! [`SourceResolver`] is the contract the graph and search layers consume.
//! [`IndexSourceResolver`] implements it from the loaded index itself: each
//! definition occurrence gives the defining file and position, and module text
//! comes either from the index or from the project checkout.

mod resolver;

pub use resolver::IndexSourceResolver;

use thiserror::Error;

use crate::symbol::Symbol;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Source resolver failure: {0}")]
    Resolver(String),
}

pub type SourceResult<T> = Result<T, SourceError>;

/// Zero-based definition span of a symbol inside one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSpan {
    pub path: String,
    pub start_line: u32,
    pub start_column: u32,
    pub end_line: u32,
}

impl SourceSpan {
    /// Whether a position falls lexically inside the span.
    ///
    /// Positions left of the start column on the start line are outside; the
    /// end line is taken whole.
    pub fn encloses(&self, line: u32, column: u32) -> bool {
        if line < self.start_line || line > self.end_line {
            return false;
        }
        !(line == self.start_line && column < self.start_column)
    }
}

/// Source text of a symbol together with where it was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolSource {
    pub span: SourceSpan,
    pub text: String,
}

/// Resolves symbols to their definition span and source text.
///
/// Implementations are blocking and may fail; callers own retry policy.
pub trait SourceResolver: Send + Sync {
    /// Definition span, or `None` when the symbol cannot be located.
    fn span(&self, symbol: &Symbol) -> SourceResult<Option<SourceSpan>>;

    /// Definition span plus its text, or `None` when the symbol cannot be located.
    fn source(&self, symbol: &Symbol) -> SourceResult<Option<SymbolSource>>;

    /// Every loaded module as `(path, text)`, in a stable order.
    fn modules(&self) -> Box<dyn Iterator<Item = (&str, &str)> + '_>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_encloses() {
        let span = SourceSpan {
            path: "m.py".to_string(),
            start_line: 3,
            start_column: 4,
            end_line: 6,
        };

        assert!(span.encloses(3, 4));
        assert!(span.encloses(5, 0));
        assert!(span.encloses(6, 200));

        assert!(!span.encloses(3, 3));
        assert!(!span.encloses(2, 10));
        assert!(!span.encloses(7, 0));
    }
}
