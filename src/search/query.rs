use std::fmt;
use std::str::FromStr;

use super::SearchError;

/// A parsed dispatch command, `type:<kind> <text>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchQuery {
    SymbolReferences(String),
    SymbolRank(String),
    Exact(String),
    Source(String),
}

impl SearchQuery {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SymbolReferences(_) => "symbol_references",
            Self::SymbolRank(_) => "symbol_rank",
            Self::Exact(_) => "exact",
            Self::Source(_) => "source",
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Self::SymbolReferences(text)
            | Self::SymbolRank(text)
            | Self::Exact(text)
            | Self::Source(text) => text,
        }
    }
}

impl FromStr for SearchQuery {
    type Err = SearchError;

    /// Everything after the first space is the query text, kept verbatim.
    fn from_str(query: &str) -> Result<Self, Self::Err> {
        let body = query.strip_prefix("type:").ok_or_else(|| {
            SearchError::InvalidQuery(format!("missing 'type:' prefix in {query:?}"))
        })?;
        let (kind, text) = body
            .split_once(' ')
            .ok_or_else(|| SearchError::InvalidQuery(format!("missing query text in {query:?}")))?;
        if text.trim().is_empty() {
            return Err(SearchError::InvalidQuery(format!(
                "empty query text in {query:?}"
            )));
        }

        let text = text.to_string();
        match kind {
            "symbol_references" => Ok(Self::SymbolReferences(text)),
            "symbol_rank" => Ok(Self::SymbolRank(text)),
            "exact" => Ok(Self::Exact(text)),
            "source" => Ok(Self::Source(text)),
            other => Err(SearchError::InvalidQuery(format!(
                "unknown query type '{other}'"
            ))),
        }
    }
}

impl fmt::Display for SearchQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "type:{} {}", self.kind(), self.text())
    }
}
