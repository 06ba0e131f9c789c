use serde::{Deserialize, Serialize};
use std::fmt;

use crate::symbol::Symbol;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EmbeddingKind {
    /// Vector over the symbol's source text.
    Code,
    /// Vector over generated documentation.
    Doc { summary: String, context: String },
}

/// Which of a symbol's embeddings a store entry holds.
///
/// A symbol can carry one entry per slot; code and documentation vectors never
/// replace each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EmbeddingSlot {
    Code,
    Doc,
}

impl fmt::Display for EmbeddingSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Code => f.write_str("code"),
            Self::Doc => f.write_str("doc"),
        }
    }
}

/// A stored embedding for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolEmbedding {
    pub key: Symbol,
    pub document: String,
    pub vector: Vec<f32>,
    pub kind: EmbeddingKind,
}

impl SymbolEmbedding {
    pub fn code(key: Symbol, document: impl Into<String>, vector: Vec<f32>) -> Self {
        Self {
            key,
            document: document.into(),
            vector,
            kind: EmbeddingKind::Code,
        }
    }

    pub fn doc(
        key: Symbol,
        document: impl Into<String>,
        vector: Vec<f32>,
        summary: impl Into<String>,
        context: impl Into<String>,
    ) -> Self {
        Self {
            key,
            document: document.into(),
            vector,
            kind: EmbeddingKind::Doc {
                summary: summary.into(),
                context: context.into(),
            },
        }
    }

    pub fn slot(&self) -> EmbeddingSlot {
        match self.kind {
            EmbeddingKind::Code => EmbeddingSlot::Code,
            EmbeddingKind::Doc { .. } => EmbeddingSlot::Doc,
        }
    }

    /// Store key within the slot: the symbol's dotted path, stable across
    /// package versions.
    pub fn store_key(&self) -> String {
        self.key.dotpath()
    }
}
