//! Embeddings and query similarity.
//!
//! Symbols are embedded through an injected [`EmbeddingProvider`] and kept in a
//! [`VectorStore`]. [`SymbolSimilarityCalculator`] scores a free-text query
//! against the stored vectors; the scores become the personalization vector
//! for SymbolRank.

mod embedding;
mod error;
#[cfg(feature = "fastembed")]
mod fastembed_provider;
mod handler;
mod provider;
mod similarity;
mod store;

pub use embedding::{EmbeddingKind, EmbeddingSlot, SymbolEmbedding};
pub use error::{EmbeddingError, EmbeddingResult};
#[cfg(feature = "fastembed")]
pub use fastembed_provider::FastEmbedProvider;
pub use handler::{EmbeddingUpdate, SymbolEmbeddingHandler};
pub use provider::EmbeddingProvider;
pub use similarity::{NormType, SymbolSimilarityCalculator, shifted_z_score, top_k};
pub use store::{InMemoryVectorStore, JsonVectorStore, VectorStore};
