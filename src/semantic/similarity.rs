use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{EmbeddingError, EmbeddingProvider, EmbeddingResult, SymbolEmbedding};
use crate::symbol::Symbol;

/// How query/embedding similarity is normalized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormType {
    /// Dot product of L1-normalized vectors.
    L1,
    /// Cosine similarity.
    #[default]
    L2,
    /// Softmax over the raw dot products of all candidates.
    Softmax,
}

/// Scores stored embeddings against free-text queries.
pub struct SymbolSimilarityCalculator {
    provider: Arc<dyn EmbeddingProvider>,
    norm: NormType,
}

impl SymbolSimilarityCalculator {
    pub fn new(provider: Arc<dyn EmbeddingProvider>, norm: NormType) -> Self {
        Self { provider, norm }
    }

    pub fn norm(&self) -> NormType {
        self.norm
    }

    /// Embed `query` with the calculator's provider.
    pub fn query_vector(&self, query: &str) -> EmbeddingResult<Vec<f32>> {
        self.provider.build_vector(query)
    }

    /// One score per embedding, in input order.
    pub fn similarity_dict(
        &self,
        embeddings: &[&SymbolEmbedding],
        query: &str,
    ) -> EmbeddingResult<IndexMap<Symbol, f64>> {
        let query_vector = self.query_vector(query)?;
        self.score_vector(embeddings, &query_vector)
    }

    /// The `k` best matches for `query`; ties keep input order.
    pub fn top_k(
        &self,
        embeddings: &[&SymbolEmbedding],
        query: &str,
        k: usize,
    ) -> EmbeddingResult<Vec<(Symbol, f64)>> {
        Ok(top_k(&self.similarity_dict(embeddings, query)?, k))
    }

    pub fn score_vector(
        &self,
        embeddings: &[&SymbolEmbedding],
        query: &[f32],
    ) -> EmbeddingResult<IndexMap<Symbol, f64>> {
        let mut scores = IndexMap::with_capacity(embeddings.len());
        for embedding in embeddings {
            if embedding.vector.len() != query.len() {
                return Err(EmbeddingError::DimensionMismatch {
                    expected: query.len(),
                    actual: embedding.vector.len(),
                });
            }
            let score = match self.norm {
                NormType::L1 => dot(&normalize(&embedding.vector, l1), &normalize(query, l1)),
                NormType::L2 => dot(&normalize(&embedding.vector, l2), &normalize(query, l2)),
                NormType::Softmax => dot(&embedding.vector, query),
            };
            scores.insert(embedding.key.clone(), score);
        }

        if self.norm == NormType::Softmax && !scores.is_empty() {
            let max = scores.values().copied().fold(f64::NEG_INFINITY, f64::max);
            let total: f64 = scores.values().map(|s| (s - max).exp()).sum();
            for score in scores.values_mut() {
                *score = (*score - max).exp() / total;
            }
        }
        Ok(scores)
    }
}

/// The `k` highest entries of `scores`, ties in map order.
pub fn top_k(scores: &IndexMap<Symbol, f64>, k: usize) -> Vec<(Symbol, f64)> {
    let mut ranked: Vec<(Symbol, f64)> = scores.iter().map(|(s, v)| (s.clone(), *v)).collect();
    // Stable sort keeps input order among equal scores.
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked.truncate(k);
    ranked
}

/// Standardize, shift so the minimum is zero, then raise to `power`.
///
/// Constant input (zero variance) maps to all zeros.
pub fn shifted_z_score(values: &[f64], power: f64) -> Vec<f64> {
    if values.is_empty() {
        return Vec::new();
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let std_dev = variance.sqrt();
    if std_dev == 0.0 || !std_dev.is_finite() {
        return vec![0.0; values.len()];
    }

    let z: Vec<f64> = values.iter().map(|v| (v - mean) / std_dev).collect();
    let min = z.iter().copied().fold(f64::INFINITY, f64::min);
    z.into_iter().map(|v| (v - min).powf(power)).collect()
}

fn l1(vector: &[f64]) -> f64 {
    vector.iter().map(|v| v.abs()).sum()
}

fn l2(vector: &[f64]) -> f64 {
    vector.iter().map(|v| v * v).sum::<f64>().sqrt()
}

fn normalize(vector: &[f32], norm: fn(&[f64]) -> f64) -> Vec<f64> {
    let wide: Vec<f64> = vector.iter().map(|&v| f64::from(v)).collect();
    let magnitude = norm(&wide);
    if magnitude == 0.0 {
        return wide;
    }
    wide.into_iter().map(|v| v / magnitude).collect()
}

fn dot<A: Copy + Into<f64>, B: Copy + Into<f64>>(a: &[A], b: &[B]) -> f64 {
    a.iter().zip(b).map(|(&x, &y)| x.into() * y.into()).sum()
}
