use super::EmbeddingResult;

/// Turns text into embedding vectors.
///
/// Calls are synchronous and may block on a model or a network round-trip.
/// Failures propagate to the caller, which owns any retry policy.
pub trait EmbeddingProvider: Send + Sync {
    fn build_vector(&self, text: &str) -> EmbeddingResult<Vec<f32>>;

    /// One vector per input, in input order.
    fn batch_build_vectors(&self, texts: &[String]) -> EmbeddingResult<Vec<Vec<f32>>> {
        texts.iter().map(|text| self.build_vector(text)).collect()
    }
}
