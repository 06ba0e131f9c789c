//! Local embedding provider backed by fastembed.

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use std::sync::Mutex;
use tracing::info;

use super::{EmbeddingError, EmbeddingProvider, EmbeddingResult};

/// Runs an ONNX sentence-embedding model in process.
///
/// Uses AllMiniLML6V2 unless another model is requested.
pub struct FastEmbedProvider {
    /// `TextEmbedding::embed` needs `&mut self`.
    model: Mutex<TextEmbedding>,
    dimensions: usize,
}

impl FastEmbedProvider {
    pub fn new() -> EmbeddingResult<Self> {
        Self::with_model(EmbeddingModel::AllMiniLML6V2)
    }

    /// Resolve a model by its fastembed name, e.g. `AllMiniLML6V2`.
    pub fn from_name(name: &str) -> EmbeddingResult<Self> {
        let model = match name {
            "AllMiniLML6V2" => EmbeddingModel::AllMiniLML6V2,
            "AllMiniLML12V2" => EmbeddingModel::AllMiniLML12V2,
            "BGESmallENV15" => EmbeddingModel::BGESmallENV15,
            "BGEBaseENV15" => EmbeddingModel::BGEBaseENV15,
            other => {
                return Err(EmbeddingError::Provider(format!(
                    "unsupported embedding model: {other}"
                )));
            }
        };
        Self::with_model(model)
    }

    pub fn with_model(model: EmbeddingModel) -> EmbeddingResult<Self> {
        let mut text_model = TextEmbedding::try_new(
            InitOptions::new(model.clone()).with_show_download_progress(true),
        )
        .map_err(|e| EmbeddingError::Provider(format!("failed to load model: {e}")))?;

        // Probe once to learn the output width.
        let probe = text_model
            .embed(vec!["test"], None)
            .map_err(|e| EmbeddingError::Provider(e.to_string()))?;
        let dimensions = probe.first().map(Vec::len).unwrap_or_default();

        info!(target: "semantic", "Loaded embedding model {model:?} ({dimensions} dimensions)");
        Ok(Self {
            model: Mutex::new(text_model),
            dimensions,
        })
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn embed(&self, texts: Vec<&str>) -> EmbeddingResult<Vec<Vec<f32>>> {
        let mut model = self
            .model
            .lock()
            .map_err(|_| EmbeddingError::Provider("embedding model lock poisoned".to_string()))?;
        model
            .embed(texts, None)
            .map_err(|e| EmbeddingError::Provider(e.to_string()))
    }
}

impl EmbeddingProvider for FastEmbedProvider {
    fn build_vector(&self, text: &str) -> EmbeddingResult<Vec<f32>> {
        self.embed(vec![text])?
            .into_iter()
            .next()
            .ok_or_else(|| EmbeddingError::Provider("model returned no embedding".to_string()))
    }

    fn batch_build_vectors(&self, texts: &[String]) -> EmbeddingResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.embed(texts.iter().map(String::as_str).collect())
    }
}
