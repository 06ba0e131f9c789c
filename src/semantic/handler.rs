use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info};

use super::{
    EmbeddingError, EmbeddingProvider, EmbeddingResult, EmbeddingSlot, SymbolEmbedding, VectorStore,
};
use crate::symbol::Symbol;

/// What [`SymbolEmbeddingHandler::process`] did for a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingUpdate {
    /// First embedding for this key.
    Created,
    /// Content changed; old entry discarded and a new vector built.
    Superseded,
    /// Same content under a new uri; entry re-keyed without a new vector.
    Repointed,
    Unchanged,
}

/// Keeps a vector store in step with symbol sources.
///
/// The store sits behind a lock so the handler can be shared with the search
/// facade while embeddings are refreshed.
pub struct SymbolEmbeddingHandler {
    store: RwLock<Box<dyn VectorStore>>,
    provider: Arc<dyn EmbeddingProvider>,
}

impl SymbolEmbeddingHandler {
    pub fn new(store: Box<dyn VectorStore>, provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            store: RwLock::new(store),
            provider,
        }
    }

    pub fn provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.provider
    }

    pub fn len(&self) -> usize {
        self.store.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.read().is_empty()
    }

    /// Persist the store, if it is backed by a file.
    pub fn flush(&self) -> EmbeddingResult<()> {
        self.store.read().flush()
    }

    /// The code embedding stored for `symbol`.
    pub fn get_embedding(&self, symbol: &Symbol) -> Option<SymbolEmbedding> {
        self.store.read().get(symbol, EmbeddingSlot::Code).cloned()
    }

    pub fn get_documentation(&self, symbol: &Symbol) -> Option<SymbolEmbedding> {
        self.store.read().get(symbol, EmbeddingSlot::Doc).cloned()
    }

    /// Run `f` over the embeddings stored in `slot`, in key order.
    ///
    /// The store stays read-locked while `f` runs.
    pub fn with_ordered_embeddings<R>(
        &self,
        slot: EmbeddingSlot,
        f: impl FnOnce(&[&SymbolEmbedding]) -> R,
    ) -> R {
        let store = self.store.read();
        let entries: Vec<&SymbolEmbedding> = store
            .get_ordered_entries()
            .into_iter()
            .filter(|entry| entry.slot() == slot)
            .collect();
        f(&entries)
    }

    #[cfg(test)]
    pub(crate) fn store_is_locked(&self) -> bool {
        self.store.is_locked()
    }

    /// Create, supersede or re-point the code embedding for `symbol`.
    pub fn process(&self, symbol: &Symbol, source: &str) -> EmbeddingResult<EmbeddingUpdate> {
        if let Some(update) = self.refresh_without_vector(symbol, source, EmbeddingSlot::Code)? {
            return Ok(update);
        }
        let vector = self.provider.build_vector(source)?;
        self.store_vector(SymbolEmbedding::code(symbol.clone(), source, vector))
    }

    /// Like [`process`](Self::process) for many symbols, building all new
    /// vectors in one provider batch.
    ///
    /// Fails with [`EmbeddingError::Provider`] if the provider returns a
    /// different number of vectors than it was given texts.
    pub fn process_batch(
        &self,
        items: &[(Symbol, String)],
    ) -> EmbeddingResult<Vec<EmbeddingUpdate>> {
        let mut updates = vec![EmbeddingUpdate::Unchanged; items.len()];
        let mut pending = Vec::new();
        for (position, (symbol, source)) in items.iter().enumerate() {
            match self.refresh_without_vector(symbol, source, EmbeddingSlot::Code)? {
                Some(update) => updates[position] = update,
                None => pending.push(position),
            }
        }
        if pending.is_empty() {
            return Ok(updates);
        }

        let texts: Vec<String> = pending.iter().map(|&p| items[p].1.clone()).collect();
        let vectors = self.provider.batch_build_vectors(&texts)?;
        if vectors.len() != texts.len() {
            return Err(EmbeddingError::Provider(format!(
                "expected {} vectors, got {}",
                texts.len(),
                vectors.len()
            )));
        }
        for (&position, vector) in pending.iter().zip(vectors) {
            let (symbol, source) = &items[position];
            let embedding = SymbolEmbedding::code(symbol.clone(), source.as_str(), vector);
            updates[position] = self.store_vector(embedding)?;
        }

        info!(
            target: "semantic",
            "Embedded {} of {} symbols",
            pending.len(),
            items.len()
        );
        Ok(updates)
    }

    /// Store a documentation embedding built from `document`. A code
    /// embedding for the same symbol is left in place.
    pub fn process_documentation(
        &self,
        symbol: &Symbol,
        document: &str,
        summary: &str,
        context: &str,
    ) -> EmbeddingResult<EmbeddingUpdate> {
        if let Some(update) = self.refresh_without_vector(symbol, document, EmbeddingSlot::Doc)? {
            return Ok(update);
        }
        let vector = self.provider.build_vector(document)?;
        self.store_vector(SymbolEmbedding::doc(
            symbol.clone(),
            document,
            vector,
            summary,
            context,
        ))
    }

    /// Handles the cases that need no new vector. `None` means one must be built.
    fn refresh_without_vector(
        &self,
        symbol: &Symbol,
        document: &str,
        slot: EmbeddingSlot,
    ) -> EmbeddingResult<Option<EmbeddingUpdate>> {
        let mut store = self.store.write();
        let Some(existing) = store.get(symbol, slot) else {
            return Ok(None);
        };
        if existing.document != document {
            return Ok(None);
        }
        if existing.key.uri() == symbol.uri() {
            return Ok(Some(EmbeddingUpdate::Unchanged));
        }

        let mut repointed = existing.clone();
        debug!(
            target: "semantic",
            "re-pointing embedding {} -> {symbol}", repointed.key
        );
        repointed.key = symbol.clone();
        store.update(repointed)?;
        Ok(Some(EmbeddingUpdate::Repointed))
    }

    fn store_vector(&self, embedding: SymbolEmbedding) -> EmbeddingResult<EmbeddingUpdate> {
        let mut store = self.store.write();
        let slot = embedding.slot();
        let update = if store.contains(&embedding.key, slot) {
            store.discard(&embedding.key, slot)?;
            EmbeddingUpdate::Superseded
        } else {
            EmbeddingUpdate::Created
        };
        debug!(target: "semantic", "{update:?} {slot} embedding for {}", embedding.key);
        store.add(embedding)?;
        Ok(update)
    }
}
