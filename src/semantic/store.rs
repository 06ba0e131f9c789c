use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::{EmbeddingError, EmbeddingResult, EmbeddingSlot, SymbolEmbedding};
use crate::symbol::Symbol;

/// Keyed storage for symbol embeddings.
///
/// Entries are keyed by slot and the symbol's dotted path, so a symbol whose
/// uri changes (a new package version, say) still finds its old entry.
pub trait VectorStore: Send + Sync {
    fn contains(&self, symbol: &Symbol, slot: EmbeddingSlot) -> bool;

    fn get(&self, symbol: &Symbol, slot: EmbeddingSlot) -> Option<&SymbolEmbedding>;

    /// Fails with [`EmbeddingError::DuplicateKey`] if the key is taken.
    fn add(&mut self, embedding: SymbolEmbedding) -> EmbeddingResult<()>;

    fn discard(&mut self, symbol: &Symbol, slot: EmbeddingSlot) -> EmbeddingResult<SymbolEmbedding>;

    /// Replace an existing entry.
    fn update(&mut self, embedding: SymbolEmbedding) -> EmbeddingResult<()>;

    /// Every entry, ordered by slot then key.
    fn get_ordered_entries(&self) -> Vec<&SymbolEmbedding>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Persist pending changes. No-op for stores without a backing file.
    fn flush(&self) -> EmbeddingResult<()> {
        Ok(())
    }
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryVectorStore {
    entries: BTreeMap<(EmbeddingSlot, String), SymbolEmbedding>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl VectorStore for InMemoryVectorStore {
    fn contains(&self, symbol: &Symbol, slot: EmbeddingSlot) -> bool {
        self.entries.contains_key(&(slot, symbol.dotpath()))
    }

    fn get(&self, symbol: &Symbol, slot: EmbeddingSlot) -> Option<&SymbolEmbedding> {
        self.entries.get(&(slot, symbol.dotpath()))
    }

    fn add(&mut self, embedding: SymbolEmbedding) -> EmbeddingResult<()> {
        let key = (embedding.slot(), embedding.store_key());
        if self.entries.contains_key(&key) {
            return Err(EmbeddingError::DuplicateKey(describe(&key)));
        }
        self.entries.insert(key, embedding);
        Ok(())
    }

    fn discard(
        &mut self,
        symbol: &Symbol,
        slot: EmbeddingSlot,
    ) -> EmbeddingResult<SymbolEmbedding> {
        let key = (slot, symbol.dotpath());
        match self.entries.remove(&key) {
            Some(embedding) => Ok(embedding),
            None => Err(EmbeddingError::MissingKey(describe(&key))),
        }
    }

    fn update(&mut self, embedding: SymbolEmbedding) -> EmbeddingResult<()> {
        let key = (embedding.slot(), embedding.store_key());
        match self.entries.get_mut(&key) {
            Some(slot) => {
                *slot = embedding;
                Ok(())
            }
            None => Err(EmbeddingError::MissingKey(describe(&key))),
        }
    }

    fn get_ordered_entries(&self) -> Vec<&SymbolEmbedding> {
        self.entries.values().collect()
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

fn describe((slot, key): &(EmbeddingSlot, String)) -> String {
    format!("{key} ({slot})")
}

/// In-memory store persisted as a JSON array of entries.
///
/// Changes stay in memory until [`JsonVectorStore::save`] is called.
#[derive(Debug)]
pub struct JsonVectorStore {
    path: PathBuf,
    inner: InMemoryVectorStore,
}

impl JsonVectorStore {
    /// Load entries from `path`, or start empty if the file does not exist.
    pub fn open(path: impl Into<PathBuf>) -> EmbeddingResult<Self> {
        let path = path.into();
        let mut inner = InMemoryVectorStore::new();

        if path.exists() {
            let content = fs::read_to_string(&path).map_err(|source| EmbeddingError::Io {
                path: path.clone(),
                source,
            })?;
            let entries: Vec<SymbolEmbedding> = serde_json::from_str(&content)?;
            for entry in entries {
                inner.add(entry)?;
            }
            info!(
                target: "semantic",
                "Loaded {} embeddings from {}",
                inner.len(),
                path.display()
            );
        } else {
            debug!(target: "semantic", "no embeddings at {}, starting empty", path.display());
        }

        Ok(Self { path, inner })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save(&self) -> EmbeddingResult<()> {
        let io_err = |source| EmbeddingError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(io_err)?;
            }
        }
        let content = serde_json::to_string(&self.inner.get_ordered_entries())?;
        fs::write(&self.path, content).map_err(io_err)?;
        debug!(
            target: "semantic",
            "Saved {} embeddings to {}",
            self.inner.len(),
            self.path.display()
        );
        Ok(())
    }
}

impl VectorStore for JsonVectorStore {
    fn contains(&self, symbol: &Symbol, slot: EmbeddingSlot) -> bool {
        self.inner.contains(symbol, slot)
    }

    fn get(&self, symbol: &Symbol, slot: EmbeddingSlot) -> Option<&SymbolEmbedding> {
        self.inner.get(symbol, slot)
    }

    fn add(&mut self, embedding: SymbolEmbedding) -> EmbeddingResult<()> {
        self.inner.add(embedding)
    }

    fn discard(
        &mut self,
        symbol: &Symbol,
        slot: EmbeddingSlot,
    ) -> EmbeddingResult<SymbolEmbedding> {
        self.inner.discard(symbol, slot)
    }

    fn update(&mut self, embedding: SymbolEmbedding) -> EmbeddingResult<()> {
        self.inner.update(embedding)
    }

    fn get_ordered_entries(&self) -> Vec<&SymbolEmbedding> {
        self.inner.get_ordered_entries()
    }

    fn len(&self) -> usize {
        self.inner.len()
    }

    fn flush(&self) -> EmbeddingResult<()> {
        self.save()
    }
}
