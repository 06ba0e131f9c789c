//! Loading of pre-computed cross-reference indexes.

pub mod scip;

use prost::Message;
use std::path::Path;
use tracing::{debug, info};

use crate::graph::{GraphError, GraphResult};
use crate::types::RelationshipKinds;

/// Reads a SCIP index snapshot from disk.
///
/// The index underlies every other component, so an unreadable or undecodable
/// file is reported as an error instead of yielding an empty index.
#[derive(Debug, Default)]
pub struct IndexLoader;

impl IndexLoader {
    pub fn load(path: impl AsRef<Path>) -> GraphResult<scip::Index> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| GraphError::IndexRead {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(target: "index", "read {} bytes from {}", bytes.len(), path.display());

        let index = Self::decode(&bytes).map_err(|err| match err {
            GraphError::IndexDecode { source, .. } => GraphError::IndexDecode {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })?;

        info!(
            target: "index",
            "Loaded index {}: {} documents, {} external symbols",
            path.display(),
            index.documents.len(),
            index.external_symbols.len()
        );
        Ok(index)
    }

    /// Decode an in-memory index.
    pub fn decode(bytes: &[u8]) -> GraphResult<scip::Index> {
        scip::Index::decode(bytes).map_err(|source| GraphError::IndexDecode {
            path: Default::default(),
            source,
        })
    }
}

impl scip::Relationship {
    pub fn kinds(&self) -> RelationshipKinds {
        let mut kinds = RelationshipKinds::empty();
        kinds.set(RelationshipKinds::REFERENCE, self.is_reference);
        kinds.set(RelationshipKinds::IMPLEMENTATION, self.is_implementation);
        kinds.set(RelationshipKinds::TYPE_DEFINITION, self.is_type_definition);
        kinds.set(RelationshipKinds::DEFINITION, self.is_definition);
        kinds
    }
}

impl scip::Index {
    /// Project root recorded by the indexer, with any `file://` scheme removed.
    pub fn project_root(&self) -> Option<&str> {
        let root = self.metadata.as_ref()?.project_root.as_str();
        if root.is_empty() {
            return None;
        }
        Some(root.strip_prefix("file://").unwrap_or(root))
    }
}
