//! Document identity and content snapshots

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::infra::hash_content;

/// Identifies a document in the host editor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(PathBuf);

impl DocumentId {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    /// File type used for generator filtering (the lowercased extension).
    pub fn file_type(&self) -> Option<String> {
        self.0
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
    }
}

impl From<&str> for DocumentId {
    fn from(s: &str) -> Self {
        Self(PathBuf::from(s))
    }
}

impl From<PathBuf> for DocumentId {
    fn from(p: PathBuf) -> Self {
        Self(p)
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// Immutable view of a document's content at one point in time.
///
/// The hash is the cache key dimension: two snapshots with equal hashes are
/// treated as the same content everywhere in the engine.
#[derive(Debug, Clone)]
pub struct DocumentSnapshot {
    pub id: DocumentId,
    pub text: Arc<str>,
    pub hash: u64,
}

impl DocumentSnapshot {
    pub fn new(id: DocumentId, text: impl Into<Arc<str>>) -> Self {
        let text = text.into();
        let hash = hash_content(&text);
        Self { id, text, hash }
    }

    /// Same document, different content. Used by the sequential formatting
    /// chain to hand source *i*'s output to source *i+1*.
    pub fn with_text(&self, text: impl Into<Arc<str>>) -> Self {
        Self::new(self.id.clone(), text)
    }
}
