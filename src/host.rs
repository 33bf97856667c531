//! Host editor collaborators
//!
//! The engine never owns text storage, undo or diagnostic display; it talks
//! to the host through these traits. [`MemoryHost`] is the in-memory
//! implementation used by the CLI (files loaded into memory) and by tests.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{SidecarError, SidecarResult};
use crate::models::diagnostic::Diagnostic;
use crate::models::document::{DocumentId, DocumentSnapshot};
use crate::models::text::{Position, TextEdit};

/// Read access to document content.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, id: &DocumentId) -> SidecarResult<DocumentSnapshot>;
}

/// Applies edits to live documents. `atomic = true` makes the whole batch a
/// single undo step; the formatting merge result requires it.
#[async_trait]
pub trait EditSink: Send + Sync {
    async fn apply_edit(
        &self,
        id: &DocumentId,
        edits: &[TextEdit],
        atomic: bool,
    ) -> SidecarResult<()>;
}

/// Receives merged diagnostics, one call per affected document.
#[async_trait]
pub trait DiagnosticSink: Send + Sync {
    async fn publish(&self, id: &DocumentId, diagnostics: Vec<Diagnostic>);
}

/// In-memory host: documents, a per-document undo stack and published
/// diagnostics, all process-lifetime only.
///
/// Text and its undo stack live under one lock; edit and undo paths touch
/// both together and must see them move in lockstep.
#[derive(Default)]
pub struct MemoryHost {
    documents: RwLock<HashMap<DocumentId, DocumentState>>,
    published: RwLock<HashMap<DocumentId, Vec<Diagnostic>>>,
}

#[derive(Default)]
struct DocumentState {
    text: String,
    undo: Vec<String>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn open(&self, id: DocumentId, text: impl Into<String>) {
        self.documents.write().await.insert(
            id,
            DocumentState {
                text: text.into(),
                undo: Vec::new(),
            },
        );
    }

    pub async fn content(&self, id: &DocumentId) -> Option<String> {
        self.documents.read().await.get(id).map(|s| s.text.clone())
    }

    /// Pop one undo step. Returns false when there is nothing to undo.
    pub async fn undo(&self, id: &DocumentId) -> bool {
        let mut documents = self.documents.write().await;
        let Some(state) = documents.get_mut(id) else {
            return false;
        };
        match state.undo.pop() {
            Some(previous) => {
                state.text = previous;
                true
            }
            None => false,
        }
    }

    pub async fn undo_depth(&self, id: &DocumentId) -> usize {
        self.documents
            .read()
            .await
            .get(id)
            .map(|s| s.undo.len())
            .unwrap_or(0)
    }

    /// Diagnostics last published for a document.
    pub async fn diagnostics_for(&self, id: &DocumentId) -> Vec<Diagnostic> {
        self.published
            .read()
            .await
            .get(id)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl DocumentStore for MemoryHost {
    async fn get(&self, id: &DocumentId) -> SidecarResult<DocumentSnapshot> {
        let documents = self.documents.read().await;
        let state = documents
            .get(id)
            .ok_or_else(|| SidecarError::UnknownDocument(id.to_string()))?;
        Ok(DocumentSnapshot::new(id.clone(), state.text.as_str()))
    }
}

#[async_trait]
impl EditSink for MemoryHost {
    async fn apply_edit(
        &self,
        id: &DocumentId,
        edits: &[TextEdit],
        atomic: bool,
    ) -> SidecarResult<()> {
        let mut documents = self.documents.write().await;
        let state = documents
            .get_mut(id)
            .ok_or_else(|| SidecarError::UnknownDocument(id.to_string()))?;

        if atomic {
            let updated = apply_edits(&state.text, edits);
            state.undo.push(std::mem::replace(&mut state.text, updated));
        } else {
            // Non-atomic: one undo step per edit
            for edit in edits {
                let updated = apply_edits(&state.text, std::slice::from_ref(edit));
                state.undo.push(std::mem::replace(&mut state.text, updated));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl DiagnosticSink for MemoryHost {
    async fn publish(&self, id: &DocumentId, diagnostics: Vec<Diagnostic>) {
        tracing::debug!("Publishing {} diagnostics for {}", diagnostics.len(), id);
        self.published.write().await.insert(id.clone(), diagnostics);
    }
}

/// Apply a batch of edits to `text`, back to front so earlier edits do not
/// shift later ranges. Columns count characters, not bytes.
pub fn apply_edits(text: &str, edits: &[TextEdit]) -> String {
    let mut ordered: Vec<&TextEdit> = edits.iter().collect();
    ordered.sort_by_key(|e| (e.range.start.line, e.range.start.character));

    let mut result = text.to_string();
    for edit in ordered.iter().rev() {
        if edit.range.is_full() {
            result = edit.new_text.clone();
            continue;
        }
        let start = offset_of(&result, edit.range.start);
        let end = offset_of(&result, edit.range.end).max(start);
        result.replace_range(start..end, &edit.new_text);
    }
    result
}

/// Byte offset of a line/character position, clamped to the text bounds.
fn offset_of(text: &str, position: Position) -> usize {
    let mut offset = 0;
    for (line_index, line) in text.split_inclusive('\n').enumerate() {
        if line_index == position.line as usize {
            let in_line: usize = line
                .char_indices()
                .nth(position.character as usize)
                .map(|(i, _)| i)
                .unwrap_or_else(|| line.trim_end_matches('\n').len());
            return offset + in_line.min(line.len());
        }
        offset += line.len();
    }
    text.len()
}
