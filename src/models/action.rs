//! Code actions and hover results

use serde::{Deserialize, Serialize};

use super::document::DocumentId;
use super::text::TextEdit;

/// An action offered by a code-action generator.
///
/// Remembers the generator that produced it; applying the action edits the
/// document, so a subsequent code-action request re-enters that generator
/// against the new content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeAction {
    pub title: String,
    pub source_name: String,
    pub document: DocumentId,
    pub edits: Vec<TextEdit>,
}

impl CodeAction {
    pub fn new(
        title: impl Into<String>,
        source_name: impl Into<String>,
        document: DocumentId,
        edits: Vec<TextEdit>,
    ) -> Self {
        Self {
            title: title.into(),
            source_name: source_name.into(),
            document,
            edits,
        }
    }
}

/// Hover text produced by a hover generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hover {
    pub contents: String,
}

impl Hover {
    pub fn new(contents: impl Into<String>) -> Self {
        Self {
            contents: contents.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.contents.trim().is_empty()
    }
}
