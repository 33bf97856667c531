//! Execution requests

use super::capability::Capability;
use super::diagnostic::Diagnostic;
use super::document::DocumentSnapshot;
use super::text::Range;

/// One capability request against one document snapshot.
///
/// Immutable; the dispatcher constructs a fresh request per dispatch (and
/// per chain step, for formatting).
#[derive(Debug, Clone)]
pub struct ExecutionRequest {
    pub capability: Capability,
    pub snapshot: DocumentSnapshot,
    pub range: Option<Range>,
    /// Trigger context for code-action generation: the diagnostics under
    /// the cursor, if the host supplied them.
    pub trigger: Vec<Diagnostic>,
}

impl ExecutionRequest {
    pub fn new(capability: Capability, snapshot: DocumentSnapshot) -> Self {
        Self {
            capability,
            snapshot,
            range: None,
            trigger: Vec::new(),
        }
    }

    pub fn with_range(mut self, range: Range) -> Self {
        self.range = Some(range);
        self
    }

    pub fn with_trigger(mut self, trigger: Vec<Diagnostic>) -> Self {
        self.trigger = trigger;
        self
    }
}
