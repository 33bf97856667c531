//! Generator invocation outcomes

use std::sync::Arc;

use super::action::{CodeAction, Hover};
use super::diagnostic::Diagnostic;

/// Capability-specific payload of a successful invocation.
#[derive(Debug, Clone)]
pub enum GeneratorPayload {
    Diagnostics(Vec<Diagnostic>),
    Formatted(String),
    Actions(Vec<CodeAction>),
    Hover(Hover),
}

impl GeneratorPayload {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Diagnostics(d) => d.is_empty(),
            Self::Formatted(_) => false,
            Self::Actions(a) => a.is_empty(),
            Self::Hover(h) => h.is_empty(),
        }
    }
}

/// Why a generator was skipped for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Runtime condition returned false. The source stays live.
    RuntimeCondition,
    /// Resolution mode was only-local and no local executable was found.
    LocalExecutableMissing,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RuntimeCondition => write!(f, "runtime condition not met"),
            Self::LocalExecutableMissing => write!(f, "no local executable"),
        }
    }
}

/// Terminal state of one generator invocation.
///
/// Failure and Timeout degrade only that generator's contribution; they
/// never abort the surrounding request.
#[derive(Debug, Clone)]
pub enum Outcome {
    Success(Arc<GeneratorPayload>),
    Failure(String),
    Timeout,
    Skipped(SkipReason),
}

impl Outcome {
    pub fn success(payload: GeneratorPayload) -> Self {
        Self::Success(Arc::new(payload))
    }

    pub fn payload(&self) -> Option<&GeneratorPayload> {
        match self {
            Self::Success(p) => Some(p),
            _ => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped(_))
    }
}
