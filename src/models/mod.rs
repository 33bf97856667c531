//! Data models for Sidecar
//!
//! Contains core type definitions used throughout the engine.

pub mod action;
pub mod capability;
pub mod diagnostic;
pub mod document;
pub mod outcome;
pub mod request;
pub mod text;

// Re-export commonly used types
pub use action::{CodeAction, Hover};
pub use capability::Capability;
pub use diagnostic::{Diagnostic, Severity};
pub use document::{DocumentId, DocumentSnapshot};
pub use outcome::{GeneratorPayload, Outcome, SkipReason};
pub use request::ExecutionRequest;
pub use text::{Position, Range, TextEdit};
