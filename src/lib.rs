//! Sidecar - External Tool Orchestration Library
//!
//! Lets an editor obtain diagnostics, formatting, code actions and hover
//! content by delegating to external command-line tools and in-process
//! functions, without those tools knowing anything about the editor.

pub mod app;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod host;
pub mod infra;
pub mod models;
pub mod source;

pub use engine::{Delivered, Engine};
pub use error::{SidecarError, SidecarResult};
