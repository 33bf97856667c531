//! Error types for Sidecar

use std::time::Duration;

use thiserror::Error;

pub type SidecarResult<T> = std::result::Result<T, SidecarError>;

#[derive(Debug, Error)]
pub enum SidecarError {
    #[error("{0}")]
    Registry(#[from] RegistryError),

    #[error("{0}")]
    Exec(#[from] ExecError),

    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("Unknown document: {0}")]
    UnknownDocument(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Errors surfaced at generator registration time.
///
/// A bad descriptor fails immediately and is never added to the registry;
/// failures during a dispatch are outcomes, never errors.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Invalid generator '{name}': {reason}")]
    InvalidDescriptor { name: String, reason: String },

    #[error("Generator already registered: {0}")]
    DuplicateName(String),

    #[error("Unknown generator: {0}")]
    UnknownSource(String),
}

impl RegistryError {
    pub fn invalid(name: &str, reason: &str) -> Self {
        Self::InvalidDescriptor {
            name: name.to_string(),
            reason: reason.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("Executable not found: {0}")]
    NotFound(String),

    #[error("Process timed out after {0:?}")]
    Timeout(Duration),

    #[error("Failed to spawn process: {0}")]
    Spawn(#[source] std::io::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ExecError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config parse error: {0}")]
    Parse(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Invalid value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
