//! Source Registry
//!
//! Holds the currently active generator descriptors. Sequence numbers are
//! strictly increasing and never reused; they define combination order for
//! formatting and display order for diagnostics and code actions.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::RwLock;

use super::descriptor::{SourceDescriptor, WorkspaceContext};
use crate::error::RegistryError;
use crate::models::capability::Capability;

/// A descriptor plus registry-assigned bookkeeping.
///
/// `live == false` means the static condition failed at registration: the
/// source stays visible to introspection but is excluded from every query.
/// Re-registration is the only way to retry.
#[derive(Debug, Clone)]
pub struct RegisteredSource {
    pub descriptor: Arc<SourceDescriptor>,
    pub seq: u64,
    pub live: bool,
}

pub struct SourceRegistry {
    workspace: WorkspaceContext,
    sources: RwLock<Vec<Arc<RegisteredSource>>>,
    next_seq: AtomicU64,
}

impl SourceRegistry {
    pub fn new(workspace: WorkspaceContext) -> Self {
        Self {
            workspace,
            sources: RwLock::new(Vec::new()),
            next_seq: AtomicU64::new(1),
        }
    }

    pub fn workspace(&self) -> &WorkspaceContext {
        &self.workspace
    }

    /// Register a descriptor, evaluating its static condition immediately.
    /// Returns the assigned sequence number.
    pub async fn register(&self, descriptor: SourceDescriptor) -> Result<u64, RegistryError> {
        let mut sources = self.sources.write().await;
        if sources.iter().any(|s| s.descriptor.name == descriptor.name) {
            return Err(RegistryError::DuplicateName(descriptor.name));
        }

        let live = descriptor
            .static_condition
            .as_ref()
            .map(|cond| cond(&self.workspace))
            .unwrap_or(true);

        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        if live {
            tracing::info!("Registered {} generator '{}' (#{})", descriptor.capability, descriptor.name, seq);
        } else {
            tracing::info!(
                "Registered {} generator '{}' (#{}) as inactive: static condition failed",
                descriptor.capability,
                descriptor.name,
                seq
            );
        }

        sources.push(Arc::new(RegisteredSource {
            descriptor: Arc::new(descriptor),
            seq,
            live,
        }));
        Ok(seq)
    }

    pub async fn deregister(&self, name: &str) -> Result<(), RegistryError> {
        let mut sources = self.sources.write().await;
        let before = sources.len();
        sources.retain(|s| s.descriptor.name != name);
        if sources.len() == before {
            return Err(RegistryError::UnknownSource(name.to_string()));
        }
        tracing::info!("Deregistered generator '{}'", name);
        Ok(())
    }

    /// Clear all sources. The sequence counter keeps climbing; numbers from
    /// before the reset are never handed out again.
    pub async fn reset(&self) {
        self.sources.write().await.clear();
        tracing::debug!("Registry reset");
    }

    /// Live sources matching capability and file type, in ascending
    /// sequence order.
    pub async fn query(
        &self,
        capability: Capability,
        filetype: Option<&str>,
    ) -> Vec<Arc<RegisteredSource>> {
        let sources = self.sources.read().await;
        sources
            .iter()
            .filter(|s| {
                s.live
                    && s.descriptor.capability == capability
                    && s.descriptor.matches_filetype(filetype)
            })
            .cloned()
            .collect()
    }

    /// Every registered source, dead entries included. Introspection only.
    pub async fn sources(&self) -> Vec<Arc<RegisteredSource>> {
        self.sources.read().await.clone()
    }
}
