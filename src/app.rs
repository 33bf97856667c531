//! Application container for the Sidecar CLI
//!
//! Wires configuration, the in-memory document host and the engine together
//! for one invocation. Library consumers construct `Engine` directly; this
//! is the CLI's view of the world.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cli::{OutputContext, OutputFormat, SidecarConfig};
use crate::config::EngineConfig;
use crate::engine::Engine;
use crate::error::{SidecarError, SidecarResult};
use crate::host::{DiagnosticSink, DocumentStore, EditSink, MemoryHost};
use crate::models::document::DocumentId;
use crate::source::descriptor::WorkspaceContext;
use crate::source::registry::SourceRegistry;

pub struct App {
    root: PathBuf,
    pub(crate) output: OutputContext,
    pub(crate) host: Arc<MemoryHost>,
    pub(crate) engine: Engine,
    pub(crate) engine_config: EngineConfig,
}

impl App {
    pub async fn new(root: Option<PathBuf>, format: OutputFormat) -> anyhow::Result<Self> {
        let root = match root {
            Some(root) => root,
            None => std::env::current_dir()?,
        };
        tracing::debug!("Initializing sidecar at {:?}", root);

        let config = SidecarConfig::load(&root)?;
        let engine_config = config.engine_config();
        let descriptors = config.into_descriptors()?;

        let registry = Arc::new(SourceRegistry::new(WorkspaceContext::new(root.clone())));
        for descriptor in descriptors {
            let name = descriptor.name.clone();
            registry.register(descriptor).await?;
            tracing::debug!("Registered generator '{}'", name);
        }

        let host = Arc::new(MemoryHost::new());
        let engine = Engine::new(
            registry,
            engine_config.clone(),
            Arc::clone(&host) as Arc<dyn DocumentStore>,
            Arc::clone(&host) as Arc<dyn EditSink>,
            Arc::clone(&host) as Arc<dyn DiagnosticSink>,
        );

        Ok(Self {
            output: OutputContext::new(root.clone(), format),
            root,
            host,
            engine,
            engine_config,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Load a file from disk into the in-memory host. Relative paths are
    /// resolved against the workspace root.
    pub async fn open_file(&self, path: &Path) -> SidecarResult<DocumentId> {
        let abs = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        };
        let text = tokio::fs::read_to_string(&abs)
            .await
            .map_err(SidecarError::Io)?;
        let id = DocumentId::new(abs);
        self.host.open(id.clone(), text).await;
        Ok(id)
    }
}
