//! Dispatcher/Aggregator
//!
//! The orchestration core. For one capability request it selects eligible
//! sources from the registry, filters them through runtime conditions, runs
//! them under the capability's execution strategy and merges the surviving
//! outcomes into a single result. Individual generator failures degrade only
//! that generator's contribution; an all-failed request still delivers an
//! empty result rather than an error.

use std::collections::HashMap;
use std::sync::Arc;

use futures::FutureExt;

use super::cache::ResultCache;
use super::inflight::InflightMap;
use crate::config::EngineConfig;
use crate::error::SidecarResult;
use crate::host::{DiagnosticSink, DocumentStore, EditSink};
use crate::models::action::{CodeAction, Hover};
use crate::models::capability::Capability;
use crate::models::diagnostic::Diagnostic;
use crate::models::document::DocumentId;
use crate::models::outcome::{GeneratorPayload, Outcome, SkipReason};
use crate::models::request::ExecutionRequest;
use crate::models::text::{Position, Range, TextEdit};
use crate::source::descriptor::{CachePolicy, GeneratorKind};
use crate::source::registry::{RegisteredSource, SourceRegistry};
use crate::source::{SourceDescriptor, normalize};

/// Result of one dispatch. A request superseded by a newer one for the same
/// (document, capability) pair is discarded on arrival, never delivered.
#[derive(Debug, Clone, PartialEq)]
pub enum Delivered<T> {
    Complete(T),
    Superseded,
}

impl<T> Delivered<T> {
    pub fn into_inner(self) -> Option<T> {
        match self {
            Self::Complete(value) => Some(value),
            Self::Superseded => None,
        }
    }

    pub fn is_superseded(&self) -> bool {
        matches!(self, Self::Superseded)
    }
}

pub struct Engine {
    registry: Arc<SourceRegistry>,
    cache: Arc<ResultCache>,
    inflight: Arc<InflightMap>,
    config: EngineConfig,
    store: Arc<dyn DocumentStore>,
    edits: Arc<dyn EditSink>,
    diagnostics_sink: Arc<dyn DiagnosticSink>,
    generations: tokio::sync::Mutex<HashMap<(DocumentId, Capability), u64>>,
}

impl Engine {
    pub fn new(
        registry: Arc<SourceRegistry>,
        config: EngineConfig,
        store: Arc<dyn DocumentStore>,
        edits: Arc<dyn EditSink>,
        diagnostics_sink: Arc<dyn DiagnosticSink>,
    ) -> Self {
        Self {
            registry,
            cache: Arc::new(ResultCache::new()),
            inflight: Arc::new(InflightMap::new()),
            config,
            store,
            edits,
            diagnostics_sink,
            generations: tokio::sync::Mutex::new(HashMap::new()),
        }
    }

    pub fn registry(&self) -> &Arc<SourceRegistry> {
        &self.registry
    }

    pub fn cache(&self) -> &Arc<ResultCache> {
        &self.cache
    }

    // ========================================================================
    // Capability operations
    // ========================================================================

    /// Run all eligible diagnostics generators concurrently and publish the
    /// merged sets, one per affected document. A generator may report
    /// findings for files other than the requested one; those are routed to
    /// their own document's set.
    pub async fn diagnostics(
        &self,
        document: &DocumentId,
    ) -> SidecarResult<Delivered<HashMap<DocumentId, Vec<Diagnostic>>>> {
        let snapshot = self.store.get(document).await?;
        let generation = self.begin(document, Capability::Diagnostics).await;

        let request = ExecutionRequest::new(Capability::Diagnostics, snapshot);
        let outcomes = self.collect_concurrent(&request).await;

        if !self.is_current(document, Capability::Diagnostics, generation).await {
            tracing::debug!("Discarding stale diagnostics for {}", document);
            return Ok(Delivered::Superseded);
        }

        let mut merged: HashMap<DocumentId, Vec<Diagnostic>> = HashMap::new();
        merged.insert(document.clone(), Vec::new());

        for (source, outcome) in outcomes {
            let Some(GeneratorPayload::Diagnostics(found)) = outcome.payload() else {
                continue;
            };
            for mut diagnostic in found.iter().cloned() {
                diagnostic.source = Some(source.descriptor.name.clone());
                if let Some(template) = &source.descriptor.format_template {
                    diagnostic.message = diagnostic.formatted_message(template);
                }
                let target = DocumentId::new(diagnostic.file_path.clone());
                merged.entry(target).or_default().push(diagnostic);
            }
        }

        for (target, diagnostics) in &merged {
            self.diagnostics_sink
                .publish(target, diagnostics.clone())
                .await;
        }
        Ok(Delivered::Complete(merged))
    }

    /// Run the sequential formatting chain and apply the combined result as
    /// one atomic edit. Returns the final text when it differs from the
    /// original.
    pub async fn format(&self, document: &DocumentId) -> SidecarResult<Delivered<Option<String>>> {
        self.run_format_chain(document, Capability::Formatting, None)
            .await
    }

    /// Formatting restricted to a range. Same sequential pass-through
    /// semantics; the range rides along on every request.
    pub async fn range_format(
        &self,
        document: &DocumentId,
        range: Range,
    ) -> SidecarResult<Delivered<Option<String>>> {
        self.run_format_chain(document, Capability::RangeFormatting, Some(range))
            .await
    }

    /// Concatenate actions from all eligible generators, in registration
    /// order. `trigger` carries the diagnostics under the cursor, if any.
    pub async fn code_actions(
        &self,
        document: &DocumentId,
        range: Option<Range>,
        trigger: Vec<Diagnostic>,
    ) -> SidecarResult<Delivered<Vec<CodeAction>>> {
        let snapshot = self.store.get(document).await?;
        let generation = self.begin(document, Capability::CodeAction).await;

        let mut request = ExecutionRequest::new(Capability::CodeAction, snapshot).with_trigger(trigger);
        if let Some(range) = range {
            request = request.with_range(range);
        }
        let outcomes = self.collect_concurrent(&request).await;

        if !self.is_current(document, Capability::CodeAction, generation).await {
            return Ok(Delivered::Superseded);
        }

        let mut actions = Vec::new();
        for (_, outcome) in outcomes {
            if let Some(GeneratorPayload::Actions(found)) = outcome.payload() {
                actions.extend(found.iter().cloned());
            }
        }
        Ok(Delivered::Complete(actions))
    }

    /// Apply a previously returned action as a single atomic edit.
    pub async fn apply_action(&self, action: &CodeAction) -> SidecarResult<()> {
        tracing::debug!(
            "Applying action '{}' from '{}' to {}",
            action.title,
            action.source_name,
            action.document
        );
        self.edits
            .apply_edit(&action.document, &action.edits, true)
            .await
    }

    /// All hover generators run concurrently; the earliest-registered
    /// non-empty success wins.
    pub async fn hover(
        &self,
        document: &DocumentId,
        position: Option<Position>,
    ) -> SidecarResult<Delivered<Option<Hover>>> {
        let snapshot = self.store.get(document).await?;
        let generation = self.begin(document, Capability::Hover).await;

        let mut request = ExecutionRequest::new(Capability::Hover, snapshot);
        if let Some(position) = position {
            request = request.with_range(Range::point(position));
        }
        let outcomes = self.collect_concurrent(&request).await;

        if !self.is_current(document, Capability::Hover, generation).await {
            return Ok(Delivered::Superseded);
        }

        let winner = outcomes.iter().find_map(|(_, outcome)| match outcome.payload() {
            Some(GeneratorPayload::Hover(hover)) if !hover.is_empty() => Some(hover.clone()),
            _ => None,
        });
        Ok(Delivered::Complete(winner))
    }

    // ========================================================================
    // Dispatch strategies
    // ========================================================================

    /// Concurrent strategy: every eligible source is issued at once and all
    /// are awaited. `join_all` preserves issue order, so completion order
    /// never leaks into result order.
    async fn collect_concurrent(
        &self,
        request: &ExecutionRequest,
    ) -> Vec<(Arc<RegisteredSource>, Outcome)> {
        let filetype = request.snapshot.id.file_type();
        let sources = self
            .registry
            .query(request.capability, filetype.as_deref())
            .await;
        tracing::debug!(
            "{} request for {}: {} eligible source(s)",
            request.capability,
            request.snapshot.id,
            sources.len()
        );

        let mut tasks = Vec::with_capacity(sources.len());
        for source in &sources {
            let request = request.clone();
            tasks.push(async move {
                if !runtime_eligible(&source.descriptor, &request) {
                    return Outcome::Skipped(SkipReason::RuntimeCondition);
                }
                self.invoke_source(source, &request).await
            });
        }

        let outcomes = futures::future::join_all(tasks).await;
        sources.into_iter().zip(outcomes).collect()
    }

    /// Sequential strategy for formatting: each source consumes the output
    /// of the previous one; Skipped and failed sources pass content through
    /// unchanged.
    async fn run_format_chain(
        &self,
        document: &DocumentId,
        capability: Capability,
        range: Option<Range>,
    ) -> SidecarResult<Delivered<Option<String>>> {
        let snapshot = self.store.get(document).await?;
        let generation = self.begin(document, capability).await;

        let filetype = snapshot.id.file_type();
        let sources = self.registry.query(capability, filetype.as_deref()).await;

        let original: Arc<str> = Arc::clone(&snapshot.text);
        let mut current = snapshot;

        for source in sources {
            let mut request = ExecutionRequest::new(capability, current.clone());
            if let Some(range) = range {
                request = request.with_range(range);
            }
            if !runtime_eligible(&source.descriptor, &request) {
                tracing::debug!("Formatter '{}' skipped by runtime condition", source.descriptor.name);
                continue;
            }

            match self.invoke_source(&source, &request).await {
                Outcome::Success(payload) => {
                    if let GeneratorPayload::Formatted(text) = payload.as_ref() {
                        current = current.with_text(text.as_str());
                    }
                }
                outcome => {
                    // Pass-through: the next formatter sees the content as
                    // last produced.
                    tracing::warn!(
                        "Formatter '{}' contributed nothing: {:?}",
                        source.descriptor.name,
                        outcome
                    );
                }
            }
        }

        if !self.is_current(document, capability, generation).await {
            tracing::debug!("Discarding stale format result for {}", document);
            return Ok(Delivered::Superseded);
        }

        if *current.text == *original {
            return Ok(Delivered::Complete(None));
        }

        let formatted = current.text.to_string();
        self.edits
            .apply_edit(document, &[TextEdit::replace_all(formatted.clone())], true)
            .await?;
        Ok(Delivered::Complete(Some(formatted)))
    }

    /// Invoke one source, routing through the result cache and the
    /// in-flight tracker as its descriptor demands.
    async fn invoke_source(&self, source: &RegisteredSource, request: &ExecutionRequest) -> Outcome {
        let descriptor = Arc::clone(&source.descriptor);
        let seq = source.seq;
        let document = request.snapshot.id.clone();
        let content_hash = request.snapshot.hash;
        let cached = self.config.cache_enabled
            && matches!(descriptor.cache, CachePolicy::ContentKeyed);

        let inflight = Arc::clone(&self.inflight);
        let config = self.config.clone();
        let request = request.clone();

        let compute = {
            let document = document.clone();
            move || async move {
                match descriptor.kind {
                    // In-process call: no spawn, nothing to deduplicate
                    GeneratorKind::Function(_) => {
                        normalize::invoke(&descriptor, &request, &config).await
                    }
                    GeneratorKind::Process(_) => {
                        let work = {
                            let descriptor = Arc::clone(&descriptor);
                            let request = request.clone();
                            let config = config.clone();
                            async move { normalize::invoke(&descriptor, &request, &config).await }
                                .boxed()
                        };
                        inflight.run((seq, document), work).await
                    }
                }
            }
        };

        if cached {
            self.cache
                .get_or_compute(seq, &document, content_hash, compute)
                .await
        } else {
            compute().await
        }
    }

    // ========================================================================
    // Request generations (last-request-wins per document/capability)
    // ========================================================================

    async fn begin(&self, document: &DocumentId, capability: Capability) -> u64 {
        let mut generations = self.generations.lock().await;
        let counter = generations
            .entry((document.clone(), capability))
            .or_insert(0);
        *counter += 1;
        *counter
    }

    async fn is_current(&self, document: &DocumentId, capability: Capability, generation: u64) -> bool {
        let generations = self.generations.lock().await;
        generations
            .get(&(document.clone(), capability))
            .is_some_and(|current| *current == generation)
    }
}

fn runtime_eligible(descriptor: &SourceDescriptor, request: &ExecutionRequest) -> bool {
    descriptor
        .runtime_condition
        .as_ref()
        .map(|condition| condition(request))
        .unwrap_or(true)
}
