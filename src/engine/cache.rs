//! Result caching keyed by content
//!
//! Memoizes successful generator payloads per (source, document, content
//! hash). Invalidation is coarse on purpose: any observed content change for
//! a document discards every entry for that document across all sources,
//! trading hit rate for correctness.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::RwLock;

use crate::models::document::DocumentId;
use crate::models::outcome::{GeneratorPayload, Outcome};

struct CacheEntry {
    content_hash: u64,
    payload: Arc<GeneratorPayload>,
}

/// Thread-safe per-document result cache with hit/miss statistics.
pub struct ResultCache {
    entries: RwLock<HashMap<DocumentId, HashMap<u64, CacheEntry>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultCache {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Return the cached payload for (source, document, hash) or run
    /// `compute`, caching its payload on success. Only Success outcomes are
    /// stored; failures and timeouts always recompute.
    pub async fn get_or_compute<F, Fut>(
        &self,
        source_seq: u64,
        document: &DocumentId,
        content_hash: u64,
        compute: F,
    ) -> Outcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Outcome>,
    {
        {
            let mut entries = self.entries.write().await;
            if let Some(per_source) = entries.get_mut(document) {
                // Hash mismatch anywhere means the document changed; drop
                // everything keyed to it before looking further.
                if per_source.values().any(|e| e.content_hash != content_hash) {
                    tracing::trace!("Content changed, invalidating cache for {}", document);
                    entries.remove(document);
                } else if let Some(entry) = per_source.get(&source_seq) {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    tracing::trace!("Result cache hit: {} #{}", document, source_seq);
                    return Outcome::Success(Arc::clone(&entry.payload));
                }
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        tracing::trace!("Result cache miss: {} #{}", document, source_seq);
        let outcome = compute().await;

        if let Outcome::Success(payload) = &outcome {
            let mut entries = self.entries.write().await;
            entries.entry(document.clone()).or_default().insert(
                source_seq,
                CacheEntry {
                    content_hash,
                    payload: Arc::clone(payload),
                },
            );
        }
        outcome
    }

    /// Discard all entries for one document, every source included.
    pub async fn invalidate_document(&self, document: &DocumentId) {
        self.entries.write().await.remove(document);
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    pub async fn stats(&self) -> CacheStats {
        let entries = self.entries.read().await;
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        CacheStats {
            document_count: entries.len(),
            entry_count: entries.values().map(HashMap::len).sum(),
            hits,
            misses,
            hit_rate: if hits + misses > 0 {
                hits as f64 / (hits + misses) as f64
            } else {
                0.0
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct CacheStats {
    pub document_count: usize,
    pub entry_count: usize,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::action::Hover;

    fn hover_payload(text: &str) -> Outcome {
        Outcome::success(GeneratorPayload::Hover(Hover::new(text)))
    }

    #[tokio::test]
    async fn test_hit_skips_compute() {
        let cache = ResultCache::new();
        let doc = DocumentId::from("a.rs");

        let first = cache
            .get_or_compute(1, &doc, 100, || async { hover_payload("computed") })
            .await;
        assert!(first.is_success());

        let second = cache
            .get_or_compute(1, &doc, 100, || async {
                panic!("compute must not run on a hit")
            })
            .await;
        match second.payload() {
            Some(GeneratorPayload::Hover(h)) => assert_eq!(h.contents, "computed"),
            other => panic!("unexpected payload: {:?}", other),
        }

        let stats = cache.stats().await;
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[tokio::test]
    async fn test_content_change_invalidates_whole_document() {
        let cache = ResultCache::new();
        let doc = DocumentId::from("a.rs");

        // Two sources cache against hash 1
        for seq in [1u64, 2] {
            cache
                .get_or_compute(seq, &doc, 1, || async { hover_payload("old") })
                .await;
        }
        assert_eq!(cache.stats().await.entry_count, 2);

        // New hash through source 1 drops source 2's entry too
        cache
            .get_or_compute(1, &doc, 2, || async { hover_payload("new") })
            .await;

        let recomputed = cache
            .get_or_compute(2, &doc, 2, || async { hover_payload("fresh") })
            .await;
        match recomputed.payload() {
            Some(GeneratorPayload::Hover(h)) => assert_eq!(h.contents, "fresh"),
            other => panic!("unexpected payload: {:?}", other),
        }
        assert_eq!(cache.stats().await.misses, 4);
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let cache = ResultCache::new();
        let doc = DocumentId::from("a.rs");

        cache
            .get_or_compute(1, &doc, 5, || async { Outcome::Failure("nope".into()) })
            .await;
        let outcome = cache
            .get_or_compute(1, &doc, 5, || async { hover_payload("retry worked") })
            .await;
        assert!(outcome.is_success());
    }

    #[tokio::test]
    async fn test_documents_are_independent() {
        let cache = ResultCache::new();
        let a = DocumentId::from("a.rs");
        let b = DocumentId::from("b.rs");

        cache
            .get_or_compute(1, &a, 1, || async { hover_payload("a") })
            .await;
        cache
            .get_or_compute(1, &b, 1, || async { hover_payload("b") })
            .await;

        cache.invalidate_document(&a).await;
        let outcome = cache
            .get_or_compute(1, &b, 1, || async { panic!("b should still be cached") })
            .await;
        assert!(outcome.is_success());
    }
}
