//! Hybrid index combining keyword (BM25) and semantic (embedding) search.
//!
//! This module provides the [`HybridIndex`] which orchestrates:
//! - A BM25 [`LexicalIndex`] for exact term matching
//! - An [`EmbeddingProvider`] plus brute-force cosine scan for semantic similarity
//! - Weighted fusion for combining both into one ranking
//!
//! # Architecture
//!
//! - **Source of truth**: the [`Corpus`] holds every item and its embedding.
//! - **Derived cache**: the lexical index lives in memory and is rebuilt from
//!   the corpus by [`HybridIndex::open`] / [`HybridIndex::rebuild_lexical`].
//!
//! # Concurrency
//!
//! All methods take `&self`; share the index as an `Arc<HybridIndex<..>>`.
//! The lexical index sits behind an async `RwLock`, so every search observes a
//! single consistent snapshot of BM25 statistics. Writes (`index`, `delete`,
//! `clear`, rebuild) are serialized end to end by a separate mutex so that the
//! corpus and lexical index are updated in the same order. Embedding calls run
//! outside both locks and are bounded by `HybridConfig::embed_timeout`.


use super::fusion::{weighted_merge, FusionWeights};
use super::highlight::snippet;
use super::keyword::LexicalIndex;
use super::similarity::cosine_similarity;
use super::tokenizer::tokenize;
use super::types::{MatchKind, MemoryId, MemoryItem, SearchResult, StatisticsSnapshot};
use crate::config::{HybridConfig, SNIPPET_CONTEXT_CHARS};
use crate::embedding::EmbeddingProvider;
use crate::error::{EmbeddingError, IndexError};
use crate::metrics::{IndexMetrics, TimingSnapshot};
use crate::storage::{Corpus, StoreError};
use instant::Instant;
use std::cmp::Ordering;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, instrument, warn};

/// Hybrid keyword + semantic index over a [`Corpus`].
///
/// # Example
///
/// ```ignore
/// use memoria_core::embedding::LookupEmbedder;
/// use memoria_core::search::{HybridIndex, MemoryItem, MemorySource};
/// use memoria_core::storage::InMemoryCorpus;
///
/// let index = HybridIndex::new(InMemoryCorpus::new(), LookupEmbedder::new(2));
///
/// index.index(MemoryItem::new("buy milk", MemorySource::Todo)).await?;
/// let results = index.hybrid_search("milk", 10).await?;
/// ```
pub struct HybridIndex<C: Corpus, E: EmbeddingProvider> {
    /// Durable item store
    corpus: C,
    /// Text -> vector provider
    embedder: E,
    /// BM25 index derived from the corpus
    lexical: RwLock<LexicalIndex>,
    /// Serializes corpus + lexical mutations
    write_lock: Mutex<()>,
    config: HybridConfig,
    metrics: IndexMetrics,
}

impl<C: Corpus, E: EmbeddingProvider> HybridIndex<C, E> {
    /// Create an index with the default configuration and an empty lexical
    /// index (no corpus scan).
    ///
    /// Use [`open`](Self::open) when the corpus may already hold items.
    pub fn new(corpus: C, embedder: E) -> Self {
        Self::build(corpus, embedder, HybridConfig::default())
    }

    /// Create an index with a custom configuration and an empty lexical index.
    ///
    /// # Errors
    /// Returns [`IndexError::InvalidConfig`] if the configuration fails validation.
    pub fn with_config(corpus: C, embedder: E, config: HybridConfig) -> Result<Self, IndexError> {
        config.validate().map_err(IndexError::InvalidConfig)?;
        Ok(Self::build(corpus, embedder, config))
    }

    /// Create an index and rebuild its lexical index from the corpus.
    ///
    /// This is the preferred constructor for production use.
    pub async fn open(corpus: C, embedder: E, config: HybridConfig) -> Result<Self, IndexError> {
        let index = Self::with_config(corpus, embedder, config)?;
        index.rebuild_lexical().await?;
        Ok(index)
    }

    fn build(corpus: C, embedder: E, config: HybridConfig) -> Self {
        Self {
            lexical: RwLock::new(LexicalIndex::with_params(config.k1, config.b)),
            write_lock: Mutex::new(()),
            metrics: IndexMetrics::new(config.timing_history),
            corpus,
            embedder,
            config,
        }
    }

    /// Rebuild the lexical index by replaying every corpus item.
    ///
    /// The new index is built aside and swapped in only after the scan
    /// succeeds, so a failed or abandoned rebuild leaves the current index in
    /// place and can simply be retried. The corpus is only read.
    ///
    /// # Returns
    /// Number of documents in the rebuilt index.
    #[instrument(skip_all)]
    pub async fn rebuild_lexical(&self) -> Result<usize, IndexError> {
        let start = Instant::now();
        let _guard = self.write_lock.lock().await;

        let items = self.corpus.scan_all().await?;
        let scan_elapsed = start.elapsed();

        let mut fresh = LexicalIndex::with_params(self.config.k1, self.config.b);
        for item in &items {
            fresh.add_document(item.id, tokenize(&item.content));
        }
        let count = fresh.len();
        let vocabulary = fresh.vocabulary_size();

        *self.lexical.write().await = fresh;

        info!(
            "Rebuilt lexical index: {} documents, {} terms in {:?} (scan: {:?})",
            count,
            vocabulary,
            start.elapsed(),
            scan_elapsed
        );
        Ok(count)
    }

    /// Get a reference to the corpus.
    pub fn corpus(&self) -> &C {
        &self.corpus
    }

    /// Get a reference to the embedding provider.
    pub fn embedder(&self) -> &E {
        &self.embedder
    }

    /// Get the active configuration.
    pub fn config(&self) -> &HybridConfig {
        &self.config
    }

    /// Rolling latency buffers.
    pub fn timings(&self) -> TimingSnapshot {
        self.metrics.snapshot()
    }

    fn fusion_weights(&self) -> FusionWeights {
        FusionWeights {
            keyword: self.config.keyword_weight,
            semantic: self.config.semantic_weight,
        }
    }

    // =========================================================================
    // Indexing
    // =========================================================================

    /// Index (or re-index) an item.
    ///
    /// Embeds the content if the item has no embedding, writes the item to the
    /// corpus, then adds its terms to the lexical index. Re-indexing an id
    /// replaces the previous version in both.
    ///
    /// All-or-nothing: if validation, embedding or the corpus write fails,
    /// the lexical index is not touched.
    ///
    /// # Errors
    /// - [`IndexError::EmptyContent`] for empty or whitespace-only content
    /// - [`IndexError::DimensionMismatch`] if the embedding length differs
    ///   from the provider's dimension
    /// - [`IndexError::EmbeddingFailed`] if the provider fails (including
    ///   `ModelNotReady`, which is retryable)
    /// - [`IndexError::StorageFailed`] if the corpus write fails
    #[instrument(skip_all, fields(id = %item.id, content_len = item.content.len()))]
    pub async fn index(&self, mut item: MemoryItem) -> Result<(), IndexError> {
        if item.content.trim().is_empty() {
            return Err(IndexError::EmptyContent);
        }

        let embedding = match item.embedding.take() {
            Some(embedding) => embedding,
            None => self.embed(&item.content).await?,
        };
        self.validate_dimension(embedding.len())?;
        item.embedding = Some(embedding);

        let terms = tokenize(&item.content);
        let term_count = terms.len();

        let _guard = self.write_lock.lock().await;
        // Persist first; the lexical index only ever mirrors stored items
        self.corpus.put(&item).await?;
        self.lexical.write().await.add_document(item.id, terms);

        debug!("Indexed item with {} terms", term_count);
        Ok(())
    }

    /// Index several items in order.
    ///
    /// Each item is indexed independently with the same all-or-nothing
    /// guarantee as [`index`](Self::index); one failure does not stop the rest.
    ///
    /// # Returns
    /// One result per input item, in input order.
    pub async fn index_batch(&self, items: Vec<MemoryItem>) -> Vec<Result<(), IndexError>> {
        let mut results = Vec::with_capacity(items.len());
        for item in items {
            let id = item.id;
            let result = self.index(item).await;
            if let Err(e) = &result {
                warn!("Failed to index item {}: {}", id, e);
            }
            results.push(result);
        }
        results
    }

    /// Fetch a stored item by id.
    pub async fn get(&self, id: MemoryId) -> Result<Option<MemoryItem>, IndexError> {
        Ok(self.corpus.get(id).await?)
    }

    /// Remove an item from the corpus and the lexical index.
    ///
    /// Succeeds if the id is unknown.
    #[instrument(skip_all, fields(id = %id))]
    pub async fn delete(&self, id: MemoryId) -> Result<(), IndexError> {
        let _guard = self.write_lock.lock().await;
        self.corpus.delete(id).await?;
        let removed = self.lexical.write().await.remove_document(&id);
        debug!("Deleted item (lexical entry present: {})", removed);
        Ok(())
    }

    /// Remove every item and start over with an empty lexical index.
    ///
    /// Timing buffers are kept.
    #[instrument(skip_all)]
    pub async fn clear(&self) -> Result<(), IndexError> {
        let _guard = self.write_lock.lock().await;
        self.corpus.delete_all().await?;
        *self.lexical.write().await = LexicalIndex::with_params(self.config.k1, self.config.b);
        info!("Cleared index");
        Ok(())
    }

    // =========================================================================
    // Search
    // =========================================================================

    /// Keyword (BM25) search.
    ///
    /// Results are tagged [`MatchKind::Keyword`] and carry a highlighted
    /// snippet. Lexical hits whose item is missing from the corpus, or whose
    /// stored record cannot be decoded, are dropped.
    ///
    /// # Errors
    /// Returns [`IndexError::StorageFailed`] if a corpus read fails for any
    /// other reason.
    #[instrument(skip_all, fields(query_len = query.len(), limit = limit))]
    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>, IndexError> {
        let start = Instant::now();
        let terms = tokenize(query);
        let results = self.keyword_results(&terms, limit).await?;
        self.record_search(start);
        Ok(results)
    }

    /// Semantic (embedding similarity) search.
    ///
    /// Embeds the query, scores every stored embedding by cosine similarity,
    /// and keeps results strictly above the similarity floor. Equal
    /// similarities are ordered by item timestamp, oldest first. Results are
    /// tagged [`MatchKind::Semantic`].
    ///
    /// # Errors
    /// Returns [`IndexError::EmbeddingFailed`] if the query cannot be embedded,
    /// or [`IndexError::StorageFailed`] if the corpus scan fails.
    #[instrument(skip_all, fields(query_len = query.len(), limit = limit))]
    pub async fn semantic_search(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<SearchResult>, IndexError> {
        let start = Instant::now();
        let terms = tokenize(query);
        let results = self.semantic_results(query, &terms, limit).await?;
        self.record_search(start);
        Ok(results)
    }

    /// Hybrid search: keyword and semantic search run concurrently, then fuse.
    ///
    /// Each side fetches `limit * overfetch` candidates. Items found by both
    /// are scored `keyword_weight * bm25 + semantic_weight * cosine` and tagged
    /// [`MatchKind::Hybrid`]. If one side fails, the other's results are used
    /// alone.
    ///
    /// # Errors
    /// Returns [`IndexError::SearchFailed`] only if both sides fail.
    #[instrument(skip_all, fields(query_len = query.len(), limit = limit))]
    pub async fn hybrid_search(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<SearchResult>, IndexError> {
        let start = Instant::now();
        let terms = tokenize(query);
        if terms.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let fetch = limit.saturating_mul(self.config.overfetch);
        let (keyword, semantic) = tokio::join!(
            self.keyword_results(&terms, fetch),
            self.semantic_results(query, &terms, fetch)
        );

        let (keyword, semantic) = match (keyword, semantic) {
            (Ok(keyword), Ok(semantic)) => (keyword, semantic),
            (Ok(keyword), Err(e)) => {
                warn!("Semantic search failed, using keyword results only: {}", e);
                (keyword, Vec::new())
            }
            (Err(e), Ok(semantic)) => {
                warn!("Keyword search failed, using semantic results only: {}", e);
                (Vec::new(), semantic)
            }
            (Err(keyword), Err(semantic)) => {
                return Err(IndexError::SearchFailed {
                    keyword: Box::new(keyword),
                    semantic: Box::new(semantic),
                });
            }
        };

        let keyword_count = keyword.len();
        let semantic_count = semantic.len();
        let results = weighted_merge(keyword, semantic, self.fusion_weights(), limit);

        debug!(
            "Hybrid search: {} keyword + {} semantic -> {} results",
            keyword_count,
            semantic_count,
            results.len()
        );
        self.record_search(start);
        Ok(results)
    }

    async fn keyword_results(
        &self,
        terms: &[String],
        limit: usize,
    ) -> Result<Vec<SearchResult>, IndexError> {
        if terms.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        // Release the read guard before touching the corpus
        let hits = self.lexical.read().await.search_terms(terms, limit);

        let mut results = Vec::with_capacity(hits.len());
        for (id, score) in hits {
            match self.corpus.get(id).await {
                Ok(Some(item)) => {
                    let snippet = snippet(&item.content, terms, SNIPPET_CONTEXT_CHARS);
                    results.push(SearchResult {
                        id,
                        item,
                        score,
                        kind: MatchKind::Keyword(score),
                        snippet,
                    });
                }
                Ok(None) => {
                    warn!("Keyword hit {} has no corpus record, dropping", id);
                }
                Err(StoreError::SerializationError(e)) => {
                    warn!("Keyword hit {} has a malformed corpus record, dropping: {}", id, e);
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(results)
    }

    async fn semantic_results(
        &self,
        query: &str,
        terms: &[String],
        limit: usize,
    ) -> Result<Vec<SearchResult>, IndexError> {
        if terms.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let query_embedding = self.embed(query).await?;
        let items = self.corpus.scan_with_embeddings().await?;
        let scanned = items.len();

        let floor = self.config.similarity_floor;
        let mut scored: Vec<(f32, MemoryItem)> = items
            .into_iter()
            .filter_map(|item| {
                let similarity = cosine_similarity(&query_embedding, item.embedding.as_deref()?);
                (similarity > floor).then_some((similarity, item))
            })
            .collect();

        // Equal similarities fall back to capture time, then corpus order
        scored.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.1.timestamp.cmp(&b.1.timestamp))
        });
        scored.truncate(limit);

        debug!(
            "Semantic scan: {} candidates, {} above floor {}",
            scanned,
            scored.len(),
            floor
        );

        Ok(scored
            .into_iter()
            .map(|(similarity, item)| SearchResult {
                id: item.id,
                item,
                score: similarity,
                kind: MatchKind::Semantic(similarity),
                snippet: None,
            })
            .collect())
    }

    // =========================================================================
    // Statistics
    // =========================================================================

    /// Snapshot of corpus size, lexical index size and rolling latencies.
    pub async fn get_statistics(&self) -> Result<StatisticsSnapshot, IndexError> {
        let total_items = self.corpus.count().await?;
        let items_with_embeddings = self.corpus.count_with_embeddings().await?;
        let storage_size_bytes = self.corpus.approximate_size_bytes().await?;

        let (lexical_documents, vocabulary_size) = {
            let lexical = self.lexical.read().await;
            (lexical.len(), lexical.vocabulary_size())
        };
        let timings = self.metrics.snapshot();

        Ok(StatisticsSnapshot {
            total_items,
            items_with_embeddings,
            lexical_documents,
            vocabulary_size,
            avg_embedding_ms: timings.embedding_avg_ms,
            avg_search_ms: timings.search_avg_ms,
            storage_size_bytes,
        })
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// Embed `text`, bounded by the configured timeout, and record the latency.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let start = Instant::now();
        let embedding = match self.config.embed_timeout {
            Some(limit) => tokio::time::timeout(limit, self.embedder.embed(text))
                .await
                .map_err(|_| EmbeddingError::Timeout(limit))??,
            None => self.embedder.embed(text).await?,
        };
        self.metrics
            .record_embedding(start.elapsed().as_secs_f64() * 1000.0);
        Ok(embedding)
    }

    fn validate_dimension(&self, actual: usize) -> Result<(), IndexError> {
        match self.embedder.dimension() {
            Some(expected) if expected != actual => {
                Err(IndexError::DimensionMismatch { expected, actual })
            }
            _ => Ok(()),
        }
    }

    fn record_search(&self, start: Instant) {
        self.metrics
            .record_search(start.elapsed().as_secs_f64() * 1000.0);
    }
}
