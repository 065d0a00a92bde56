//! Table-driven embedding provider.
//!
//! Returns preset vectors for known texts and a zero vector for anything else.
//! Intended for tests and demos where a real model is unavailable; readiness,
//! latency and call counts can all be controlled.

use super::traits::EmbeddingProvider;
use crate::error::EmbeddingError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::RwLock;
use std::time::Duration;

/// Embedding provider backed by a text -> vector table.
#[derive(Debug)]
pub struct LookupEmbedder {
    dimension: usize,
    vectors: RwLock<HashMap<String, Vec<f32>>>,
    ready: AtomicBool,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl LookupEmbedder {
    /// Creates an empty, ready provider producing `dimension`-length vectors.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            vectors: RwLock::new(HashMap::new()),
            ready: AtomicBool::new(true),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Adds a preset vector (builder form).
    pub fn with(self, text: impl Into<String>, vector: Vec<f32>) -> Self {
        if let Ok(mut vectors) = self.vectors.write() {
            vectors.insert(text.into(), vector);
        }
        self
    }

    /// Sleeps for `delay` before answering each call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Adds or replaces a preset vector.
    pub fn insert(&self, text: impl Into<String>, vector: Vec<f32>) -> Result<(), EmbeddingError> {
        self.vectors
            .write()
            .map_err(|e| EmbeddingError::InferenceFailed(format!("Lock poisoned: {}", e)))?
            .insert(text.into(), vector);
        Ok(())
    }

    /// Toggles readiness. While not ready, every call fails with
    /// [`EmbeddingError::ModelNotReady`].
    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    /// Number of `embed` calls made so far, including failed ones.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for LookupEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if !self.is_ready() {
            return Err(EmbeddingError::ModelNotReady);
        }

        let vectors = self
            .vectors
            .read()
            .map_err(|e| EmbeddingError::InferenceFailed(format!("Lock poisoned: {}", e)))?;

        Ok(vectors
            .get(text)
            .cloned()
            .unwrap_or_else(|| vec![0.0; self.dimension]))
    }

    fn dimension(&self) -> Option<usize> {
        Some(self.dimension)
    }

    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_known_and_unknown_text() {
        let embedder = LookupEmbedder::new(2).with("milk", vec![1.0, 0.0]);

        assert_eq!(embedder.embed("milk").await.unwrap(), vec![1.0, 0.0]);
        assert_eq!(embedder.embed("bread").await.unwrap(), vec![0.0, 0.0]);
        assert_eq!(embedder.calls(), 2);
    }

    #[tokio::test]
    async fn test_not_ready_is_retryable() {
        let embedder = LookupEmbedder::new(2);
        embedder.set_ready(false);

        let err = embedder.embed("anything").await.unwrap_err();
        assert_eq!(err, EmbeddingError::ModelNotReady);
        assert!(err.is_retryable());

        embedder.set_ready(true);
        assert!(embedder.embed("anything").await.is_ok());
    }

    #[tokio::test]
    async fn test_batch_defaults_to_repeated_calls() {
        let embedder = LookupEmbedder::new(1).with("a", vec![1.0]).with("b", vec![2.0]);
        let texts = vec!["a".to_string(), "b".to_string()];

        let out = embedder.embed_batch(&texts).await.unwrap();
        assert_eq!(out, vec![vec![1.0], vec![2.0]]);
        assert_eq!(embedder.calls(), 2);
    }

    #[tokio::test]
    async fn test_arc_dyn_provider() {
        let embedder = LookupEmbedder::new(3);
        embedder.insert("x", vec![0.0, 1.0, 0.0]).unwrap();
        let shared: Arc<dyn EmbeddingProvider> = Arc::new(embedder);

        assert_eq!(shared.dimension(), Some(3));
        assert_eq!(shared.embed("x").await.unwrap(), vec![0.0, 1.0, 0.0]);
    }
}
