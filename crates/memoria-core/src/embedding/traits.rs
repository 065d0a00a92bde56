//! Traits for embedding operations.
//!
//! The embedding model is outside this crate. [`HybridIndex`](crate::search::HybridIndex)
//! talks to it only through [`EmbeddingProvider`], so a local model, a remote
//! API or a test double can be swapped without changing the index.

use crate::error::EmbeddingError;
use async_trait::async_trait;
use std::sync::Arc;

/// Asynchronous text-to-vector function.
///
/// # Readiness
///
/// Models are often loaded in the background. Until loading finishes,
/// implementations return [`EmbeddingError::ModelNotReady`], which callers
/// treat as retryable.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`. The index may call `embed`
/// concurrently from several tasks; a provider whose model is not thread-safe
/// serializes internally.
///
/// # Cancellation
///
/// The index wraps each call in a timeout and drops the future when it
/// elapses. Implementations should not hold state that breaks if a call is
/// abandoned midway.
///
/// # Examples
///
/// ```ignore
/// struct RemoteEmbedder { client: Client }
///
/// #[async_trait]
/// impl EmbeddingProvider for RemoteEmbedder {
///     async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
///         self.client.embed(text).await
///             .map_err(|e| EmbeddingError::InferenceFailed(e.to_string()))
///     }
///
///     fn dimension(&self) -> Option<usize> {
///         Some(384)
///     }
/// }
/// ```
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embeds a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Embeds several texts.
    ///
    /// The default implementation calls [`embed`](Self::embed) once per text,
    /// in order, and stops at the first failure.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed(text).await?);
        }
        Ok(embeddings)
    }

    /// Output vector length, if known.
    ///
    /// When `Some`, explicit embeddings supplied at index time are checked
    /// against it.
    fn dimension(&self) -> Option<usize>;

    /// Whether the model has finished loading.
    fn is_ready(&self) -> bool {
        true
    }
}

#[async_trait]
impl<T: EmbeddingProvider + ?Sized> EmbeddingProvider for Arc<T> {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        (**self).embed(text).await
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        (**self).embed_batch(texts).await
    }

    fn dimension(&self) -> Option<usize> {
        (**self).dimension()
    }

    fn is_ready(&self) -> bool {
        (**self).is_ready()
    }
}
