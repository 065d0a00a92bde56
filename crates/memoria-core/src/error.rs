//! Error types for memoria-core.
//!
//! This module defines the errors surfaced by the embedding boundary and by
//! the [`HybridIndex`](crate::search::HybridIndex) orchestrator. Storage errors
//! live next to the [`Corpus`](crate::storage::Corpus) trait in [`crate::storage`].

use crate::storage::StoreError;
use thiserror::Error;

/// Errors that can occur while producing an embedding.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EmbeddingError {
    /// The underlying model has not finished loading
    #[error("Embedding model not ready")]
    ModelNotReady,
    /// The provider did not answer within the configured timeout
    #[error("Embedding timed out after {0:?}")]
    Timeout(std::time::Duration),
    /// Forward pass or provider call failed
    #[error("Inference failed: {0}")]
    InferenceFailed(String),
}

impl EmbeddingError {
    /// Whether the caller may retry the same request later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EmbeddingError::ModelNotReady | EmbeddingError::Timeout(_))
    }
}

/// Errors returned by [`HybridIndex`](crate::search::HybridIndex) operations.
#[derive(Debug, Error)]
pub enum IndexError {
    /// Configuration failed validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    /// Item content was empty or whitespace-only
    #[error("Item content is empty")]
    EmptyContent,
    /// Explicit embedding length differs from the provider's dimension
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Provider embedding dimension
        expected: usize,
        /// Length of the embedding that was supplied
        actual: usize,
    },
    /// Embedding generation failed
    #[error("Embedding failed: {0}")]
    EmbeddingFailed(#[from] EmbeddingError),
    /// Corpus read or write failed
    #[error("Storage failed: {0}")]
    StorageFailed(#[from] StoreError),
    /// Both hybrid sub-searches failed
    #[error("Hybrid search failed (keyword: {keyword}; semantic: {semantic})")]
    SearchFailed {
        /// Keyword sub-search failure
        keyword: Box<IndexError>,
        /// Semantic sub-search failure
        semantic: Box<IndexError>,
    },
}

impl IndexError {
    /// Whether the failure came from a model that is still loading or timed out.
    pub fn is_retryable(&self) -> bool {
        match self {
            IndexError::EmbeddingFailed(e) => e.is_retryable(),
            IndexError::SearchFailed { keyword, semantic } => {
                keyword.is_retryable() || semantic.is_retryable()
            }
            _ => false,
        }
    }
}
