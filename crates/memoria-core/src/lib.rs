//! # Memoria Core
//!
//! Local hybrid retrieval engine for short captured text: notes, OCR and
//! accessibility captures, summaries, journal entries and todos.
//!
//! Items are indexed for exact-term (BM25) and meaning-based (embedding)
//! retrieval and queried by keyword, semantic, or fused hybrid ranking. The
//! embedding model and the durable store are supplied by the application
//! through the [`embedding::EmbeddingProvider`] and [`storage::Corpus`] traits.
//!
//! ## Modules
//!
//! - [`search`] - Tokenizer, BM25 index, similarity, fusion and the [`HybridIndex`](search::HybridIndex)
//! - [`storage`] - Corpus trait with in-memory and redb implementations
//! - [`embedding`] - Embedding provider trait
//! - [`config`] - Ranking constants and runtime configuration
//! - [`error`] - Error types for embedding and index operations
//! - [`metrics`] - Rolling latency buffers
//!
//! ## Logging
//!
//! Uses [`tracing`] throughout. No subscriber is installed; the host
//! application chooses one.

pub mod config;
pub mod embedding;
pub mod error;
pub mod metrics;
pub mod search;
pub mod storage;

pub use config::HybridConfig;
pub use error::{EmbeddingError, IndexError};
pub use search::{HybridIndex, MemoryId, MemoryItem, MemorySource, SearchResult};
