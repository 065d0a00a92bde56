//! Embedding provider abstraction.
//!
//! The model that turns text into vectors is an external collaborator. This
//! module defines the contract the index relies on and ships one simple
//! implementation.
//!
//! ## Core Traits
//!
//! - [`EmbeddingProvider`] - Async `embed(text) -> vector`, may report the model as not ready
//!
//! ## Implementations
//!
//! - [`LookupEmbedder`] - Preset vectors keyed by text, for tests and demos
//!
//! ## Example
//!
//! ```
//! use memoria_core::embedding::{EmbeddingProvider, LookupEmbedder};
//!
//! # tokio_test_block_on(async {
//! let embedder = LookupEmbedder::new(2).with("hello", vec![1.0, 0.0]);
//! assert_eq!(embedder.embed("hello").await.unwrap(), vec![1.0, 0.0]);
//! # });
//! # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```

mod lookup;
mod traits;

pub use lookup::LookupEmbedder;
pub use traits::EmbeddingProvider;
