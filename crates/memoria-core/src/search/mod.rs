//! Hybrid retrieval combining keyword and semantic search.
//!
//! This module implements a local retrieval engine that combines:
//! - **Keyword search** (exact term matching via BM25)
//! - **Semantic search** (cosine similarity over item embeddings)
//! - **Weighted fusion** to merge both into one ranking
//!
//! # Architecture
//!
//! - `types`: Core types (MemoryId, MemoryItem, SearchResult, MatchKind, StatisticsSnapshot)
//! - `engine`: HybridIndex orchestrating corpus, embeddings and the keyword index
//! - `tokenizer`: Term extraction shared by indexing and querying
//! - `keyword`: BM25 index with incremental add/remove
//! - `similarity`: Cosine similarity and Euclidean distance
//! - `fusion`: Weighted merge of keyword and semantic results
//! - `highlight`: Snippets with matched terms marked
//!
//! # Usage
//!
//! ```ignore
//! use memoria_core::embedding::LookupEmbedder;
//! use memoria_core::search::{HybridIndex, MemoryItem, MemorySource};
//! use memoria_core::storage::InMemoryCorpus;
//!
//! let index = HybridIndex::new(InMemoryCorpus::new(), LookupEmbedder::new(384));
//!
//! index.index(MemoryItem::new("Standup notes: ship the release", MemorySource::UserNote)).await?;
//!
//! let keyword = index.search("release", 10).await?;
//! let semantic = index.semantic_search("shipping plans", 10).await?;
//! let hybrid = index.hybrid_search("release plans", 10).await?;
//! ```
//!
//! # Algorithm Details
//!
//! **Keyword Search (BM25)**:
//! - `idf = ln((N - df + 0.5) / (df + 0.5))`, not clamped
//! - Parameters: k1=1.2, b=0.75
//! - Average document length is derived from live documents on every search
//!
//! **Semantic Search**:
//! - Brute-force cosine scan over every stored embedding
//! - Results at or below the 0.3 similarity floor are dropped
//!
//! **Hybrid Fusion**:
//! - Each side fetches `2 * limit` candidates, concurrently
//! - Items found by both: `0.6 * bm25 + 0.4 * cosine`
//! - Items found by one side keep that side's score
//!
//! # Performance Characteristics
//!
//! - **Indexing**: O(terms) per item plus one embedding call
//! - **Keyword search**: O(documents × query terms)
//! - **Semantic search**: O(items × dimension)

pub mod types;

mod engine;
pub mod fusion;
pub mod highlight;
pub mod keyword;
pub mod similarity;
pub mod tokenizer;

// Re-export main types (public API)
pub use types::{
    MatchKind, MemoryId, MemoryItem, MemorySource, Metadata, MetadataValue, SearchResult,
    StatisticsSnapshot,
};

pub use engine::HybridIndex;
pub use keyword::LexicalIndex;
pub use similarity::{cosine_similarity, euclidean_distance};
pub use tokenizer::tokenize;
