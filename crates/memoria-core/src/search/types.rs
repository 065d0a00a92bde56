use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Unique memory item identifier.
///
/// Wraps a v4 UUID. Use `MemoryId::new()` to mint a fresh id, or
/// [`MemoryId::from_uuid`] when the id comes from an external store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemoryId(uuid::Uuid);

impl MemoryId {
    /// Generates a new random id.
    ///
    /// Default is intentionally not implemented: two `default()` calls would
    /// return different values.
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Wraps an existing UUID.
    pub fn from_uuid(id: uuid::Uuid) -> Self {
        Self(id)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }

    /// Big-endian byte form, used as a storage key.
    pub fn to_bytes(&self) -> [u8; 16] {
        *self.0.as_bytes()
    }

    /// Rebuilds an id from its storage key.
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(uuid::Uuid::from_bytes(bytes))
    }
}

impl fmt::Display for MemoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::str::FromStr for MemoryId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        uuid::Uuid::parse_str(s).map(Self)
    }
}

/// Where a memory item's text was captured from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemorySource {
    ScreenCapture,
    Ocr,
    Accessibility,
    FileContent,
    UserNote,
    AiSummary,
    Journal,
    Todo,
}

/// Metadata value attached to a memory item.
///
/// A closed set of variants rather than an open "any" so that equality and
/// serialization stay well defined. Serialized untagged, so a metadata map
/// reads as plain JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    List(Vec<MetadataValue>),
    Map(BTreeMap<String, MetadataValue>),
}

impl From<&str> for MetadataValue {
    fn from(s: &str) -> Self {
        MetadataValue::String(s.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(s: String) -> Self {
        MetadataValue::String(s)
    }
}

impl From<bool> for MetadataValue {
    fn from(b: bool) -> Self {
        MetadataValue::Bool(b)
    }
}

impl From<f64> for MetadataValue {
    fn from(n: f64) -> Self {
        MetadataValue::Number(n)
    }
}

impl From<i64> for MetadataValue {
    fn from(n: i64) -> Self {
        MetadataValue::Number(n as f64)
    }
}

/// Ordered metadata map.
pub type Metadata = BTreeMap<String, MetadataValue>;

/// A unit of indexed text.
///
/// Created by the caller. `embedding` may be left empty, in which case
/// [`HybridIndex::index`](super::HybridIndex::index) fills it in from the
/// embedding provider before the item is stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryItem {
    /// Unique identifier (re-indexing the same id replaces the item)
    pub id: MemoryId,
    /// Searchable text
    pub content: String,
    /// Capture time
    pub timestamp: DateTime<Utc>,
    /// Capture source
    pub source: MemorySource,
    /// Embedding vector, if already computed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    /// Free-form metadata
    #[serde(default)]
    pub metadata: Metadata,
}

impl MemoryItem {
    /// Creates an item with a fresh id, the current time and no embedding.
    pub fn new(content: impl Into<String>, source: MemorySource) -> Self {
        Self {
            id: MemoryId::new(),
            content: content.into(),
            timestamp: Utc::now(),
            source,
            embedding: None,
            metadata: Metadata::new(),
        }
    }

    /// Attaches a precomputed embedding.
    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    /// Adds a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Which ranker(s) produced a result, with their raw scores.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatchKind {
    /// BM25 hit only
    Keyword(f32),
    /// Embedding-similarity hit only
    Semantic(f32),
    /// Hit in both rankers
    Hybrid {
        /// BM25 score
        keyword: f32,
        /// Cosine similarity
        semantic: f32,
    },
}

impl MatchKind {
    /// BM25 score, if the item was a keyword hit.
    pub fn keyword_score(&self) -> Option<f32> {
        match self {
            MatchKind::Keyword(s) | MatchKind::Hybrid { keyword: s, .. } => Some(*s),
            MatchKind::Semantic(_) => None,
        }
    }

    /// Cosine similarity, if the item was a semantic hit.
    pub fn semantic_score(&self) -> Option<f32> {
        match self {
            MatchKind::Semantic(s) | MatchKind::Hybrid { semantic: s, .. } => Some(*s),
            MatchKind::Keyword(_) => None,
        }
    }
}

/// One ranked, hydrated hit.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    /// Item identifier
    pub id: MemoryId,
    /// Stored item
    pub item: MemoryItem,
    /// Ranking score (BM25, cosine, or weighted fusion of both)
    pub score: f32,
    /// Score provenance
    pub kind: MatchKind,
    /// Content excerpt with query terms wrapped in `**`
    pub snippet: Option<String>,
}

/// Point-in-time view of index size and recent latency.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatisticsSnapshot {
    /// Items in the corpus
    pub total_items: usize,
    /// Items in the corpus that carry an embedding
    pub items_with_embeddings: usize,
    /// Documents in the lexical index
    pub lexical_documents: usize,
    /// Distinct terms in the lexical index
    pub vocabulary_size: usize,
    /// Rolling mean embedding latency (ms)
    pub avg_embedding_ms: Option<f64>,
    /// Rolling mean search latency (ms)
    pub avg_search_ms: Option<f64>,
    /// Approximate corpus footprint
    pub storage_size_bytes: u64,
}
