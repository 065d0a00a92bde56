//! Ranking and runtime configuration.
//!
//! The constants below are the production defaults. [`HybridConfig`] carries
//! the same values at runtime so they can be overridden from a config file
//! without recompiling.
//!
//! # Usage
//!
//! ```
//! use memoria_core::config::{HybridConfig, SIMILARITY_FLOOR};
//!
//! let config = HybridConfig::default();
//! assert_eq!(config.similarity_floor, SIMILARITY_FLOOR);
//!
//! let tuned: HybridConfig = serde_json::from_str(r#"{ "keyword_weight": 0.7 }"#).unwrap();
//! assert_eq!(tuned.keyword_weight, 0.7);
//! assert_eq!(tuned.semantic_weight, 0.4);
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

// =============================================================================
// BM25
// =============================================================================

/// Term-frequency saturation.
pub const BM25_K1: f32 = 1.2;

/// Document-length normalization strength.
pub const BM25_B: f32 = 0.75;

// =============================================================================
// Semantic search and fusion
// =============================================================================

/// Semantic hits at or below this cosine similarity are discarded.
pub const SIMILARITY_FLOOR: f32 = 0.3;

/// Weight of the BM25 score when an item is both a keyword and a semantic hit.
pub const KEYWORD_WEIGHT: f32 = 0.6;

/// Weight of the cosine similarity when an item is both a keyword and a semantic hit.
pub const SEMANTIC_WEIGHT: f32 = 0.4;

/// Each hybrid sub-search fetches `limit * HYBRID_OVERFETCH` candidates.
pub const HYBRID_OVERFETCH: usize = 2;

// =============================================================================
// Runtime
// =============================================================================

/// Samples kept per rolling timing buffer.
pub const TIMING_HISTORY: usize = 100;

/// Default upper bound on a single embedding call.
pub const EMBED_TIMEOUT: Duration = Duration::from_secs(30);

/// Characters of context kept on each side of a highlighted match.
pub const SNIPPET_CONTEXT_CHARS: usize = 60;

/// Runtime configuration for [`HybridIndex`](crate::search::HybridIndex).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HybridConfig {
    /// BM25 `k1`
    pub k1: f32,
    /// BM25 `b`
    pub b: f32,
    /// Minimum (exclusive) cosine similarity for a semantic hit
    pub similarity_floor: f32,
    /// Keyword score weight in hybrid fusion
    pub keyword_weight: f32,
    /// Semantic score weight in hybrid fusion
    pub semantic_weight: f32,
    /// Candidate multiplier for hybrid sub-searches
    pub overfetch: usize,
    /// Samples kept per timing buffer
    pub timing_history: usize,
    /// Timeout applied to each embedding call; `None` waits indefinitely
    #[serde(rename = "embed_timeout_ms", with = "duration_ms")]
    pub embed_timeout: Option<Duration>,
}

impl Default for HybridConfig {
    fn default() -> Self {
        Self {
            k1: BM25_K1,
            b: BM25_B,
            similarity_floor: SIMILARITY_FLOOR,
            keyword_weight: KEYWORD_WEIGHT,
            semantic_weight: SEMANTIC_WEIGHT,
            overfetch: HYBRID_OVERFETCH,
            timing_history: TIMING_HISTORY,
            embed_timeout: Some(EMBED_TIMEOUT),
        }
    }
}

impl HybridConfig {
    /// Checks that every parameter is in its usable range.
    pub fn validate(&self) -> Result<(), String> {
        if !self.k1.is_finite() || self.k1 < 0.0 {
            return Err(format!("k1 must be a non-negative number, got {}", self.k1));
        }
        if !self.b.is_finite() || !(0.0..=1.0).contains(&self.b) {
            return Err(format!("b must be within [0, 1], got {}", self.b));
        }
        if !self.similarity_floor.is_finite() {
            return Err("similarity_floor must be finite".to_string());
        }
        for (name, weight) in [
            ("keyword_weight", self.keyword_weight),
            ("semantic_weight", self.semantic_weight),
        ] {
            if !weight.is_finite() || weight < 0.0 {
                return Err(format!("{name} must be a non-negative number, got {weight}"));
            }
        }
        if self.overfetch == 0 {
            return Err("overfetch must be at least 1".to_string());
        }
        if self.timing_history == 0 {
            return Err("timing_history must be at least 1".to_string());
        }
        Ok(())
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => s.serialize_some(&(d.as_millis() as u64)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(d)?.map(Duration::from_millis))
    }
}
