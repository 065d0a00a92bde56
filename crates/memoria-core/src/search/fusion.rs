// Weighted score fusion for hybrid search

use super::types::{MatchKind, MemoryId, SearchResult};
use crate::config::{KEYWORD_WEIGHT, SEMANTIC_WEIGHT};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Weights applied when an item is both a keyword and a semantic hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionWeights {
    pub keyword: f32,
    pub semantic: f32,
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self {
            keyword: KEYWORD_WEIGHT,
            semantic: SEMANTIC_WEIGHT,
        }
    }
}

impl FusionWeights {
    /// Combined score: `keyword * kw + semantic * sem`.
    pub fn combine(&self, keyword_score: f32, semantic_score: f32) -> f32 {
        self.keyword * keyword_score + self.semantic * semantic_score
    }
}

/// Merges keyword and semantic result lists into one ranking.
///
/// Starts from the keyword results keyed by id. A semantic hit whose id is
/// already present replaces that entry with a [`MatchKind::Hybrid`] entry
/// scored by [`FusionWeights::combine`], keeping the keyword snippet. Other
/// semantic hits are appended unchanged. The merged list is sorted by score
/// descending (stable, so ties keep keyword-then-semantic order) and
/// truncated to `limit`.
///
/// Each id appears at most once in the output.
pub fn weighted_merge(
    keyword: Vec<SearchResult>,
    semantic: Vec<SearchResult>,
    weights: FusionWeights,
    limit: usize,
) -> Vec<SearchResult> {
    let mut merged: Vec<SearchResult> = Vec::with_capacity(keyword.len() + semantic.len());
    let mut positions: HashMap<MemoryId, usize> = HashMap::new();

    for result in keyword {
        if positions.contains_key(&result.id) {
            continue;
        }
        positions.insert(result.id, merged.len());
        merged.push(result);
    }

    for result in semantic {
        let semantic_score = result.score;
        match positions.get(&result.id) {
            Some(&pos) => {
                let existing = &mut merged[pos];
                // Only a plain keyword entry fuses; repeats are ignored.
                let MatchKind::Keyword(keyword_score) = existing.kind else {
                    continue;
                };
                existing.score = weights.combine(keyword_score, semantic_score);
                existing.kind = MatchKind::Hybrid {
                    keyword: keyword_score,
                    semantic: semantic_score,
                };
            }
            None => {
                positions.insert(result.id, merged.len());
                merged.push(result);
            }
        }
    }

    merged.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    merged.truncate(limit);
    merged
}
