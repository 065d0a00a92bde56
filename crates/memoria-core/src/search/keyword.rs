//! BM25 keyword index with incremental add and remove.
//!
//! # Algorithm
//!
//! For query term *t* and document *d*:
//!
//! ```text
//! idf(t)   = ln((N - df(t) + 0.5) / (df(t) + 0.5))
//! score(d) = Σ idf(t) · tf·(k1 + 1) / (tf + k1·(1 - b + b·|d| / avgdl))
//! ```
//!
//! `N` is the number of indexed documents, `df(t)` the number containing *t*,
//! `tf` the count of *t* in *d*, and `avgdl` the mean document length. The idf
//! is the classical form and goes negative for terms present in more than half
//! of the documents. It is not clamped.
//!
//! # Usage
//!
//! ```
//! use memoria_core::search::keyword::LexicalIndex;
//! use memoria_core::search::tokenizer::tokenize;
//! use memoria_core::search::MemoryId;
//!
//! let mut index = LexicalIndex::new();
//! let id = MemoryId::new();
//! index.add_document(id, tokenize("rust programming language"));
//!
//! let results = index.search("rust", 10);
//! assert_eq!(results[0].0, id);
//! ```
//!
//! # Thread Safety
//!
//! This type is **not thread-safe**. [`HybridIndex`](super::HybridIndex) keeps
//! it behind an async `RwLock` so every call sees one consistent snapshot.

use super::tokenizer::tokenize;
use super::types::MemoryId;
use crate::config::{BM25_B, BM25_K1};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Per-document index state.
#[derive(Debug, Clone)]
struct IndexedDocument {
    /// Terms in document order
    terms: Vec<String>,
    /// Term -> occurrences in this document
    term_freqs: HashMap<String, u32>,
    /// Insertion sequence, used to break score ties
    seq: u64,
}

impl IndexedDocument {
    fn len(&self) -> usize {
        self.terms.len()
    }
}

/// In-memory BM25 index.
#[derive(Debug, Clone)]
pub struct LexicalIndex {
    k1: f32,
    b: f32,
    documents: HashMap<MemoryId, IndexedDocument>,
    /// Term -> number of documents containing it
    document_freqs: HashMap<String, usize>,
    /// Sum of all document lengths, kept in step with `documents`
    total_terms: usize,
    next_seq: u64,
}

impl LexicalIndex {
    /// Creates an empty index with the default `k1`/`b`.
    pub fn new() -> Self {
        Self::with_params(BM25_K1, BM25_B)
    }

    /// Creates an empty index with custom BM25 parameters.
    pub fn with_params(k1: f32, b: f32) -> Self {
        Self {
            k1,
            b,
            documents: HashMap::new(),
            document_freqs: HashMap::new(),
            total_terms: 0,
            next_seq: 0,
        }
    }

    /// Indexes `terms` under `id`.
    ///
    /// An existing entry for `id` is removed first, so re-adding leaves the
    /// index exactly as if only the new version had ever been added.
    pub fn add_document(&mut self, id: MemoryId, terms: Vec<String>) {
        self.remove_document(&id);

        let mut term_freqs: HashMap<String, u32> = HashMap::new();
        for term in &terms {
            *term_freqs.entry(term.clone()).or_insert(0) += 1;
        }

        for term in term_freqs.keys() {
            *self.document_freqs.entry(term.clone()).or_insert(0) += 1;
        }

        self.total_terms += terms.len();
        let seq = self.next_seq;
        self.next_seq += 1;

        self.documents.insert(
            id,
            IndexedDocument {
                terms,
                term_freqs,
                seq,
            },
        );
    }

    /// Removes `id` from the index. Returns `false` if it was not present.
    pub fn remove_document(&mut self, id: &MemoryId) -> bool {
        let Some(doc) = self.documents.remove(id) else {
            return false;
        };

        for term in doc.term_freqs.keys() {
            if let Some(df) = self.document_freqs.get_mut(term) {
                *df -= 1;
                if *df == 0 {
                    self.document_freqs.remove(term);
                }
            }
        }
        self.total_terms -= doc.len();
        true
    }

    /// Tokenizes `query` and returns up to `limit` `(id, score)` pairs.
    ///
    /// See [`search_terms`](Self::search_terms).
    pub fn search(&self, query: &str, limit: usize) -> Vec<(MemoryId, f32)> {
        self.search_terms(&tokenize(query), limit)
    }

    /// Scores every document against pre-tokenized query terms.
    ///
    /// Only documents containing at least one query term are returned, even
    /// when common terms drive the score to zero or below. Results are sorted
    /// by score descending; equal scores keep insertion order.
    pub fn search_terms(&self, query_terms: &[String], limit: usize) -> Vec<(MemoryId, f32)> {
        if query_terms.is_empty() || limit == 0 || self.documents.is_empty() {
            return Vec::new();
        }

        let avgdl = self.average_document_length();
        let idfs: Vec<Option<f32>> = query_terms.iter().map(|t| self.idf(t)).collect();

        let mut scored: Vec<(MemoryId, f32, u64)> = self
            .documents
            .iter()
            .filter_map(|(id, doc)| {
                self.score_with(doc, query_terms, &idfs, avgdl)
                    .map(|score| (*id, score, doc.seq))
            })
            .collect();

        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.2.cmp(&b.2))
        });
        scored.truncate(limit);

        scored.into_iter().map(|(id, score, _)| (id, score)).collect()
    }

    /// BM25 score of a single document, or `None` if no query term occurs in it.
    pub fn score(&self, id: &MemoryId, query_terms: &[String]) -> Option<f32> {
        let doc = self.documents.get(id)?;
        let idfs: Vec<Option<f32>> = query_terms.iter().map(|t| self.idf(t)).collect();
        self.score_with(doc, query_terms, &idfs, self.average_document_length())
    }

    fn score_with(
        &self,
        doc: &IndexedDocument,
        query_terms: &[String],
        idfs: &[Option<f32>],
        avgdl: f32,
    ) -> Option<f32> {
        let doc_len = doc.len() as f32;
        let mut score = 0.0f32;
        let mut matched = false;

        for (term, idf) in query_terms.iter().zip(idfs) {
            let Some(idf) = idf else { continue };
            let tf = match doc.term_freqs.get(term) {
                Some(&tf) if tf > 0 => tf as f32,
                _ => continue,
            };
            let norm = self.k1 * (1.0 - self.b + self.b * (doc_len / avgdl));
            score += idf * (tf * (self.k1 + 1.0)) / (tf + norm);
            matched = true;
        }

        matched.then_some(score)
    }

    /// Inverse document frequency, or `None` when no document contains `term`.
    fn idf(&self, term: &str) -> Option<f32> {
        let df = *self.document_freqs.get(term)?;
        if df == 0 {
            return None;
        }
        let n = self.documents.len() as f32;
        let df = df as f32;
        Some(((n - df + 0.5) / (df + 0.5)).ln())
    }

    /// Mean document length; 1.0 for an empty index or all-empty documents.
    pub fn average_document_length(&self) -> f32 {
        if self.documents.is_empty() || self.total_terms == 0 {
            return 1.0;
        }
        self.total_terms as f32 / self.documents.len() as f32
    }

    /// Number of documents containing `term`.
    pub fn document_frequency(&self, term: &str) -> usize {
        self.document_freqs.get(term).copied().unwrap_or(0)
    }

    /// Stored terms for `id`, in document order.
    pub fn terms(&self, id: &MemoryId) -> Option<&[String]> {
        self.documents.get(id).map(|d| d.terms.as_slice())
    }

    /// Whether `id` is indexed.
    pub fn contains(&self, id: &MemoryId) -> bool {
        self.documents.contains_key(id)
    }

    /// Number of distinct terms across all documents.
    pub fn vocabulary_size(&self) -> usize {
        self.document_freqs.len()
    }

    /// Number of indexed documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Returns `true` if no documents are indexed.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl Default for LexicalIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ids(n: usize) -> Vec<MemoryId> {
        (0..n).map(|_| MemoryId::new()).collect()
    }

    fn terms(text: &str) -> Vec<String> {
        tokenize(text)
    }

    #[test]
    fn test_keyword_search() {
        let mut index = LexicalIndex::new();
        let id = ids(4);

        index.add_document(id[0], terms("the quick brown fox jumps over the lazy dog"));
        index.add_document(id[1], terms("the lazy cat sleeps all day"));
        index.add_document(id[2], terms("quick brown rabbits hop in the garden"));
        index.add_document(id[3], terms("a cat naps"));

        let results = index.search("lazy cat", 10);

        assert_eq!(results[0].0, id[1], "document with both terms ranks first");
        assert!(results.iter().all(|(doc, _)| *doc != id[2]));
    }

    #[test]
    fn test_common_term_still_matches() {
        // "buy" is in 2 of 3 documents, so its idf is negative; matching
        // documents are still returned.
        let mut index = LexicalIndex::new();
        let id = ids(3);
        index.add_document(id[0], terms("buy milk"));
        index.add_document(id[1], terms("buy bread"));
        index.add_document(id[2], terms("walk dog"));

        let results = index.search("buy", 10);
        let found: Vec<MemoryId> = results.iter().map(|(i, _)| *i).collect();

        assert_eq!(found, vec![id[0], id[1]]);
        assert!(results[0].1 < 0.0);
    }

    #[test]
    fn test_idf_matches_formula() {
        let mut index = LexicalIndex::new();
        let id = ids(4);
        index.add_document(id[0], terms("alpha beta"));
        index.add_document(id[1], terms("gamma delta"));
        index.add_document(id[2], terms("gamma epsilon"));
        index.add_document(id[3], terms("zeta eta"));

        // N = 4, df(alpha) = 1, tf = 1, |d| = avgdl = 2
        let idf = ((4.0f32 - 1.0 + 0.5) / (1.0 + 0.5)).ln();
        let expected = idf * (1.0 * 2.2) / (1.0 + 1.2);

        let score = index.score(&id[0], &terms("alpha")).unwrap();
        assert!((score - expected).abs() < 1e-6, "{score} != {expected}");
    }

    #[test]
    fn test_empty_query_returns_empty() {
        let mut index = LexicalIndex::new();
        index.add_document(MemoryId::new(), terms("test document"));

        assert!(index.search("", 10).is_empty());
        assert!(index.search("   ", 10).is_empty());
    }

    #[test]
    fn test_empty_index_returns_empty() {
        let index = LexicalIndex::new();
        assert!(index.search("query", 10).is_empty());
        assert_eq!(index.average_document_length(), 1.0);
    }

    #[test]
    fn test_zero_limit_returns_empty() {
        let mut index = LexicalIndex::new();
        index.add_document(MemoryId::new(), terms("rust"));
        assert!(index.search("rust", 0).is_empty());
    }

    #[test]
    fn test_unknown_term_returns_empty() {
        let mut index = LexicalIndex::new();
        index.add_document(MemoryId::new(), terms("rust programming"));
        assert!(index.search("python", 10).is_empty());
    }

    #[test]
    fn test_case_insensitivity() {
        let mut index = LexicalIndex::new();
        let id = MemoryId::new();
        index.add_document(id, terms("Rust Programming Language"));
        index.add_document(MemoryId::new(), terms("something else entirely"));
        index.add_document(MemoryId::new(), terms("and another one"));

        for query in ["rust", "RUST", "RuSt"] {
            let results = index.search(query, 1);
            assert_eq!(results.first().map(|r| r.0), Some(id), "query {query}");
        }
    }

    #[test]
    fn test_higher_tf_scores_higher() {
        let mut index = LexicalIndex::new();
        let id = ids(4);
        index.add_document(id[0], terms("rust programming"));
        index.add_document(id[1], terms("rust rust rust programming"));
        index.add_document(id[2], terms("python programming"));
        index.add_document(id[3], terms("go programming"));

        let results = index.search("rust", 4);
        assert_eq!(results[0].0, id[1]);
        assert_eq!(results[1].0, id[0]);
        assert!(results[0].1 > results[1].1);
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let mut index = LexicalIndex::new();
        let id = ids(5);
        for doc in &id[..3] {
            index.add_document(*doc, terms("same words here"));
        }
        index.add_document(id[3], terms("other content"));
        index.add_document(id[4], terms("more other content"));

        let results = index.search("same", 10);
        let found: Vec<MemoryId> = results.iter().map(|(i, _)| *i).collect();
        assert_eq!(found, id[..3].to_vec());
    }

    #[test]
    fn test_search_returns_top_k() {
        let mut index = LexicalIndex::new();
        for i in 0..10 {
            index.add_document(MemoryId::new(), terms(&format!("chunk number {i}")));
        }
        assert_eq!(index.search("number", 3).len(), 3);
    }

    #[test]
    fn test_readd_replaces_previous_version() {
        let mut index = LexicalIndex::new();
        let id = MemoryId::new();
        index.add_document(id, terms("old words"));
        index.add_document(id, terms("new words words"));

        assert_eq!(index.len(), 1);
        assert_eq!(index.document_frequency("old"), 0);
        assert_eq!(index.document_frequency("new"), 1);
        assert_eq!(index.document_frequency("words"), 1);
        assert_eq!(index.average_document_length(), 3.0);
        assert_eq!(index.terms(&id).unwrap(), &terms("new words words")[..]);
    }

    #[test]
    fn test_remove_document() {
        let mut index = LexicalIndex::new();
        let id = ids(2);
        index.add_document(id[0], terms("unique zebra"));
        index.add_document(id[1], terms("common horse"));

        assert!(index.remove_document(&id[0]));
        assert!(!index.remove_document(&id[0]));
        assert!(index.search("zebra", 10).is_empty());
        assert_eq!(index.document_frequency("zebra"), 0);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_empty_document_is_counted() {
        let mut index = LexicalIndex::new();
        let empty = MemoryId::new();
        index.add_document(empty, Vec::new());
        assert_eq!(index.len(), 1);
        assert_eq!(index.average_document_length(), 1.0);
        assert!(index.remove_document(&empty));
        assert!(index.is_empty());
    }

    fn vocab() -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec(
            prop::sample::select(vec!["apple", "bread", "milk", "dog", "walk", "note"]),
            0..8,
        )
        .prop_map(|words| words.into_iter().map(String::from).collect())
    }

    proptest! {
        #[test]
        fn prop_add_then_remove_all_is_empty(docs in prop::collection::vec(vocab(), 0..20)) {
            let mut index = LexicalIndex::new();
            let id: Vec<MemoryId> = docs.iter().map(|_| MemoryId::new()).collect();
            for (doc_id, doc_terms) in id.iter().zip(&docs) {
                index.add_document(*doc_id, doc_terms.clone());
            }
            for doc_id in &id {
                index.remove_document(doc_id);
            }
            prop_assert_eq!(index.len(), 0);
            prop_assert_eq!(index.vocabulary_size(), 0);
            prop_assert_eq!(index.total_terms, 0);
        }

        #[test]
        fn prop_readd_is_idempotent(first in vocab(), second in vocab(), others in prop::collection::vec(vocab(), 0..6)) {
            let id = MemoryId::new();
            let other_ids: Vec<MemoryId> = others.iter().map(|_| MemoryId::new()).collect();

            let mut twice = LexicalIndex::new();
            let mut once = LexicalIndex::new();
            for (oid, terms) in other_ids.iter().zip(&others) {
                twice.add_document(*oid, terms.clone());
                once.add_document(*oid, terms.clone());
            }
            twice.add_document(id, first);
            twice.add_document(id, second.clone());
            once.add_document(id, second);

            prop_assert_eq!(&twice.document_freqs, &once.document_freqs);
            prop_assert_eq!(twice.total_terms, once.total_terms);
            prop_assert_eq!(twice.len(), once.len());
        }

        #[test]
        fn prop_more_occurrences_never_lower_score(extra in 1usize..6, filler in 0usize..6) {
            // "target" occurs in one of four documents, so its idf is positive.
            let build = |copies: usize| {
                let mut index = LexicalIndex::new();
                let id = MemoryId::new();
                let mut doc = vec!["target".to_string(); copies];
                doc.extend(std::iter::repeat("pad".to_string()).take(filler));
                index.add_document(id, doc);
                index.add_document(MemoryId::new(), terms("alpha beta"));
                index.add_document(MemoryId::new(), terms("gamma delta"));
                index.add_document(MemoryId::new(), terms("epsilon zeta"));
                index.score(&id, &terms("target")).unwrap()
            };
            prop_assert!(build(1 + extra) >= build(1));
        }

        #[test]
        fn prop_result_cap(docs in prop::collection::vec(vocab(), 1..20), limit in 0usize..10) {
            let mut index = LexicalIndex::new();
            for doc in docs {
                index.add_document(MemoryId::new(), doc);
            }
            prop_assert!(index.search("apple milk dog", limit).len() <= limit);
        }
    }
}
