//! Benchmarks for search operations (BM25, semantic scan, hybrid).
//!
//! Run with: `cargo bench -p memoria-core --bench search`
//!
//! These benchmarks measure the performance of:
//! - Keyword search (BM25) by index size and query length
//! - Incremental add/remove on the BM25 index
//! - Semantic search (brute-force cosine scan)
//! - Hybrid search with weighted fusion

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use memoria_core::embedding::LookupEmbedder;
use memoria_core::search::fusion::{weighted_merge, FusionWeights};
use memoria_core::search::keyword::LexicalIndex;
use memoria_core::search::{
    cosine_similarity, tokenize, HybridIndex, MatchKind, MemoryId, MemoryItem, MemorySource,
    SearchResult,
};
use memoria_core::storage::InMemoryCorpus;

// =============================================================================
// Benchmark Configuration
// =============================================================================

/// Embedding dimension used for semantic benchmarks.
const BENCH_DIM: usize = 384;

/// Seed used for generating query embeddings.
///
/// Differs from item seeds (0..N) so the query is never an exact match.
const QUERY_EMBEDDING_SEED: u64 = 1_000_000;

const QUERY: &str = "meeting notes release planning";

// =============================================================================
// Test Data Generation
// =============================================================================

/// Generate a deterministic L2-normalized embedding with a seed.
fn seeded_embedding(seed: u64) -> Vec<f32> {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let raw: Vec<f32> = (0..BENCH_DIM)
        .map(|i| {
            let mut hasher = DefaultHasher::new();
            seed.hash(&mut hasher);
            i.hash(&mut hasher);
            let h = hasher.finish();
            ((h as f32 / u64::MAX as f32) * 2.0) - 1.0
        })
        .collect();

    let norm: f32 = raw.iter().map(|x| x * x).sum::<f32>().sqrt();
    raw.into_iter().map(|x| x / norm).collect()
}

/// Generate short captured text, varied by id for a realistic term distribution.
fn sample_text(id: u64) -> String {
    let topics = [
        "meeting notes about the release planning",
        "browser tab reading about rust async runtimes",
        "grocery list with milk bread and eggs",
        "email draft to the design team",
        "terminal output from a failing build",
        "journal entry about the weekend hike",
        "todo: renew passport before travel",
        "slides on quarterly revenue and hiring",
    ];
    let topic = topics[(id % topics.len() as u64) as usize];
    format!("Capture {id}: {topic}. Seen in window {} at minute {}.", id % 13, id % 60)
}

fn build_lexical_index(size: usize) -> LexicalIndex {
    let mut index = LexicalIndex::new();
    for i in 0..size {
        index.add_document(MemoryId::new(), tokenize(&sample_text(i as u64)));
    }
    index
}

fn build_hybrid_index(
    rt: &tokio::runtime::Runtime,
    size: usize,
) -> HybridIndex<InMemoryCorpus, LookupEmbedder> {
    let embedder = LookupEmbedder::new(BENCH_DIM).with(QUERY, seeded_embedding(QUERY_EMBEDDING_SEED));
    let index = HybridIndex::new(InMemoryCorpus::new(), embedder);

    rt.block_on(async {
        for i in 0..size {
            let item = MemoryItem::new(sample_text(i as u64), MemorySource::ScreenCapture)
                .with_embedding(seeded_embedding(i as u64));
            index.index(item).await.unwrap();
        }
    });
    index
}

// ============================================================================
// BM25 Keyword Search Benchmarks
// ============================================================================

/// Benchmark: BM25 search with varying index sizes
fn bench_bm25_search_varying_size(c: &mut Criterion) {
    let mut group = c.benchmark_group("bm25/search_by_size");
    group.sample_size(100);

    let k = 10;
    for size in [100, 300, 600, 1000, 2000] {
        let index = build_lexical_index(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| index.search(black_box(QUERY), k));
        });
    }

    group.finish();
}

/// Benchmark: BM25 search with varying query lengths
fn bench_bm25_search_varying_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("bm25/search_by_query_length");
    group.sample_size(100);

    let index = build_lexical_index(1000);
    let queries = [
        ("1_word", "release"),
        ("3_words", "release planning notes"),
        ("6_words", "release planning notes rust async build"),
    ];

    for (name, query) in queries {
        group.bench_with_input(BenchmarkId::from_parameter(name), &query, |b, query| {
            b.iter(|| index.search(black_box(query), 10));
        });
    }

    group.finish();
}

/// Benchmark: re-adding a document (remove + add) on a populated index
fn bench_bm25_upsert(c: &mut Criterion) {
    let mut index = build_lexical_index(1000);
    let id = MemoryId::new();
    let terms = tokenize(&sample_text(7));

    c.bench_function("bm25/upsert", |b| {
        b.iter(|| index.add_document(black_box(id), terms.clone()));
    });
}

// ============================================================================
// Semantic and Hybrid Benchmarks
// ============================================================================

/// Benchmark: raw cosine similarity at the benchmark dimension
fn bench_cosine(c: &mut Criterion) {
    let a = seeded_embedding(1);
    let b_vec = seeded_embedding(2);

    c.bench_function("similarity/cosine", |b| {
        b.iter(|| cosine_similarity(black_box(&a), black_box(&b_vec)));
    });
}

/// Benchmark: keyword vs semantic vs hybrid through the full index
fn bench_search_modality_comparison(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let mut group = c.benchmark_group("index/modality");
    group.sample_size(50);

    for size in [100, 1000] {
        let index = build_hybrid_index(&rt, size);

        group.bench_with_input(BenchmarkId::new("keyword", size), &size, |b, _| {
            b.to_async(&rt)
                .iter(|| async { index.search(black_box(QUERY), 10).await.unwrap() });
        });
        group.bench_with_input(BenchmarkId::new("semantic", size), &size, |b, _| {
            b.to_async(&rt)
                .iter(|| async { index.semantic_search(black_box(QUERY), 10).await.unwrap() });
        });
        group.bench_with_input(BenchmarkId::new("hybrid", size), &size, |b, _| {
            b.to_async(&rt)
                .iter(|| async { index.hybrid_search(black_box(QUERY), 10).await.unwrap() });
        });
    }

    group.finish();
}

/// Benchmark: weighted merge of two overlapping result lists
fn bench_weighted_merge(c: &mut Criterion) {
    let items: Vec<MemoryItem> = (0..40)
        .map(|i| MemoryItem::new(sample_text(i), MemorySource::UserNote))
        .collect();
    let result = |item: &MemoryItem, score: f32, kind: MatchKind| SearchResult {
        id: item.id,
        item: item.clone(),
        score,
        kind,
        snippet: None,
    };
    let keyword: Vec<SearchResult> = items[..20]
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let s = 10.0 - i as f32 * 0.3;
            result(item, s, MatchKind::Keyword(s))
        })
        .collect();
    let semantic: Vec<SearchResult> = items[10..30]
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let s = 0.95 - i as f32 * 0.02;
            result(item, s, MatchKind::Semantic(s))
        })
        .collect();

    c.bench_function("fusion/weighted_merge_20x20", |b| {
        b.iter(|| {
            weighted_merge(
                black_box(keyword.clone()),
                black_box(semantic.clone()),
                FusionWeights::default(),
                10,
            )
        });
    });
}

criterion_group!(
    benches,
    bench_bm25_search_varying_size,
    bench_bm25_search_varying_query,
    bench_bm25_upsert,
    bench_cosine,
    bench_search_modality_comparison,
    bench_weighted_merge,
);
criterion_main!(benches);
