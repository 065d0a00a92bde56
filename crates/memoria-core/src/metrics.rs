//! Rolling latency buffers for the index.
//!
//! Each [`HybridIndex`](crate::search::HybridIndex) owns one [`IndexMetrics`].
//! Two buffers are kept: embedding generation and search. Each holds the most
//! recent N samples (N = `timing_history`, 100 by default); older samples are
//! dropped as new ones arrive. Buffers live as long as the index and are never
//! reset by `clear()`.

use std::collections::VecDeque;
use std::sync::RwLock;

/// Bounded sample buffer for a single metric.
#[derive(Debug)]
struct MetricData {
    /// Most recent samples in milliseconds, oldest first.
    samples: VecDeque<f64>,
    /// Buffer capacity.
    capacity: usize,
    /// Total count since startup.
    total_count: u64,
}

impl MetricData {
    fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
            total_count: 0,
        }
    }

    /// Record a new sample.
    fn record(&mut self, duration_ms: f64) {
        self.total_count += 1;
        self.samples.push_back(duration_ms);

        // Trim if over max
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    /// Mean of the buffered samples.
    fn rolling_avg(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        Some(self.samples.iter().sum::<f64>() / self.samples.len() as f64)
    }
}

/// Point-in-time view of both buffers.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TimingSnapshot {
    /// Rolling mean embedding latency (ms).
    pub embedding_avg_ms: Option<f64>,
    /// Samples currently in the embedding buffer.
    pub embedding_samples: usize,
    /// Embedding calls recorded since startup.
    pub total_embeddings: u64,
    /// Rolling mean search latency (ms).
    pub search_avg_ms: Option<f64>,
    /// Samples currently in the search buffer.
    pub search_samples: usize,
    /// Searches recorded since startup.
    pub total_searches: u64,
}

#[derive(Debug)]
struct MetricsInner {
    embedding: MetricData,
    search: MetricData,
}

/// Latency collector owned by one index.
///
/// Thread-safe. Recording never fails: a poisoned lock drops the sample.
#[derive(Debug)]
pub struct IndexMetrics {
    inner: RwLock<MetricsInner>,
}

impl IndexMetrics {
    /// Creates empty buffers that each keep `history` samples.
    pub fn new(history: usize) -> Self {
        Self {
            inner: RwLock::new(MetricsInner {
                embedding: MetricData::new(history),
                search: MetricData::new(history),
            }),
        }
    }

    /// Record embedding generation time.
    pub fn record_embedding(&self, duration_ms: f64) {
        if let Ok(mut inner) = self.inner.write() {
            inner.embedding.record(duration_ms);
        }
    }

    /// Record end-to-end search time.
    pub fn record_search(&self, duration_ms: f64) {
        if let Ok(mut inner) = self.inner.write() {
            inner.search.record(duration_ms);
        }
    }

    /// Get a snapshot of both buffers.
    pub fn snapshot(&self) -> TimingSnapshot {
        let inner = match self.inner.read() {
            Ok(inner) => inner,
            Err(_) => return TimingSnapshot::default(),
        };

        TimingSnapshot {
            embedding_avg_ms: inner.embedding.rolling_avg(),
            embedding_samples: inner.embedding.samples.len(),
            total_embeddings: inner.embedding.total_count,
            search_avg_ms: inner.search.rolling_avg(),
            search_samples: inner.search.samples.len(),
            total_searches: inner.search.total_count,
        }
    }
}

impl Default for IndexMetrics {
    fn default() -> Self {
        Self::new(crate::config::TIMING_HISTORY)
    }
}
