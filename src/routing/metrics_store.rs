//! Rolling per-backend performance statistics.
//!
//! The [`MetricsStore`] accumulates one [`BackendMetrics`] record per
//! backend: an exponential moving average of dispatch success, a running
//! average of call latency, and a completed-call counter.  It is the only
//! mutable state the scorer reads, and it is mutated through exactly one
//! operation, [`MetricsStore::record_outcome`], invoked once per completed
//! dispatch attempt.
//!
//! Thread-safe: backed by a [`DashMap`] whose entry API serializes the
//! read-modify-write per backend key.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Smoothing factor for the success-rate EMA: each new outcome carries
/// 10% of the weight.
const EMA_ALPHA: f64 = 0.1;

// ── BackendMetrics ─────────────────────────────────────────────────────

/// Point-in-time performance record for one backend.
///
/// # Panics
///
/// This type never panics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendMetrics {
    /// EMA of dispatch success in `[0.0, 1.0]`, seeded optimistically at 1.0
    /// so an unproven backend is not penalized.
    pub success_rate: f64,
    /// Running average dispatch latency in seconds, seeded at 0.0.
    pub avg_latency_secs: f64,
    /// Number of completed dispatch attempts recorded.
    pub total_calls: u64,
}

impl Default for BackendMetrics {
    fn default() -> Self {
        Self {
            success_rate: 1.0,
            avg_latency_secs: 0.0,
            total_calls: 0,
        }
    }
}

// ── MetricsStore ───────────────────────────────────────────────────────

/// Concurrent store of per-backend [`BackendMetrics`].
///
/// # Panics
///
/// This type and its methods never panic.
#[derive(Debug, Default)]
pub struct MetricsStore {
    inner: DashMap<String, BackendMetrics>,
}

impl MetricsStore {
    /// Create an empty store.  Unseen backends report seed values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-seeded with default records for the given ids,
    /// so introspection lists every configured backend from the start.
    ///
    /// # Panics
    ///
    /// This function never panics.
    pub fn seeded<I>(ids: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let store = Self::new();
        for id in ids {
            store.inner.entry(id).or_default();
        }
        store
    }

    /// Return a snapshot of the metrics for `backend_id`.
    ///
    /// Unseen backends return the seed record (success 1.0, latency 0.0,
    /// zero calls) without creating an entry.
    ///
    /// # Panics
    ///
    /// This function never panics.
    pub fn snapshot(&self, backend_id: &str) -> BackendMetrics {
        self.inner
            .get(backend_id)
            .map(|r| r.value().clone())
            .unwrap_or_default()
    }

    /// Record the outcome of one completed dispatch attempt.
    ///
    /// Applies `success_rate ← 0.9·old + 0.1·outcome` and folds `elapsed`
    /// into the running latency average.  The entry lock makes the whole
    /// read-modify-write atomic per backend.
    ///
    /// # Arguments
    ///
    /// * `backend_id` — The backend that actually executed the call.
    /// * `success` — Whether the dispatch succeeded.
    /// * `elapsed_secs` — Wall-clock duration of the dispatch in seconds.
    ///
    /// # Panics
    ///
    /// This function never panics.
    pub fn record_outcome(&self, backend_id: &str, success: bool, elapsed_secs: f64) {
        let mut entry = self.inner.entry(backend_id.to_string()).or_default();
        let metrics = entry.value_mut();

        let outcome = if success { 1.0 } else { 0.0 };
        metrics.success_rate = (1.0 - EMA_ALPHA) * metrics.success_rate + EMA_ALPHA * outcome;

        let count = metrics.total_calls as f64;
        metrics.avg_latency_secs = (metrics.avg_latency_secs * count + elapsed_secs) / (count + 1.0);
        metrics.total_calls += 1;
    }

    /// All records, sorted by backend id for stable introspection output.
    ///
    /// # Panics
    ///
    /// This function never panics.
    pub fn all(&self) -> BTreeMap<String, BackendMetrics> {
        self.inner
            .iter()
            .map(|r| (r.key().clone(), r.value().clone()))
            .collect()
    }

    /// Total completed dispatch attempts across all backends.
    pub fn total_calls(&self) -> u64 {
        self.inner.iter().map(|r| r.value().total_calls).sum()
    }
}

// ── Tests ──────────────────────────────────────────────────────────────
