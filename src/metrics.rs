//! Prometheus metrics for the routing engine.
//!
//! ## Usage
//!
//! Call [`init_metrics`] once at process startup **before** constructing the
//! router. The helper functions (`inc_route`, `inc_cache_hit`, …) are no-ops
//! if `init_metrics` was never called, so routing is always safe to run —
//! observability simply degrades gracefully.
//!
//! ## Metrics Exposed
//!
//! | Name | Type | Labels |
//! |------|------|--------|
//! | `router_requests_total` | Counter | `reason` |
//! | `router_cache_hits_total` | Counter | — |
//! | `router_probe_failures_total` | Counter | `backend` |
//! | `router_outcomes_total` | Counter | `backend`, `status` |
//! | `router_decision_duration_seconds` | Histogram | — |

use crate::RouterError;
use prometheus::{
    CounterVec, Encoder, Histogram, HistogramOpts, IntCounter, Opts, Registry, TextEncoder,
};
use std::sync::OnceLock;
use std::time::Duration;

// ── Internal metrics bundle ────────────────────────────────────────────────

/// All Prometheus metrics for the router, bundled together so they can be
/// stored in a single [`OnceLock`] and initialised atomically.
pub struct Metrics {
    /// Prometheus registry that owns all metric descriptors.
    pub registry: Registry,
    /// Routing decisions produced, by reason code.
    pub requests_total: CounterVec,
    /// Decisions served from the cache.
    pub cache_hits: IntCounter,
    /// Availability probes that reported a backend unreachable.
    pub probe_failures: CounterVec,
    /// Recorded dispatch outcomes by backend and status.
    pub outcomes_total: CounterVec,
    /// Wall-clock time spent producing a decision.
    pub decision_duration: Histogram,
}

static METRICS: OnceLock<Metrics> = OnceLock::new();

// ── Initialisation ─────────────────────────────────────────────────────────

/// Initialise all Prometheus metrics and register them with a private
/// registry.
///
/// Must be called once at process startup before routing begins.  Calling
/// it a second time is a no-op (returns `Ok(())`).
///
/// # Errors
///
/// Returns [`RouterError::Other`] if metric construction or registry
/// registration fails (e.g., duplicate descriptor names).
///
/// # Panics
///
/// This function never panics.
pub fn init_metrics() -> Result<(), RouterError> {
    if METRICS.get().is_some() {
        return Ok(());
    }

    let registry = Registry::new();

    let requests_total = CounterVec::new(
        Opts::new("router_requests_total", "Routing decisions by reason"),
        &["reason"],
    )
    .map_err(|e| RouterError::Other(format!("metrics init failed: {e}")))?;
    registry
        .register(Box::new(requests_total.clone()))
        .map_err(|e| RouterError::Other(format!("metrics registration failed: {e}")))?;

    let cache_hits = IntCounter::new("router_cache_hits_total", "Decisions served from cache")
        .map_err(|e| RouterError::Other(format!("metrics init failed: {e}")))?;
    registry
        .register(Box::new(cache_hits.clone()))
        .map_err(|e| RouterError::Other(format!("metrics registration failed: {e}")))?;

    let probe_failures = CounterVec::new(
        Opts::new(
            "router_probe_failures_total",
            "Availability probes reporting a backend unreachable",
        ),
        &["backend"],
    )
    .map_err(|e| RouterError::Other(format!("metrics init failed: {e}")))?;
    registry
        .register(Box::new(probe_failures.clone()))
        .map_err(|e| RouterError::Other(format!("metrics registration failed: {e}")))?;

    let outcomes_total = CounterVec::new(
        Opts::new(
            "router_outcomes_total",
            "Recorded dispatch outcomes by backend and status",
        ),
        &["backend", "status"],
    )
    .map_err(|e| RouterError::Other(format!("metrics init failed: {e}")))?;
    registry
        .register(Box::new(outcomes_total.clone()))
        .map_err(|e| RouterError::Other(format!("metrics registration failed: {e}")))?;

    let decision_duration = Histogram::with_opts(HistogramOpts::new(
        "router_decision_duration_seconds",
        "Time spent producing a routing decision",
    ))
    .map_err(|e| RouterError::Other(format!("metrics init failed: {e}")))?;
    registry
        .register(Box::new(decision_duration.clone()))
        .map_err(|e| RouterError::Other(format!("metrics registration failed: {e}")))?;

    // If another thread raced us, the first one wins — both initializations
    // produce identical metric descriptors, so neither outcome is incorrect.
    let _ = METRICS.set(Metrics {
        registry,
        requests_total,
        cache_hits,
        probe_failures,
        outcomes_total,
        decision_duration,
    });

    Ok(())
}

/// Return a reference to the initialised [`Metrics`], or `None` if
/// [`init_metrics`] has not been called yet.
fn metrics() -> Option<&'static Metrics> {
    METRICS.get()
}

// ── Public helper functions ────────────────────────────────────────────────

/// Count a routing decision under its reason code.
///
/// No-op if metrics have not been initialised.
///
/// # Panics
///
/// This function never panics.
pub fn inc_route(reason: &str) {
    if let Some(m) = metrics() {
        if let Ok(c) = m.requests_total.get_metric_with_label_values(&[reason]) {
            c.inc();
        }
    }
}

/// Count a decision served from the cache.
///
/// No-op if metrics have not been initialised.
///
/// # Panics
///
/// This function never panics.
pub fn inc_cache_hit() {
    if let Some(m) = metrics() {
        m.cache_hits.inc();
    }
}

/// Count a failed availability probe for a backend.
///
/// No-op if metrics have not been initialised.
///
/// # Panics
///
/// This function never panics.
pub fn inc_probe_failure(backend: &str) {
    if let Some(m) = metrics() {
        if let Ok(c) = m.probe_failures.get_metric_with_label_values(&[backend]) {
            c.inc();
        }
    }
}

/// Count a recorded dispatch outcome.
///
/// No-op if metrics have not been initialised.
///
/// # Panics
///
/// This function never panics.
pub fn inc_outcome(backend: &str, success: bool) {
    if let Some(m) = metrics() {
        let status = if success { "success" } else { "failure" };
        if let Ok(c) = m
            .outcomes_total
            .get_metric_with_label_values(&[backend, status])
        {
            c.inc();
        }
    }
}

/// Record how long a routing decision took to produce.
///
/// No-op if metrics have not been initialised.
///
/// # Panics
///
/// This function never panics.
pub fn observe_decision_duration(d: Duration) {
    if let Some(m) = metrics() {
        m.decision_duration.observe(d.as_secs_f64());
    }
}

/// Gather all registered metrics as a raw list of metric families.
///
/// Returns an empty `Vec` if metrics have not been initialised.
///
/// # Panics
///
/// This function never panics.
pub fn gather() -> Vec<prometheus::proto::MetricFamily> {
    metrics().map_or_else(Vec::new, |m| m.registry.gather())
}

/// Gather and encode all metrics in the Prometheus text exposition format.
///
/// Returns an empty string if metrics have not been initialised or if
/// encoding fails. Observability degrades gracefully rather than panicking.
///
/// # Panics
///
/// This function never panics.
pub fn gather_metrics() -> String {
    let families = gather();
    if families.is_empty() {
        return String::new();
    }
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if encoder.encode(&families, &mut buffer).is_err() {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
