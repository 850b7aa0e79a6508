//! The routing service.
//!
//! [`ModelRouter`] ties the classifier, scorer, probe, fallback resolver,
//! decision cache, and metrics store into the single entry point the agent
//! layer calls.  One router instance is constructed at process start and
//! shared (`Arc`) across request handlers; there is no global state.
//!
//! Routing is total: [`ModelRouter::route`] always returns a usable
//! [`RoutingDecision`].  Pool-listing failures degrade to the full catalog,
//! probe failures trigger fallback resolution, resolver exhaustion falls
//! through to the configured default, and any unexpected internal error is
//! caught at the top level and surfaced as an `ErrorFallback` decision.

use crate::pool::BackendPool;
use crate::{metrics, RouterError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use super::cache::{self, DecisionCache};
use super::catalog::CapabilityCatalog;
use super::classifier::{TaskClassifier, TaskContext, TaskProfile};
use super::config::RoutingConfig;
use super::fallback::FallbackResolver;
use super::metrics_store::{BackendMetrics, MetricsStore};
use super::probe::AvailabilityProbe;
use super::scorer::{BackendScorer, RoutePreferences};

// ── Decision types ─────────────────────────────────────────────────────

/// How the chosen backend was arrived at.
///
/// # Panics
///
/// This type never panics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteReason {
    /// The scored winner answered its probe.
    OptimalSelection,
    /// The winner was unreachable; a capability-overlapping backend took over.
    FallbackUsed,
    /// No overlapping backend was live; the configured default was used.
    FallbackDefault,
    /// Routing failed internally; the configured default was used.
    ErrorFallback,
}

impl RouteReason {
    /// Stable string form, used as a metrics label.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OptimalSelection => "optimal_selection",
            Self::FallbackUsed => "fallback_used",
            Self::FallbackDefault => "fallback_default",
            Self::ErrorFallback => "error_fallback",
        }
    }
}

impl std::fmt::Display for RouteReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The outcome of one routing request.  Immutable once produced; cached
/// hits return it verbatim, original timestamp included.
///
/// # Panics
///
/// This type never panics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingDecision {
    /// The backend the caller should dispatch to.
    pub backend_id: String,
    /// The classified task.
    pub task: TaskProfile,
    /// Per-backend fitness scores in catalog order (empty on degraded paths).
    pub scores: Vec<(String, f64)>,
    /// Backends considered available when the decision was made.
    pub available: Vec<String>,
    /// When the decision was produced.
    pub timestamp: DateTime<Utc>,
    /// How the backend was chosen.
    pub reason: RouteReason,
    /// Error description, populated only for [`RouteReason::ErrorFallback`].
    pub error: Option<String>,
}

impl RoutingDecision {
    /// Return `true` if the scored winner was used directly.
    pub fn is_optimal(&self) -> bool {
        self.reason == RouteReason::OptimalSelection
    }

    /// Return `true` if any fallback path was taken.
    pub fn used_fallback(&self) -> bool {
        matches!(
            self.reason,
            RouteReason::FallbackUsed | RouteReason::FallbackDefault | RouteReason::ErrorFallback
        )
    }

    /// Return `true` if routing failed internally.
    pub fn is_error(&self) -> bool {
        self.reason == RouteReason::ErrorFallback
    }
}

/// Read-only introspection snapshot of the router.
///
/// # Panics
///
/// This type never panics.
#[derive(Debug, Clone, Serialize)]
pub struct RouterStats {
    /// Live metrics per backend, sorted by id.
    pub backends: std::collections::BTreeMap<String, BackendMetrics>,
    /// Number of cached routing decisions.
    pub cache_size: usize,
    /// Completed dispatch attempts recorded across all backends.
    pub total_routed_calls: u64,
    /// Every backend id in the catalog, registration order.
    pub configured_backends: Vec<String>,
}

// ── Router ─────────────────────────────────────────────────────────────

/// Long-lived adaptive routing service.
///
/// Construct once, share via `Arc`, and inject into request handlers.
///
/// # Panics
///
/// This type and its methods never panic.
pub struct ModelRouter {
    config: RoutingConfig,
    catalog: CapabilityCatalog,
    classifier: TaskClassifier,
    scorer: BackendScorer,
    fallback: FallbackResolver,
    cache: DecisionCache,
    metrics: MetricsStore,
    pool: Arc<dyn BackendPool>,
    probe: Arc<dyn AvailabilityProbe>,
}

impl std::fmt::Debug for ModelRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelRouter")
            .field("config", &self.config)
            .field("catalog", &self.catalog.ids())
            .field("cache", &self.cache)
            .finish()
    }
}

impl ModelRouter {
    /// Create a new router.
    ///
    /// # Arguments
    ///
    /// * `config` — Endpoint, default backend, probe and cache settings.
    /// * `catalog` — The ordered backend registry.
    /// * `pool` — Pool client used for model listing.
    /// * `probe` — Availability probe (usually the pool client again).
    ///
    /// # Panics
    ///
    /// This function never panics.
    pub fn new(
        config: RoutingConfig,
        catalog: CapabilityCatalog,
        pool: Arc<dyn BackendPool>,
        probe: Arc<dyn AvailabilityProbe>,
    ) -> Self {
        let cache = DecisionCache::new(config.cache.capacity, config.cache_ttl());
        let metrics = MetricsStore::seeded(catalog.ids());
        Self {
            config,
            catalog,
            classifier: TaskClassifier::new(),
            scorer: BackendScorer::new(),
            fallback: FallbackResolver::new(),
            cache,
            metrics,
            pool,
            probe,
        }
    }

    /// Route a task to the most suitable backend.
    ///
    /// Total: every failure mode degrades to a usable decision instead of
    /// an error.  Identical (text, context) pairs hit the decision cache
    /// and return the original decision, timestamp included.
    ///
    /// # Arguments
    ///
    /// * `text` — The raw task description.
    /// * `context` — Context attributes (may be empty).
    ///
    /// # Panics
    ///
    /// This function never panics.
    pub async fn route(&self, text: &str, context: &TaskContext) -> RoutingDecision {
        let started = Instant::now();

        let fingerprint = cache::fingerprint(text, context);
        if let Some(decision) = self.cache.get(fingerprint) {
            metrics::inc_cache_hit();
            debug!(backend = %decision.backend_id, "using cached routing decision");
            return decision;
        }

        let decision = match self.route_uncached(text, context).await {
            Ok(decision) => {
                self.cache.insert(fingerprint, decision.clone());
                decision
            }
            Err(e) => {
                error!(error = %e, default = %self.config.default_backend,
                    "routing failed, using emergency default");
                RoutingDecision {
                    backend_id: self.config.default_backend.clone(),
                    task: self.classifier.classify(text, context),
                    scores: Vec::new(),
                    available: Vec::new(),
                    timestamp: Utc::now(),
                    reason: RouteReason::ErrorFallback,
                    error: Some(e.to_string()),
                }
            }
        };

        metrics::inc_route(decision.reason.as_str());
        metrics::observe_decision_duration(started.elapsed());
        decision
    }

    /// The full classify → score → probe → fallback pipeline.
    async fn route_uncached(
        &self,
        text: &str,
        context: &TaskContext,
    ) -> Result<RoutingDecision, RouterError> {
        if self.catalog.is_empty() {
            return Err(RouterError::EmptyCatalog);
        }

        let task = self.classifier.classify(text, context);
        let available = self.available_backends().await;

        if available.is_empty() {
            warn!(default = %self.config.default_backend,
                "pool reports none of the configured backends, using default");
            return Ok(RoutingDecision {
                backend_id: self.config.default_backend.clone(),
                task,
                scores: Vec::new(),
                available,
                timestamp: Utc::now(),
                reason: RouteReason::FallbackDefault,
                error: None,
            });
        }

        let prefs = RoutePreferences::from_context(context);
        let (candidate, scores) = self
            .scorer
            .select(&self.catalog, &available, &task, &self.metrics, &prefs)
            .ok_or_else(|| RouterError::Other("no scorable backend".to_string()))?;

        let (backend_id, reason) = if self.probe.probe(&candidate).await {
            (candidate, RouteReason::OptimalSelection)
        } else {
            metrics::inc_probe_failure(&candidate);
            warn!(backend = %candidate, "selected backend failed probe, resolving fallback");
            match self.fallback.resolve(&self.catalog, &candidate, &available) {
                Some(replacement) => (replacement, RouteReason::FallbackUsed),
                None => (
                    self.config.default_backend.clone(),
                    RouteReason::FallbackDefault,
                ),
            }
        };

        info!(
            backend = %backend_id,
            reason = %reason,
            task_type = %task.task_type,
            complexity = %task.complexity,
            "routing decision made"
        );

        Ok(RoutingDecision {
            backend_id,
            task,
            scores,
            available,
            timestamp: Utc::now(),
            reason,
            error: None,
        })
    }

    /// Record the outcome of a completed dispatch attempt.
    ///
    /// Must be called exactly once per attempt, against whichever backend
    /// actually executed (including fallback backends).
    ///
    /// # Arguments
    ///
    /// * `backend_id` — The backend that executed the call.
    /// * `success` — Whether the dispatch succeeded.
    /// * `elapsed_secs` — Wall-clock dispatch duration in seconds.
    ///
    /// # Panics
    ///
    /// This function never panics.
    pub fn record_outcome(&self, backend_id: &str, success: bool, elapsed_secs: f64) {
        self.metrics.record_outcome(backend_id, success, elapsed_secs);
        metrics::inc_outcome(backend_id, success);
        let snapshot = self.metrics.snapshot(backend_id);
        debug!(
            backend = %backend_id,
            success,
            elapsed_secs,
            success_rate = snapshot.success_rate,
            avg_latency_secs = snapshot.avg_latency_secs,
            "recorded dispatch outcome"
        );
    }

    /// Configured backends the pool currently reports as present.
    ///
    /// On a listing failure the full catalog is treated as nominally
    /// available, so the result is empty only when the catalog is empty or
    /// the pool answered with none of the configured models.
    ///
    /// # Panics
    ///
    /// This function never panics.
    pub async fn available_backends(&self) -> Vec<String> {
        match self.pool.list_models().await {
            Ok(models) => self
                .catalog
                .iter()
                .filter(|p| models.iter().any(|m| m == &p.id))
                .map(|p| p.id.clone())
                .collect(),
            Err(e) => {
                warn!(error = %e, "could not list pool models, treating full catalog as available");
                self.catalog.ids()
            }
        }
    }

    /// Read-only introspection snapshot.
    ///
    /// # Panics
    ///
    /// This function never panics.
    pub fn stats(&self) -> RouterStats {
        RouterStats {
            backends: self.metrics.all(),
            cache_size: self.cache.len(),
            total_routed_calls: self.metrics.total_calls(),
            configured_backends: self.catalog.ids(),
        }
    }

    /// The default backend for an agent role (configured override or the
    /// global default).
    pub fn default_backend_for_role(&self, role: &str) -> &str {
        self.config.default_backend_for_role(role)
    }

    /// The backend catalog.
    pub fn catalog(&self) -> &CapabilityCatalog {
        &self.catalog
    }

    /// The active configuration.
    pub fn config(&self) -> &RoutingConfig {
        &self.config
    }
}

// ── Tests ──────────────────────────────────────────────────────────────
