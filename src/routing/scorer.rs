//! Backend fitness scoring.
//!
//! Combines catalog profiles, the classifier's [`TaskProfile`], live
//! [`BackendMetrics`], and caller preferences into a non-negative fitness
//! score per backend; higher is better.
//!
//! ## Formula
//!
//! | Component        | Contribution                                        |
//! |------------------|-----------------------------------------------------|
//! | Baseline         | the backend's `performance_score` (0–10)            |
//! | Capability match | +2.5 per shared tag with the task's required set    |
//! | Complexity fit   | +3.0 flat if the ceiling covers the task, else      |
//! |                  | −2.0 per tier of shortfall                          |
//! | History          | (success_rate − 0.8) × 10, plus ±1.0 for latency    |
//! |                  | under 5 s / over 15 s (only after ≥1 recorded call) |
//! | Preference       | prefer-fast: +2.0 low tier, −1.0 high tier          |
//!
//! The sum is clamped to a minimum of 0.0.  Surplus complexity capacity is
//! deliberately not rewarded beyond the flat bonus.

use super::catalog::{BackendProfile, Capability, CapabilityCatalog, ResourceTier};
use super::classifier::{TaskContext, TaskProfile, TaskType};
use super::metrics_store::{BackendMetrics, MetricsStore};

/// Latency below which a backend earns the +1.0 fast bonus.
const FAST_LATENCY_SECS: f64 = 5.0;
/// Latency above which a backend takes the -1.0 slow penalty.
const SLOW_LATENCY_SECS: f64 = 15.0;

// ── Capability requirements ────────────────────────────────────────────

/// The capability tags a task type wants from a backend.
///
/// # Panics
///
/// This function never panics.
pub fn required_capabilities(task_type: TaskType) -> &'static [Capability] {
    match task_type {
        TaskType::Ideation => &[Capability::Creative, Capability::General],
        TaskType::Architecture => &[Capability::Technical, Capability::Reasoning],
        TaskType::Coding => &[Capability::Coding, Capability::Technical],
        TaskType::Debugging => &[Capability::Coding, Capability::Analytical],
        TaskType::Analysis => &[Capability::Analytical, Capability::Reasoning],
        TaskType::Documentation => &[Capability::General, Capability::Technical],
        TaskType::Testing => &[Capability::Coding, Capability::Analytical],
        TaskType::Deployment => &[Capability::Technical, Capability::General],
    }
}

// ── Preferences ────────────────────────────────────────────────────────

/// Caller preferences affecting scoring.
///
/// # Panics
///
/// This type never panics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoutePreferences {
    /// Bias towards low-resource backends (and away from heavy ones).
    pub prefer_fast: bool,
}

impl RoutePreferences {
    /// Extract preferences from request context attributes.
    ///
    /// # Panics
    ///
    /// This function never panics.
    pub fn from_context(context: &TaskContext) -> Self {
        Self {
            prefer_fast: context.get("prefer_fast").map(String::as_str) == Some("true"),
        }
    }
}

// ── Score breakdown ────────────────────────────────────────────────────

/// Per-component contributions behind one fitness score.
///
/// Useful for logging and transparency into routing decisions.
///
/// # Panics
///
/// This type never panics.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreBreakdown {
    /// The backend's baseline performance score.
    pub baseline: f64,
    /// Capability-tag match bonus.
    pub capability_match: f64,
    /// Complexity-fit bonus or shortfall penalty.
    pub complexity_fit: f64,
    /// Historical success-rate and latency adjustment.
    pub historical: f64,
    /// Caller-preference adjustment.
    pub preference: f64,
    /// Final clamped score.
    pub total: f64,
}

// ── Scorer ─────────────────────────────────────────────────────────────

/// Stateless backend fitness scorer.
///
/// # Panics
///
/// This type and its methods never panic.
#[derive(Debug, Clone, Default)]
pub struct BackendScorer;

impl BackendScorer {
    /// Create a new scorer.
    pub fn new() -> Self {
        Self
    }

    /// Score one backend for one task.
    ///
    /// # Returns
    ///
    /// A non-negative fitness score; higher is better.
    ///
    /// # Panics
    ///
    /// This function never panics.
    pub fn score(
        &self,
        backend: &BackendProfile,
        task: &TaskProfile,
        metrics: &BackendMetrics,
        prefs: &RoutePreferences,
    ) -> f64 {
        self.breakdown(backend, task, metrics, prefs).total
    }

    /// Score one backend and report each component's contribution.
    ///
    /// # Panics
    ///
    /// This function never panics.
    pub fn breakdown(
        &self,
        backend: &BackendProfile,
        task: &TaskProfile,
        metrics: &BackendMetrics,
        prefs: &RoutePreferences,
    ) -> ScoreBreakdown {
        let baseline = backend.performance_score;

        let required = required_capabilities(task.task_type);
        let matches = backend
            .capabilities
            .iter()
            .filter(|c| required.contains(c))
            .count();
        let capability_match = matches as f64 * 2.5;

        let complexity_fit = if backend.max_complexity >= task.complexity {
            3.0
        } else {
            let shortfall = f64::from(task.complexity.tier() - backend.max_complexity.tier());
            -2.0 * shortfall
        };

        let historical = if metrics.total_calls > 0 {
            let mut adjustment = (metrics.success_rate - 0.8) * 10.0;
            if metrics.avg_latency_secs < FAST_LATENCY_SECS {
                adjustment += 1.0;
            } else if metrics.avg_latency_secs > SLOW_LATENCY_SECS {
                adjustment -= 1.0;
            }
            adjustment
        } else {
            0.0
        };

        let preference = if prefs.prefer_fast {
            match backend.resource_tier {
                ResourceTier::Low => 2.0,
                ResourceTier::Medium => 0.0,
                ResourceTier::High => -1.0,
            }
        } else {
            0.0
        };

        let total =
            (baseline + capability_match + complexity_fit + historical + preference).max(0.0);

        ScoreBreakdown {
            baseline,
            capability_match,
            complexity_fit,
            historical,
            preference,
            total,
        }
    }

    /// Score every available backend and pick the strict maximum.
    ///
    /// Backends are visited in catalog registration order and only a
    /// strictly higher score displaces the current best, so the
    /// first-registered backend wins ties.
    ///
    /// # Arguments
    ///
    /// * `catalog` — The full backend registry.
    /// * `available` — Ids currently reported available by the pool.
    /// * `task` — The classified task.
    /// * `metrics` — Live performance store.
    /// * `prefs` — Caller preferences.
    ///
    /// # Returns
    ///
    /// `Some((best_id, scores))` with the per-backend score list in catalog
    /// order, or `None` if no available backend is in the catalog.
    ///
    /// # Panics
    ///
    /// This function never panics.
    pub fn select(
        &self,
        catalog: &CapabilityCatalog,
        available: &[String],
        task: &TaskProfile,
        metrics: &MetricsStore,
        prefs: &RoutePreferences,
    ) -> Option<(String, Vec<(String, f64)>)> {
        let mut scores: Vec<(String, f64)> = Vec::new();
        let mut best: Option<(usize, f64)> = None;

        for backend in catalog.iter() {
            if !available.iter().any(|id| id == &backend.id) {
                continue;
            }
            let snapshot = metrics.snapshot(&backend.id);
            let score = self.score(backend, task, &snapshot, prefs);
            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((scores.len(), score));
            }
            scores.push((backend.id.clone(), score));
        }

        best.map(|(index, _)| (scores[index].0.clone(), scores))
    }
}

// ── Tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::classifier::TaskComplexity;

    fn profile(
        id: &str,
        capabilities: Vec<Capability>,
        max_complexity: TaskComplexity,
        performance_score: f64,
        resource_tier: ResourceTier,
    ) -> BackendProfile {
        BackendProfile::new(
            id,
            capabilities,
            max_complexity,
            performance_score,
            resource_tier,
        )
    }

    fn task(task_type: TaskType, complexity: TaskComplexity) -> TaskProfile {
        TaskProfile {
            task_type,
            complexity,
        }
    }

    fn fresh() -> BackendMetrics {
        BackendMetrics::default()
    }

    fn no_prefs() -> RoutePreferences {
        RoutePreferences::default()
    }

    // -- formula components ----------------------------------------------

    #[test]
    fn test_baseline_plus_fit_for_capability_free_backend() {
        // No shared capabilities, sufficient tier: baseline + 3.0.
        let backend = profile(
            "m",
            vec![Capability::Creative],
            TaskComplexity::Expert,
            7.0,
            ResourceTier::Medium,
        );
        let score = BackendScorer::new().score(
            &backend,
            &task(TaskType::Coding, TaskComplexity::Simple),
            &fresh(),
            &no_prefs(),
        );
        assert!((score - 10.0).abs() < f64::EPSILON, "got {score}");
    }

    #[test]
    fn test_each_capability_match_adds_2_5() {
        let scorer = BackendScorer::new();
        let coding_task = task(TaskType::Coding, TaskComplexity::Simple);

        let one = profile(
            "one",
            vec![Capability::Coding],
            TaskComplexity::Expert,
            5.0,
            ResourceTier::Medium,
        );
        let two = profile(
            "two",
            vec![Capability::Coding, Capability::Technical],
            TaskComplexity::Expert,
            5.0,
            ResourceTier::Medium,
        );

        let one_score = scorer.score(&one, &coding_task, &fresh(), &no_prefs());
        let two_score = scorer.score(&two, &coding_task, &fresh(), &no_prefs());
        assert!((two_score - one_score - 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_surplus_complexity_capacity_is_not_rewarded() {
        let scorer = BackendScorer::new();
        let simple_task = task(TaskType::Coding, TaskComplexity::Simple);
        let exact = profile(
            "exact",
            vec![],
            TaskComplexity::Simple,
            5.0,
            ResourceTier::Medium,
        );
        let surplus = profile(
            "surplus",
            vec![],
            TaskComplexity::Expert,
            5.0,
            ResourceTier::Medium,
        );
        let exact_score = scorer.score(&exact, &simple_task, &fresh(), &no_prefs());
        let surplus_score = scorer.score(&surplus, &simple_task, &fresh(), &no_prefs());
        assert!((exact_score - surplus_score).abs() < f64::EPSILON);
    }

    #[test]
    fn test_tier_shortfall_penalty_is_monotonic() {
        // A backend short by `gap` tiers scores exactly 2·gap + 3 lower than
        // an otherwise identical backend with a sufficient ceiling.
        let scorer = BackendScorer::new();
        let expert_task = task(TaskType::Coding, TaskComplexity::Expert);

        let sufficient = profile(
            "ok",
            vec![],
            TaskComplexity::Expert,
            8.0,
            ResourceTier::Medium,
        );
        let short_one = profile(
            "short1",
            vec![],
            TaskComplexity::Complex,
            8.0,
            ResourceTier::Medium,
        );
        let short_three = profile(
            "short3",
            vec![],
            TaskComplexity::Simple,
            8.0,
            ResourceTier::Medium,
        );

        let ok = scorer.score(&sufficient, &expert_task, &fresh(), &no_prefs());
        let one = scorer.score(&short_one, &expert_task, &fresh(), &no_prefs());
        let three = scorer.score(&short_three, &expert_task, &fresh(), &no_prefs());

        assert!((ok - one - 5.0).abs() < f64::EPSILON, "gap 1: {ok} vs {one}");
        assert!(
            (ok - three - 9.0).abs() < f64::EPSILON,
            "gap 3: {ok} vs {three}"
        );
        assert!(three < one, "penalty must grow with the gap");
    }

    // -- historical adjustment --------------------------------------------

    #[test]
    fn test_history_ignored_until_first_call() {
        let backend = profile(
            "m",
            vec![],
            TaskComplexity::Expert,
            5.0,
            ResourceTier::Medium,
        );
        let bad_history = BackendMetrics {
            success_rate: 0.1,
            avg_latency_secs: 60.0,
            total_calls: 0,
        };
        let scorer = BackendScorer::new();
        let with_history = scorer.score(
            &backend,
            &task(TaskType::Coding, TaskComplexity::Simple),
            &bad_history,
            &no_prefs(),
        );
        let without = scorer.score(
            &backend,
            &task(TaskType::Coding, TaskComplexity::Simple),
            &fresh(),
            &no_prefs(),
        );
        assert!((with_history - without).abs() < f64::EPSILON);
    }

    #[test]
    fn test_perfect_success_rate_adds_two() {
        let backend = profile(
            "m",
            vec![],
            TaskComplexity::Expert,
            5.0,
            ResourceTier::Medium,
        );
        let metrics = BackendMetrics {
            success_rate: 1.0,
            avg_latency_secs: 10.0, // neutral band
            total_calls: 5,
        };
        let breakdown = BackendScorer::new().breakdown(
            &backend,
            &task(TaskType::Coding, TaskComplexity::Simple),
            &metrics,
            &no_prefs(),
        );
        assert!((breakdown.historical - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_half_success_rate_costs_three() {
        let backend = profile(
            "m",
            vec![],
            TaskComplexity::Expert,
            9.0,
            ResourceTier::Medium,
        );
        let metrics = BackendMetrics {
            success_rate: 0.5,
            avg_latency_secs: 10.0,
            total_calls: 5,
        };
        let breakdown = BackendScorer::new().breakdown(
            &backend,
            &task(TaskType::Coding, TaskComplexity::Simple),
            &metrics,
            &no_prefs(),
        );
        assert!((breakdown.historical + 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_latency_bonus_and_penalty_bands() {
        let backend = profile(
            "m",
            vec![],
            TaskComplexity::Expert,
            5.0,
            ResourceTier::Medium,
        );
        let scorer = BackendScorer::new();
        let coding = task(TaskType::Coding, TaskComplexity::Simple);

        let fast = BackendMetrics {
            success_rate: 0.8,
            avg_latency_secs: 2.0,
            total_calls: 1,
        };
        let neutral = BackendMetrics {
            success_rate: 0.8,
            avg_latency_secs: 5.0,
            total_calls: 1,
        };
        let slow = BackendMetrics {
            success_rate: 0.8,
            avg_latency_secs: 20.0,
            total_calls: 1,
        };

        let fast_hist = scorer.breakdown(&backend, &coding, &fast, &no_prefs()).historical;
        let neutral_hist = scorer
            .breakdown(&backend, &coding, &neutral, &no_prefs())
            .historical;
        let slow_hist = scorer.breakdown(&backend, &coding, &slow, &no_prefs()).historical;

        assert!((fast_hist - 1.0).abs() < 1e-12, "fast: {fast_hist}");
        assert!(neutral_hist.abs() < 1e-12, "neutral: {neutral_hist}");
        assert!((slow_hist + 1.0).abs() < 1e-12, "slow: {slow_hist}");
    }

    // -- preferences ------------------------------------------------------

    #[test]
    fn test_prefer_fast_rewards_low_and_penalizes_high() {
        let scorer = BackendScorer::new();
        let coding = task(TaskType::Coding, TaskComplexity::Simple);
        let prefer_fast = RoutePreferences { prefer_fast: true };

        let low = profile("low", vec![], TaskComplexity::Expert, 5.0, ResourceTier::Low);
        let medium = profile(
            "med",
            vec![],
            TaskComplexity::Expert,
            5.0,
            ResourceTier::Medium,
        );
        let high = profile(
            "high",
            vec![],
            TaskComplexity::Expert,
            5.0,
            ResourceTier::High,
        );

        let low_pref = scorer.breakdown(&low, &coding, &fresh(), &prefer_fast).preference;
        let med_pref = scorer
            .breakdown(&medium, &coding, &fresh(), &prefer_fast)
            .preference;
        let high_pref = scorer.breakdown(&high, &coding, &fresh(), &prefer_fast).preference;

        assert!((low_pref - 2.0).abs() < f64::EPSILON);
        assert!(med_pref.abs() < f64::EPSILON);
        assert!((high_pref + 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_preferences_parse_from_context() {
        let mut context = TaskContext::new();
        assert!(!RoutePreferences::from_context(&context).prefer_fast);
        context.insert("prefer_fast".to_string(), "true".to_string());
        assert!(RoutePreferences::from_context(&context).prefer_fast);
        context.insert("prefer_fast".to_string(), "yes".to_string());
        assert!(!RoutePreferences::from_context(&context).prefer_fast);
    }

    // -- clamping ---------------------------------------------------------

    #[test]
    fn test_score_never_negative() {
        // Low baseline, huge shortfall, terrible history, heavy tier.
        let backend = profile(
            "m",
            vec![],
            TaskComplexity::Simple,
            0.5,
            ResourceTier::High,
        );
        let metrics = BackendMetrics {
            success_rate: 0.0,
            avg_latency_secs: 120.0,
            total_calls: 50,
        };
        let score = BackendScorer::new().score(
            &backend,
            &task(TaskType::Coding, TaskComplexity::Expert),
            &metrics,
            &RoutePreferences { prefer_fast: true },
        );
        assert!(score >= 0.0);
        assert!(score.abs() < f64::EPSILON);
    }

    // -- selection --------------------------------------------------------

    #[test]
    fn test_select_prefers_capability_and_tier_fit() {
        let catalog = CapabilityCatalog::new(vec![
            profile(
                "coder",
                vec![Capability::Coding, Capability::Technical],
                TaskComplexity::Expert,
                9.0,
                ResourceTier::Medium,
            ),
            profile(
                "writer",
                vec![Capability::Creative],
                TaskComplexity::Medium,
                7.0,
                ResourceTier::Medium,
            ),
        ]);
        let available = vec!["coder".to_string(), "writer".to_string()];
        let store = MetricsStore::new();
        let result = BackendScorer::new().select(
            &catalog,
            &available,
            &task(TaskType::Coding, TaskComplexity::Simple),
            &store,
            &no_prefs(),
        );
        let (best, scores) = result.unwrap_or_else(|| std::panic::panic_any("no selection"));
        assert_eq!(best, "coder");
        assert_eq!(scores.len(), 2);
        assert_eq!(scores[0].0, "coder");
    }

    #[test]
    fn test_select_breaks_ties_by_catalog_order() {
        let catalog = CapabilityCatalog::new(vec![
            profile(
                "first",
                vec![],
                TaskComplexity::Expert,
                5.0,
                ResourceTier::Medium,
            ),
            profile(
                "second",
                vec![],
                TaskComplexity::Expert,
                5.0,
                ResourceTier::Medium,
            ),
        ]);
        let available = vec!["second".to_string(), "first".to_string()];
        let store = MetricsStore::new();
        let result = BackendScorer::new().select(
            &catalog,
            &available,
            &task(TaskType::Coding, TaskComplexity::Simple),
            &store,
            &no_prefs(),
        );
        let (best, _) = result.unwrap_or_else(|| std::panic::panic_any("no selection"));
        assert_eq!(best, "first");
    }

    #[test]
    fn test_select_ignores_unavailable_backends() {
        let catalog = CapabilityCatalog::default();
        let available = vec!["phi3:3.8b".to_string()];
        let store = MetricsStore::new();
        let result = BackendScorer::new().select(
            &catalog,
            &available,
            &task(TaskType::Coding, TaskComplexity::Expert),
            &store,
            &no_prefs(),
        );
        let (best, scores) = result.unwrap_or_else(|| std::panic::panic_any("no selection"));
        assert_eq!(best, "phi3:3.8b");
        assert_eq!(scores.len(), 1);
    }

    #[test]
    fn test_select_returns_none_when_nothing_available() {
        let catalog = CapabilityCatalog::default();
        let store = MetricsStore::new();
        let result = BackendScorer::new().select(
            &catalog,
            &[],
            &task(TaskType::Coding, TaskComplexity::Simple),
            &store,
            &no_prefs(),
        );
        assert!(result.is_none());
    }
}
