//! End-to-end routing scenarios.
//!
//! These tests drive the full decision pipeline through the public surface:
//! - classification determinism and the length-only expert band
//! - score non-negativity across the whole catalog
//! - probe failure → capability-overlap fallback → configured default
//! - decision caching with order-independent context
//! - outcome feedback shifting the metrics store (EMA verification)

use std::sync::Arc;
use tokio_model_router::routing::{
    BackendProfile, Capability, CapabilityCatalog, ResourceTier, RouteReason, RoutingConfig,
    StaticProbe, TaskComplexity, TaskType,
};
use tokio_model_router::{ModelRouter, StaticPool, TaskContext};

// ── Helper functions ──────────────────────────────────────────────

/// The two-backend catalog: a coding specialist and a creative writer
/// that share no capability tags.
fn disjoint_catalog() -> CapabilityCatalog {
    CapabilityCatalog::new(vec![
        BackendProfile::new(
            "coder-xl",
            vec![Capability::Coding, Capability::Technical],
            TaskComplexity::Expert,
            9.0,
            ResourceTier::Medium,
        ),
        BackendProfile::new(
            "writer-md",
            vec![Capability::Creative],
            TaskComplexity::Medium,
            7.0,
            ResourceTier::Medium,
        ),
    ])
}

fn router(
    catalog: CapabilityCatalog,
    pool: StaticPool,
    probe: StaticProbe,
    default_backend: &str,
) -> ModelRouter {
    let mut config = RoutingConfig::default();
    config.default_backend = default_backend.to_string();
    ModelRouter::new(config, catalog, Arc::new(pool), Arc::new(probe))
}

fn ctx(pairs: &[(&str, &str)]) -> TaskContext {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

// ── Test: classification determinism ──────────────────────────────

#[tokio::test]
async fn test_simple_trigger_text_classifies_simple_every_time() {
    let catalog = CapabilityCatalog::default();
    let r = router(
        catalog.clone(),
        StaticPool::serving(catalog.ids()),
        StaticProbe::all_up(),
        "qwen2.5:7b",
    );

    for _ in 0..5 {
        let decision = r.route("uma tarefa simples e rápida", &TaskContext::new()).await;
        assert_eq!(decision.task.complexity, TaskComplexity::Simple);
    }
}

#[tokio::test]
async fn test_1200_chars_without_triggers_classifies_expert() {
    let catalog = CapabilityCatalog::default();
    let r = router(
        catalog.clone(),
        StaticPool::serving(catalog.ids()),
        StaticProbe::all_up(),
        "qwen2.5:7b",
    );

    // 1200 chars of trigger-free filler.
    let text = "zz ".repeat(400);
    assert_eq!(text.chars().count(), 1200);
    let decision = r.route(&text, &TaskContext::new()).await;
    assert_eq!(decision.task.complexity, TaskComplexity::Expert);
}

// ── Test: score invariants over the full catalog ──────────────────

#[tokio::test]
async fn test_all_reported_scores_are_non_negative() {
    let catalog = CapabilityCatalog::default();
    let r = router(
        catalog.clone(),
        StaticPool::serving(catalog.ids()),
        StaticProbe::all_up(),
        "qwen2.5:7b",
    );

    // Poison every backend's history so penalties stack up.
    for id in catalog.ids() {
        for _ in 0..20 {
            r.record_outcome(&id, false, 30.0);
        }
    }

    let decision = r
        .route(
            "an enterprise production kubernetes microservices program",
            &ctx(&[("prefer_fast", "true")]),
        )
        .await;

    assert_eq!(decision.scores.len(), 4);
    for (backend, score) in &decision.scores {
        assert!(*score >= 0.0, "{backend} scored negative: {score}");
    }
}

// ── Test: the A/B fallback-default scenario ───────────────────────

#[tokio::test]
async fn test_disjoint_fallback_lands_on_configured_default() {
    // "crie uma API simples": classifier yields (coding, simple); the coder
    // wins on capability match and tier fit; it is probed unreachable; the
    // writer shares no capability tag, so resolution falls through to the
    // configured default with reason fallback_default.
    let r = router(
        disjoint_catalog(),
        StaticPool::serving(vec!["coder-xl".to_string(), "writer-md".to_string()]),
        StaticProbe::up(["writer-md"]),
        "default-model",
    );

    let decision = r.route("crie uma API simples", &TaskContext::new()).await;

    assert_eq!(decision.task.task_type, TaskType::Coding);
    assert_eq!(decision.task.complexity, TaskComplexity::Simple);
    assert_eq!(decision.reason, RouteReason::FallbackDefault);
    assert_eq!(decision.backend_id, "default-model");

    // The scored winner really was the coder.
    let top = decision
        .scores
        .iter()
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(id, _)| id.clone());
    assert_eq!(top.as_deref(), Some("coder-xl"));
}

#[tokio::test]
async fn test_overlapping_fallback_is_used_when_available() {
    // Add a second coding-capable backend: now the dead coder has an
    // overlapping replacement and the default is not needed.
    let catalog = CapabilityCatalog::new(vec![
        BackendProfile::new(
            "coder-xl",
            vec![Capability::Coding, Capability::Technical],
            TaskComplexity::Expert,
            9.0,
            ResourceTier::Medium,
        ),
        BackendProfile::new(
            "coder-sm",
            vec![Capability::Coding],
            TaskComplexity::Medium,
            7.0,
            ResourceTier::Low,
        ),
        BackendProfile::new(
            "writer-md",
            vec![Capability::Creative],
            TaskComplexity::Medium,
            7.0,
            ResourceTier::Medium,
        ),
    ]);
    let ids = catalog.ids();
    let r = router(
        catalog,
        StaticPool::serving(ids),
        StaticProbe::up(["coder-sm", "writer-md"]),
        "default-model",
    );

    let decision = r.route("crie uma API simples", &TaskContext::new()).await;
    assert_eq!(decision.reason, RouteReason::FallbackUsed);
    assert_eq!(decision.backend_id, "coder-sm");
    assert!(decision.available.contains(&decision.backend_id));
}

// ── Test: decision caching ────────────────────────────────────────

#[tokio::test]
async fn test_cached_decision_keeps_original_timestamp() {
    let catalog = CapabilityCatalog::default();
    let r = router(
        catalog.clone(),
        StaticPool::serving(catalog.ids()),
        StaticProbe::all_up(),
        "qwen2.5:7b",
    );

    let first = r
        .route(
            "analyze the report",
            &ctx(&[("agent", "reviewer"), ("project_scale", "startup")]),
        )
        .await;

    tokio::time::sleep(std::time::Duration::from_millis(10)).await;

    // Same attributes, reversed insertion order.
    let second = r
        .route(
            "analyze the report",
            &ctx(&[("project_scale", "startup"), ("agent", "reviewer")]),
        )
        .await;

    assert_eq!(first.timestamp, second.timestamp, "second call must be a cache hit");
    assert_eq!(first, second);
    assert_eq!(r.stats().cache_size, 1);
}

#[tokio::test]
async fn test_different_context_misses_the_cache() {
    let catalog = CapabilityCatalog::default();
    let r = router(
        catalog.clone(),
        StaticPool::serving(catalog.ids()),
        StaticProbe::all_up(),
        "qwen2.5:7b",
    );

    let _ = r.route("analyze the report", &ctx(&[("agent", "reviewer")])).await;
    let _ = r.route("analyze the report", &ctx(&[("agent", "builder")])).await;
    assert_eq!(r.stats().cache_size, 2);
}

// ── Test: outcome feedback ────────────────────────────────────────

#[tokio::test]
async fn test_ema_sequence_matches_formula_through_public_surface() {
    let catalog = CapabilityCatalog::default();
    let r = router(
        catalog.clone(),
        StaticPool::serving(catalog.ids()),
        StaticProbe::all_up(),
        "qwen2.5:7b",
    );

    // Seed 1.0 → failure → 0.9 → success → 0.91
    r.record_outcome("phi3:3.8b", false, 2.0);
    r.record_outcome("phi3:3.8b", true, 4.0);

    let stats = r.stats();
    let m = &stats.backends["phi3:3.8b"];
    assert!((m.success_rate - 0.91).abs() < 1e-12, "got {}", m.success_rate);
    assert!((m.avg_latency_secs - 3.0).abs() < 1e-12, "got {}", m.avg_latency_secs);
    assert_eq!(m.total_calls, 2);
    assert_eq!(stats.total_routed_calls, 2);
}

#[tokio::test]
async fn test_outcomes_recorded_against_fallback_backend() {
    let r = router(
        disjoint_catalog(),
        StaticPool::serving(vec!["coder-xl".to_string(), "writer-md".to_string()]),
        StaticProbe::up(["writer-md"]),
        "default-model",
    );

    let decision = r.route("crie uma API simples", &TaskContext::new()).await;
    // The caller reports against whichever backend actually executed.
    r.record_outcome(&decision.backend_id, true, 1.5);

    let stats = r.stats();
    let m = &stats.backends["default-model"];
    assert_eq!(m.total_calls, 1);
}

// ── Test: chosen backend belongs to the available set ─────────────

#[tokio::test]
async fn test_non_degraded_decisions_choose_from_available_set() {
    let catalog = CapabilityCatalog::default();
    let r = router(
        catalog.clone(),
        StaticPool::serving(catalog.ids()),
        StaticProbe::up(["phi3:3.8b", "qwen2.5:7b", "llama3.1:8b-instruct"]),
        "qwen2.5:7b",
    );

    let texts = [
        "implementar o serviço de pagamentos",
        "brainstorm a creative concept",
        "review and evaluate the analysis",
        "write the documentation guide",
    ];
    for text in texts {
        let decision = r.route(text, &TaskContext::new()).await;
        match decision.reason {
            RouteReason::OptimalSelection | RouteReason::FallbackUsed => {
                assert!(
                    decision.available.contains(&decision.backend_id),
                    "{text}: chosen {} outside available {:?}",
                    decision.backend_id,
                    decision.available
                );
            }
            RouteReason::FallbackDefault | RouteReason::ErrorFallback => {
                // Degraded paths record why the available set was bypassed.
            }
        }
    }
}
