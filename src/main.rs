//! Demo binary for tokio-model-router
//!
//! Routes a handful of bilingual demo tasks through the engine against a
//! stubbed pool (one backend deliberately unreachable), reports outcomes,
//! and prints the resulting stats.
//!
//! ## Environment Variables
//!
//! - `LOG_FORMAT=json` — structured JSON output (production)
//! - `RUST_LOG=info` — log level filter (default: info)
//! - `OLLAMA_URL` / `ROUTER_DEFAULT_MODEL` — routing config overrides

use std::sync::Arc;
use std::time::Instant;
use tokio_model_router::routing::{RoutingConfig, StaticProbe};
use tokio_model_router::{
    init_tracing, metrics, BackendPool, CapabilityCatalog, ChatMessage, ModelRouter, StaticPool,
    TaskContext,
};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured tracing (JSON or pretty, based on LOG_FORMAT env)
    let _ = init_tracing();

    // Initialize Prometheus metrics registry before any routing happens.
    metrics::init_metrics()?;

    info!("Starting tokio-model-router demo");

    let config = RoutingConfig::from_env();
    let catalog = CapabilityCatalog::default();

    // Stub pool: all four catalog models are loaded, but the top coding
    // model fails its probe to exercise the fallback path.
    let pool = Arc::new(StaticPool::serving(catalog.ids()));
    let probe = Arc::new(StaticProbe::up([
        "phi3:3.8b",
        "qwen2.5:7b",
        "llama3.1:8b-instruct",
    ]));

    let dispatcher = pool.clone();
    let router = Arc::new(ModelRouter::new(config, catalog, pool, probe));

    let demo_tasks: Vec<(&str, Vec<(&str, &str)>)> = vec![
        ("crie uma API simples para cadastro de usuários", vec![]),
        (
            "design the architecture of an enterprise payment system",
            vec![("project_scale", "enterprise")],
        ),
        (
            "implementar e desenvolver o módulo de autenticação",
            vec![("agent", "builder")],
        ),
        ("fix the bug causing this timeout error in production", vec![]),
        (
            "brainstorm ideas for a new SaaS product concept",
            vec![("agent", "ideator")],
        ),
        ("write a readme and a deployment guide", vec![("prefer_fast", "true")]),
        // Repeated task: the second occurrence should hit the cache.
        ("crie uma API simples para cadastro de usuários", vec![]),
    ];

    info!(count = demo_tasks.len(), "Routing demo tasks");

    for (i, (text, pairs)) in demo_tasks.iter().enumerate() {
        let context: TaskContext = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        let decision = router.route(text, &context).await;
        info!(
            request = i,
            backend = %decision.backend_id,
            reason = %decision.reason,
            task_type = %decision.task.task_type,
            complexity = %decision.task.complexity,
            "decision"
        );

        // Dispatch through the pool and report the outcome back.
        let started = Instant::now();
        let outcome = dispatcher
            .chat(&decision.backend_id, &[ChatMessage::user(*text)])
            .await;
        router.record_outcome(
            &decision.backend_id,
            outcome.is_ok(),
            started.elapsed().as_secs_f64(),
        );
    }

    let stats = router.stats();
    info!(
        total_routed_calls = stats.total_routed_calls,
        cache_size = stats.cache_size,
        backends = stats.backends.len(),
        "demo complete"
    );
    for (backend, m) in &stats.backends {
        info!(
            backend = %backend,
            success_rate = %format!("{:.2}", m.success_rate),
            avg_latency_secs = %format!("{:.2}", m.avg_latency_secs),
            total_calls = m.total_calls,
            "backend metrics"
        );
    }

    let exposition = metrics::gather_metrics();
    info!(lines = exposition.lines().count(), "prometheus exposition ready");

    Ok(())
}
