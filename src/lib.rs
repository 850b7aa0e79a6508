//! # tokio-model-router
//!
//! An adaptive model-routing engine for LLM backend pools over Tokio.
//!
//! ## Architecture
//!
//! Each request flows through a fixed decision pipeline:
//! ```text
//! task text + context → Classify → Score available → Probe winner
//!                          → Fallback resolve (on probe failure)
//!                          → Cache → RoutingDecision
//! ```
//! The caller dispatches the chosen backend through the pool client and
//! reports the outcome back, which feeds the metrics store and shifts
//! future scoring.

// ── Lint policy (aerospace-grade) ─────────────────────────────────────────
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(missing_docs)]

use thiserror::Error;
use tracing_subscriber::EnvFilter;

pub mod metrics;
pub mod pool;
pub mod routing;

// Re-exports for convenience
pub use pool::{BackendPool, ChatMessage, OllamaPool, StaticPool};
pub use routing::{
    CapabilityCatalog, ModelRouter, RouteReason, RouterStats, RoutingConfig, RoutingDecision,
    TaskContext,
};

/// Initialise the global tracing subscriber.
///
/// Reads the `LOG_FORMAT` environment variable to choose output format:
/// - `"json"` — structured JSON output for production log aggregators
/// - anything else (including unset) — human-readable pretty output
///   for local development
///
/// Filter level is controlled by `RUST_LOG` (e.g. `RUST_LOG=info`).
///
/// # Errors
///
/// Returns [`RouterError::Other`] if the global subscriber has already
/// been set (e.g. by a previous call or a test harness).
///
/// # Panics
///
/// This function never panics.
///
/// # Example
///
/// ```no_run
/// # use tokio_model_router::{init_tracing, RouterError};
/// # fn example() -> Result<(), RouterError> {
/// init_tracing()?;
/// # Ok(()) }
/// ```
pub fn init_tracing() -> Result<(), RouterError> {
    let format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    let result = match format.as_str() {
        "json" => tracing_subscriber::fmt()
            .json()
            .with_env_filter(EnvFilter::from_default_env())
            .with_current_span(true)
            .with_span_list(true)
            .try_init(),
        _ => tracing_subscriber::fmt()
            .pretty()
            .with_env_filter(EnvFilter::from_default_env())
            .try_init(),
    };

    result.map_err(|e| RouterError::Other(format!("tracing init failed: {e}")))
}

/// Top-level routing errors.
///
/// Every error surface in the engine is mapped to a variant here.  All
/// variants implement `std::error::Error` via [`thiserror`].  Note that
/// `ModelRouter::route` itself never returns these; they are caught at the
/// top level and folded into an `error_fallback` decision.
#[derive(Error, Debug)]
pub enum RouterError {
    /// The pool's model-listing facility failed (network or protocol).
    #[error("pool error: {0}")]
    Pool(String),

    /// A model dispatch call failed (network, API, or parsing error).
    #[error("inference failed: {0}")]
    Inference(String),

    /// A configuration value is missing or invalid.
    ///
    /// This is returned at construction time so that misconfiguration
    /// surfaces immediately rather than at the first routing request.
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// The catalog holds no backend profiles; nothing can be scored.
    #[error("backend catalog is empty")]
    EmptyCatalog,

    /// Catch-all for errors that do not fit a specific variant.
    #[error("{0}")]
    Other(String),
}
