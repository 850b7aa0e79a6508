//! # Adaptive Model Routing
//!
//! ## Responsibility
//! Pick the most suitable backend model for each incoming task: classify
//! the task lexically, score every available backend against it, verify
//! the winner actually answers, and degrade through capability-overlap
//! fallback down to a configured default when it does not.  Decisions are
//! memoized by request fingerprint and refined over time by dispatch
//! outcomes fed back into the metrics store.
//!
//! ## Guarantees
//! - Total: `ModelRouter::route` always returns a usable decision; every
//!   failure mode maps to a reason code instead of an error.
//! - Deterministic: classification and scoring are pure over their inputs;
//!   tie-breaks follow explicit declared orders, not map iteration.
//! - Thread-safe: the catalog and config are immutable; the metrics store
//!   serializes per-key read-modify-write; the cache holds one coarse lock.
//! - Bounded: the only network wait is the availability probe, capped by
//!   its own timeout; the decision cache has fixed capacity and expiry.
//!
//! ## NOT Responsible For
//! - Actually dispatching the model call (that belongs to `pool`)
//! - Judging output quality; only availability and fitness are predicted
//! - Prompt assembly, conversation storage, or retrieval pipelines

pub mod cache;
pub mod catalog;
pub mod classifier;
pub mod config;
pub mod fallback;
pub mod metrics_store;
pub mod probe;
pub mod router;
pub mod scorer;

// Re-exports for convenience
pub use cache::{fingerprint, DecisionCache};
pub use catalog::{BackendProfile, Capability, CapabilityCatalog, ResourceTier};
pub use classifier::{TaskClassifier, TaskComplexity, TaskContext, TaskProfile, TaskType};
pub use config::{validate, CacheConfig, RoutingConfig};
pub use fallback::FallbackResolver;
pub use metrics_store::{BackendMetrics, MetricsStore};
pub use probe::{AvailabilityProbe, StaticProbe};
pub use router::{ModelRouter, RouteReason, RouterStats, RoutingDecision};
pub use scorer::{required_capabilities, BackendScorer, RoutePreferences, ScoreBreakdown};
