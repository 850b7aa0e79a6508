//! Backend availability probing.
//!
//! Before committing to a scored backend the router verifies it actually
//! answers.  The probe is isolated behind a trait so the network dependency
//! can be stubbed in tests; the HTTP implementation lives on the pool
//! client (`crate::pool::OllamaPool`), which already owns the endpoint and
//! a bounded probe timeout.
//!
//! A probe reports plain reachability: timeouts, refused connections, and
//! non-success statuses all collapse to `false`.  It never errors.

use async_trait::async_trait;
use std::collections::HashSet;

/// Reachability check for a single backend.
///
/// Implementations must bound their own blocking duration (a timeout on
/// the order of a few seconds) so one dead backend cannot stall concurrent
/// routing requests.
#[async_trait]
pub trait AvailabilityProbe: Send + Sync {
    /// Return `true` if the backend answers a minimal synthetic call.
    ///
    /// Must not panic and must not error; every failure mode is `false`.
    async fn probe(&self, backend_id: &str) -> bool;
}

// ── Static stub ────────────────────────────────────────────────────────

/// In-process probe stub with fixed answers, for tests and demos.
///
/// # Panics
///
/// This type and its methods never panic.
#[derive(Debug, Clone, Default)]
pub struct StaticProbe {
    reachable: HashSet<String>,
    default_reachable: bool,
}

impl StaticProbe {
    /// A probe that reports every backend reachable.
    pub fn all_up() -> Self {
        Self {
            reachable: HashSet::new(),
            default_reachable: true,
        }
    }

    /// A probe that reports every backend unreachable.
    pub fn all_down() -> Self {
        Self::default()
    }

    /// A probe that reports only the given backends reachable.
    ///
    /// # Panics
    ///
    /// This function never panics.
    pub fn up<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            reachable: ids.into_iter().map(Into::into).collect(),
            default_reachable: false,
        }
    }
}

#[async_trait]
impl AvailabilityProbe for StaticProbe {
    async fn probe(&self, backend_id: &str) -> bool {
        self.reachable.contains(backend_id) || self.default_reachable
    }
}

// ── Tests ──────────────────────────────────────────────────────────────
