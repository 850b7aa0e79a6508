//! Capability-overlap fallback resolution.
//!
//! When the scored winner fails its availability probe, the resolver looks
//! for the live backend whose capability tags overlap most with the dead
//! one's, so the replacement serves roughly the same kind of work.  Ties
//! resolve by catalog registration order.  If nothing overlaps at all, the
//! resolver reports `None` and the router falls through to the statically
//! configured default backend, which is trusted without a re-probe.

use super::catalog::CapabilityCatalog;

/// Picks a replacement for an unavailable backend.
///
/// Stateless; all inputs arrive per call.
///
/// # Panics
///
/// This type and its methods never panic.
#[derive(Debug, Clone, Default)]
pub struct FallbackResolver;

impl FallbackResolver {
    /// Create a new resolver.
    pub fn new() -> Self {
        Self
    }

    /// Find the available backend with the largest capability overlap.
    ///
    /// # Arguments
    ///
    /// * `catalog` — The full backend registry.
    /// * `unavailable_id` — The backend that failed its probe.
    /// * `available` — Ids currently reported available by the pool.
    ///
    /// # Returns
    ///
    /// The best overlapping backend id, or `None` when the dead backend is
    /// not in the catalog or no available backend shares a capability.
    ///
    /// # Panics
    ///
    /// This function never panics.
    pub fn resolve(
        &self,
        catalog: &CapabilityCatalog,
        unavailable_id: &str,
        available: &[String],
    ) -> Option<String> {
        let dead = catalog.get(unavailable_id)?;

        let mut best: Option<(String, usize)> = None;
        for backend in catalog.iter() {
            if backend.id == unavailable_id || !available.iter().any(|id| id == &backend.id) {
                continue;
            }
            let overlap = backend
                .capabilities
                .iter()
                .filter(|c| dead.capabilities.contains(c))
                .count();
            if overlap == 0 {
                continue;
            }
            // Strictly-greater keeps the earliest registered on ties.
            if best.as_ref().map_or(true, |(_, b)| overlap > *b) {
                best = Some((backend.id.clone(), overlap));
            }
        }

        best.map(|(id, _)| id)
    }
}

// ── Tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::catalog::{BackendProfile, Capability, ResourceTier};
    use crate::routing::classifier::TaskComplexity;

    fn profile(id: &str, capabilities: Vec<Capability>) -> BackendProfile {
        BackendProfile::new(
            id,
            capabilities,
            TaskComplexity::Expert,
            8.0,
            ResourceTier::Medium,
        )
    }

    fn ids(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_picks_largest_capability_overlap() {
        let catalog = CapabilityCatalog::new(vec![
            profile("dead", vec![Capability::Coding, Capability::Technical]),
            profile("half", vec![Capability::Coding, Capability::Creative]),
            profile("full", vec![Capability::Coding, Capability::Technical]),
        ]);
        let resolver = FallbackResolver::new();
        let fallback = resolver.resolve(&catalog, "dead", &ids(&["half", "full"]));
        assert_eq!(fallback.as_deref(), Some("full"));
    }

    #[test]
    fn test_tie_resolves_to_first_registered() {
        let catalog = CapabilityCatalog::new(vec![
            profile("dead", vec![Capability::Coding]),
            profile("earlier", vec![Capability::Coding]),
            profile("later", vec![Capability::Coding]),
        ]);
        let resolver = FallbackResolver::new();
        let fallback = resolver.resolve(&catalog, "dead", &ids(&["later", "earlier"]));
        assert_eq!(fallback.as_deref(), Some("earlier"));
    }

    #[test]
    fn test_no_shared_capability_returns_none() {
        let catalog = CapabilityCatalog::new(vec![
            profile("dead", vec![Capability::Coding, Capability::Technical]),
            profile("other", vec![Capability::Creative]),
        ]);
        let resolver = FallbackResolver::new();
        assert!(resolver.resolve(&catalog, "dead", &ids(&["other"])).is_none());
    }

    #[test]
    fn test_dead_backend_is_never_its_own_fallback() {
        let catalog = CapabilityCatalog::new(vec![profile("dead", vec![Capability::Coding])]);
        let resolver = FallbackResolver::new();
        // Pool still lists the dead backend; it must not be returned.
        assert!(resolver.resolve(&catalog, "dead", &ids(&["dead"])).is_none());
    }

    #[test]
    fn test_unknown_backend_returns_none() {
        let catalog = CapabilityCatalog::default();
        let resolver = FallbackResolver::new();
        assert!(resolver
            .resolve(&catalog, "not-configured", &ids(&["phi3:3.8b"]))
            .is_none());
    }

    #[test]
    fn test_unavailable_candidates_are_skipped() {
        let catalog = CapabilityCatalog::new(vec![
            profile("dead", vec![Capability::Coding]),
            profile("offline", vec![Capability::Coding]),
            profile("online", vec![Capability::Coding]),
        ]);
        let resolver = FallbackResolver::new();
        let fallback = resolver.resolve(&catalog, "dead", &ids(&["online"]));
        assert_eq!(fallback.as_deref(), Some("online"));
    }
}
