//! Static backend capability catalog.
//!
//! The [`CapabilityCatalog`] is the read-only registry of backend profiles:
//! which capability tags each backend carries, the highest complexity tier
//! it can serve, its baseline performance score, and its resource tier.
//! Profiles are stored in a deliberate order because both the scorer and
//! the fallback resolver break ties by first-registered-wins; iteration
//! order is part of the contract, not an accident of a map.
//!
//! The catalog is immutable after construction and therefore needs no
//! synchronization when shared across request tasks.

use super::classifier::TaskComplexity;
use serde::{Deserialize, Serialize};

// ── Capability tags ────────────────────────────────────────────────────

/// Domain-strength label used for backend/task matching.
///
/// # Panics
///
/// This type never panics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// General-purpose conversation and instruction following.
    General,
    /// Code generation and manipulation.
    Coding,
    /// Multi-step reasoning.
    Reasoning,
    /// Creative and open-ended writing.
    Creative,
    /// Evaluation and review.
    Analytical,
    /// Technical and infrastructure knowledge.
    Technical,
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::General => write!(f, "general"),
            Self::Coding => write!(f, "coding"),
            Self::Reasoning => write!(f, "reasoning"),
            Self::Creative => write!(f, "creative"),
            Self::Analytical => write!(f, "analytical"),
            Self::Technical => write!(f, "technical"),
        }
    }
}

/// Relative resource footprint of a backend.
///
/// # Panics
///
/// This type never panics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceTier {
    /// Small models, fast and cheap to run.
    Low,
    /// Mid-size models.
    Medium,
    /// Large models, slow and memory-hungry.
    High,
}

// ── Backend profile ────────────────────────────────────────────────────

/// Immutable description of one backend in the pool.
///
/// Loaded once at startup and never mutated afterwards.
///
/// # Panics
///
/// This type never panics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendProfile {
    /// Backend identifier as known to the pool (e.g. `"qwen2.5:7b"`).
    pub id: String,
    /// Capability tags, duplicate-free.
    pub capabilities: Vec<Capability>,
    /// Highest complexity tier this backend can serve.
    pub max_complexity: TaskComplexity,
    /// Human-readable strengths, for introspection and logs.
    #[serde(default)]
    pub strengths: Vec<String>,
    /// Baseline performance score in `0.0..=10.0`.
    pub performance_score: f64,
    /// Resource footprint, used by the prefer-fast preference.
    pub resource_tier: ResourceTier,
}

impl BackendProfile {
    /// Create a new profile with no strengths listed.
    ///
    /// # Panics
    ///
    /// This function never panics.
    pub fn new(
        id: impl Into<String>,
        capabilities: Vec<Capability>,
        max_complexity: TaskComplexity,
        performance_score: f64,
        resource_tier: ResourceTier,
    ) -> Self {
        Self {
            id: id.into(),
            capabilities,
            max_complexity,
            strengths: Vec::new(),
            performance_score,
            resource_tier,
        }
    }

    /// Attach human-readable strengths.
    pub fn with_strengths(mut self, strengths: &[&str]) -> Self {
        self.strengths = strengths.iter().map(|s| s.to_string()).collect();
        self
    }
}

// ── Catalog ────────────────────────────────────────────────────────────

/// Ordered, read-only registry of [`BackendProfile`]s.
///
/// # Panics
///
/// This type and its methods never panic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityCatalog {
    profiles: Vec<BackendProfile>,
}

impl CapabilityCatalog {
    /// Build a catalog from an ordered list of profiles.
    ///
    /// The list order is the tie-break order used by scoring and fallback
    /// resolution.  If two profiles share an id, lookups return the first.
    pub fn new(profiles: Vec<BackendProfile>) -> Self {
        Self { profiles }
    }

    /// An empty catalog.  Routing against it always takes the error path.
    pub fn empty() -> Self {
        Self {
            profiles: Vec::new(),
        }
    }

    /// Look up a profile by backend id.
    pub fn get(&self, id: &str) -> Option<&BackendProfile> {
        self.profiles.iter().find(|p| p.id == id)
    }

    /// Return `true` if a backend with this id is registered.
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Iterate profiles in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &BackendProfile> {
        self.profiles.iter()
    }

    /// All backend ids in registration order.
    pub fn ids(&self) -> Vec<String> {
        self.profiles.iter().map(|p| p.id.clone()).collect()
    }

    /// Number of registered backends.
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    /// Return `true` if no backends are registered.
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

impl Default for CapabilityCatalog {
    /// The stock Ollama pool: two coding-leaning models, one reasoning
    /// generalist, one creative/analytical generalist.
    fn default() -> Self {
        Self::new(vec![
            BackendProfile::new(
                "phi3:3.8b",
                vec![Capability::General, Capability::Coding],
                TaskComplexity::Medium,
                7.5,
                ResourceTier::Low,
            )
            .with_strengths(&["fast", "efficient", "code_generation"]),
            BackendProfile::new(
                "qwen2.5:7b",
                vec![
                    Capability::General,
                    Capability::Reasoning,
                    Capability::Technical,
                ],
                TaskComplexity::Complex,
                8.5,
                ResourceTier::Medium,
            )
            .with_strengths(&["reasoning", "multilingual", "technical_knowledge"]),
            BackendProfile::new(
                "llama3.1:8b-instruct",
                vec![
                    Capability::General,
                    Capability::Creative,
                    Capability::Analytical,
                ],
                TaskComplexity::Expert,
                9.0,
                ResourceTier::High,
            )
            .with_strengths(&["creative", "analytical", "instruction_following"]),
            BackendProfile::new(
                "codegemma:7b",
                vec![Capability::Coding, Capability::Technical],
                TaskComplexity::Expert,
                9.2,
                ResourceTier::Medium,
            )
            .with_strengths(&["code_generation", "debugging", "technical_accuracy"]),
        ])
    }
}

// ── Tests ──────────────────────────────────────────────────────────────
