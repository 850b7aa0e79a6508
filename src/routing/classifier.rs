//! Lexical task classification.
//!
//! Turns a free-text task description plus optional context attributes into
//! a [`TaskProfile`]: one [`TaskType`] and one [`TaskComplexity`].  The
//! classification is purely lexical (bilingual pt/en trigger phrases,
//! case-insensitive substring matching) and therefore deterministic, total,
//! and allocation-light.  It never fails and never blocks.
//!
//! ## Scoring
//!
//! Each category accumulates an integer score:
//!
//! 1. **Trigger phrases** — +1 per trigger phrase found in the lowered text.
//! 2. **Context bonuses** — a declared `project_scale` boosts complexity;
//!    a calling `agent` identifier boosts its associated task type.
//! 3. **Length band** — text over 1000 chars adds +1 to expert, otherwise
//!    over 500 chars adds +1 to complex.
//! 4. **Technical indicators** — infrastructure vocabulary adds +1 to
//!    expert per hit.
//!
//! The category with the strictly highest score wins.  Ties resolve to the
//! first entry of the rule tables below, so the table order is a visible,
//! tested contract: with every score at zero the classifier lands on
//! [`TaskType::Coding`] and [`TaskComplexity::Medium`].

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Free-form context attributes accompanying a routing request.
///
/// Well-known keys: `project_scale` (e.g. `"enterprise"`), `agent` (the
/// calling agent identifier), `prefer_fast` (`"true"` to bias towards
/// low-resource backends).
pub type TaskContext = HashMap<String, String>;

// ── Category enums ─────────────────────────────────────────────────────

/// The closed set of task types the router distinguishes.
///
/// # Panics
///
/// This type never panics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    /// Brainstorming, concept and idea generation.
    Ideation,
    /// System design and structural questions.
    Architecture,
    /// Writing new code.
    Coding,
    /// Finding and fixing defects.
    Debugging,
    /// Reviewing and evaluating existing material.
    Analysis,
    /// Writing docs, readmes, and guides.
    Documentation,
    /// Writing or running tests.
    Testing,
    /// Shipping and operating software.
    Deployment,
}

impl std::fmt::Display for TaskType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ideation => write!(f, "ideation"),
            Self::Architecture => write!(f, "architecture"),
            Self::Coding => write!(f, "coding"),
            Self::Debugging => write!(f, "debugging"),
            Self::Analysis => write!(f, "analysis"),
            Self::Documentation => write!(f, "documentation"),
            Self::Testing => write!(f, "testing"),
            Self::Deployment => write!(f, "deployment"),
        }
    }
}

/// Ordered task difficulty tiers: `Simple < Medium < Complex < Expert`.
///
/// The derived [`Ord`] follows declaration order and is relied on by the
/// scorer's complexity-fit check.
///
/// # Panics
///
/// This type never panics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskComplexity {
    /// Small, direct, low-risk work.
    Simple,
    /// Typical day-to-day work.
    Medium,
    /// Detailed, multi-part work.
    Complex,
    /// Production-grade or specialist work.
    Expert,
}

impl TaskComplexity {
    /// Return the numeric tier for this complexity, `1..=4`.
    ///
    /// # Panics
    ///
    /// This function never panics.
    pub fn tier(self) -> u8 {
        match self {
            Self::Simple => 1,
            Self::Medium => 2,
            Self::Complex => 3,
            Self::Expert => 4,
        }
    }
}

impl std::fmt::Display for TaskComplexity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Simple => write!(f, "simple"),
            Self::Medium => write!(f, "medium"),
            Self::Complex => write!(f, "complex"),
            Self::Expert => write!(f, "expert"),
        }
    }
}

/// The classifier's verdict for one request: task type plus complexity.
///
/// Transient — recomputed per request, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskProfile {
    /// Inferred task type.
    pub task_type: TaskType,
    /// Inferred task complexity.
    pub complexity: TaskComplexity,
}

// ── Rule tables ────────────────────────────────────────────────────────
//
// Order matters: the first entry wins score ties, which makes the first
// entry of each table the zero-score default.

/// Complexity trigger phrases (pt/en), in tie-break order.
const COMPLEXITY_RULES: [(TaskComplexity, &[&str]); 4] = [
    (
        TaskComplexity::Medium,
        &[
            "médio", "moderado", "padrão", "normal", "típico", "medium", "moderate", "standard",
            "typical", "regular",
        ],
    ),
    (
        TaskComplexity::Simple,
        &[
            "simples", "básico", "rápido", "pequeno", "fácil", "direto", "simple", "basic",
            "quick", "small", "easy", "straightforward",
        ],
    ),
    (
        TaskComplexity::Complex,
        &[
            "complexo", "avançado", "detalhado", "completo", "robusto", "complex", "advanced",
            "detailed", "complete", "robust", "comprehensive",
        ],
    ),
    (
        TaskComplexity::Expert,
        &[
            "expert", "especialista", "enterprise", "profissional", "produção", "specialist",
            "professional", "production", "scalable",
        ],
    ),
];

/// Task-type trigger phrases (pt/en), in tie-break order.
///
/// `Testing` and `Deployment` carry no trigger phrases; they can only win
/// through an agent-context bonus.
const TYPE_RULES: [(TaskType, &[&str]); 8] = [
    (
        TaskType::Coding,
        &[
            "código", "programar", "implementar", "desenvolver", "code", "program", "implement",
            "develop", "build", "create",
        ],
    ),
    (
        TaskType::Ideation,
        &[
            "ideia", "brainstorm", "criativo", "inovação", "conceito", "idea", "creative",
            "innovation", "concept", "generate",
        ],
    ),
    (
        TaskType::Architecture,
        &[
            "arquitetura", "design", "estrutura", "sistema", "padrão", "architecture",
            "structure", "system", "pattern", "blueprint",
        ],
    ),
    (
        TaskType::Debugging,
        &[
            "debug", "erro", "bug", "consertar", "corrigir", "problema", "error", "fix",
            "correct", "problem", "issue",
        ],
    ),
    (
        TaskType::Analysis,
        &[
            "análise", "analisar", "revisar", "examinar", "avaliar", "analysis", "analyze",
            "review", "examine", "evaluate", "assess",
        ],
    ),
    (
        TaskType::Documentation,
        &[
            "documentação", "documenta", "readme", "docs", "manual", "documentation",
            "document", "guide",
        ],
    ),
    (TaskType::Testing, &[]),
    (TaskType::Deployment, &[]),
];

/// Infrastructure vocabulary that marks expert-tier work, +1 each.
const TECHNICAL_INDICATORS: &[&str] = &[
    "microservices",
    "kubernetes",
    "docker",
    "ci/cd",
    "terraform",
    "scalability",
    "performance",
    "security",
    "enterprise",
    "production",
];

/// Calling-agent identifiers and the task-type bonus each one carries.
const AGENT_TYPE_BONUSES: &[(&str, TaskType, u32)] = &[
    ("ideator", TaskType::Ideation, 3),
    ("architect", TaskType::Architecture, 3),
    ("builder", TaskType::Coding, 3),
    ("developer", TaskType::Coding, 2),
    ("reviewer", TaskType::Analysis, 3),
];

// ── Classifier ─────────────────────────────────────────────────────────

/// Deterministic lexical task classifier.
///
/// Stateless and cheap to construct.  Classification is a case-insensitive
/// substring scan over the task text plus a handful of context lookups.
///
/// # Panics
///
/// This type and its methods never panic.
#[derive(Debug, Clone, Default)]
pub struct TaskClassifier;

impl TaskClassifier {
    /// Create a new classifier.
    pub fn new() -> Self {
        Self
    }

    /// Classify a task into a [`TaskProfile`].
    ///
    /// # Arguments
    ///
    /// * `text` — The raw task description.
    /// * `context` — Context attributes (may be empty).
    ///
    /// # Returns
    ///
    /// A [`TaskProfile`]; never "unknown", never an error.
    ///
    /// # Panics
    ///
    /// This function never panics.
    pub fn classify(&self, text: &str, context: &TaskContext) -> TaskProfile {
        TaskProfile {
            task_type: self.classify_type(text, context),
            complexity: self.classify_complexity(text, context),
        }
    }

    /// Infer the task type from trigger phrases and agent context.
    ///
    /// # Panics
    ///
    /// This function never panics.
    pub fn classify_type(&self, text: &str, context: &TaskContext) -> TaskType {
        let lower = text.to_lowercase();

        let mut scores: Vec<(TaskType, u32)> = TYPE_RULES
            .iter()
            .map(|(task_type, triggers)| (*task_type, count_triggers(&lower, triggers)))
            .collect();

        if let Some(agent) = context.get("agent") {
            for (name, task_type, bonus) in AGENT_TYPE_BONUSES {
                if agent == name {
                    bump(&mut scores, *task_type, *bonus);
                }
            }
        }

        pick(&scores)
    }

    /// Infer the task complexity from trigger phrases, context, and length.
    ///
    /// # Panics
    ///
    /// This function never panics.
    pub fn classify_complexity(&self, text: &str, context: &TaskContext) -> TaskComplexity {
        let lower = text.to_lowercase();

        let mut scores: Vec<(TaskComplexity, u32)> = COMPLEXITY_RULES
            .iter()
            .map(|(complexity, triggers)| (*complexity, count_triggers(&lower, triggers)))
            .collect();

        if let Some(scale) = context.get("project_scale") {
            match scale.as_str() {
                "enterprise" | "large" => bump(&mut scores, TaskComplexity::Expert, 2),
                "startup" | "medium" => bump(&mut scores, TaskComplexity::Complex, 1),
                _ => {}
            }
        }

        // Length band: long texts tend to describe harder work.  The bands
        // are exclusive so a very long text counts towards expert only.
        let chars = text.chars().count();
        if chars > 1000 {
            bump(&mut scores, TaskComplexity::Expert, 1);
        } else if chars > 500 {
            bump(&mut scores, TaskComplexity::Complex, 1);
        }

        bump(
            &mut scores,
            TaskComplexity::Expert,
            count_triggers(&lower, TECHNICAL_INDICATORS),
        );

        pick(&scores)
    }
}

/// Count how many trigger phrases occur in the (already lowered) text.
fn count_triggers(lower: &str, triggers: &[&str]) -> u32 {
    triggers.iter().filter(|t| lower.contains(*t)).count() as u32
}

/// Add `bonus` to the score of `category`.
fn bump<T: PartialEq>(scores: &mut [(T, u32)], category: T, bonus: u32) {
    for (cat, score) in scores.iter_mut() {
        if *cat == category {
            *score += bonus;
        }
    }
}

/// Return the category with the strictly highest score; ties keep the
/// earliest entry, so slice order is the tie-break contract.
fn pick<T: Copy>(scores: &[(T, u32)]) -> T {
    let mut best = scores[0];
    for &(category, score) in &scores[1..] {
        if score > best.1 {
            best = (category, score);
        }
    }
    best.0
}

// ── Tests ──────────────────────────────────────────────────────────────
