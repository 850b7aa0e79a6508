//! Routing decision memoization.
//!
//! The cache keys a full [`RoutingDecision`] by a fingerprint of the task
//! text and a canonical (key-sorted) serialization of the context, so two
//! requests that differ only in context insertion order share an entry.
//! Hits return the stored decision verbatim, original timestamp included;
//! no availability re-validation happens on the hit path.
//!
//! Unlike a plain memo table the cache is bounded: a fixed capacity with
//! FIFO eviction plus a time-to-live, so stale decisions age out as backend
//! availability and metrics drift.  Entries are never overwritten; the
//! first decision stored for a fingerprint stands until it expires or is
//! evicted.
//!
//! A single coarse mutex serializes check-then-insert; decisions are cheap
//! relative to the model call they precede, so contention is negligible.

use super::classifier::TaskContext;
use super::router::RoutingDecision;
use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, VecDeque};
use std::hash::{Hash, Hasher};
use std::sync::Mutex;
use std::time::{Duration, Instant};

// ── Fingerprinting ─────────────────────────────────────────────────────

/// Compute the cache key for a (task text, context) pair.
///
/// Context pairs are hashed in key order, so the fingerprint is independent
/// of map iteration order.  Stable within a process, which is all the cache
/// needs; nothing is persisted.
///
/// # Panics
///
/// This function never panics.
pub fn fingerprint(text: &str, context: &TaskContext) -> u64 {
    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);

    let mut pairs: Vec<(&String, &String)> = context.iter().collect();
    pairs.sort();
    for (key, value) in pairs {
        key.hash(&mut hasher);
        value.hash(&mut hasher);
    }

    hasher.finish()
}

// ── Cache ──────────────────────────────────────────────────────────────

struct CacheEntry {
    decision: RoutingDecision,
    inserted_at: Instant,
}

struct CacheInner {
    entries: HashMap<u64, CacheEntry>,
    /// Insertion order for FIFO eviction.
    order: VecDeque<u64>,
}

/// Bounded, expiring store of [`RoutingDecision`]s.
///
/// # Panics
///
/// This type and its methods never panic.
pub struct DecisionCache {
    capacity: usize,
    ttl: Duration,
    inner: Mutex<CacheInner>,
}

impl std::fmt::Debug for DecisionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecisionCache")
            .field("capacity", &self.capacity)
            .field("ttl", &self.ttl)
            .field("len", &self.len())
            .finish()
    }
}

impl DecisionCache {
    /// Create a cache with the given entry capacity and time-to-live.
    ///
    /// A capacity of zero disables caching entirely.
    ///
    /// # Panics
    ///
    /// This function never panics.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            capacity,
            ttl,
            inner: Mutex::new(CacheInner {
                entries: HashMap::new(),
                order: VecDeque::new(),
            }),
        }
    }

    /// Look up a previously stored decision.
    ///
    /// Expired entries are dropped and reported as misses.
    ///
    /// # Returns
    ///
    /// A clone of the stored decision, timestamp untouched, or `None`.
    ///
    /// # Panics
    ///
    /// This function never panics.
    pub fn get(&self, fingerprint: u64) -> Option<RoutingDecision> {
        let Ok(mut inner) = self.inner.lock() else {
            return None;
        };
        let expired = match inner.entries.get(&fingerprint) {
            Some(entry) if entry.inserted_at.elapsed() < self.ttl => {
                return Some(entry.decision.clone());
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            inner.entries.remove(&fingerprint);
            inner.order.retain(|key| *key != fingerprint);
        }
        None
    }

    /// Store a decision under `fingerprint`.
    ///
    /// A fingerprint already present keeps its existing decision; stored
    /// decisions are immutable.  When the cache is full the oldest entry
    /// is evicted first.
    ///
    /// # Panics
    ///
    /// This function never panics.
    pub fn insert(&self, fingerprint: u64, decision: RoutingDecision) {
        if self.capacity == 0 {
            return;
        }
        let Ok(mut inner) = self.inner.lock() else {
            return;
        };
        if inner.entries.contains_key(&fingerprint) {
            return;
        }
        while inner.entries.len() >= self.capacity {
            match inner.order.pop_front() {
                Some(oldest) => {
                    inner.entries.remove(&oldest);
                }
                None => break,
            }
        }
        inner.entries.insert(
            fingerprint,
            CacheEntry {
                decision,
                inserted_at: Instant::now(),
            },
        );
        inner.order.push_back(fingerprint);
    }

    /// Number of live entries (expired ones may still be counted until
    /// their next lookup).
    ///
    /// # Panics
    ///
    /// This function never panics.
    pub fn len(&self) -> usize {
        self.inner.lock().map(|inner| inner.entries.len()).unwrap_or(0)
    }

    /// Return `true` if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ── Tests ──────────────────────────────────────────────────────────────
