// crates/puckboard-cache/src/ttl.rs
// ============================================================================
// Module: TTL Cache
// Description: In-process mapping from opaque key to value with expiry.
// Purpose: Bound reuse of upstream payloads and heavy computations.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! [`TtlCache`] maps deterministic string keys (endpoint + parameters) to
//! `(value, expires_at)` pairs. Reads go through [`TtlCache::get_valid`],
//! which runs a correctness predicate before returning a hit; entries that
//! fail the predicate are evicted so a poisoned payload can never be served
//! twice. Writers simply overwrite: entries are idempotent recomputations,
//! so last-writer-wins is correct.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::Duration;
use std::time::Instant;

use serde_json::Value;

// ============================================================================
// SECTION: Cache Surfaces
// ============================================================================

/// Cacheable surface with its TTL policy.
///
/// # Invariants
/// - TTLs match the serving contract; changing one changes observable
///   freshness behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CacheSurface {
    /// Live scoreboard by date.
    LiveScores,
    /// Daily schedule.
    Schedule,
    /// League standings by date.
    Standings,
    /// Skater/goalie leaders.
    Leaders,
    /// Player landing profile.
    PlayerLanding,
    /// Advanced team analytics (PFI/RTI/FSP bundle).
    AdvancedTeam,
    /// Cap and contract snapshots.
    CapSnapshots,
}

impl CacheSurface {
    /// Returns the TTL for this surface.
    #[must_use]
    pub const fn ttl(self) -> Duration {
        match self {
            Self::LiveScores => Duration::from_secs(15),
            Self::Schedule => Duration::from_secs(45),
            Self::Standings | Self::Leaders => Duration::from_secs(120),
            Self::PlayerLanding => Duration::from_secs(300),
            Self::AdvancedTeam | Self::CapSnapshots => Duration::from_secs(600),
        }
    }

    /// Returns a stable key prefix for this surface.
    #[must_use]
    pub const fn key_prefix(self) -> &'static str {
        match self {
            Self::LiveScores => "scores",
            Self::Schedule => "schedule",
            Self::Standings => "standings",
            Self::Leaders => "leaders",
            Self::PlayerLanding => "player_landing",
            Self::AdvancedTeam => "team_adv",
            Self::CapSnapshots => "cap",
        }
    }

    /// Builds the deterministic cache key for a parameter string.
    #[must_use]
    pub fn key(self, params: &str) -> String {
        format!("{}:{params}", self.key_prefix())
    }
}

// ============================================================================
// SECTION: Entry
// ============================================================================

/// One cache entry; immutable until expiry or invalidation.
#[derive(Debug, Clone)]
struct CacheEntry {
    /// Cached payload.
    value: Value,
    /// Expiry instant.
    expires_at: Instant,
}

// ============================================================================
// SECTION: Cache
// ============================================================================

/// In-process TTL cache keyed by opaque strings.
///
/// # Invariants
/// - The mutex is held only for map operations, never across I/O.
#[derive(Debug, Default)]
pub struct TtlCache {
    /// Entry map guarded for cross-task use.
    entries: Mutex<BTreeMap<String, CacheEntry>>,
}

impl TtlCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the entry for `key` when present and unexpired.
    #[must_use]
    pub fn get_if_fresh(&self, key: &str) -> Option<Value> {
        self.get_valid(key, |_| true)
    }

    /// Returns a fresh entry that also passes the correctness predicate.
    ///
    /// Entries failing the predicate are evicted immediately so the caller
    /// recomputes instead of re-serving a historically poisoned payload.
    #[must_use]
    pub fn get_valid(&self, key: &str, predicate: impl Fn(&Value) -> bool) -> Option<Value> {
        let Ok(mut entries) = self.entries.lock() else {
            return None;
        };
        let hit = entries.get(key).map(|entry| (entry.expires_at > Instant::now(), entry.value.clone()));
        match hit {
            Some((true, value)) if predicate(&value) => Some(value),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Stores a value under `key` for `ttl`.
    pub fn put(&self, key: impl Into<String>, value: Value, ttl: Duration) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(
                key.into(),
                CacheEntry {
                    value,
                    expires_at: Instant::now() + ttl,
                },
            );
        }
    }

    /// Removes the entry for `key`, if any.
    pub fn invalidate(&self, key: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(key);
        }
    }

    /// Removes every expired entry and returns how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let Ok(mut entries) = self.entries.lock() else {
            return 0;
        };
        let now = Instant::now();
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        before - entries.len()
    }

    /// Returns the number of live entries (expired entries may linger until
    /// their next read or a purge).
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    /// Returns true when the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
