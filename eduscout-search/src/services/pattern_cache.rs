//! Pattern Cache
//!
//! Bounded, context-keyed memory of query terms that previously produced
//! high-confidence results. Consulted to front-load alternate queries.
//!
//! **Bounds:**
//! - Per key: at most `max_terms_per_key` terms, oldest evicted first (FIFO)
//! - Global: at most `max_keys` context keys, least-recently-updated evicted
//!
//! All access goes through one mutex, so concurrent searches for the same
//! context never lose updates.
//!
//! **Snapshot format:** `{"<subject>|<grade>": ["term", ...]}`, terms oldest
//! first. Malformed entries are discarded on restore.

use crate::config::CacheConfig;
use crate::models::ContextKey;
use eduscout_common::Result;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

#[derive(Debug, Default)]
struct CacheEntry {
    terms: VecDeque<String>,
    /// Logical clock value of the last update
    updated_at: u64,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<ContextKey, CacheEntry>,
    clock: u64,
}

/// Outcome of restoring a snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestoreReport {
    /// Context keys loaded
    pub loaded: usize,
    /// Entries (or whole documents) discarded as malformed
    pub discarded: usize,
}

/// Pattern cache shared by all searches of one orchestrator
#[derive(Debug)]
pub struct PatternCache {
    state: Mutex<CacheState>,
    max_terms_per_key: usize,
    max_keys: usize,
}

impl PatternCache {
    pub fn new(max_terms_per_key: usize, max_keys: usize) -> Self {
        Self {
            state: Mutex::new(CacheState::default()),
            max_terms_per_key: max_terms_per_key.max(1),
            max_keys: max_keys.max(1),
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.max_terms_per_key, config.max_keys)
    }

    /// Cache state is best-effort: a panic mid-update leaves it usable
    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append unseen terms for `key`, evicting beyond the bounds.
    ///
    /// Returns the number of terms added.
    pub fn record(&self, key: &ContextKey, terms: &[String]) -> usize {
        let mut state = self.lock();
        let added = Self::record_locked(&mut state, key, terms, self.max_terms_per_key);
        if added > 0 {
            self.evict_keys_locked(&mut state, key);
            debug!(key = %key, added, "Recorded successful query terms");
        }
        added
    }

    fn record_locked(
        state: &mut CacheState,
        key: &ContextKey,
        terms: &[String],
        max_terms: usize,
    ) -> usize {
        let fresh: Vec<&str> = terms
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .collect();
        if fresh.is_empty() {
            return 0;
        }

        state.clock += 1;
        let clock = state.clock;
        let entry = state.entries.entry(key.clone()).or_default();

        let mut added = 0;
        for term in fresh {
            let folded = term.to_lowercase();
            let duplicate = entry.terms.iter().any(|t| t.to_lowercase() == folded);
            if !duplicate {
                entry.terms.push_back(term.to_string());
                added += 1;
            }
        }
        while entry.terms.len() > max_terms {
            entry.terms.pop_front();
        }
        if added > 0 {
            entry.updated_at = clock;
        } else if entry.terms.is_empty() {
            state.entries.remove(key);
        }
        added
    }

    fn evict_keys_locked(&self, state: &mut CacheState, keep: &ContextKey) {
        while state.entries.len() > self.max_keys {
            let oldest = state
                .entries
                .iter()
                .filter(|(k, _)| *k != keep)
                .min_by_key(|(_, e)| e.updated_at)
                .map(|(k, _)| k.clone());
            match oldest {
                Some(k) => {
                    debug!(key = %k, "Evicting least-recently-updated context key");
                    state.entries.remove(&k);
                }
                None => break,
            }
        }
    }

    /// Cached terms for `key`, oldest first
    pub fn lookup(&self, key: &ContextKey) -> Vec<String> {
        self.lock()
            .entries
            .get(key)
            .map(|e| e.terms.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of context keys
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of terms across all keys
    pub fn total_terms(&self) -> usize {
        self.lock().entries.values().map(|e| e.terms.len()).sum()
    }

    pub fn clear(&self) {
        let mut state = self.lock();
        state.entries.clear();
        state.clock = 0;
    }

    /// Copy of the cache keyed by `subject|grade`
    pub fn snapshot(&self) -> BTreeMap<String, Vec<String>> {
        self.lock()
            .entries
            .iter()
            .map(|(k, e)| (k.to_string(), e.terms.iter().cloned().collect()))
            .collect()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.snapshot())?)
    }

    /// Load a snapshot produced by [`to_json`](Self::to_json).
    ///
    /// Never fails: malformed entries, or a malformed document, are discarded
    /// with a warning and counted in the report.
    pub fn restore_json(&self, json: &str) -> RestoreReport {
        let mut report = RestoreReport::default();

        let document: Value = match serde_json::from_str(json) {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "Discarding unreadable pattern cache snapshot");
                report.discarded = 1;
                return report;
            }
        };
        let Some(object) = document.as_object() else {
            warn!("Discarding pattern cache snapshot: top level is not an object");
            report.discarded = 1;
            return report;
        };

        let mut state = self.lock();
        for (raw_key, value) in object {
            let Some(key) = ContextKey::parse(raw_key) else {
                warn!(key = %raw_key, "Discarding cache entry with malformed key");
                report.discarded += 1;
                continue;
            };
            let terms: Option<Vec<String>> = value.as_array().and_then(|items| {
                items
                    .iter()
                    .map(|t| t.as_str().map(str::to_string))
                    .collect()
            });
            let Some(terms) = terms else {
                warn!(key = %raw_key, "Discarding cache entry with malformed terms");
                report.discarded += 1;
                continue;
            };

            if Self::record_locked(&mut state, &key, &terms, self.max_terms_per_key) > 0 {
                self.evict_keys_locked(&mut state, &key);
                report.loaded += 1;
            }
        }

        debug!(loaded = report.loaded, discarded = report.discarded, "Pattern cache restored");
        report
    }
}
