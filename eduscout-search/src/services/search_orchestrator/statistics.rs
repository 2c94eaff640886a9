//! Search performance statistics
//!
//! Best-effort counters owned by one orchestrator. Safe to reset at any time:
//! they never influence search results.

use serde::{Deserialize, Serialize};
use std::sync::{Mutex, PoisonError};

/// Snapshot returned by `SearchOrchestrator::performance_metrics`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    /// Every search that passed input validation
    pub total_searches: u64,
    /// Searches that returned at least one result
    pub successful_searches: u64,
    /// Searches that failed with `ProviderUnavailable`
    pub failed_searches: u64,
    /// Searches that ran fallback passes
    pub fallback_searches: u64,
    /// `fallback_searches / total_searches` (0.0 before any search)
    pub fallback_rate: f64,
    /// Mean of per-search average confidence over successful searches
    pub average_confidence: f64,
    /// Context keys in the pattern cache
    pub cache_size: usize,
    /// Terms across all cache keys
    pub cached_terms: usize,
}

impl PerformanceMetrics {
    pub fn display_string(&self) -> String {
        format!(
            "{} searches ({} successful, {} failed), fallback rate {:.0}%, average confidence {:.1}, {} cached contexts",
            self.total_searches,
            self.successful_searches,
            self.failed_searches,
            self.fallback_rate * 100.0,
            self.average_confidence,
            self.cache_size
        )
    }
}

#[derive(Debug, Default)]
struct Counters {
    total: u64,
    successful: u64,
    failed: u64,
    fallback: u64,
    confidence_sum: f64,
}

/// Thread-safe search counters
#[derive(Debug, Default)]
pub struct SearchStatistics {
    counters: Mutex<Counters>,
}

impl SearchStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_counters<R>(&self, f: impl FnOnce(&mut Counters) -> R) -> R {
        let mut counters = self.counters.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut counters)
    }

    /// Record a completed search
    pub fn record_completed(&self, result_count: usize, average_confidence: f64, fallback_triggered: bool) {
        self.with_counters(|c| {
            c.total += 1;
            if fallback_triggered {
                c.fallback += 1;
            }
            if result_count > 0 {
                c.successful += 1;
                c.confidence_sum += average_confidence;
            }
        });
    }

    /// Record a search that failed on the primary fetch
    pub fn record_failed(&self) {
        self.with_counters(|c| {
            c.total += 1;
            c.failed += 1;
        });
    }

    pub fn reset(&self) {
        self.with_counters(|c| *c = Counters::default());
    }

    pub fn snapshot(&self, cache_size: usize, cached_terms: usize) -> PerformanceMetrics {
        self.with_counters(|c| PerformanceMetrics {
            total_searches: c.total,
            successful_searches: c.successful,
            failed_searches: c.failed,
            fallback_searches: c.fallback,
            fallback_rate: ratio(c.fallback as f64, c.total),
            average_confidence: ratio(c.confidence_sum, c.successful),
            cache_size,
            cached_terms,
        })
    }
}

fn ratio(numerator: f64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator / denominator as f64
    }
}
