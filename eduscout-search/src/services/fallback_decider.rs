//! Fallback Decision Function
//!
//! Decides whether the primary pass is good enough or alternate terms must be
//! tried. Rules, in order:
//!
//! 1. Fewer than `min_result_count` results at or above
//!    `fallback_confidence_threshold` → fallback (count shortfall)
//! 2. Mean confidence below `min_confidence` → fallback (mean shortfall)
//! 3. Otherwise no fallback
//!
//! An empty result set always falls back: its mean is defined as 0.

use crate::models::{mean_confidence, ScoredCandidate, Thresholds};
use serde::{Deserialize, Serialize};

/// Outcome of the fallback decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackDecision {
    pub triggered: bool,
    pub reason: String,
}

/// Decide whether to run fallback passes for `results`
pub fn should_fallback(results: &[ScoredCandidate], thresholds: &Thresholds) -> FallbackDecision {
    let qualifying = results
        .iter()
        .filter(|c| c.confidence >= thresholds.fallback_confidence_threshold)
        .count();

    if results.is_empty() || qualifying < thresholds.min_result_count {
        return FallbackDecision {
            triggered: true,
            reason: format!(
                "Only {} of {} required results reached confidence {}",
                qualifying, thresholds.min_result_count, thresholds.fallback_confidence_threshold
            ),
        };
    }

    let mean = mean_confidence(results);
    if mean < f64::from(thresholds.min_confidence) {
        return FallbackDecision {
            triggered: true,
            reason: format!(
                "Mean confidence {:.1} below minimum {}",
                mean, thresholds.min_confidence
            ),
        };
    }

    FallbackDecision {
        triggered: false,
        reason: format!(
            "{} results reached confidence {} with mean {:.1}",
            qualifying, thresholds.fallback_confidence_threshold, mean
        ),
    }
}
