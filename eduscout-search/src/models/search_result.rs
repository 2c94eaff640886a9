//! Search output types

use super::ScoredCandidate;
use serde::{Deserialize, Serialize};

/// Per-context thresholds driving the fallback decision. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Minimum acceptable mean confidence (0-100)
    pub min_confidence: u8,
    /// Required number of qualifying results
    pub min_result_count: usize,
    /// Confidence a result needs to count as qualifying (0-100)
    pub fallback_confidence_threshold: u8,
}

/// How the final result set was assembled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SearchStrategy {
    PrimaryOnly,
    FallbackEnhanced,
}

impl SearchStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchStrategy::PrimaryOnly => "primary-only",
            SearchStrategy::FallbackEnhanced => "fallback-enhanced",
        }
    }
}

/// Caller-visible diagnostics for one search
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFeedback {
    /// Final results that came from the primary pass
    pub primary_results: usize,
    /// Final results that came from alternate passes
    pub fallback_results: usize,
    /// Distinct candidates excluded by filter reasons
    pub filtered_out_count: usize,
    /// Distinct filter reasons, first-seen order
    pub reasons_filtered: Vec<String>,
    /// Why the fallback decision came out the way it did
    pub fallback_reason: String,
    /// Alternate terms whose fetch failed or timed out
    pub failed_alternates: Vec<String>,
}

/// Result of one `search` call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Highest confidence first; ties keep pass/provider order
    pub results: Vec<ScoredCandidate>,
    /// Primary term followed by every alternate attempted
    pub query_terms_used: Vec<String>,
    /// Mean confidence of `results` (0.0 when empty)
    pub average_confidence: f64,
    /// Raw candidates returned by the provider across all passes
    pub total_candidates_examined: usize,
    pub fallback_triggered: bool,
    pub strategy: SearchStrategy,
    pub feedback: SearchFeedback,
    pub thresholds: Thresholds,
    pub elapsed_ms: u64,
}

impl SearchResult {
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// Arithmetic mean of candidate confidences (0.0 for an empty slice)
pub fn mean_confidence(candidates: &[ScoredCandidate]) -> f64 {
    if candidates.is_empty() {
        return 0.0;
    }
    let total: u64 = candidates.iter().map(|c| u64::from(c.confidence)).sum();
    total as f64 / candidates.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CandidateItem;

    fn scored(confidence: u8) -> ScoredCandidate {
        ScoredCandidate {
            item: CandidateItem::new(format!("id-{confidence}"), "t"),
            confidence,
            educational_indicators: vec![],
            filter_reasons: vec![],
            query_term: "q".to_string(),
        }
    }

    #[test]
    fn test_mean_confidence() {
        assert_eq!(mean_confidence(&[]), 0.0);
        assert_eq!(mean_confidence(&[scored(50), scored(70)]), 60.0);
    }

    #[test]
    fn test_strategy_serializes_kebab_case() {
        let json = serde_json::to_string(&SearchStrategy::FallbackEnhanced).unwrap();
        assert_eq!(json, "\"fallback-enhanced\"");
        assert_eq!(SearchStrategy::PrimaryOnly.as_str(), "primary-only");
    }
}
