//! Result Combiner/Ranker
//!
//! Flattens passes in order (primary first), drops disqualified candidates,
//! keeps the first occurrence of each identifier, stable-sorts by confidence
//! descending and truncates.

use crate::models::{ScoredCandidate, SearchPass};
use std::collections::HashSet;

/// Combined output plus the bookkeeping that feeds `SearchFeedback`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CombinedResults {
    pub results: Vec<ScoredCandidate>,
    /// Results that came from the primary pass
    pub primary_count: usize,
    /// Results that came from alternate passes
    pub fallback_count: usize,
    /// Distinct identifiers that were disqualified and never accepted
    pub filtered_out_count: usize,
    /// Distinct filter reasons, first-seen order
    pub reasons_filtered: Vec<String>,
}

/// Combine passes into a single ranked list of at most `max_results`
pub fn combine(passes: &[SearchPass], max_results: usize) -> CombinedResults {
    let mut seen_ids: HashSet<&str> = HashSet::new();
    let mut rejected_ids: HashSet<&str> = HashSet::new();
    let mut reasons: Vec<String> = Vec::new();
    let mut merged: Vec<(bool, ScoredCandidate)> = Vec::new();

    for pass in passes {
        for candidate in &pass.candidates {
            if !candidate.is_accepted() {
                rejected_ids.insert(candidate.id());
                for reason in &candidate.filter_reasons {
                    if !reasons.contains(reason) {
                        reasons.push(reason.clone());
                    }
                }
                continue;
            }
            if seen_ids.insert(candidate.id()) {
                merged.push((pass.is_primary, candidate.clone()));
            }
        }
    }

    // Stable: ties keep pass/provider order
    merged.sort_by(|a, b| b.1.confidence.cmp(&a.1.confidence));
    merged.truncate(max_results);

    let filtered_out_count = rejected_ids.difference(&seen_ids).count();
    let primary_count = merged.iter().filter(|(primary, _)| *primary).count();

    CombinedResults {
        primary_count,
        fallback_count: merged.len() - primary_count,
        filtered_out_count,
        reasons_filtered: reasons,
        results: merged.into_iter().map(|(_, c)| c).collect(),
    }
}
