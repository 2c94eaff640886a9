//! Search orchestrator
//!
//! # State Progression
//! INIT → PRIMARY_SEARCH → SCORING → FALLBACK_CHECK → [FALLBACK_SEARCH] →
//! COMBINE → LEARN → METRICS_UPDATE → DONE
//!
//! The primary fetch is the only hard failure: if it fails or times out the
//! search ends in FAILED and `SearchError::ProviderUnavailable` is returned.
//! Alternate-term fetches run with bounded concurrency; a failed or timed-out
//! alternate is logged, skipped and reported in `SearchFeedback::failed_alternates`.
//!
//! The orchestrator owns its pattern cache and statistics. Both are behind
//! locks, so one instance can serve concurrent searches.

mod statistics;

pub use statistics::{PerformanceMetrics, SearchStatistics};

use crate::config::{EngineConfig, SearchConfig};
use crate::error::{EngineResult, SearchError};
use crate::models::{
    mean_confidence, CandidateItem, ScoredCandidate, SearchContext, SearchFeedback, SearchPass,
    SearchPhase, SearchResult, SearchSession, SearchStrategy, Thresholds,
};
use crate::services::fallback_decider::should_fallback;
use crate::services::query_expander::merge_alternates;
use crate::services::result_combiner::combine;
use crate::services::{CandidateScorer, PatternCache, QueryExpander, ThresholdProvider};
use crate::types::{ContentProvider, DurationBand, FetchOutcome, ProviderError, SearchFilters};
use futures::stream::{self, StreamExt};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Contextual search orchestrator
pub struct SearchOrchestrator {
    provider: Arc<dyn ContentProvider>,
    expander: QueryExpander,
    scorer: CandidateScorer,
    threshold_provider: ThresholdProvider,
    cache: Arc<PatternCache>,
    statistics: SearchStatistics,
    settings: SearchConfig,
}

/// Outcome of one alternate-term fetch, tagged with its position in the
/// alternate list so completion order never leaks into results
struct AlternateFetch {
    index: usize,
    term: String,
    outcome: FetchOutcome,
}

impl SearchOrchestrator {
    /// Create an orchestrator with an empty pattern cache
    pub fn new(provider: Arc<dyn ContentProvider>, config: &EngineConfig) -> Self {
        Self {
            provider,
            expander: QueryExpander::new(&config.expansion),
            scorer: CandidateScorer::new(&config.scoring),
            threshold_provider: ThresholdProvider::new(&config.thresholds),
            cache: Arc::new(PatternCache::from_config(&config.cache)),
            statistics: SearchStatistics::new(),
            settings: config.search.clone(),
        }
    }

    /// Use a caller-supplied (e.g. restored or shared) pattern cache
    pub fn with_cache(mut self, cache: Arc<PatternCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn cache(&self) -> &Arc<PatternCache> {
        &self.cache
    }

    /// Thresholds applied to `context`
    pub fn thresholds_for(&self, context: &SearchContext) -> Thresholds {
        self.threshold_provider.thresholds(context)
    }

    /// Alternate terms a fallback for `primary_term` would try, in order:
    /// cached terms (most recent first), the context's previously successful
    /// terms, then generated expansions. Capped at `max_alternates`.
    pub fn alternates_for(&self, primary_term: &str, context: &SearchContext) -> Vec<String> {
        let mut cached = self.cache.lookup(&context.cache_key());
        cached.reverse();
        let generated = self.expander.expand(primary_term, context);

        merge_alternates(
            &[
                cached.as_slice(),
                context.previous_successful_terms(),
                generated.as_slice(),
            ],
            primary_term.trim(),
            self.settings.max_alternates,
        )
    }

    /// Search for content matching `primary_term` in `context`
    ///
    /// # Errors
    /// - `InvalidInput` for an empty term (nothing is fetched or counted)
    /// - `ProviderUnavailable` when the primary fetch fails or times out
    pub async fn search(&self, primary_term: &str, context: &SearchContext) -> EngineResult<SearchResult> {
        let term = primary_term.trim();
        if term.is_empty() {
            return Err(SearchError::InvalidInput("search term is empty".to_string()));
        }

        let mut session = SearchSession::new(term);
        let thresholds = self.threshold_provider.thresholds(context);
        let filters = SearchFilters {
            safe_mode: self.settings.safe_mode,
            preferred_duration_band: DurationBand::from_target_minutes(context.target_duration_minutes()),
        };

        // PRIMARY_SEARCH
        session.transition_to(SearchPhase::PrimarySearch);
        let primary_items = match self.fetch(term, &filters).await.into_result() {
            Ok(items) => items,
            Err(source) => {
                session.transition_to(SearchPhase::Failed);
                self.statistics.record_failed();
                warn!(
                    term = %term,
                    provider = self.provider.name(),
                    error = %source,
                    "Primary fetch failed"
                );
                return Err(SearchError::ProviderUnavailable {
                    query: term.to_string(),
                    source,
                });
            }
        };

        // SCORING
        session.transition_to(SearchPhase::Scoring);
        let examined = AtomicUsize::new(primary_items.len());
        let primary_pass = SearchPass::primary(term, self.score_all(&primary_items, context, term));
        debug!(
            term = %term,
            candidates = primary_items.len(),
            "Primary pass scored"
        );

        // FALLBACK_CHECK
        session.transition_to(SearchPhase::FallbackCheck);
        let accepted: Vec<ScoredCandidate> = primary_pass
            .candidates
            .iter()
            .filter(|c| c.is_accepted())
            .cloned()
            .collect();
        let decision = should_fallback(&accepted, &thresholds);
        debug!(
            term = %term,
            triggered = decision.triggered,
            reason = %decision.reason,
            "Fallback decision"
        );

        let mut passes = vec![primary_pass];
        let mut query_terms_used = vec![term.to_string()];
        let mut failed_alternates = Vec::new();

        if decision.triggered {
            // FALLBACK_SEARCH
            session.transition_to(SearchPhase::FallbackSearch);
            let alternates = self.alternates_for(term, context);
            query_terms_used.extend(alternates.iter().cloned());

            for fetch in self.fetch_alternates(&alternates, &filters, &examined).await {
                match fetch.outcome.into_result() {
                    Ok(items) => {
                        debug!(
                            term = %fetch.term,
                            index = fetch.index,
                            candidates = items.len(),
                            "Alternate pass scored"
                        );
                        let scored = self.score_all(&items, context, &fetch.term);
                        passes.push(SearchPass::fallback(fetch.term, scored));
                    }
                    Err(e) => {
                        warn!(term = %fetch.term, error = %e, "Alternate fetch failed, skipping");
                        failed_alternates.push(fetch.term);
                    }
                }
            }
        }
        let ran_alternates = passes.len() > 1 || !failed_alternates.is_empty();

        // COMBINE
        session.transition_to(SearchPhase::Combine);
        let combined = combine(&passes, self.settings.max_results);

        // LEARN
        session.transition_to(SearchPhase::Learn);
        let successful_terms: Vec<String> = passes
            .iter()
            .filter(|p| p.has_success_at(self.settings.success_confidence))
            .map(|p| p.query_term.clone())
            .collect();
        if !successful_terms.is_empty() {
            self.cache.record(&context.cache_key(), &successful_terms);
        }

        // METRICS_UPDATE
        session.transition_to(SearchPhase::MetricsUpdate);
        let average_confidence = mean_confidence(&combined.results);
        self.statistics
            .record_completed(combined.results.len(), average_confidence, decision.triggered);

        session.transition_to(SearchPhase::Done);

        let result = SearchResult {
            query_terms_used,
            average_confidence,
            total_candidates_examined: examined.load(Ordering::Relaxed),
            fallback_triggered: decision.triggered,
            strategy: if ran_alternates {
                SearchStrategy::FallbackEnhanced
            } else {
                SearchStrategy::PrimaryOnly
            },
            feedback: SearchFeedback {
                primary_results: combined.primary_count,
                fallback_results: combined.fallback_count,
                filtered_out_count: combined.filtered_out_count,
                reasons_filtered: combined.reasons_filtered,
                fallback_reason: decision.reason,
                failed_alternates,
            },
            thresholds,
            elapsed_ms: session.elapsed().as_millis() as u64,
            results: combined.results,
        };

        info!(
            term = %term,
            context = %context.cache_key(),
            results = result.results.len(),
            average_confidence = format!("{:.1}", result.average_confidence),
            strategy = result.strategy.as_str(),
            examined = result.total_candidates_examined,
            elapsed_ms = result.elapsed_ms,
            "Search complete"
        );

        Ok(result)
    }

    /// Counters plus current cache size
    pub fn performance_metrics(&self) -> PerformanceMetrics {
        self.statistics
            .snapshot(self.cache.len(), self.cache.total_terms())
    }

    pub fn reset_metrics(&self) {
        self.statistics.reset();
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    fn score_all(&self, items: &[CandidateItem], context: &SearchContext, query_term: &str) -> Vec<ScoredCandidate> {
        items
            .iter()
            .map(|item| self.scorer.score(item, context, query_term))
            .collect()
    }

    /// One provider request bounded by the per-call timeout
    async fn fetch(&self, query: &str, filters: &SearchFilters) -> FetchOutcome {
        let timeout_ms = self.settings.request_timeout_ms;
        let request = self
            .provider
            .search(query, self.settings.provider_max_results, filters);

        match tokio::time::timeout(Duration::from_millis(timeout_ms), request).await {
            Ok(outcome) => outcome,
            Err(_) => FetchOutcome::Failed(ProviderError::Timeout(timeout_ms)),
        }
    }

    /// Fetch alternates with at most `max_concurrent_fetches` in flight.
    ///
    /// Returned in alternate order regardless of completion order.
    async fn fetch_alternates(
        &self,
        alternates: &[String],
        filters: &SearchFilters,
        examined: &AtomicUsize,
    ) -> Vec<AlternateFetch> {
        let mut fetches: Vec<AlternateFetch> = stream::iter(alternates.iter().cloned().enumerate())
            .map(move |(index, term)| async move {
                let outcome = self.fetch(&term, filters).await;
                if let FetchOutcome::Items(items) = &outcome {
                    examined.fetch_add(items.len(), Ordering::Relaxed);
                }
                AlternateFetch { index, term, outcome }
            })
            .buffer_unordered(self.settings.max_concurrent_fetches.max(1))
            .collect()
            .await;

        fetches.sort_by_key(|f| f.index);
        fetches
    }
}
