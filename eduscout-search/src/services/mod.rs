//! Service modules for the search engine
//!
//! Pure components (expander, scorer, fallback decider, threshold provider,
//! combiner), the pattern cache, content providers, and the orchestrator that
//! sequences them.

pub mod candidate_scorer;
pub mod fallback_decider;
pub mod pattern_cache;
pub mod query_expander;
pub mod result_combiner;
pub mod search_orchestrator;
pub mod static_provider;
pub mod threshold_provider;
pub mod youtube_client;

pub use candidate_scorer::CandidateScorer;
pub use fallback_decider::{should_fallback, FallbackDecision};
pub use pattern_cache::{PatternCache, RestoreReport};
pub use query_expander::{merge_alternates, QueryExpander};
pub use result_combiner::{combine, CombinedResults};
pub use search_orchestrator::{PerformanceMetrics, SearchOrchestrator, SearchStatistics};
pub use static_provider::StaticProvider;
pub use threshold_provider::ThresholdProvider;
pub use youtube_client::YouTubeClient;
