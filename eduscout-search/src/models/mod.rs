//! Data models for eduscout-search

pub mod candidate;
pub mod context;
pub mod search_result;
pub mod search_session;

pub use candidate::{CandidateItem, ScoredCandidate, SearchPass};
pub use context::{ContextKey, GradeBand, SearchContext, SearchPreferences, Subject};
pub use search_result::{mean_confidence, SearchFeedback, SearchResult, SearchStrategy, Thresholds};
pub use search_session::{PhaseTransition, SearchPhase, SearchSession};
