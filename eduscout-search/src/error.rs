//! Error types for eduscout-search
//!
//! Only two things fail a search: bad input and an unavailable provider on the
//! primary fetch. Alternate-term failures are absorbed by the orchestrator and
//! surface in `SearchFeedback::failed_alternates`.

use crate::types::ProviderError;
use thiserror::Error;

/// Search engine error type
#[derive(Debug, Error)]
pub enum SearchError {
    /// Primary fetch could not be attempted or failed entirely
    #[error("Content provider unavailable for '{query}': {source}")]
    ProviderUnavailable {
        query: String,
        #[source]
        source: ProviderError,
    },

    /// Invalid request (empty term etc.)
    #[error("Invalid request: {0}")]
    InvalidInput(String),

    /// Engine configuration rejected
    #[error("Configuration error: {0}")]
    Config(String),

    /// eduscout-common error
    #[error("Common error: {0}")]
    Common(#[from] eduscout_common::Error),
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, SearchError>;
