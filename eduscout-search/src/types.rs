//! Content provider boundary
//!
//! The orchestrator talks to exactly one external dependency, a
//! [`ContentProvider`]. Provider outcomes are an explicit [`FetchOutcome`]:
//! "no results" is `Empty`, never an error.

use crate::models::CandidateItem;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Preferred duration band passed to the provider
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurationBand {
    #[default]
    Any,
    /// Under 4 minutes
    Short,
    /// 4 to 20 minutes
    Medium,
    /// Over 20 minutes
    Long,
}

impl DurationBand {
    /// Band containing a target duration, `Any` when there is no target
    pub fn from_target_minutes(minutes: Option<u32>) -> Self {
        match minutes {
            None => DurationBand::Any,
            Some(m) if m < 4 => DurationBand::Short,
            Some(m) if m <= 20 => DurationBand::Medium,
            Some(_) => DurationBand::Long,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DurationBand::Any => "any",
            DurationBand::Short => "short",
            DurationBand::Medium => "medium",
            DurationBand::Long => "long",
        }
    }
}

/// Provider-side filters for one request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilters {
    pub safe_mode: bool,
    pub preferred_duration_band: DurationBand,
}

impl Default for SearchFilters {
    fn default() -> Self {
        Self {
            safe_mode: true,
            preferred_duration_band: DurationBand::Any,
        }
    }
}

/// Unrecoverable (after retries) provider failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("Provider credentials not configured")]
    MissingCredentials,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {0} ms")]
    Timeout(u64),

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("Provider quota exceeded")]
    QuotaExceeded,

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl ProviderError {
    /// Worth retrying: the same request may succeed later
    pub fn is_transient(&self) -> bool {
        match self {
            ProviderError::Network(_) | ProviderError::Timeout(_) | ProviderError::RateLimited => {
                true
            }
            ProviderError::Api(status, _) => *status >= 500,
            _ => false,
        }
    }
}

/// Outcome of one provider request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Items(Vec<CandidateItem>),
    Empty,
    Failed(ProviderError),
}

impl FetchOutcome {
    /// `Empty` for an empty list, `Items` otherwise
    pub fn from_items(items: Vec<CandidateItem>) -> Self {
        if items.is_empty() {
            FetchOutcome::Empty
        } else {
            FetchOutcome::Items(items)
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, FetchOutcome::Failed(_))
    }

    /// Collapse into a `Result`, `Empty` becoming an empty list
    pub fn into_result(self) -> Result<Vec<CandidateItem>, ProviderError> {
        match self {
            FetchOutcome::Items(items) => Ok(items),
            FetchOutcome::Empty => Ok(Vec::new()),
            FetchOutcome::Failed(e) => Err(e),
        }
    }
}

/// External content provider
///
/// Implementations must be safe to retry, return [`FetchOutcome::Empty`] for
/// "no results", and reserve [`FetchOutcome::Failed`] for unrecoverable
/// transport, auth or credential failures.
///
/// # Example
/// ```rust,ignore
/// use eduscout_search::types::{ContentProvider, FetchOutcome, SearchFilters};
///
/// struct NothingProvider;
///
/// #[async_trait::async_trait]
/// impl ContentProvider for NothingProvider {
///     fn name(&self) -> &'static str { "nothing" }
///
///     async fn search(&self, _query: &str, _max: usize, _filters: &SearchFilters) -> FetchOutcome {
///         FetchOutcome::Empty
///     }
/// }
/// ```
#[async_trait::async_trait]
pub trait ContentProvider: Send + Sync {
    /// Provider name for logging
    fn name(&self) -> &'static str;

    /// Search for up to `max_results` candidates matching `query`
    async fn search(&self, query: &str, max_results: usize, filters: &SearchFilters) -> FetchOutcome;
}
