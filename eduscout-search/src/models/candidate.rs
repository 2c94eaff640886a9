//! Candidate records: raw provider items and their scored form

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Raw unit returned by a content provider. Provider-owned, read-only.
///
/// Every field beyond `id` defaults when absent, so scoring never has to
/// special-case missing metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateItem {
    /// Provider identifier (e.g. YouTube video ID)
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Channel or source name
    #[serde(default)]
    pub channel: String,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    /// Duration in seconds (0 when unknown)
    #[serde(default)]
    pub duration_seconds: u32,
    #[serde(default)]
    pub view_count: Option<u64>,
}

impl CandidateItem {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            channel: String::new(),
            published_at: None,
            duration_seconds: 0,
            view_count: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = channel.into();
        self
    }

    pub fn with_duration_seconds(mut self, seconds: u32) -> Self {
        self.duration_seconds = seconds;
        self
    }

    pub fn duration_minutes(&self) -> f64 {
        f64::from(self.duration_seconds) / 60.0
    }
}

/// Candidate plus the scorer's verdict
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    #[serde(flatten)]
    pub item: CandidateItem,
    /// Confidence score (0-100)
    pub confidence: u8,
    /// Why the candidate scored well
    pub educational_indicators: Vec<String>,
    /// Why the candidate is disqualified (empty if accepted)
    pub filter_reasons: Vec<String>,
    /// Query term whose pass produced this candidate
    pub query_term: String,
}

impl ScoredCandidate {
    /// Accepted candidates carry no filter reasons
    pub fn is_accepted(&self) -> bool {
        self.filter_reasons.is_empty()
    }

    pub fn id(&self) -> &str {
        &self.item.id
    }
}

/// Candidates produced by one query pass, in provider order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPass {
    pub query_term: String,
    pub is_primary: bool,
    pub candidates: Vec<ScoredCandidate>,
}

impl SearchPass {
    pub fn primary(query_term: impl Into<String>, candidates: Vec<ScoredCandidate>) -> Self {
        Self {
            query_term: query_term.into(),
            is_primary: true,
            candidates,
        }
    }

    pub fn fallback(query_term: impl Into<String>, candidates: Vec<ScoredCandidate>) -> Self {
        Self {
            query_term: query_term.into(),
            is_primary: false,
            candidates,
        }
    }

    /// True when at least one accepted candidate reached `min_confidence`
    pub fn has_success_at(&self, min_confidence: u8) -> bool {
        self.candidates
            .iter()
            .any(|c| c.is_accepted() && c.confidence >= min_confidence)
    }
}
