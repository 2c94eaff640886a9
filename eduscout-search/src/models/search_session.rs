//! Search state machine
//!
//! INIT → PRIMARY_SEARCH → SCORING → FALLBACK_CHECK → [FALLBACK_SEARCH] →
//! COMBINE → LEARN → METRICS_UPDATE → DONE
//!
//! A primary fetch failure moves the session straight to FAILED.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Search workflow phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SearchPhase {
    Init,
    PrimarySearch,
    Scoring,
    FallbackCheck,
    FallbackSearch,
    Combine,
    Learn,
    MetricsUpdate,
    Done,
    Failed,
}

/// State transition record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseTransition {
    pub old_phase: SearchPhase,
    pub new_phase: SearchPhase,
    pub at: Duration,
}

/// In-memory state for one search call
#[derive(Debug)]
pub struct SearchSession {
    pub primary_term: String,
    pub phase: SearchPhase,
    transitions: Vec<PhaseTransition>,
    started_at: Instant,
}

impl SearchSession {
    pub fn new(primary_term: impl Into<String>) -> Self {
        Self {
            primary_term: primary_term.into(),
            phase: SearchPhase::Init,
            transitions: Vec::new(),
            started_at: Instant::now(),
        }
    }

    /// Transition to new phase
    pub fn transition_to(&mut self, new_phase: SearchPhase) -> PhaseTransition {
        let transition = PhaseTransition {
            old_phase: self.phase,
            new_phase,
            at: self.started_at.elapsed(),
        };
        tracing::trace!(
            term = %self.primary_term,
            from = ?transition.old_phase,
            to = ?new_phase,
            "Search phase transition"
        );
        self.phase = new_phase;
        self.transitions.push(transition);
        transition
    }

    pub fn transitions(&self) -> &[PhaseTransition] {
        &self.transitions
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Check if session is terminal (finished)
    pub fn is_terminal(&self) -> bool {
        matches!(self.phase, SearchPhase::Done | SearchPhase::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions_are_recorded_in_order() {
        let mut session = SearchSession::new("fractions");
        assert_eq!(session.phase, SearchPhase::Init);

        session.transition_to(SearchPhase::PrimarySearch);
        session.transition_to(SearchPhase::Failed);

        let phases: Vec<_> = session.transitions().iter().map(|t| t.new_phase).collect();
        assert_eq!(phases, vec![SearchPhase::PrimarySearch, SearchPhase::Failed]);
        assert_eq!(session.transitions()[1].old_phase, SearchPhase::PrimarySearch);
        assert!(session.is_terminal());
    }

    #[test]
    fn test_phase_serialization() {
        let json = serde_json::to_string(&SearchPhase::FallbackSearch).unwrap();
        assert_eq!(json, "\"FALLBACK_SEARCH\"");
    }
}
