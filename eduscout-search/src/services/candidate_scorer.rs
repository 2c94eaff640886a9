//! Candidate Scorer Service
//!
//! Heuristic confidence scoring of one provider candidate against a
//! pedagogical context. Pure: no I/O, no clock, no randomness.
//!
//! **Scoring:**
//! - Safety gate (checked first, short-circuits to 0): disallowed term in
//!   title/description, or channel excluded by preferences
//! - Content: +10 per educational keyword (general + subject lexicon)
//! - Source: +25 for a trusted channel, +10 for a preferred channel. Channel
//!   lists match whole names, ignoring case and surrounding whitespace
//! - Context: subject name +15, topic +20, query term in title +15,
//!   grade vocabulary +5 each (max 15), duration fit +10 / over-long -5
//!
//! Confidence below 20 gets an advisory low-relevance filter reason; the
//! score itself is kept.

use crate::config::ScoringConfig;
use crate::models::{CandidateItem, ScoredCandidate, SearchContext};
use crate::utils::normalize_terms;
use std::collections::BTreeMap;

const KEYWORD_POINTS: i32 = 10;
const TRUSTED_SOURCE_POINTS: i32 = 25;
const PREFERRED_CHANNEL_POINTS: i32 = 10;
const SUBJECT_MATCH_POINTS: i32 = 15;
const TOPIC_MATCH_POINTS: i32 = 20;
const QUERY_IN_TITLE_POINTS: i32 = 15;
const GRADE_TERM_POINTS: i32 = 5;
const GRADE_BONUS_CAP: i32 = 15;
const DURATION_FIT_POINTS: i32 = 10;
const DURATION_OVERLONG_PENALTY: i32 = -5;

/// Duration window (minutes, inclusive) that earns the fit bonus
const DURATION_FIT_MINUTES: (f64, f64) = (3.0, 20.0);
/// Durations above this (minutes) are penalized
const DURATION_MAX_MINUTES: f64 = 30.0;
/// Below this the candidate gets a low-relevance filter reason
const LOW_RELEVANCE_THRESHOLD: u8 = 20;

/// Candidate scorer
///
/// Lexicons are lowercased once at construction so scoring only lowercases
/// the candidate text.
pub struct CandidateScorer {
    trusted_sources: Vec<String>,
    disallowed_terms: Vec<String>,
    general_keywords: Vec<String>,
    subject_keywords: BTreeMap<String, Vec<String>>,
    grade_vocabulary: BTreeMap<String, Vec<String>>,
}

impl CandidateScorer {
    pub fn new(config: &ScoringConfig) -> Self {
        let lower_map = |map: &BTreeMap<String, Vec<String>>| -> BTreeMap<String, Vec<String>> {
            map.iter()
                .map(|(k, v)| (k.clone(), normalize_terms(v)))
                .collect()
        };

        Self {
            trusted_sources: normalize_terms(&config.trusted_sources),
            disallowed_terms: normalize_terms(&config.disallowed_terms),
            general_keywords: normalize_terms(&config.general_keywords),
            subject_keywords: lower_map(&config.subject_keywords),
            grade_vocabulary: lower_map(&config.grade_vocabulary),
        }
    }

    /// Score one candidate
    pub fn score(
        &self,
        candidate: &CandidateItem,
        context: &SearchContext,
        query_term: &str,
    ) -> ScoredCandidate {
        let title = candidate.title.to_lowercase();
        let description = candidate.description.to_lowercase();
        let channel = candidate.channel.trim().to_lowercase();
        let in_text = |needle: &str| title.contains(needle) || description.contains(needle);

        let verdict = |confidence: u8, indicators: Vec<String>, reasons: Vec<String>| ScoredCandidate {
            item: candidate.clone(),
            confidence,
            educational_indicators: indicators,
            filter_reasons: reasons,
            query_term: query_term.to_string(),
        };

        // Safety gate
        if let Some(term) = self.disallowed_terms.iter().find(|t| in_text(t.as_str())) {
            tracing::debug!(id = %candidate.id, term = %term, "Candidate failed safety gate");
            return verdict(0, Vec::new(), vec![format!("Contains disallowed term: '{}'", term)]);
        }
        let preferences = context.preferences();
        if !channel.is_empty() {
            let excluded = normalize_terms(&preferences.excluded_channels);
            if excluded.iter().any(|c| *c == channel) {
                return verdict(
                    0,
                    Vec::new(),
                    vec![format!("Channel excluded by preferences: '{}'", candidate.channel)],
                );
            }
        }

        let mut score: i32 = 0;
        let mut indicators = Vec::new();
        let mut reasons = Vec::new();

        // Content
        let subject_lexicon = self
            .subject_keywords
            .get(context.subject_kind().key())
            .map(Vec::as_slice)
            .unwrap_or_default();
        let mut matched_keywords: Vec<&str> = Vec::new();
        for keyword in self.general_keywords.iter().chain(subject_lexicon) {
            if !matched_keywords.contains(&keyword.as_str()) && in_text(keyword.as_str()) {
                matched_keywords.push(keyword.as_str());
                score += KEYWORD_POINTS;
                indicators.push(format!("Educational keyword: '{}'", keyword));
            }
        }

        // Source
        if !channel.is_empty() {
            if let Some(source) = self.trusted_sources.iter().find(|s| **s == channel) {
                score += TRUSTED_SOURCE_POINTS;
                indicators.push(format!("Trusted source: '{}'", source));
            }
            let preferred = normalize_terms(&preferences.preferred_channels);
            if preferred.iter().any(|c| *c == channel) {
                score += PREFERRED_CHANNEL_POINTS;
                indicators.push("Preferred channel".to_string());
            }
        }

        // Context
        let subject = context.subject().trim().to_lowercase();
        if !subject.is_empty() && in_text(subject.as_str()) {
            score += SUBJECT_MATCH_POINTS;
            indicators.push(format!("Mentions subject '{}'", context.subject().trim()));
        }

        let topic = context.topic().trim().to_lowercase();
        if !topic.is_empty() && in_text(topic.as_str()) {
            score += TOPIC_MATCH_POINTS;
            indicators.push(format!("Mentions topic '{}'", context.topic().trim()));
        }

        let query = query_term.trim().to_lowercase();
        if !query.is_empty() && title.contains(&query) {
            score += QUERY_IN_TITLE_POINTS;
            indicators.push("Query term in title".to_string());
        }

        let grade_matches = self
            .grade_vocabulary
            .get(context.grade_band().key())
            .map(|vocab| vocab.iter().filter(|v| in_text(v.as_str())).count())
            .unwrap_or(0);
        if grade_matches > 0 {
            let bonus = (grade_matches as i32 * GRADE_TERM_POINTS).min(GRADE_BONUS_CAP);
            score += bonus;
            indicators.push(format!("Grade-appropriate vocabulary (+{})", bonus));
        }

        if context.target_duration_minutes().is_some() && candidate.duration_seconds > 0 {
            let minutes = candidate.duration_minutes();
            if (DURATION_FIT_MINUTES.0..=DURATION_FIT_MINUTES.1).contains(&minutes) {
                score += DURATION_FIT_POINTS;
                indicators.push(format!("Classroom-friendly length ({:.0} min)", minutes));
            } else if minutes > DURATION_MAX_MINUTES {
                score += DURATION_OVERLONG_PENALTY;
                reasons.push(format!("Too long for classroom use ({:.0} min)", minutes));
            }
        }

        let confidence = score.clamp(0, 100) as u8;

        if confidence < LOW_RELEVANCE_THRESHOLD {
            reasons.push(format!("Low educational relevance (confidence {})", confidence));
        }
        if let Some(min) = preferences.min_confidence {
            if confidence < min {
                reasons.push(format!("Below preferred minimum confidence {}", min));
            }
        }

        verdict(confidence, indicators, reasons)
    }
}
