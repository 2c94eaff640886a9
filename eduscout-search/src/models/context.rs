//! Pedagogical search context
//!
//! Subject and grade strings are classified exactly once, when the
//! [`SearchContext`] is built. Downstream components branch on the closed
//! [`Subject`] and [`GradeBand`] variants instead of re-parsing strings.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Subject family used to select lexicons, templates and threshold adjustments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Subject {
    Math,
    Science,
    English,
    SocialStudies,
    ForeignLanguage,
    ComputerScience,
    Art,
    Music,
    PhysicalEducation,
    /// Anything that does not match a known subject family
    General,
}

impl Subject {
    /// Classify a free-form subject name
    pub fn classify(raw: &str) -> Self {
        let s = raw.trim().to_lowercase();
        let has = |needle: &str| s.contains(needle);
        let has_word = |word: &str| s.split(|c: char| !c.is_alphanumeric()).any(|t| t == word);

        if has("computer") || has("coding") || has("programming") || has_word("cs") {
            Subject::ComputerScience
        } else if has("math") || has("algebra") || has("geometry") || has("calculus")
            || has("arithmetic") || has("statistics") || has("trigonometry")
        {
            Subject::Math
        } else if has("social") || has("history") || has("geography") || has("civics")
            || has("government") || has("economics") || has("political")
        {
            Subject::SocialStudies
        } else if has("science") || has("biology") || has("chemistry") || has("physics")
            || has("astronomy") || has("anatomy") || has("ecology")
        {
            Subject::Science
        } else if has("foreign") || has("spanish") || has("french") || has("german")
            || has("chinese") || has("mandarin") || has("japanese") || has("latin")
            || has_word("esl")
        {
            Subject::ForeignLanguage
        } else if has("english") || has("reading") || has("writing") || has("language arts")
            || has("literature") || has("grammar") || has("phonics") || has_word("ela")
        {
            Subject::English
        } else if has("music") || has("choir") || has("orchestra") || has_word("band") {
            Subject::Music
        } else if has_word("art") || has_word("arts") || has("drawing") || has("painting") {
            Subject::Art
        } else if has("physical education") || has_word("pe") || has("gym")
            || has("fitness") || has("health")
        {
            Subject::PhysicalEducation
        } else {
            Subject::General
        }
    }

    /// Stable key used in config maps (`[scoring.subject_keywords]` etc.)
    pub fn key(&self) -> &'static str {
        match self {
            Subject::Math => "math",
            Subject::Science => "science",
            Subject::English => "english",
            Subject::SocialStudies => "social_studies",
            Subject::ForeignLanguage => "foreign_language",
            Subject::ComputerScience => "computer_science",
            Subject::Art => "art",
            Subject::Music => "music",
            Subject::PhysicalEducation => "physical_education",
            Subject::General => "general",
        }
    }
}

/// Grade band derived from a free-form grade level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GradeBand {
    /// K-5
    Elementary,
    /// 6-8
    Middle,
    /// 9-12
    High,
    /// College, AP, adult learners
    Advanced,
    Unknown,
}

impl GradeBand {
    /// Classify a free-form grade level ("5th grade", "Grade 10", "AP", "K")
    pub fn classify(raw: &str) -> Self {
        let s = raw.trim().to_lowercase();
        let has = |needle: &str| s.contains(needle);
        let has_word = |word: &str| s.split(|c: char| !c.is_alphanumeric()).any(|t| t == word);

        if has("kindergarten") || has("pre-k") || has("elementary") || has("primary")
            || has_word("k") || has_word("prek")
        {
            return GradeBand::Elementary;
        }
        if has("middle") || has("junior high") {
            return GradeBand::Middle;
        }
        if has("high school") || has("secondary") {
            return GradeBand::High;
        }
        if has("college") || has("university") || has("graduate") || has("adult")
            || has("advanced") || has_word("ap")
        {
            return GradeBand::Advanced;
        }

        match first_number(&s) {
            Some(0..=5) => GradeBand::Elementary,
            Some(6..=8) => GradeBand::Middle,
            Some(9..=12) => GradeBand::High,
            Some(_) => GradeBand::Advanced,
            None => GradeBand::Unknown,
        }
    }

    /// Stable key used in config maps (`[scoring.grade_vocabulary]` etc.)
    pub fn key(&self) -> &'static str {
        match self {
            GradeBand::Elementary => "elementary",
            GradeBand::Middle => "middle",
            GradeBand::High => "high",
            GradeBand::Advanced => "advanced",
            GradeBand::Unknown => "unknown",
        }
    }
}

fn first_number(s: &str) -> Option<u32> {
    let digits: String = s
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

/// Caller preferences carried alongside the context
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchPreferences {
    /// Candidates scoring below this are excluded from results
    #[serde(default)]
    pub min_confidence: Option<u8>,
    /// Channels that receive a scoring bonus
    #[serde(default)]
    pub preferred_channels: Vec<String>,
    /// Channels that are always excluded
    #[serde(default)]
    pub excluded_channels: Vec<String>,
}

/// Normalized `(subject, grade_level)` pair keying the pattern cache
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextKey {
    subject: String,
    grade_level: String,
}

impl ContextKey {
    const SEPARATOR: char = '|';

    pub fn new(subject: &str, grade_level: &str) -> Self {
        Self {
            subject: normalize(subject),
            grade_level: normalize(grade_level),
        }
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn grade_level(&self) -> &str {
        &self.grade_level
    }

    /// Parse the `subject|grade` form produced by `Display`.
    ///
    /// Returns `None` for anything that could not have come from `Display`.
    pub fn parse(raw: &str) -> Option<Self> {
        let (subject, grade) = raw.split_once(Self::SEPARATOR)?;
        if subject.trim().is_empty() || grade.contains(Self::SEPARATOR) {
            return None;
        }
        Some(Self::new(subject, grade))
    }
}

impl fmt::Display for ContextKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.subject, Self::SEPARATOR, self.grade_level)
    }
}

fn normalize(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Immutable pedagogical context for one search call
#[derive(Debug, Clone, PartialEq)]
pub struct SearchContext {
    subject: String,
    grade_level: String,
    topic: String,
    target_duration_minutes: Option<u32>,
    previous_successful_terms: Vec<String>,
    preferences: SearchPreferences,
    subject_kind: Subject,
    grade_band: GradeBand,
}

impl SearchContext {
    pub fn new(
        subject: impl Into<String>,
        grade_level: impl Into<String>,
        topic: impl Into<String>,
    ) -> Self {
        let subject = subject.into();
        let grade_level = grade_level.into();
        let subject_kind = Subject::classify(&subject);
        let grade_band = GradeBand::classify(&grade_level);

        Self {
            subject,
            grade_level,
            topic: topic.into(),
            target_duration_minutes: None,
            previous_successful_terms: Vec::new(),
            preferences: SearchPreferences::default(),
            subject_kind,
            grade_band,
        }
    }

    pub fn with_target_duration(mut self, minutes: u32) -> Self {
        self.target_duration_minutes = Some(minutes);
        self
    }

    pub fn with_previous_terms(mut self, terms: Vec<String>) -> Self {
        self.previous_successful_terms = terms;
        self
    }

    pub fn with_preferences(mut self, preferences: SearchPreferences) -> Self {
        self.preferences = preferences;
        self
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn grade_level(&self) -> &str {
        &self.grade_level
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn target_duration_minutes(&self) -> Option<u32> {
        self.target_duration_minutes
    }

    pub fn previous_successful_terms(&self) -> &[String] {
        &self.previous_successful_terms
    }

    pub fn preferences(&self) -> &SearchPreferences {
        &self.preferences
    }

    pub fn subject_kind(&self) -> Subject {
        self.subject_kind
    }

    pub fn grade_band(&self) -> GradeBand {
        self.grade_band
    }

    pub fn cache_key(&self) -> ContextKey {
        ContextKey::new(&self.subject, &self.grade_level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subject_classification() {
        assert_eq!(Subject::classify("Math"), Subject::Math);
        assert_eq!(Subject::classify("Algebra II"), Subject::Math);
        assert_eq!(Subject::classify("Earth Science"), Subject::Science);
        assert_eq!(Subject::classify("Social Studies"), Subject::SocialStudies);
        assert_eq!(Subject::classify("Political Science"), Subject::SocialStudies);
        assert_eq!(Subject::classify("English Language Arts"), Subject::English);
        assert_eq!(Subject::classify("Computer Science"), Subject::ComputerScience);
        assert_eq!(Subject::classify("Visual Art"), Subject::Art);
        assert_eq!(Subject::classify("Spanish"), Subject::ForeignLanguage);
        assert_eq!(Subject::classify("Music"), Subject::Music);
        assert_eq!(Subject::classify("PE"), Subject::PhysicalEducation);
        assert_eq!(Subject::classify("Homeroom"), Subject::General);
    }

    #[test]
    fn test_grade_band_classification() {
        assert_eq!(GradeBand::classify("K"), GradeBand::Elementary);
        assert_eq!(GradeBand::classify("Kindergarten"), GradeBand::Elementary);
        assert_eq!(GradeBand::classify("5th grade"), GradeBand::Elementary);
        assert_eq!(GradeBand::classify("Grade 7"), GradeBand::Middle);
        assert_eq!(GradeBand::classify("Middle School"), GradeBand::Middle);
        assert_eq!(GradeBand::classify("10th Grade"), GradeBand::High);
        assert_eq!(GradeBand::classify("High School"), GradeBand::High);
        assert_eq!(GradeBand::classify("AP"), GradeBand::Advanced);
        assert_eq!(GradeBand::classify("College"), GradeBand::Advanced);
        assert_eq!(GradeBand::classify("whatever"), GradeBand::Unknown);
    }

    #[test]
    fn test_context_key_normalization() {
        let a = ContextKey::new("  Math ", "5th   Grade");
        let b = ContextKey::new("math", "5th grade");
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "math|5th grade");
    }

    #[test]
    fn test_context_key_parse() {
        let key = ContextKey::parse("science|grade 7").unwrap();
        assert_eq!(key.subject(), "science");
        assert_eq!(key.grade_level(), "grade 7");

        assert!(ContextKey::parse("no separator").is_none());
        assert!(ContextKey::parse("|grade 7").is_none());
        assert!(ContextKey::parse("a|b|c").is_none());
    }

    #[test]
    fn test_context_classifies_once() {
        let ctx = SearchContext::new("Biology", "9th grade", "cells").with_target_duration(10);
        assert_eq!(ctx.subject_kind(), Subject::Science);
        assert_eq!(ctx.grade_band(), GradeBand::High);
        assert_eq!(ctx.target_duration_minutes(), Some(10));
        assert_eq!(ctx.cache_key(), ContextKey::new("biology", "9th grade"));
    }
}
