//! Engine configuration
//!
//! Every policy input (threshold constants, trusted sources, disallowed terms,
//! keyword lexicons, grade vocabularies, expansion templates) is data. The
//! compiled-in defaults below can be overridden section by section from TOML:
//!
//! ```toml
//! [scoring]
//! trusted_sources = ["Khan Academy", "TED-Ed"]
//!
//! [search]
//! max_alternates = 3
//! ```
//!
//! Provider API key resolution priority: ENV → TOML.

use crate::error::{EngineResult, SearchError};
use eduscout_common::config::{load_toml_or_default, LoggingConfig};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable holding the provider API key
pub const API_KEY_ENV_VAR: &str = "EDUSCOUT_YOUTUBE_API_KEY";

/// Environment variable pointing at the config file
pub const CONFIG_ENV_VAR: &str = "EDUSCOUT_CONFIG";

/// Lowest configurable `thresholds.floor_min_confidence`
const MIN_CONFIDENCE_FLOOR: u8 = 30;

/// Lowest configurable `thresholds.floor_fallback_confidence`
const MIN_FALLBACK_FLOOR: u8 = 40;

/// Top-level engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub thresholds: ThresholdConfig,
    pub scoring: ScoringConfig,
    pub expansion: ExpansionConfig,
    pub search: SearchConfig,
    pub cache: CacheConfig,
    pub provider: ProviderConfig,
    pub logging: LoggingConfig,
}

/// Additive threshold adjustment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdAdjustment {
    pub min_confidence: i32,
    pub min_result_count: i32,
    pub fallback_confidence: i32,
}

impl ThresholdAdjustment {
    pub const fn new(min_confidence: i32, min_result_count: i32, fallback_confidence: i32) -> Self {
        Self {
            min_confidence,
            min_result_count,
            fallback_confidence,
        }
    }
}

/// Base thresholds, floors and per-subject / per-grade-band adjustments
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    pub base_min_confidence: u8,
    pub base_min_result_count: usize,
    pub base_fallback_confidence: u8,
    pub floor_min_confidence: u8,
    pub floor_min_result_count: usize,
    pub floor_fallback_confidence: u8,
    /// Keyed by `Subject::key()`
    pub subject_adjustments: BTreeMap<String, ThresholdAdjustment>,
    /// Keyed by `GradeBand::key()`
    pub grade_adjustments: BTreeMap<String, ThresholdAdjustment>,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        let terminology_dense = ThresholdAdjustment::new(5, 0, 5);
        let creative = ThresholdAdjustment::new(-10, -1, 0);

        let subject_adjustments = [
            ("math", terminology_dense),
            ("science", terminology_dense),
            ("computer_science", terminology_dense),
            ("foreign_language", terminology_dense),
            ("art", creative),
            ("music", creative),
            ("physical_education", creative),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        let grade_adjustments = [
            ("elementary", ThresholdAdjustment::new(5, 0, 5)),
            ("high", ThresholdAdjustment::new(-5, 0, -5)),
            ("advanced", ThresholdAdjustment::new(-10, -1, -10)),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        Self {
            base_min_confidence: 60,
            base_min_result_count: 3,
            base_fallback_confidence: 70,
            floor_min_confidence: 30,
            floor_min_result_count: 1,
            floor_fallback_confidence: 40,
            subject_adjustments,
            grade_adjustments,
        }
    }
}

/// Scoring lexicons and lists
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Channel allowlist (whole channel name, case-insensitive)
    pub trusted_sources: Vec<String>,
    /// Safety gate terms (case-insensitive substring match)
    pub disallowed_terms: Vec<String>,
    /// Educational keywords applied to every subject
    pub general_keywords: Vec<String>,
    /// Keyed by `Subject::key()`
    pub subject_keywords: BTreeMap<String, Vec<String>>,
    /// Keyed by `GradeBand::key()`
    pub grade_vocabulary: BTreeMap<String, Vec<String>>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            trusted_sources: strings(&[
                "Khan Academy",
                "CrashCourse",
                "Crash Course",
                "TED-Ed",
                "National Geographic",
                "PBS",
                "BBC",
                "Smithsonian",
                "SciShow",
                "Numberphile",
                "3Blue1Brown",
                "Math Antics",
                "Scratch Garden",
                "Free School",
                "Homeschool Pop",
                "Peekaboo Kidz",
                "Jack Hartmann",
                "NASA",
                "Veritasium",
                "Kurzgesagt",
                "The Organic Chemistry Tutor",
                "Art for Kids Hub",
            ]),
            disallowed_terms: strings(&[
                "graphic violence",
                "violence",
                "gore",
                "explicit",
                "nsfw",
                "profanity",
                "swearing",
                "gambling",
                "horror",
                "mature content",
                "18+",
                "prank",
            ]),
            general_keywords: strings(&[
                "explained",
                "lesson",
                "tutorial",
                "learn",
                "introduction",
                "education",
                "how to",
                "guide",
                "for kids",
                "for students",
                "classroom",
                "teacher",
                "overview",
            ]),
            subject_keywords: string_map(&[
                ("math", &[
                    "math", "fraction", "equation", "algebra", "geometry", "multiplication",
                    "division", "addition", "subtraction", "decimal", "percent", "calculus",
                    "problem solving",
                ]),
                ("science", &[
                    "science", "experiment", "biology", "chemistry", "physics", "scientific",
                    "hypothesis", "cell", "energy", "ecosystem", "molecule",
                ]),
                ("english", &[
                    "grammar", "reading", "writing", "vocabulary", "literature", "poetry",
                    "phonics", "essay", "spelling",
                ]),
                ("social_studies", &[
                    "history", "geography", "civics", "government", "culture", "historical",
                    "timeline", "economics", "civilization",
                ]),
                ("foreign_language", &[
                    "vocabulary", "pronunciation", "conversation", "phrases", "grammar",
                    "language",
                ]),
                ("computer_science", &[
                    "coding", "programming", "computer", "algorithm", "python", "scratch",
                    "software",
                ]),
                ("art", &[
                    "art", "drawing", "painting", "sketch", "color", "creative", "artist",
                ]),
                ("music", &[
                    "music", "rhythm", "melody", "instrument", "notes", "singing", "composer",
                ]),
                ("physical_education", &[
                    "exercise", "fitness", "sports", "workout", "health", "stretching",
                ]),
            ]),
            grade_vocabulary: string_map(&[
                ("elementary", &[
                    "kids", "children", "elementary", "easy", "simple", "fun", "kindergarten",
                    "for beginners",
                ]),
                ("middle", &[
                    "middle school", "beginner", "introduction", "basics", "6th grade",
                    "7th grade", "8th grade",
                ]),
                ("high", &[
                    "high school", "in depth", "in-depth", "exam", "test prep", "ap ",
                ]),
                ("advanced", &[
                    "university", "college", "lecture", "graduate", "advanced", "theory",
                    "course",
                ]),
            ]),
        }
    }
}

/// Keyword-triggered subject rewording
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordRewording {
    /// `Subject::key()` this rewording belongs to
    pub subject: String,
    /// Substring of the primary term that activates it
    pub trigger: String,
    pub alternates: Vec<String>,
}

/// Query expansion templates
///
/// Templates may use `{term}`, `{subject}`, `{grade}` and `{topic}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpansionConfig {
    pub keyword_rewordings: Vec<KeywordRewording>,
    /// Keyed by `Subject::key()`
    pub subject_templates: BTreeMap<String, Vec<String>>,
    /// Keyed by `GradeBand::key()`
    pub grade_templates: BTreeMap<String, Vec<String>>,
    pub generic_templates: Vec<String>,
}

impl Default for ExpansionConfig {
    fn default() -> Self {
        fn rewording(subject: &str, trigger: &str, alternates: &[&str]) -> KeywordRewording {
            KeywordRewording {
                subject: subject.to_string(),
                trigger: trigger.to_string(),
                alternates: strings(alternates),
            }
        }

        Self {
            keyword_rewordings: vec![
                rewording("math", "fraction", &["understanding fractions", "fractions for beginners", "fraction basics"]),
                rewording("math", "multiplication", &["times tables", "multiplication tricks"]),
                rewording("math", "algebra", &["solving equations", "algebra basics"]),
                rewording("math", "geometry", &["shapes and angles", "geometry basics"]),
                rewording("science", "photosynthesis", &["how plants make food", "photosynthesis process"]),
                rewording("science", "water cycle", &["evaporation and condensation", "water cycle for students"]),
                rewording("science", "solar system", &["planets for students", "our solar system"]),
                rewording("science", "cell", &["cell structure", "parts of a cell"]),
                rewording("social_studies", "revolution", &["revolutionary war", "causes of the revolution"]),
                rewording("social_studies", "civil war", &["american civil war", "civil war causes"]),
                rewording("english", "grammar", &["parts of speech", "sentence structure"]),
                rewording("english", "poetry", &["poetry for students", "how to write a poem"]),
                rewording("computer_science", "loop", &["loops in programming", "for loops explained"]),
            ],
            subject_templates: string_map(&[
                ("math", &["{term} math", "{term} step by step", "{term} practice problems"]),
                ("science", &["{term} science", "{term} experiment", "how does {term} work"]),
                ("english", &["{term} grammar", "{term} reading lesson", "{term} language arts"]),
                ("social_studies", &["{term} history", "{term} facts", "{term} documentary for students"]),
                ("foreign_language", &["{term} vocabulary", "{term} pronunciation"]),
                ("computer_science", &["{term} coding", "{term} programming tutorial"]),
                ("art", &["{term} art lesson", "how to draw {term}", "{term} art project"]),
                ("music", &["{term} music lesson", "{term} for musicians"]),
                ("physical_education", &["{term} exercise", "{term} fitness for students"]),
            ]),
            grade_templates: string_map(&[
                ("elementary", &["{term} for children", "easy {term}"]),
                ("middle", &["{term} middle school", "{term} basics"]),
                ("high", &["{term} high school", "{term} in depth"]),
                ("advanced", &["{term} lecture", "advanced {term}", "{term} college course"]),
            ]),
            generic_templates: strings(&[
                "{term} lesson",
                "{term} tutorial",
                "{term} explained",
                "{term} for kids",
                "{term} education",
                "learn {term}",
                "{term} {subject}",
                "{grade} {term}",
            ]),
        }
    }
}

/// Orchestrator settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Final result cap
    pub max_results: usize,
    /// Candidates requested per provider call
    pub provider_max_results: usize,
    /// Alternate terms tried per fallback
    pub max_alternates: usize,
    /// Concurrent alternate fetches
    pub max_concurrent_fetches: usize,
    /// Per-request timeout
    pub request_timeout_ms: u64,
    /// Confidence a pass needs for its term to be learned
    pub success_confidence: u8,
    /// Ask the provider for safe-search filtering
    pub safe_mode: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_results: 10,
            provider_max_results: 25,
            max_alternates: 4,
            max_concurrent_fetches: 4,
            request_timeout_ms: 10_000,
            success_confidence: 80,
            safe_mode: true,
        }
    }
}

/// Pattern cache limits and persistence
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub max_terms_per_key: usize,
    pub max_keys: usize,
    /// JSON snapshot loaded at startup and written after each search
    pub snapshot_path: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_terms_per_key: 10,
            max_keys: 100,
            snapshot_path: None,
        }
    }
}

/// Content provider (YouTube Data API) settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub requests_per_second: u32,
    /// Result pages fetched per query
    pub max_pages: u32,
    /// Retries for transient failures
    pub max_retries: u32,
    /// Per HTTP request. Must be below `search.request_timeout_ms`, which
    /// bounds the whole provider call including retries
    pub http_timeout_ms: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://www.googleapis.com/youtube/v3".to_string(),
            requests_per_second: 5,
            max_pages: 2,
            max_retries: 2,
            http_timeout_ms: 3_000,
        }
    }
}

impl EngineConfig {
    /// Load from TOML (missing file → defaults) and validate
    pub fn load(path: Option<&Path>) -> EngineResult<Self> {
        let config: EngineConfig = load_toml_or_default(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the engine cannot run with
    pub fn validate(&self) -> EngineResult<()> {
        let checks = [
            (self.search.max_results == 0, "search.max_results must be > 0"),
            (self.search.provider_max_results == 0, "search.provider_max_results must be > 0"),
            (self.search.max_concurrent_fetches == 0, "search.max_concurrent_fetches must be > 0"),
            (self.search.request_timeout_ms == 0, "search.request_timeout_ms must be > 0"),
            (self.search.success_confidence > 100, "search.success_confidence must be <= 100"),
            (self.cache.max_terms_per_key == 0, "cache.max_terms_per_key must be > 0"),
            (self.cache.max_keys == 0, "cache.max_keys must be > 0"),
            (self.provider.requests_per_second == 0, "provider.requests_per_second must be > 0"),
            (self.provider.max_pages == 0, "provider.max_pages must be > 0"),
            (self.thresholds.base_min_confidence > 100, "thresholds.base_min_confidence must be <= 100"),
            (
                self.thresholds.base_fallback_confidence > 100,
                "thresholds.base_fallback_confidence must be <= 100",
            ),
            (
                self.thresholds.floor_min_result_count == 0,
                "thresholds.floor_min_result_count must be >= 1",
            ),
            (
                !(MIN_CONFIDENCE_FLOOR..=100).contains(&self.thresholds.floor_min_confidence),
                "thresholds.floor_min_confidence must be between 30 and 100",
            ),
            (
                !(MIN_FALLBACK_FLOOR..=100).contains(&self.thresholds.floor_fallback_confidence),
                "thresholds.floor_fallback_confidence must be between 40 and 100",
            ),
            (
                self.provider.http_timeout_ms >= self.search.request_timeout_ms,
                "provider.http_timeout_ms must be < search.request_timeout_ms",
            ),
        ];

        match checks.iter().find(|(failed, _)| *failed) {
            Some((_, message)) => Err(SearchError::Config((*message).to_string())),
            None => Ok(()),
        }
    }

    /// Resolve the provider API key
    ///
    /// **Priority:** ENV → TOML. Blank values are ignored.
    pub fn resolve_api_key(&self) -> Option<String> {
        let env_key = std::env::var(API_KEY_ENV_VAR).ok().filter(|k| is_valid_key(k));
        let toml_key = self.provider.api_key.clone().filter(|k| is_valid_key(k));

        if env_key.is_some() && toml_key.is_some() {
            warn!(
                "Provider API key found in environment and TOML. Using environment (highest priority)."
            );
        }

        if let Some(key) = env_key {
            info!("Provider API key loaded from environment variable");
            return Some(key);
        }
        if let Some(key) = toml_key {
            info!("Provider API key loaded from TOML config");
            return Some(key);
        }

        warn!(
            "Provider API key not configured. Set {} or [provider] api_key in the config file.",
            API_KEY_ENV_VAR
        );
        None
    }
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn string_map(entries: &[(&str, &[&str])]) -> BTreeMap<String, Vec<String>> {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), strings(v)))
        .collect()
}
