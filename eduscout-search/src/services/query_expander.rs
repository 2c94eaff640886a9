//! Query Expansion Generator
//!
//! Produces alternate query strings for a primary term, in priority order:
//!
//! 1. Subject rewordings: keyword-triggered rewordings for the detected
//!    subject, then the subject's templates
//! 2. Grade-band templates
//! 3. Generic pedagogical templates
//!
//! Output is deterministic, deduplicated case-insensitively, and never
//! contains the primary term itself.

use crate::config::ExpansionConfig;
use crate::models::SearchContext;
use crate::utils::render_template;
use std::collections::HashSet;

/// Query expansion generator
pub struct QueryExpander {
    config: ExpansionConfig,
}

impl QueryExpander {
    pub fn new(config: &ExpansionConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Generate alternates for `primary_term`, highest priority first
    pub fn expand(&self, primary_term: &str, context: &SearchContext) -> Vec<String> {
        let term = primary_term.trim();
        if term.is_empty() {
            return Vec::new();
        }
        let term_lower = term.to_lowercase();
        let subject_key = context.subject_kind().key();
        let grade_key = context.grade_band().key();

        let render = |template: &str| {
            render_template(
                template,
                term,
                context.subject(),
                context.grade_level(),
                context.topic(),
            )
        };

        let rewordings = self
            .config
            .keyword_rewordings
            .iter()
            .filter(|r| r.subject == subject_key && term_lower.contains(&r.trigger.to_lowercase()))
            .flat_map(|r| r.alternates.iter().cloned());

        let subject_templates = self
            .config
            .subject_templates
            .get(subject_key)
            .into_iter()
            .flatten()
            .map(|t| render(t.as_str()));

        let grade_templates = self
            .config
            .grade_templates
            .get(grade_key)
            .into_iter()
            .flatten()
            .map(|t| render(t.as_str()));

        let generic = self.config.generic_templates.iter().map(|t| render(t.as_str()));

        let candidates: Vec<String> = rewordings
            .chain(subject_templates)
            .chain(grade_templates)
            .chain(generic)
            .collect();

        dedup_excluding(candidates, term)
    }
}

/// Merge alternate sources in priority order and cap the result.
///
/// Earlier sources win: a term appearing in several sources keeps the
/// position of its first occurrence. The primary term is never returned.
pub fn merge_alternates(sources: &[&[String]], primary_term: &str, limit: usize) -> Vec<String> {
    let flattened = sources.iter().flat_map(|s| s.iter().cloned()).collect();
    let mut merged = dedup_excluding(flattened, primary_term);
    merged.truncate(limit);
    merged
}

/// Trim, drop blanks, drop `excluded`, dedup case-insensitively keeping first
fn dedup_excluding(terms: Vec<String>, excluded: &str) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    seen.insert(excluded.trim().to_lowercase());

    terms
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .filter(|t| seen.insert(t.to_lowercase()))
        .collect()
}
