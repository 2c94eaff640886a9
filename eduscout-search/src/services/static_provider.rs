//! In-memory content provider
//!
//! Serves canned candidates per query (case-insensitive), with optional
//! per-query failures and delays. Backs the CLI's offline `--fixture` mode
//! and the test suites.
//!
//! Fixture file format: a JSON object mapping query → candidate list, where
//! the `"*"` entry answers any query without its own entry:
//!
//! ```json
//! {
//!   "fractions": [{"id": "abc", "title": "Fractions Explained", "channel": "Khan Academy"}],
//!   "*": []
//! }
//! ```

use crate::models::CandidateItem;
use crate::types::{ContentProvider, FetchOutcome, ProviderError, SearchFilters};
use async_trait::async_trait;
use eduscout_common::{Error, Result};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// Catalog key answering any query without its own entry
pub const WILDCARD_QUERY: &str = "*";

/// Provider backed by an in-memory catalog
#[derive(Debug, Default)]
pub struct StaticProvider {
    catalog: HashMap<String, Vec<CandidateItem>>,
    failures: HashMap<String, ProviderError>,
    delays: HashMap<String, Duration>,
    calls: Mutex<Vec<String>>,
}

fn catalog_key(query: &str) -> String {
    query.trim().to_lowercase()
}

impl StaticProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `items` for `query`
    pub fn with_results(mut self, query: &str, items: Vec<CandidateItem>) -> Self {
        self.catalog.insert(catalog_key(query), items);
        self
    }

    /// Serve `items` for any query without its own entry
    pub fn with_default(self, items: Vec<CandidateItem>) -> Self {
        self.with_results(WILDCARD_QUERY, items)
    }

    /// Fail every request for `query` with `error`
    pub fn with_failure(mut self, query: &str, error: ProviderError) -> Self {
        self.failures.insert(catalog_key(query), error);
        self
    }

    /// Delay responses for `query` (`"*"` for every query)
    pub fn with_delay(mut self, query: &str, delay: Duration) -> Self {
        self.delays.insert(catalog_key(query), delay);
        self
    }

    /// Load a fixture file (see module docs)
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let catalog: HashMap<String, Vec<CandidateItem>> =
            serde_json::from_str(&contents).map_err(|e| {
                Error::Config(format!("Invalid fixture file {}: {}", path.display(), e))
            })?;

        tracing::info!(
            path = %path.display(),
            queries = catalog.len(),
            "Loaded static provider fixture"
        );

        Ok(catalog
            .into_iter()
            .fold(Self::new(), |provider, (query, items)| provider.with_results(&query, items)))
    }

    /// Queries received so far, in call order
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn lookup<'a, T>(map: &'a HashMap<String, T>, key: &str) -> Option<&'a T> {
        map.get(key).or_else(|| map.get(WILDCARD_QUERY))
    }
}

#[async_trait]
impl ContentProvider for StaticProvider {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn search(&self, query: &str, max_results: usize, _filters: &SearchFilters) -> FetchOutcome {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(query.to_string());

        let key = catalog_key(query);

        if let Some(delay) = Self::lookup(&self.delays, &key) {
            tokio::time::sleep(*delay).await;
        }
        if let Some(error) = Self::lookup(&self.failures, &key) {
            return FetchOutcome::Failed(error.clone());
        }

        let items = Self::lookup(&self.catalog, &key)
            .map(|items| items.iter().take(max_results).cloned().collect())
            .unwrap_or_default();
        FetchOutcome::from_items(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_case_insensitive_lookup_and_wildcard() {
        let provider = StaticProvider::new()
            .with_results("Fractions", vec![CandidateItem::new("a", "A"), CandidateItem::new("b", "B")])
            .with_default(vec![CandidateItem::new("z", "Z")]);
        let filters = SearchFilters::default();

        let outcome = provider.search(" fractions ", 1, &filters).await;
        assert_eq!(outcome, FetchOutcome::Items(vec![CandidateItem::new("a", "A")]));

        let outcome = provider.search("anything", 10, &filters).await;
        assert_eq!(outcome, FetchOutcome::Items(vec![CandidateItem::new("z", "Z")]));

        assert_eq!(provider.calls(), vec![" fractions ".to_string(), "anything".to_string()]);
    }

    #[tokio::test]
    async fn test_unknown_query_is_empty_not_error() {
        let provider = StaticProvider::new();
        let outcome = provider.search("nothing", 10, &SearchFilters::default()).await;
        assert_eq!(outcome, FetchOutcome::Empty);
    }

    #[tokio::test]
    async fn test_configured_failure() {
        let provider = StaticProvider::new().with_failure("broken", ProviderError::QuotaExceeded);
        let outcome = provider.search("broken", 10, &SearchFilters::default()).await;
        assert_eq!(outcome, FetchOutcome::Failed(ProviderError::QuotaExceeded));
    }

    #[tokio::test]
    async fn test_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"fractions": [{{"id": "v1", "title": "Fractions Explained", "channel": "Khan Academy"}}], "*": []}}"#
        )
        .unwrap();

        let provider = StaticProvider::from_json_file(file.path()).unwrap();
        let items = provider
            .search("fractions", 10, &SearchFilters::default())
            .await
            .into_result()
            .unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].channel, "Khan Academy");
    }

    #[test]
    fn test_from_json_file_rejects_bad_fixture() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[1, 2, 3]").unwrap();
        assert!(matches!(
            StaticProvider::from_json_file(file.path()),
            Err(Error::Config(_))
        ));
    }
}
