//! End-to-end search tests against the in-memory provider
//!
//! Covers the scenario behaviors (trusted source, disallowed content,
//! fallback, empty provider), failure isolation, timeouts, learning and
//! concurrent use of one orchestrator.

mod helpers;

use eduscout_search::config::EngineConfig;
use eduscout_search::models::{CandidateItem, SearchPreferences, SearchStrategy, Thresholds};
use eduscout_search::services::{PatternCache, StaticProvider, YouTubeClient};
use eduscout_search::{ProviderError, SearchContext, SearchError, SearchOrchestrator};
use helpers::{capture_logs, noise_video, orchestrator, orchestrator_with, strong_fraction_video};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::Level;

fn math_context() -> SearchContext {
    SearchContext::new("Math", "5th grade", "fractions")
}

// ============================================================================
// Scenarios
// ============================================================================

#[tokio::test]
async fn test_trusted_source_candidate_is_accepted() {
    let provider = StaticProvider::new().with_results(
        "fractions",
        vec![CandidateItem::new("v1", "Fractions Explained").with_channel("Khan Academy")],
    );
    let (orch, _) = orchestrator(provider);

    let result = orch.search("fractions", &math_context()).await.unwrap();

    assert_eq!(result.results.len(), 1);
    assert_eq!(result.results[0].id(), "v1");
    assert!(result.results[0].confidence >= 75);
    assert!(result.results[0].filter_reasons.is_empty());
}

#[tokio::test]
async fn test_disallowed_content_is_excluded_and_counted() {
    let provider = StaticProvider::new().with_results(
        "revolution",
        vec![CandidateItem::new("bad", "Graphic violence in history documentaries")
            .with_channel("Khan Academy")],
    );
    let (orch, _) = orchestrator(provider);
    let ctx = SearchContext::new("Social Studies", "High School", "history");

    let result = orch.search("revolution", &ctx).await.unwrap();

    assert!(result.results.iter().all(|c| c.id() != "bad"));
    assert_eq!(result.feedback.filtered_out_count, 1);
    assert!(result
        .feedback
        .reasons_filtered
        .contains(&"Contains disallowed term: 'graphic violence'".to_string()));
    assert!(result.fallback_triggered);
}

#[tokio::test]
async fn test_weak_primary_triggers_bounded_fallback() {
    // topic +20, query in title +15, "tutorial" +10, "basics" +5 = 50
    let provider = StaticProvider::new()
        .with_results("x", vec![CandidateItem::new("weak", "x tutorial basics")]);
    let (orch, provider) = orchestrator(provider);
    let ctx = SearchContext::new("Homeroom", "Grade 7", "x");

    let result = orch.search("x", &ctx).await.unwrap();

    assert_eq!(
        result.thresholds,
        Thresholds {
            min_confidence: 60,
            min_result_count: 3,
            fallback_confidence_threshold: 70,
        }
    );
    assert!(result.fallback_triggered);
    assert!(result.feedback.fallback_reason.contains("Only 0 of 3"));
    assert_eq!(result.strategy, SearchStrategy::FallbackEnhanced);
    assert!(provider.call_count() <= 5);
    assert_eq!(result.query_terms_used.len(), provider.call_count());
    assert_eq!(result.results.len(), 1);
    assert_eq!(result.results[0].confidence, 50);
}

#[tokio::test]
async fn test_empty_provider_returns_empty_result() {
    let (orch, provider) = orchestrator(StaticProvider::new());

    let result = orch.search("volcanoes", &SearchContext::new("Science", "Grade 7", "volcanoes")).await.unwrap();

    assert!(result.is_empty());
    assert!(result.fallback_triggered);
    assert_eq!(result.total_candidates_examined, 0);
    assert_eq!(result.average_confidence, 0.0);
    assert_eq!(provider.call_count(), 5);
}

// ============================================================================
// Failure handling
// ============================================================================

#[tokio::test]
async fn test_primary_failure_is_provider_unavailable() {
    let provider = StaticProvider::new().with_failure("fractions", ProviderError::Auth("bad key".into()));
    let (orch, provider) = orchestrator(provider);

    let err = orch.search("fractions", &math_context()).await.unwrap_err();

    match err {
        SearchError::ProviderUnavailable { query, source } => {
            assert_eq!(query, "fractions");
            assert_eq!(source, ProviderError::Auth("bad key".into()));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(provider.call_count(), 1);
    assert_eq!(orch.performance_metrics().failed_searches, 1);
}

#[tokio::test]
async fn test_missing_credentials_fail_before_any_request() {
    let config = EngineConfig::default();
    let client = YouTubeClient::new(&config.provider, None).unwrap();
    let orch = SearchOrchestrator::new(Arc::new(client), &config);

    let err = orch.search("fractions", &math_context()).await.unwrap_err();

    assert!(matches!(
        err,
        SearchError::ProviderUnavailable {
            source: ProviderError::MissingCredentials,
            ..
        }
    ));
}

#[tokio::test]
async fn test_failed_alternate_is_skipped_and_logged() {
    let provider = StaticProvider::new()
        .with_failure("broken term", ProviderError::Network("connection reset".into()))
        .with_results("good term", vec![strong_fraction_video("g1")]);
    let (orch, _) = orchestrator(provider);
    let ctx = math_context().with_previous_terms(vec!["broken term".into(), "good term".into()]);
    let (logs, _guard) = capture_logs();

    let result = orch.search("fractions", &ctx).await.unwrap();

    assert_eq!(result.feedback.failed_alternates, vec!["broken term".to_string()]);
    assert_eq!(result.results.len(), 1);
    assert_eq!(result.results[0].query_term, "good term");
    assert_eq!(result.feedback.fallback_results, 1);
    logs.assert_contains(Level::WARN, "Alternate fetch failed");
}

#[tokio::test]
async fn test_timed_out_alternate_is_treated_as_failed() {
    let mut config = EngineConfig::default();
    config.search.request_timeout_ms = 50;
    let provider = StaticProvider::new()
        .with_delay("slow term", Duration::from_millis(500))
        .with_results("slow term", vec![strong_fraction_video("s1")]);
    let (orch, _) = orchestrator_with(provider, config);
    let ctx = math_context().with_previous_terms(vec!["slow term".into()]);

    let result = orch.search("fractions", &ctx).await.unwrap();

    assert_eq!(result.feedback.failed_alternates, vec!["slow term".to_string()]);
    assert!(result.results.is_empty());
}

#[tokio::test]
async fn test_timed_out_primary_is_provider_unavailable() {
    let mut config = EngineConfig::default();
    config.search.request_timeout_ms = 50;
    let provider = StaticProvider::new().with_delay("fractions", Duration::from_millis(500));
    let (orch, _) = orchestrator_with(provider, config);

    let err = orch.search("fractions", &math_context()).await.unwrap_err();

    assert!(matches!(
        err,
        SearchError::ProviderUnavailable {
            source: ProviderError::Timeout(50),
            ..
        }
    ));
}

// ============================================================================
// Combining, ordering, preferences
// ============================================================================

#[tokio::test]
async fn test_results_are_unique_and_primary_wins() {
    let provider = StaticProvider::new()
        .with_results("fractions", vec![strong_fraction_video("a")])
        .with_default(vec![strong_fraction_video("a"), strong_fraction_video("b")]);
    let (orch, _) = orchestrator(provider);

    let result = orch.search("fractions", &math_context()).await.unwrap();

    let mut ids: Vec<&str> = result.results.iter().map(|c| c.id()).collect();
    let a = result.results.iter().find(|c| c.id() == "a").unwrap();
    assert_eq!(a.query_term, "fractions");
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), result.results.len());
    assert_eq!(ids, vec!["a", "b"]);
}

#[tokio::test]
async fn test_order_does_not_depend_on_completion_order() {
    let provider = StaticProvider::new()
        .with_results("first alt", vec![strong_fraction_video("a1")])
        .with_delay("first alt", Duration::from_millis(100))
        .with_results("second alt", vec![strong_fraction_video("a2")]);
    let (orch, _) = orchestrator(provider);
    let ctx = math_context().with_previous_terms(vec!["first alt".into(), "second alt".into()]);

    let result = orch.search("fractions", &ctx).await.unwrap();

    let ids: Vec<&str> = result.results.iter().map(|c| c.id()).collect();
    assert_eq!(result.results[0].confidence, result.results[1].confidence);
    assert_eq!(ids, vec!["a1", "a2"]);
    assert_eq!(&result.query_terms_used[..3], &["fractions", "first alt", "second alt"]);
}

#[tokio::test]
async fn test_min_confidence_preference_filters_results() {
    let provider = StaticProvider::new().with_results(
        "fractions",
        vec![
            strong_fraction_video("strong"),
            CandidateItem::new("meh", "Fractions").with_channel("Some Channel"),
        ],
    );
    let (orch, _) = orchestrator(provider);
    let ctx = math_context().with_preferences(SearchPreferences {
        min_confidence: Some(90),
        ..Default::default()
    });

    let result = orch.search("fractions", &ctx).await.unwrap();

    let ids: Vec<&str> = result.results.iter().map(|c| c.id()).collect();
    assert_eq!(ids, vec!["strong"]);
    assert!(result.feedback.filtered_out_count >= 1);
}

#[tokio::test]
async fn test_noise_is_never_returned() {
    let provider = StaticProvider::new()
        .with_default((0..5).map(|i| noise_video(&format!("n{i}"))).collect());
    let (orch, _) = orchestrator(provider);

    let result = orch.search("fractions", &math_context()).await.unwrap();

    assert!(result.results.is_empty());
    assert_eq!(result.feedback.filtered_out_count, 5);
    assert!(result.total_candidates_examined >= 5);
}

// ============================================================================
// Learning and metrics
// ============================================================================

#[tokio::test]
async fn test_successful_alternate_is_learned_and_front_loaded() {
    let provider = StaticProvider::new().with_results("fraction basics", vec![strong_fraction_video("b1")]);
    let (orch, _) = orchestrator(provider);
    let ctx = math_context();

    orch.search("fractions", &ctx).await.unwrap();

    assert_eq!(orch.cache().lookup(&ctx.cache_key()), vec!["fraction basics".to_string()]);

    // Same subject/grade, different spelling: same cache key
    let other = SearchContext::new("  MATH ", "5th  Grade", "fractions");
    assert_eq!(orch.alternates_for("equivalent fractions", &other)[0], "fraction basics");
}

#[tokio::test]
async fn test_metrics_track_searches() {
    let provider = StaticProvider::new()
        .with_results("good", (0..3).map(|i| strong_fraction_video(&format!("g{i}"))).collect())
        .with_failure("down", ProviderError::QuotaExceeded);
    let (orch, _) = orchestrator(provider);
    let ctx = math_context();

    orch.search("good", &ctx).await.unwrap();
    // Different context key, so the learned "good" is not an alternate here
    let other = SearchContext::new("Science", "Grade 7", "rocks");
    orch.search("nothing here", &other).await.unwrap();
    assert!(orch.search("down", &ctx).await.is_err());

    let metrics = orch.performance_metrics();
    assert_eq!(metrics.total_searches, 3);
    assert_eq!(metrics.successful_searches, 1);
    assert_eq!(metrics.failed_searches, 1);
    assert_eq!(metrics.fallback_searches, 1);
    assert_eq!(metrics.cache_size, 1);

    orch.reset_metrics();
    orch.clear_cache();
    let metrics = orch.performance_metrics();
    assert_eq!(metrics.total_searches, 0);
    assert_eq!(metrics.cache_size, 0);
}

#[tokio::test]
async fn test_restored_cache_is_used() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cache.json");

    let cache = PatternCache::new(10, 100);
    cache.record(&math_context().cache_key(), &["pizza fractions".to_string()]);
    eduscout_common::config::write_atomic(&path, cache.to_json().unwrap().as_bytes()).unwrap();

    let restored = Arc::new(PatternCache::new(10, 100));
    let report = restored.restore_json(&std::fs::read_to_string(&path).unwrap());
    assert_eq!(report.loaded, 1);

    let provider = StaticProvider::new().with_results("pizza fractions", vec![strong_fraction_video("p1")]);
    let (orch, provider) = orchestrator(provider);
    let orch = orch.with_cache(restored);

    let result = orch.search("fractions", &math_context()).await.unwrap();

    assert_eq!(provider.calls()[1], "pizza fractions");
    assert_eq!(result.results[0].id(), "p1");
}

// ============================================================================
// Concurrency
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_searches_share_one_cache() {
    let provider = StaticProvider::new()
        .with_results("fraction basics", vec![strong_fraction_video("b1")])
        .with_results("understanding fractions", vec![strong_fraction_video("u1")])
        .with_delay("*", Duration::from_millis(5));
    let (orch, _) = orchestrator(provider);
    let orch = Arc::new(orch);
    let ctx = math_context();

    let mut join_set = JoinSet::new();
    for i in 0..8 {
        let orch = Arc::clone(&orch);
        let ctx = ctx.clone();
        join_set.spawn(async move {
            let term = format!("fractions {}", i % 2);
            orch.search(&term, &ctx).await.map(|r| r.results.len())
        });
    }

    while let Some(joined) = join_set.join_next().await {
        let count = joined.expect("task panicked").expect("search failed");
        assert!(count >= 1);
    }

    let metrics = orch.performance_metrics();
    assert_eq!(metrics.total_searches, 8);

    let learned = orch.cache().lookup(&ctx.cache_key());
    assert!(learned.len() <= 10);
    let mut unique = learned.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), learned.len());
    assert!(learned.contains(&"fraction basics".to_string()));
}
