//! YouTube Data API client
//!
//! [`ContentProvider`] over the YouTube Data API v3:
//! - `search.list` paginated via `pageToken`, up to `max_pages`
//! - `videos.list` follow-up for durations (ISO-8601) and view counts
//! - `governor` rate limiting, bounded retry with backoff for transient errors
//!
//! "No results" is `FetchOutcome::Empty`. Missing credentials, auth and quota
//! failures are `FetchOutcome::Failed`.

use crate::config::ProviderConfig;
use crate::models::CandidateItem;
use crate::types::{ContentProvider, DurationBand, FetchOutcome, ProviderError, SearchFilters};
use crate::utils::{decode_html_entities, parse_iso8601_duration, retry_transient};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use governor::{Quota, RateLimiter};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::num::NonZeroU32;
use std::time::Duration;
use tracing::{debug, warn};

/// API page size ceiling
const MAX_PAGE_SIZE: usize = 50;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchListResponse {
    #[serde(default)]
    next_page_token: Option<String>,
    #[serde(default)]
    items: Vec<SearchListItem>,
}

#[derive(Debug, Deserialize)]
struct SearchListItem {
    #[serde(default)]
    id: SearchItemId,
    #[serde(default)]
    snippet: Snippet,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItemId {
    #[serde(default)]
    video_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snippet {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    channel_title: String,
    #[serde(default)]
    published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoItem {
    id: String,
    #[serde(default)]
    content_details: Option<ContentDetails>,
    #[serde(default)]
    statistics: Option<Statistics>,
}

#[derive(Debug, Deserialize)]
struct ContentDetails {
    #[serde(default)]
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Statistics {
    /// The API returns counts as strings
    #[serde(default)]
    view_count: Option<String>,
}

/// Duration and views for one video
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VideoDetails {
    pub duration_seconds: u32,
    pub view_count: Option<u64>,
}

/// One parsed `search.list` page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPage {
    pub items: Vec<CandidateItem>,
    pub next_page_token: Option<String>,
}

/// YouTube Data API client
pub struct YouTubeClient {
    http_client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    max_pages: u32,
    max_retries: u32,
    timeout_ms: u64,
    rate_limiter: RateLimiter<
        governor::state::NotKeyed,
        governor::state::InMemoryState,
        governor::clock::DefaultClock,
    >,
}

impl YouTubeClient {
    /// Build a client; `api_key` comes from [`EngineConfig::resolve_api_key`](crate::config::EngineConfig::resolve_api_key)
    pub fn new(config: &ProviderConfig, api_key: Option<String>) -> Result<Self, ProviderError> {
        let http_client = reqwest::Client::builder()
            .user_agent(eduscout_common::config::get_user_agent())
            .timeout(Duration::from_millis(config.http_timeout_ms))
            .build()
            .map_err(|e| ProviderError::Network(format!("HTTP client init failed: {}", e)))?;

        let per_second = NonZeroU32::new(config.requests_per_second).unwrap_or(NonZeroU32::MIN);
        let rate_limiter = RateLimiter::direct(Quota::per_second(per_second));

        Ok(Self {
            http_client,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_pages: config.max_pages.max(1),
            max_retries: config.max_retries,
            timeout_ms: config.http_timeout_ms,
            rate_limiter,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn search_videos(
        &self,
        api_key: &str,
        query: &str,
        max_results: usize,
        filters: &SearchFilters,
    ) -> Result<Vec<CandidateItem>, ProviderError> {
        let mut items: Vec<CandidateItem> = Vec::new();
        let mut page_token: Option<String> = None;

        for page in 0..self.max_pages {
            let remaining = max_results.saturating_sub(items.len());
            if remaining == 0 {
                break;
            }
            let params = search_params(
                api_key,
                query,
                remaining.min(MAX_PAGE_SIZE),
                filters,
                page_token.as_deref(),
            );

            debug!(query = %query, page, "Requesting YouTube search page");
            let body = retry_transient("youtube search.list", self.max_retries, || {
                self.get_text("search", &params)
            })
            .await?;

            let parsed = parse_search_page(&body)?;
            items.extend(parsed.items);
            page_token = parsed.next_page_token;
            if page_token.is_none() {
                break;
            }
        }

        items.truncate(max_results);
        if items.is_empty() {
            return Ok(items);
        }

        let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        match self.video_details(api_key, &ids).await {
            Ok(details) => apply_details(&mut items, &details),
            // Details only enrich scoring; keep the search results
            Err(e) => warn!(query = %query, error = %e, "YouTube videos.list failed, durations unknown"),
        }

        Ok(items)
    }

    async fn video_details(
        &self,
        api_key: &str,
        ids: &[&str],
    ) -> Result<HashMap<String, VideoDetails>, ProviderError> {
        let mut details = HashMap::new();
        for chunk in ids.chunks(MAX_PAGE_SIZE) {
            let params = vec![
                ("part", "contentDetails,statistics".to_string()),
                ("id", chunk.join(",")),
                ("key", api_key.to_string()),
            ];
            let body = retry_transient("youtube videos.list", self.max_retries, || {
                self.get_text("videos", &params)
            })
            .await?;
            details.extend(parse_video_details(&body)?);
        }
        Ok(details)
    }

    /// One rate-limited GET returning the body of a 2xx response
    async fn get_text(&self, endpoint: &str, params: &[(&str, String)]) -> Result<String, ProviderError> {
        self.rate_limiter.until_ready().await;

        let url = format!("{}/{}", self.base_url, endpoint);
        let response = self
            .http_client
            .get(&url)
            .query(params)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.map_transport_error(e))?;

        if !status.is_success() {
            return Err(map_status(status.as_u16(), &body));
        }
        Ok(body)
    }

    fn map_transport_error(&self, error: reqwest::Error) -> ProviderError {
        if error.is_timeout() {
            ProviderError::Timeout(self.timeout_ms)
        } else {
            ProviderError::Network(error.to_string())
        }
    }
}

#[async_trait]
impl ContentProvider for YouTubeClient {
    fn name(&self) -> &'static str {
        "youtube"
    }

    async fn search(&self, query: &str, max_results: usize, filters: &SearchFilters) -> FetchOutcome {
        let Some(api_key) = self.api_key.as_deref() else {
            return FetchOutcome::Failed(ProviderError::MissingCredentials);
        };

        match self.search_videos(api_key, query, max_results, filters).await {
            Ok(items) => {
                debug!(query = %query, count = items.len(), "YouTube search complete");
                FetchOutcome::from_items(items)
            }
            Err(e) => FetchOutcome::Failed(e),
        }
    }
}

/// Query parameters for one `search.list` request
pub fn search_params(
    api_key: &str,
    query: &str,
    page_size: usize,
    filters: &SearchFilters,
    page_token: Option<&str>,
) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("part", "snippet".to_string()),
        ("type", "video".to_string()),
        ("q", query.to_string()),
        ("maxResults", page_size.to_string()),
        ("safeSearch", if filters.safe_mode { "strict" } else { "moderate" }.to_string()),
        ("relevanceLanguage", "en".to_string()),
        ("key", api_key.to_string()),
    ];
    if filters.preferred_duration_band != DurationBand::Any {
        params.push(("videoDuration", filters.preferred_duration_band.as_str().to_string()));
    }
    if let Some(token) = page_token {
        params.push(("pageToken", token.to_string()));
    }
    params
}

fn parse_json<T: DeserializeOwned>(body: &str) -> Result<T, ProviderError> {
    serde_json::from_str(body).map_err(|e| ProviderError::Parse(e.to_string()))
}

/// Parse a `search.list` response; items without a video id are skipped
pub fn parse_search_page(body: &str) -> Result<SearchPage, ProviderError> {
    let response: SearchListResponse = parse_json(body)?;

    let items = response
        .items
        .into_iter()
        .filter_map(|item| {
            let id = item.id.video_id?;
            let snippet = item.snippet;
            Some(CandidateItem {
                id,
                title: decode_html_entities(&snippet.title),
                description: decode_html_entities(&snippet.description),
                channel: decode_html_entities(&snippet.channel_title),
                published_at: snippet.published_at,
                duration_seconds: 0,
                view_count: None,
            })
        })
        .collect();

    Ok(SearchPage {
        items,
        next_page_token: response.next_page_token.filter(|t| !t.is_empty()),
    })
}

/// Parse a `videos.list` response into details keyed by video id
pub fn parse_video_details(body: &str) -> Result<HashMap<String, VideoDetails>, ProviderError> {
    let response: VideoListResponse = parse_json(body)?;

    Ok(response
        .items
        .into_iter()
        .map(|video| {
            let duration_seconds = video
                .content_details
                .and_then(|d| d.duration)
                .and_then(|d| parse_iso8601_duration(&d))
                .unwrap_or(0);
            let view_count = video
                .statistics
                .and_then(|s| s.view_count)
                .and_then(|v| v.parse().ok());
            (
                video.id,
                VideoDetails {
                    duration_seconds,
                    view_count,
                },
            )
        })
        .collect())
}

fn apply_details(items: &mut [CandidateItem], details: &HashMap<String, VideoDetails>) {
    for item in items.iter_mut() {
        if let Some(d) = details.get(&item.id) {
            item.duration_seconds = d.duration_seconds;
            item.view_count = d.view_count;
        }
    }
}

/// Map a non-2xx response to a provider error
///
/// YouTube reports quota and rate problems as 403 with a reason in the body.
pub fn map_status(status: u16, body: &str) -> ProviderError {
    match status {
        401 => ProviderError::Auth(summarize(body)),
        403 if body.contains("quotaExceeded") || body.contains("dailyLimitExceeded") => {
            ProviderError::QuotaExceeded
        }
        403 if body.contains("rateLimitExceeded") || body.contains("userRateLimitExceeded") => {
            ProviderError::RateLimited
        }
        403 => ProviderError::Auth(summarize(body)),
        429 => ProviderError::RateLimited,
        _ => ProviderError::Api(status, summarize(body)),
    }
}

fn summarize(body: &str) -> String {
    const MAX_LEN: usize = 200;
    let trimmed = body.trim();
    match trimmed.char_indices().nth(MAX_LEN) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEARCH_PAGE: &str = r#"{
        "nextPageToken": "CAUQAA",
        "items": [
            {
                "id": {"kind": "youtube#video", "videoId": "abc123"},
                "snippet": {
                    "title": "Fractions &amp; Decimals Explained",
                    "description": "A math lesson",
                    "channelTitle": "Khan Academy",
                    "publishedAt": "2021-03-04T12:00:00Z"
                }
            },
            {
                "id": {"kind": "youtube#channel", "channelId": "UCxyz"},
                "snippet": {"title": "A channel"}
            }
        ]
    }"#;

    #[test]
    fn test_parse_search_page() {
        let page = parse_search_page(SEARCH_PAGE).unwrap();

        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].id, "abc123");
        assert_eq!(page.items[0].title, "Fractions & Decimals Explained");
        assert_eq!(page.items[0].channel, "Khan Academy");
        assert!(page.items[0].published_at.is_some());
        assert_eq!(page.next_page_token.as_deref(), Some("CAUQAA"));
    }

    #[test]
    fn test_parse_empty_search_page() {
        let page = parse_search_page(r#"{"items": []}"#).unwrap();
        assert!(page.items.is_empty());
        assert!(page.next_page_token.is_none());
    }

    #[test]
    fn test_parse_search_page_rejects_garbage() {
        assert!(matches!(parse_search_page("<html>"), Err(ProviderError::Parse(_))));
    }

    #[test]
    fn test_parse_video_details() {
        let details = parse_video_details(
            r#"{"items": [
                {"id": "abc123", "contentDetails": {"duration": "PT7M30S"}, "statistics": {"viewCount": "12345"}},
                {"id": "live1", "contentDetails": {"duration": "P0D"}}
            ]}"#,
        )
        .unwrap();

        assert_eq!(
            details["abc123"],
            VideoDetails {
                duration_seconds: 450,
                view_count: Some(12345)
            }
        );
        assert_eq!(details["live1"].duration_seconds, 0);
        assert_eq!(details["live1"].view_count, None);
    }

    #[test]
    fn test_search_params_map_filters() {
        let filters = SearchFilters {
            safe_mode: true,
            preferred_duration_band: DurationBand::Medium,
        };
        let params = search_params("KEY", "fractions", 25, &filters, Some("TOKEN"));
        let get = |name: &str| params.iter().find(|(k, _)| *k == name).map(|(_, v)| v.as_str());

        assert_eq!(get("q"), Some("fractions"));
        assert_eq!(get("maxResults"), Some("25"));
        assert_eq!(get("safeSearch"), Some("strict"));
        assert_eq!(get("videoDuration"), Some("medium"));
        assert_eq!(get("pageToken"), Some("TOKEN"));

        let params = search_params("KEY", "fractions", 25, &SearchFilters::default(), None);
        assert!(!params.iter().any(|(k, _)| *k == "videoDuration" || *k == "pageToken"));
    }

    #[test]
    fn test_map_status() {
        let quota = r#"{"error": {"errors": [{"reason": "quotaExceeded"}]}}"#;
        assert_eq!(map_status(403, quota), ProviderError::QuotaExceeded);
        assert_eq!(map_status(403, "rateLimitExceeded"), ProviderError::RateLimited);
        assert!(matches!(map_status(403, "forbidden"), ProviderError::Auth(_)));
        assert!(matches!(map_status(401, ""), ProviderError::Auth(_)));
        assert_eq!(map_status(429, ""), ProviderError::RateLimited);
        assert!(map_status(503, "").is_transient());
        assert!(!map_status(400, "bad").is_transient());
    }

    #[tokio::test]
    async fn test_missing_key_fails_without_request() {
        let client = YouTubeClient::new(&ProviderConfig::default(), None).unwrap();
        assert!(!client.is_configured());

        let outcome = client.search("fractions", 10, &SearchFilters::default()).await;
        assert_eq!(outcome, FetchOutcome::Failed(ProviderError::MissingCredentials));
    }
}
