//! Twitter v1.1 search API client.
//!
//! Results are paged newest-first. Each request asks for at most 100 tweets;
//! the next page is requested with `max_id` set just below the oldest id seen
//! so far, until the limit is reached or a page comes back empty.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use super::oauth::{encode, OAuthCredentials};
use super::{Tweet, TweetSource};
use crate::config::SocialSupportConfig;
use crate::error::SearchError;

/// Default search endpoint.
const SEARCH_URL: &str = "https://api.twitter.com/1.1/search/tweets.json";

/// Largest page size the search endpoint accepts.
const MAX_PAGE_SIZE: usize = 100;

/// Request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Search API client authenticated with OAuth 1.0a user credentials.
pub struct TwitterSearchClient {
    client: Client,
    credentials: OAuthCredentials,
    query: String,
    search_url: String,
    /// Id of the last tweet seen; informational only.
    since_id: Mutex<Option<u64>>,
}

impl TwitterSearchClient {
    /// Create a client for `query` against the public search endpoint.
    pub fn new(credentials: OAuthCredentials, query: impl Into<String>) -> Self {
        Self::with_search_url(credentials, query, SEARCH_URL)
    }

    /// Create a client against a custom endpoint (proxies, test servers).
    pub fn with_search_url(
        credentials: OAuthCredentials,
        query: impl Into<String>,
        search_url: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .unwrap_or_else(|_| Client::new()),
            credentials,
            query: query.into(),
            search_url: search_url.into(),
            since_id: Mutex::new(None),
        }
    }

    /// Create a client from validated plugin configuration.
    pub fn from_config(config: &SocialSupportConfig) -> Self {
        let credentials = OAuthCredentials::new(
            config.twitter_consumer_key.clone(),
            config.twitter_consumer_secret.clone(),
            config.twitter_oauth_token.clone(),
            config.twitter_oauth_secret.clone(),
        );
        Self::new(credentials, config.twitter_search_query.clone())
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Search for up to `limit` tweets matching `query`.
    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<Tweet>, SearchError> {
        let mut tweets: Vec<Tweet> = Vec::with_capacity(limit.min(MAX_PAGE_SIZE));
        let mut max_id: Option<u64> = None;

        while tweets.len() < limit {
            let count = (limit - tweets.len()).min(MAX_PAGE_SIZE);
            let page = self.fetch_page(query, count, max_id).await?;
            if page.is_empty() {
                break;
            }

            max_id = page.iter().map(|t| t.id).min().and_then(|id| id.checked_sub(1));

            tracing::debug!(
                page_items = page.len(),
                total = tweets.len() + page.len(),
                "Twitter search page fetched"
            );

            for tweet in page {
                if tweets.len() >= limit {
                    break;
                }
                self.record_seen(tweet.id);
                tweets.push(tweet);
            }

            if max_id.is_none() {
                break;
            }
        }

        tracing::info!(query = query, total = tweets.len(), "Twitter search completed");
        Ok(tweets)
    }

    async fn fetch_page(
        &self,
        query: &str,
        count: usize,
        max_id: Option<u64>,
    ) -> Result<Vec<Tweet>, SearchError> {
        let count = count.to_string();
        let max_id = max_id.map(|id| id.to_string());

        let mut params: Vec<(&str, &str)> = vec![("q", query), ("count", count.as_str())];
        if let Some(ref id) = max_id {
            params.push(("max_id", id.as_str()));
        }

        let query_string = params
            .iter()
            .map(|(k, v)| format!("{}={}", encode(k), encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        let url = format!("{}?{}", self.search_url, query_string);

        let authorization = self
            .credentials
            .authorization_header("GET", &self.search_url, &params);

        let response = self
            .client
            .get(&url)
            .header("Authorization", authorization)
            .header("User-Agent", "social-support/0.1")
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, body = %body, "Twitter search API returned error");
            return Err(SearchError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let raw: Value = response
            .json()
            .await
            .map_err(|e| SearchError::Parse(e.to_string()))?;

        parse_search_page(&raw)
    }

    fn record_seen(&self, id: u64) {
        if let Ok(mut since_id) = self.since_id.lock() {
            *since_id = Some(id);
        }
    }
}

#[async_trait]
impl TweetSource for TwitterSearchClient {
    async fn fetch_tweets(&self, limit: usize) -> Result<Vec<Tweet>, SearchError> {
        self.search(&self.query, limit).await
    }

    fn since_id(&self) -> Option<u64> {
        self.since_id.lock().ok().and_then(|id| *id)
    }
}

/// Parse one search response body into tweets.
fn parse_search_page(raw: &Value) -> Result<Vec<Tweet>, SearchError> {
    let statuses = raw
        .get("statuses")
        .and_then(Value::as_array)
        .ok_or_else(|| SearchError::Parse("response has no 'statuses' array".to_string()))?;

    Ok(statuses.iter().filter_map(parse_status).collect())
}

/// Parse a single status object; statuses without an id or text are skipped.
fn parse_status(item: &Value) -> Option<Tweet> {
    let id = item
        .get("id")
        .and_then(Value::as_u64)
        .or_else(|| {
            item.get("id_str")
                .and_then(Value::as_str)
                .and_then(|s| s.parse().ok())
        })?;

    let text = item
        .get("full_text")
        .or_else(|| item.get("text"))
        .and_then(Value::as_str)?
        .to_string();

    let user = item
        .get("user")
        .and_then(|u| u.get("screen_name"))
        .and_then(Value::as_str)
        .map(str::to_string);

    let created_at = item
        .get("created_at")
        .and_then(Value::as_str)
        .map(str::to_string);

    Some(Tweet {
        id,
        text,
        user,
        created_at,
    })
}
