//! Twitter search integration.
//!
//! The plugin only needs one thing from Twitter: a batch of recent tweets
//! matching the configured search query. [`TweetSource`] is the seam the
//! training workflow depends on; [`TwitterSearchClient`] is the real
//! implementation against the v1.1 search endpoint.

pub mod oauth;
pub mod search;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::SearchError;

pub use oauth::OAuthCredentials;
pub use search::TwitterSearchClient;

/// A search result reduced to the fields the labeling workflow keeps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tweet {
    pub id: u64,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl Tweet {
    pub fn new(id: u64, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            user: None,
            created_at: None,
        }
    }
}

/// Source of tweets for queue refills.
#[async_trait]
pub trait TweetSource: Send + Sync {
    /// Fetches up to `limit` tweets for the configured search query.
    async fn fetch_tweets(&self, limit: usize) -> Result<Vec<Tweet>, SearchError>;

    /// Id of the last tweet seen by the most recent fetch, if any.
    fn since_id(&self) -> Option<u64> {
        None
    }
}
