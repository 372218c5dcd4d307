//! Reddit API access for redscrape: app-only OAuth, rate limiting, retries,
//! subreddit listings and full comment threads.

pub mod api;
pub mod auth;
pub mod listing;
pub mod models;
pub mod rate_limiter;
pub mod retry;
pub mod thread;


pub use api::{ClientSettings, RedditApiClient};
pub use listing::SubredditListing;

use async_trait::async_trait;
use redscrape_core::config::AppConfig;
use redscrape_core::pipeline::{ListingSource, ThreadSource};
use redscrape_core::{CoreError, Thread};
use std::sync::Arc;

/// Shared handle implementing the core's listing and thread sources.
#[derive(Debug, Clone)]
pub struct RedditClient {
    api: Arc<RedditApiClient>,
}

impl RedditClient {
    pub fn new(
        client_id: &str,
        client_secret: &str,
        settings: ClientSettings,
    ) -> Result<Self, CoreError> {
        Ok(Self {
            api: Arc::new(RedditApiClient::new(client_id, client_secret, settings)?),
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, CoreError> {
        Ok(Self {
            api: Arc::new(RedditApiClient::from_config(config)?),
        })
    }

    pub fn api(&self) -> &RedditApiClient {
        &self.api
    }
}

impl ListingSource for RedditClient {
    type Listing = SubredditListing;

    fn listing(&self, subreddit: &str) -> SubredditListing {
        SubredditListing::new(Arc::clone(&self.api), subreddit)
    }
}

#[async_trait]
impl ThreadSource for RedditClient {
    async fn fetch_thread(&self, url: &str) -> Result<Thread, CoreError> {
        thread::fetch_thread(&self.api, url).await
    }
}
