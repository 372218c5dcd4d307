//! Lazily paged `/r/{name}/new` feed.

use crate::api::RedditApiClient;
use async_trait::async_trait;
use redscrape_core::scanner::PostListing;
use redscrape_core::{CoreError, RawPost, RedditApiError};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::debug;

const MAX_SUBREDDIT_NAME_LEN: usize = 21;

/// Accepts `name`, `r/name` and `/r/name/`, returning the bare name.
pub fn normalize_subreddit(input: &str) -> Result<String, RedditApiError> {
    let trimmed = input.trim().trim_matches('/');
    let name = trimmed
        .strip_prefix("r/")
        .or_else(|| trimmed.strip_prefix("R/"))
        .unwrap_or(trimmed);

    let valid = !name.is_empty()
        && name.len() <= MAX_SUBREDDIT_NAME_LEN
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');

    if valid {
        Ok(name.to_string())
    } else {
        Err(RedditApiError::SubredditNotFound {
            subreddit: input.to_string(),
        })
    }
}

/// Newest-first posts of one subreddit, fetched a page at a time and only
/// when the buffered page runs out.
#[derive(Debug)]
pub struct SubredditListing {
    client: Arc<RedditApiClient>,
    subreddit: Result<String, RedditApiError>,
    buffer: VecDeque<RawPost>,
    after: Option<String>,
    exhausted: bool,
    pages_fetched: u32,
}

impl SubredditListing {
    pub fn new(client: Arc<RedditApiClient>, subreddit: &str) -> Self {
        Self {
            client,
            subreddit: normalize_subreddit(subreddit),
            buffer: VecDeque::new(),
            after: None,
            exhausted: false,
            pages_fetched: 0,
        }
    }

    pub fn pages_fetched(&self) -> u32 {
        self.pages_fetched
    }

    async fn fetch_page(&mut self) -> Result<(), CoreError> {
        let name = match &self.subreddit {
            Ok(name) => name,
            Err(e) => {
                self.exhausted = true;
                return Err(CoreError::RedditApi(e.clone()));
            }
        };

        let page = self
            .client
            .fetch_new_page(name, self.after.as_deref())
            .await?;

        self.pages_fetched += 1;
        self.after = page.data.after;
        if self.after.is_none() || page.data.children.is_empty() {
            debug!("Listing exhausted after {} pages", self.pages_fetched);
            self.exhausted = true;
        }

        self.buffer.extend(
            page.data
                .children
                .into_iter()
                .map(|child| RawPost::from(child.data)),
        );
        Ok(())
    }
}

#[async_trait]
impl PostListing for SubredditListing {
    async fn next_post(&mut self) -> Result<Option<RawPost>, CoreError> {
        loop {
            if let Some(post) = self.buffer.pop_front() {
                return Ok(Some(post));
            }
            if self.exhausted {
                return Ok(None);
            }
            self.fetch_page().await?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_subreddit() {
        assert_eq!(normalize_subreddit("rust").unwrap(), "rust");
        assert_eq!(normalize_subreddit("r/rust").unwrap(), "rust");
        assert_eq!(normalize_subreddit("/r/Ask_Reddit/").unwrap(), "Ask_Reddit");
        assert_eq!(normalize_subreddit("  learnrust ").unwrap(), "learnrust");
    }

    #[test]
    fn test_invalid_subreddit_names() {
        assert!(normalize_subreddit("").is_err());
        assert!(normalize_subreddit("r/").is_err());
        assert!(normalize_subreddit("two words").is_err());
        assert!(normalize_subreddit("../etc").is_err());
        assert!(normalize_subreddit("this_name_is_far_too_long_for_reddit").is_err());
    }
}
