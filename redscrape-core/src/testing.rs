//! In-memory listing and post builders shared by the unit tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::VecDeque;

use crate::scanner::PostListing;
use crate::types::RawPost;
use crate::{CoreError, RedditApiError};

pub fn post_at(id: &str, created_utc: DateTime<Utc>) -> RawPost {
    RawPost {
        id: id.to_string(),
        title: format!("Post {id}"),
        body: String::new(),
        subreddit: "test".to_string(),
        author: "tester".to_string(),
        created_utc,
        score: 1,
        upvote_ratio: 1.0,
        num_comments: 0,
        total_awards: 0,
        flair: None,
        is_original_content: false,
        over_18: false,
        spoiler: false,
        num_crossposts: 0,
        permalink: format!("https://www.reddit.com/r/test/comments/{id}/"),
        url: format!("https://www.reddit.com/r/test/comments/{id}/"),
    }
}

/// Listing backed by a vector that records how often it was polled.
pub struct VecListing {
    posts: VecDeque<RawPost>,
    calls: usize,
    fail_after: Option<(usize, RedditApiError)>,
}

impl VecListing {
    pub fn new(posts: Vec<RawPost>) -> Self {
        Self {
            posts: posts.into(),
            calls: 0,
            fail_after: None,
        }
    }

    /// Returns `error` on the call after `count` successful ones.
    pub fn failing_after(mut self, count: usize, error: RedditApiError) -> Self {
        self.fail_after = Some((count, error));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls
    }
}

#[async_trait]
impl PostListing for VecListing {
    async fn next_post(&mut self) -> Result<Option<RawPost>, CoreError> {
        self.calls += 1;
        if let Some((count, error)) = &self.fail_after {
            if self.calls > *count {
                return Err(CoreError::RedditApi(error.clone()));
            }
        }
        Ok(self.posts.pop_front())
    }
}
