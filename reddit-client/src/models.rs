//! Wire types for the Reddit JSON API and their conversion into core types.

use chrono::{DateTime, Utc};
use redscrape_core::{RawComment, RawPost};
use serde::{Deserialize, Serialize};

pub const REDDIT_WEB_BASE: &str = "https://www.reddit.com";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListing<T> {
    pub kind: String,
    pub data: RedditListingData<T>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListingData<T> {
    pub children: Vec<T>,
    pub after: Option<String>,
    pub before: Option<String>,
    #[serde(default)]
    pub dist: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListingChild<T> {
    pub kind: String,
    pub data: T,
}

pub type PostListingResponse = RedditListing<RedditListingChild<RedditPostData>>;

/// `/comments/{id}` answers with the submission listing followed by the
/// top-level comment listing.
pub type ThreadResponse = (PostListingResponse, RedditListing<CommentThing>);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditPostData {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub selftext: String,
    #[serde(default)]
    pub author: String,
    pub subreddit: String,
    pub url: String,
    pub permalink: String,
    pub created_utc: f64,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub upvote_ratio: f64,
    #[serde(default)]
    pub num_comments: u64,
    #[serde(default)]
    pub total_awards_received: u64,
    #[serde(default)]
    pub link_flair_text: Option<String>,
    #[serde(default)]
    pub is_original_content: bool,
    #[serde(default)]
    pub over_18: bool,
    #[serde(default)]
    pub spoiler: bool,
    #[serde(default)]
    pub num_crossposts: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data")]
pub enum CommentThing {
    #[serde(rename = "t1")]
    Comment(Box<RedditCommentData>),
    #[serde(rename = "more")]
    More(RedditMoreData),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditCommentData {
    pub id: String,
    pub parent_id: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub score: i64,
    pub created_utc: f64,
    pub permalink: String,
    #[serde(default)]
    pub is_submitter: bool,
    #[serde(default)]
    pub replies: Replies,
}

/// Reddit sends an empty string instead of a listing for comments without
/// replies.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Replies {
    Listing(Box<RedditListing<CommentThing>>),
    Empty(String),
}

impl Default for Replies {
    fn default() -> Self {
        Replies::Empty(String::new())
    }
}

impl Replies {
    pub fn into_children(self) -> Vec<CommentThing> {
        match self {
            Replies::Listing(listing) => listing.data.children,
            Replies::Empty(_) => Vec::new(),
        }
    }
}

/// Placeholder for replies that were not included in the response. An empty
/// `children` list marks a "continue this thread" link under `parent_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditMoreData {
    #[serde(default)]
    pub id: String,
    pub parent_id: String,
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub children: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoreChildrenResponse {
    pub json: MoreChildrenJson,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoreChildrenJson {
    #[serde(default)]
    pub errors: Vec<serde_json::Value>,
    pub data: Option<MoreChildrenData>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoreChildrenData {
    pub things: Vec<CommentThing>,
}

pub fn timestamp_to_utc(created_utc: f64) -> DateTime<Utc> {
    let secs = created_utc.trunc() as i64;
    let nanos = (created_utc.fract() * 1e9).round().clamp(0.0, 999_999_999.0) as u32;
    DateTime::from_timestamp(secs, nanos).unwrap_or_default()
}

fn absolute_permalink(path: &str) -> String {
    if path.starts_with("http") {
        path.to_string()
    } else {
        format!("{}{}", REDDIT_WEB_BASE, path)
    }
}

impl From<RedditPostData> for RawPost {
    fn from(data: RedditPostData) -> Self {
        Self {
            id: data.id,
            title: data.title,
            body: data.selftext,
            subreddit: data.subreddit,
            author: data.author,
            created_utc: timestamp_to_utc(data.created_utc),
            score: data.score,
            upvote_ratio: data.upvote_ratio,
            num_comments: data.num_comments,
            total_awards: data.total_awards_received,
            flair: data.link_flair_text,
            is_original_content: data.is_original_content,
            over_18: data.over_18,
            spoiler: data.spoiler,
            num_crossposts: data.num_crossposts,
            permalink: absolute_permalink(&data.permalink),
            url: data.url,
        }
    }
}

impl From<&RedditCommentData> for RawComment {
    fn from(data: &RedditCommentData) -> Self {
        Self {
            id: data.id.clone(),
            parent_id: data.parent_id.clone(),
            body: data.body.clone(),
            author: data.author.clone(),
            score: data.score,
            created_utc: timestamp_to_utc(data.created_utc),
            permalink: absolute_permalink(&data.permalink),
            is_submitter: data.is_submitter,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reddit_post_conversion() {
        let post_data = RedditPostData {
            id: "test123".to_string(),
            title: "Test Post".to_string(),
            selftext: "This is test content".to_string(),
            author: "test_user".to_string(),
            subreddit: "test".to_string(),
            url: "https://example.com/article".to_string(),
            permalink: "/r/test/comments/test123/test_post/".to_string(),
            created_utc: 1640995200.0,
            score: 42,
            upvote_ratio: 0.93,
            num_comments: 5,
            total_awards_received: 1,
            link_flair_text: Some("Discussion".to_string()),
            is_original_content: false,
            over_18: false,
            spoiler: false,
            num_crossposts: 2,
        };

        let post: RawPost = post_data.into();
        assert_eq!(post.id, "test123");
        assert_eq!(post.body, "This is test content");
        assert_eq!(post.created_utc.timestamp(), 1640995200);
        assert_eq!(
            post.permalink,
            "https://www.reddit.com/r/test/comments/test123/test_post/"
        );
        assert_eq!(post.flair.as_deref(), Some("Discussion"));
    }

    #[test]
    fn test_comment_tree_parsing() {
        let json = r#"{
            "kind": "Listing",
            "data": {
                "after": null,
                "before": null,
                "children": [
                    {"kind": "t1", "data": {
                        "id": "c1", "parent_id": "t3_p", "body": "top", "author": "a",
                        "score": 3, "created_utc": 1700000000.0,
                        "permalink": "/r/test/comments/p/_/c1/", "is_submitter": true,
                        "replies": {"kind": "Listing", "data": {"after": null, "before": null, "children": [
                            {"kind": "t1", "data": {
                                "id": "c2", "parent_id": "t1_c1", "body": "nested",
                                "author": "b", "score": 1, "created_utc": 1700000100.0,
                                "permalink": "/r/test/comments/p/_/c2/", "replies": ""
                            }}
                        ]}}
                    }},
                    {"kind": "more", "data": {
                        "id": "c9", "parent_id": "t3_p", "count": 2, "children": ["c9", "c10"]
                    }}
                ]
            }
        }"#;

        let listing: RedditListing<CommentThing> = serde_json::from_str(json).unwrap();
        assert_eq!(listing.data.children.len(), 2);

        match &listing.data.children[0] {
            CommentThing::Comment(comment) => {
                assert!(comment.is_submitter);
                let replies = comment.replies.clone().into_children();
                assert_eq!(replies.len(), 1);
            }
            other => panic!("expected comment, got {:?}", other),
        }

        match &listing.data.children[1] {
            CommentThing::More(more) => assert_eq!(more.children, vec!["c9", "c10"]),
            other => panic!("expected more, got {:?}", other),
        }
    }

    #[test]
    fn test_fractional_timestamps() {
        let ts = timestamp_to_utc(1700000000.5);
        assert_eq!(ts.timestamp(), 1700000000);
        assert_eq!(ts.timestamp_subsec_millis(), 500);
    }
}
