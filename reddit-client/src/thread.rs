//! Submission lookup by URL and full comment-tree expansion.

use crate::api::{RedditApiClient, MORE_CHILDREN_BATCH};
use crate::models::{CommentThing, RedditMoreData};
use redscrape_core::{CoreError, RawComment, RawPost, RedditApiError, Thread};
use std::collections::{HashSet, VecDeque};
use tracing::{debug, info};
use url::Url;

/// Extracts the submission id from a Reddit post URL.
///
/// Accepts `reddit.com/r/{sub}/comments/{id}/...` on any reddit.com host,
/// `reddit.com/comments/{id}` and `redd.it/{id}`, with or without a scheme.
pub fn parse_post_id(input: &str) -> Result<String, RedditApiError> {
    let invalid = || RedditApiError::InvalidPostUrl {
        url: input.to_string(),
    };

    let trimmed = input.trim();
    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };
    let url = Url::parse(&with_scheme).map_err(|_| invalid())?;
    let host = url.host_str().ok_or_else(invalid)?.to_ascii_lowercase();
    let segments: Vec<&str> = url
        .path_segments()
        .map(|segments| segments.filter(|s| !s.is_empty()).collect())
        .unwrap_or_default();

    let candidate = if host == "redd.it" {
        segments.first().copied()
    } else if host == "reddit.com" || host.ends_with(".reddit.com") {
        segments
            .iter()
            .position(|segment| *segment == "comments")
            .and_then(|index| segments.get(index + 1).copied())
    } else {
        None
    };

    match candidate {
        Some(id) if !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric()) => {
            Ok(id.to_ascii_lowercase())
        }
        _ => Err(invalid()),
    }
}

fn strip_kind_prefix(fullname: &str) -> &str {
    fullname.split_once('_').map_or(fullname, |(_, id)| id)
}

/// Breadth-first flattening of a comment tree, deduplicated by id.
#[derive(Debug, Default)]
struct CommentWalk {
    queue: VecDeque<CommentThing>,
    placeholders: VecDeque<RedditMoreData>,
    seen: HashSet<String>,
    expanded_parents: HashSet<String>,
    requested_children: HashSet<String>,
    comments: Vec<RawComment>,
}

impl CommentWalk {
    fn push_all(&mut self, things: impl IntoIterator<Item = CommentThing>) {
        self.queue.extend(things);
    }

    /// Child ids not yet loaded or asked for. Each id is handed out once.
    fn unrequested(&mut self, children: &[String]) -> Vec<String> {
        children
            .iter()
            .filter(|id| !self.seen.contains(*id) && self.requested_children.insert((*id).clone()))
            .cloned()
            .collect()
    }

    /// Drains the queue, collecting comments and setting placeholders
    /// aside for expansion.
    fn drain(&mut self) {
        while let Some(thing) = self.queue.pop_front() {
            match thing {
                CommentThing::Comment(mut comment) => {
                    if self.seen.insert(comment.id.clone()) {
                        self.comments.push(RawComment::from(comment.as_ref()));
                    }
                    let replies = std::mem::take(&mut comment.replies);
                    self.queue.extend(replies.into_children());
                }
                CommentThing::More(more) => self.placeholders.push_back(more),
            }
        }
    }
}

/// Fetches the submission behind `url` together with every comment, expanding
/// "load more" and "continue this thread" placeholders until none remain.
pub async fn fetch_thread(client: &RedditApiClient, url: &str) -> Result<Thread, CoreError> {
    let post_id = parse_post_id(url)?;
    let (post_listing, comment_listing) = client.fetch_comments(&post_id, None).await?;

    let post_data = post_listing
        .data
        .children
        .into_iter()
        .next()
        .ok_or_else(|| RedditApiError::PostNotFound {
            post_id: post_id.clone(),
        })?
        .data;
    let link_id = format!("t3_{}", post_data.id);
    let post = RawPost::from(post_data);

    let mut walk = CommentWalk::default();
    walk.push_all(comment_listing.data.children);
    walk.drain();

    let mut expansions = 0usize;
    while let Some(more) = walk.placeholders.pop_front() {
        if more.children.is_empty() {
            // An empty placeholder directly under the post carries nothing to load.
            if more.parent_id.starts_with("t3_") {
                continue;
            }
            let parent = strip_kind_prefix(&more.parent_id).to_string();
            if !walk.expanded_parents.insert(parent.clone()) {
                continue;
            }
            debug!("Continuing thread below comment {}", parent);
            let (_, sub_thread) = client.fetch_comments(&post_id, Some(&parent)).await?;
            walk.push_all(sub_thread.data.children);
        } else {
            let pending = walk.unrequested(&more.children);
            if pending.is_empty() {
                debug!("Placeholder {} lists only requested comments", more.id);
                continue;
            }
            for ids in pending.chunks(MORE_CHILDREN_BATCH) {
                let things = client.fetch_more_children(&link_id, ids).await?;
                walk.push_all(things);
            }
        }
        expansions += 1;
        walk.drain();
    }

    info!(
        "Fetched post {} with {} comments ({} placeholders expanded)",
        post.id,
        walk.comments.len(),
        expansions
    );

    Ok(Thread {
        post,
        comments: walk.comments,
    })
}
