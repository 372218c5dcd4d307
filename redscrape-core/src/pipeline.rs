//! Request-level composition of window resolution, scanning and
//! classification.
//!
//! Source failures never escape from here as `Err`: they are logged and
//! returned next to an empty record set so the caller can show a message.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tracing::info;

use crate::classifier::KeywordClassifier;
use crate::scanner::{scan, PostListing};
use crate::types::{
    ClassifiedComment, ClassifiedPost, FilterKind, RawPost, Thread, TimeWindow,
};
use crate::window::{date_range_warning, resolve};
use crate::{CoreError, ErrorReporter};

/// Opens newest-first listings by subreddit name.
pub trait ListingSource: Send + Sync {
    type Listing: PostListing;

    fn listing(&self, subreddit: &str) -> Self::Listing;
}

/// Looks up one submission and its full reply tree by URL.
#[async_trait]
pub trait ThreadSource: Send + Sync {
    async fn fetch_thread(&self, url: &str) -> Result<Thread, CoreError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionRequest {
    pub subreddit: String,
    pub filter: FilterKind,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl CollectionRequest {
    pub fn new(subreddit: impl Into<String>, filter: FilterKind) -> Self {
        Self {
            subreddit: subreddit.into(),
            filter,
            start: None,
            end: None,
        }
    }

    pub fn with_dates(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    pub fn window(&self, now: DateTime<Utc>) -> TimeWindow {
        resolve(self.filter, now, self.start, self.end)
    }

    /// Warnings that do not block the request.
    pub fn warnings(&self) -> Vec<String> {
        if self.filter != FilterKind::DateRange {
            return Vec::new();
        }
        date_range_warning(self.start, self.end).into_iter().collect()
    }
}

/// Records of one request plus the error that emptied them, if any.
#[derive(Debug)]
pub struct Collection<T> {
    pub records: Vec<T>,
    pub error: Option<CoreError>,
    pub warnings: Vec<String>,
}

impl<T> Collection<T> {
    pub fn ok(records: Vec<T>, warnings: Vec<String>) -> Self {
        Self {
            records,
            error: None,
            warnings,
        }
    }

    pub fn failed(error: CoreError, warnings: Vec<String>) -> Self {
        Self {
            records: Vec::new(),
            error: Some(error),
            warnings,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[derive(Debug)]
pub struct ThreadCollection {
    pub post: Option<ClassifiedPost>,
    pub comments: Vec<ClassifiedComment>,
    pub error: Option<CoreError>,
}

impl ThreadCollection {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

pub fn classify_post(classifier: &KeywordClassifier, post: RawPost) -> ClassifiedPost {
    let classification = classifier.classify(&post.title, &post.body);
    ClassifiedPost {
        post,
        classification,
    }
}

/// Scans `listing` for posts inside the request's window and classifies each
/// one, preserving scan order.
pub async fn collect_posts<L: PostListing + ?Sized>(
    listing: &mut L,
    request: &CollectionRequest,
    now: DateTime<Utc>,
    classifier: &KeywordClassifier,
) -> Collection<ClassifiedPost> {
    let reporter = ErrorReporter::new();
    let warnings = request.warnings();
    for warning in &warnings {
        reporter.report_warning(&CoreError::InvalidInput {
            message: format!("r/{}: {}", request.subreddit, warning),
        });
    }

    let window = request.window(now);
    match scan(listing, window).await {
        Ok(posts) => {
            let records: Vec<ClassifiedPost> = posts
                .into_iter()
                .map(|post| classify_post(classifier, post))
                .collect();
            info!(
                "Collected {} posts from r/{} ({})",
                records.len(),
                request.subreddit,
                request.filter
            );
            Collection::ok(records, warnings)
        }
        Err(e) => {
            reporter.report_error(&e);
            Collection::failed(e, warnings)
        }
    }
}

/// Fetches one thread and classifies the post and every comment. Comments
/// are classified on their body alone.
pub async fn collect_thread<S: ThreadSource + ?Sized>(
    source: &S,
    url: &str,
    classifier: &KeywordClassifier,
) -> ThreadCollection {
    match source.fetch_thread(url).await {
        Ok(thread) => {
            let post = classify_post(classifier, thread.post);
            let comments: Vec<ClassifiedComment> = thread
                .comments
                .into_iter()
                .map(|comment| {
                    let classification = classifier.classify("", &comment.body);
                    ClassifiedComment {
                        comment,
                        classification,
                    }
                })
                .collect();
            info!(
                "Collected post {} with {} comments",
                post.post.id,
                comments.len()
            );
            ThreadCollection {
                post: Some(post),
                comments,
                error: None,
            }
        }
        Err(e) => {
            ErrorReporter::new().report_error(&e);
            ThreadCollection {
                post: None,
                comments: Vec::new(),
                error: Some(e),
            }
        }
    }
}
