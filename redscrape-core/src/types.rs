use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::CoreError;

#[derive(Debug, Clone, PartialEq)]
pub struct RawPost {
    pub id: String,
    pub title: String,
    pub body: String,
    pub subreddit: String,
    pub author: String,
    pub created_utc: DateTime<Utc>,
    pub score: i64,
    pub upvote_ratio: f64,
    pub num_comments: u64,
    pub total_awards: u64,
    pub flair: Option<String>,
    pub is_original_content: bool,
    pub over_18: bool,
    pub spoiler: bool,
    pub num_crossposts: u64,
    /// Absolute `https://www.reddit.com/...` link.
    pub permalink: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawComment {
    pub id: String,
    pub parent_id: String,
    pub body: String,
    pub author: String,
    pub score: i64,
    pub created_utc: DateTime<Utc>,
    pub permalink: String,
    pub is_submitter: bool,
}

/// A submission together with its fully expanded reply tree, flattened.
#[derive(Debug, Clone)]
pub struct Thread {
    pub post: RawPost,
    pub comments: Vec<RawComment>,
}

/// Classification buckets. Declaration order of the first six variants is the
/// tie-break order used by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Pain Points")]
    PainPoints,
    #[serde(rename = "Solution Requests")]
    SolutionRequests,
    #[serde(rename = "Money Talk")]
    MoneyTalk,
    #[serde(rename = "Hot Discussions")]
    HotDiscussions,
    #[serde(rename = "Seeking Alternatives")]
    SeekingAlternatives,
    #[serde(rename = "Work/Study Related")]
    WorkStudyRelated,
    #[serde(rename = "General Discussion")]
    GeneralDiscussion,
}

impl Category {
    /// Scored categories in canonical order. `GeneralDiscussion` is the
    /// fallback and is never scored.
    pub const SCORED: [Category; 6] = [
        Category::PainPoints,
        Category::SolutionRequests,
        Category::MoneyTalk,
        Category::HotDiscussions,
        Category::SeekingAlternatives,
        Category::WorkStudyRelated,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Category::PainPoints => "Pain Points",
            Category::SolutionRequests => "Solution Requests",
            Category::MoneyTalk => "Money Talk",
            Category::HotDiscussions => "Hot Discussions",
            Category::SeekingAlternatives => "Seeking Alternatives",
            Category::WorkStudyRelated => "Work/Study Related",
            Category::GeneralDiscussion => "General Discussion",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub category: Category,
    pub confidence: f64,
}

impl ClassificationResult {
    pub fn general() -> Self {
        Self {
            category: Category::GeneralDiscussion,
            confidence: 0.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClassifiedPost {
    pub post: RawPost,
    pub classification: ClassificationResult,
}

#[derive(Debug, Clone)]
pub struct ClassifiedComment {
    pub comment: RawComment,
    pub classification: ClassificationResult,
}

/// Symbolic time filters accepted by the window resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FilterKind {
    #[default]
    All,
    LastWeek,
    LastMonth,
    LastYear,
    DateRange,
}

impl FilterKind {
    pub fn label(&self) -> &'static str {
        match self {
            FilterKind::All => "All",
            FilterKind::LastWeek => "Last Week",
            FilterKind::LastMonth => "Last Month",
            FilterKind::LastYear => "Last Year",
            FilterKind::DateRange => "Date Range",
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for FilterKind {
    type Err = CoreError;

    /// Accepts both the display labels ("Last Week") and kebab/snake-case
    /// forms ("last-week", "last_week").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .flat_map(char::to_lowercase)
            .collect();

        match normalized.as_str() {
            "all" => Ok(FilterKind::All),
            "lastweek" => Ok(FilterKind::LastWeek),
            "lastmonth" => Ok(FilterKind::LastMonth),
            "lastyear" => Ok(FilterKind::LastYear),
            "daterange" => Ok(FilterKind::DateRange),
            _ => Err(CoreError::InvalidInput {
                message: format!("unknown time filter '{}'", s),
            }),
        }
    }
}

/// Inclusive `[start, end]` bound used to select in-scope posts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant <= self.end
    }

    /// True for windows built from an inverted explicit date range.
    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }
}
