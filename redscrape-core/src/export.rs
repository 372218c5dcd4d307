//! Flat export rows and their CSV / JSON serializations.
//!
//! Both formats are produced from the same row structs, so they always carry
//! the same columns. Timestamps are written as RFC 3339 strings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

use crate::types::{Category, ClassifiedComment, ClassifiedPost};
use crate::{CoreError, ExportError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostRecord {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Post Text")]
    pub body: String,
    #[serde(rename = "Subreddit")]
    pub subreddit: String,
    #[serde(rename = "Author")]
    pub author: String,
    #[serde(rename = "Created UTC")]
    pub created_utc: DateTime<Utc>,
    #[serde(rename = "Score")]
    pub score: i64,
    #[serde(rename = "Up-vote Ratio")]
    pub upvote_ratio: f64,
    #[serde(rename = "Total Comments")]
    pub num_comments: u64,
    #[serde(rename = "Total Awards")]
    pub total_awards: u64,
    #[serde(rename = "Flair")]
    pub flair: Option<String>,
    #[serde(rename = "Is Original Content")]
    pub is_original_content: bool,
    #[serde(rename = "Over 18")]
    pub over_18: bool,
    #[serde(rename = "Spoiler")]
    pub spoiler: bool,
    #[serde(rename = "Num Cross-posts")]
    pub num_crossposts: u64,
    #[serde(rename = "Permalink")]
    pub permalink: String,
    #[serde(rename = "Post URL")]
    pub url: String,
    #[serde(rename = "Category")]
    pub category: Category,
    #[serde(rename = "Category Confidence")]
    pub category_confidence: f64,
}

impl From<&ClassifiedPost> for PostRecord {
    fn from(classified: &ClassifiedPost) -> Self {
        let post = &classified.post;
        Self {
            id: post.id.clone(),
            title: post.title.clone(),
            body: post.body.clone(),
            subreddit: post.subreddit.clone(),
            author: post.author.clone(),
            created_utc: post.created_utc,
            score: post.score,
            upvote_ratio: post.upvote_ratio,
            num_comments: post.num_comments,
            total_awards: post.total_awards,
            flair: post.flair.clone(),
            is_original_content: post.is_original_content,
            over_18: post.over_18,
            spoiler: post.spoiler,
            num_crossposts: post.num_crossposts,
            permalink: post.permalink.clone(),
            url: post.url.clone(),
            category: classified.classification.category,
            category_confidence: classified.classification.confidence,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentRecord {
    #[serde(rename = "Comment ID")]
    pub id: String,
    #[serde(rename = "Parent ID")]
    pub parent_id: String,
    #[serde(rename = "Comment Text")]
    pub body: String,
    #[serde(rename = "Author")]
    pub author: String,
    #[serde(rename = "Score")]
    pub score: i64,
    #[serde(rename = "Created UTC")]
    pub created_utc: DateTime<Utc>,
    #[serde(rename = "Permalink")]
    pub permalink: String,
    #[serde(rename = "Is Submitter")]
    pub is_submitter: bool,
    #[serde(rename = "Category")]
    pub category: Category,
    #[serde(rename = "Category Confidence")]
    pub category_confidence: f64,
}

impl From<&ClassifiedComment> for CommentRecord {
    fn from(classified: &ClassifiedComment) -> Self {
        let comment = &classified.comment;
        Self {
            id: comment.id.clone(),
            parent_id: comment.parent_id.clone(),
            body: comment.body.clone(),
            author: comment.author.clone(),
            score: comment.score,
            created_utc: comment.created_utc,
            permalink: comment.permalink.clone(),
            is_submitter: comment.is_submitter,
            category: classified.classification.category,
            category_confidence: classified.classification.confidence,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            other => Err(CoreError::InvalidInput {
                message: format!("unsupported export format '{}'", other),
            }),
        }
    }
}

/// Writes `rows` as CSV with a header row. An empty slice writes nothing.
pub fn write_csv<W: Write, T: Serialize>(writer: W, rows: &[T]) -> Result<(), CoreError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in rows {
        csv_writer.serialize(row).map_err(ExportError::from)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Writes `rows` as a pretty-printed JSON array of objects.
pub fn write_json<W: Write, T: Serialize>(writer: W, rows: &[T]) -> Result<(), CoreError> {
    serde_json::to_writer_pretty(writer, rows)?;
    Ok(())
}

pub fn to_csv_string<T: Serialize>(rows: &[T]) -> Result<String, CoreError> {
    let mut buffer = Vec::new();
    write_csv(&mut buffer, rows)?;
    String::from_utf8(buffer).map_err(|e| CoreError::Export(ExportError::from(e)))
}

pub fn to_json_string<T: Serialize>(rows: &[T]) -> Result<String, CoreError> {
    Ok(serde_json::to_string_pretty(rows)?)
}

/// Writes `rows` to `<dir>/<stem>.<ext>` and returns the path written.
pub fn export_to_file<T: Serialize>(
    dir: &Path,
    stem: &str,
    format: ExportFormat,
    rows: &[T],
) -> Result<PathBuf, CoreError> {
    fs::create_dir_all(dir).map_err(|_| {
        CoreError::Export(ExportError::OutputDirectory {
            path: dir.display().to_string(),
        })
    })?;

    let path = dir.join(format!("{}.{}", stem, format.extension()));
    let file = fs::File::create(&path)?;
    match format {
        ExportFormat::Csv => write_csv(file, rows)?,
        ExportFormat::Json => write_json(file, rows)?,
    }

    info!("Exported {} rows to {}", rows.len(), path.display());
    Ok(path)
}
