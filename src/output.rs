use redscrape_core::export::{export_to_file, CommentRecord, ExportFormat, PostRecord};
use redscrape_core::pipeline::ThreadCollection;
use redscrape_core::{ClassifiedPost, CoreError};
use std::path::{Path, PathBuf};
use tracing::info;

/// File stem for a subreddit collection, e.g. `selfhosted_posts`.
pub fn posts_file_stem(subreddit: &str) -> String {
    let name: String = subreddit
        .trim()
        .trim_start_matches("r/")
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    format!("{}_posts", name)
}

/// Writes a subreddit collection. Nothing is written for an empty one.
pub fn write_posts(
    dir: &Path,
    subreddit: &str,
    format: ExportFormat,
    records: &[ClassifiedPost],
) -> Result<Option<PathBuf>, CoreError> {
    if records.is_empty() {
        info!("No posts for {}, skipping export", subreddit);
        return Ok(None);
    }
    let rows: Vec<PostRecord> = records.iter().map(PostRecord::from).collect();
    export_to_file(dir, &posts_file_stem(subreddit), format, &rows).map(Some)
}

/// Writes `post_details` and, when there are any, `comments`.
pub fn write_thread(
    dir: &Path,
    format: ExportFormat,
    thread: &ThreadCollection,
) -> Result<Vec<PathBuf>, CoreError> {
    let mut written = Vec::new();
    let Some(post) = &thread.post else {
        return Ok(written);
    };

    written.push(export_to_file(
        dir,
        "post_details",
        format,
        &[PostRecord::from(post)],
    )?);

    if !thread.comments.is_empty() {
        let rows: Vec<CommentRecord> = thread.comments.iter().map(CommentRecord::from).collect();
        written.push(export_to_file(dir, "comments", format, &rows)?);
    }
    Ok(written)
}
