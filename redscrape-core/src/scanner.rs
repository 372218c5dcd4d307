//! Bounded scan over a newest-first post listing.
//!
//! The scanner relies on the listing being strictly ordered by creation time,
//! newest first. Posts newer than the window are skipped; the first post older
//! than the window ends the scan without requesting anything further from the
//! listing. The ordering is a precondition and is not checked: a listing that
//! returns an older post ahead of newer in-window posts makes the scan stop
//! early and under-collect.

use async_trait::async_trait;
use tracing::debug;

use crate::types::{RawPost, TimeWindow};
use crate::CoreError;

/// A lazily paged, reverse-chronological feed of posts.
///
/// `Ok(None)` marks the end of the feed. Paging and any upstream result cap
/// are the implementor's business.
#[async_trait]
pub trait PostListing: Send {
    async fn next_post(&mut self) -> Result<Option<RawPost>, CoreError>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub examined: usize,
    pub skipped_newer: usize,
    pub emitted: usize,
    pub stopped_early: bool,
}

pub struct WindowScanner<'a, L: PostListing + ?Sized> {
    listing: &'a mut L,
    window: TimeWindow,
    finished: bool,
    stats: ScanStats,
}

impl<'a, L: PostListing + ?Sized> WindowScanner<'a, L> {
    pub fn new(listing: &'a mut L, window: TimeWindow) -> Self {
        Self {
            listing,
            window,
            finished: false,
            stats: ScanStats::default(),
        }
    }

    /// Next in-window post, or `None` once the window has been left or the
    /// listing is exhausted. After an error the scanner stays finished.
    pub async fn next(&mut self) -> Result<Option<RawPost>, CoreError> {
        if self.finished {
            return Ok(None);
        }

        loop {
            let post = match self.listing.next_post().await {
                Ok(Some(post)) => post,
                Ok(None) => {
                    self.finished = true;
                    return Ok(None);
                }
                Err(e) => {
                    self.finished = true;
                    return Err(e);
                }
            };
            self.stats.examined += 1;

            if self.window.contains(post.created_utc) {
                self.stats.emitted += 1;
                return Ok(Some(post));
            }

            if post.created_utc > self.window.end {
                self.stats.skipped_newer += 1;
                continue;
            }

            debug!(
                "Post {} at {} is older than window start {}, stopping scan",
                post.id,
                post.created_utc.to_rfc3339(),
                self.window.start.to_rfc3339()
            );
            self.stats.stopped_early = true;
            self.finished = true;
            return Ok(None);
        }
    }

    pub fn stats(&self) -> ScanStats {
        self.stats
    }
}

/// Drains the scanner into a vector. Any listing error discards what was
/// collected so far.
pub async fn scan<L: PostListing + ?Sized>(
    listing: &mut L,
    window: TimeWindow,
) -> Result<Vec<RawPost>, CoreError> {
    let mut scanner = WindowScanner::new(listing, window);
    let mut posts = Vec::new();

    while let Some(post) = scanner.next().await? {
        posts.push(post);
    }

    let stats = scanner.stats();
    debug!(
        "Scan finished: examined={} skipped_newer={} emitted={} stopped_early={}",
        stats.examined, stats.skipped_newer, stats.emitted, stats.stopped_early
    );
    Ok(posts)
}
