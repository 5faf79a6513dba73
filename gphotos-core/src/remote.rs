//! Collaborators the sync planner drives: a date-filtered media search and
//! a downloader. Providers implement these; tests use in-memory fakes.

use std::path::Path;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::SyncResult;
use crate::media::MediaRecord;

/// Search over the remote library.
#[async_trait]
pub trait MediaIndex: Send + Sync {
    /// All items whose creation date is exactly `date`.
    async fn search_by_date(&self, date: NaiveDate) -> SyncResult<Vec<MediaRecord>>;
}

/// Fetches media bytes into a local folder.
#[async_trait]
pub trait Downloader: Send + Sync {
    /// Download every record in `plan` into `folder`, one at a time.
    /// Returns the number of files written.
    async fn fetch_all(&self, plan: &[MediaRecord], folder: &Path) -> SyncResult<usize>;
}
