//! The date-driven incremental sync: one remote search per day, minus what
//! already exists locally, handed to the downloader.

use std::path::Path;

use chrono::NaiveDate;

use crate::date_range::DateRange;
use crate::error::SyncResult;
use crate::inventory::LocalFileSet;
use crate::media::{MediaRecord, folder_for};
use crate::remote::{Downloader, MediaIndex};
use crate::sync::report::{DateOutcome, DateStatus, SyncReport};

/// Progress notifications emitted while a range is processed.
#[derive(Debug)]
pub enum Progress<'a> {
    /// About to search the remote library for this date.
    Searching(NaiveDate),
    /// The date is fully processed.
    Finished(&'a DateOutcome),
}

pub struct SyncPlanner<I, D> {
    index: I,
    downloader: D,
    dry_run: bool,
}

impl<I: MediaIndex, D: Downloader> SyncPlanner<I, D> {
    pub fn new(index: I, downloader: D) -> Self {
        SyncPlanner {
            index,
            downloader,
            dry_run: false,
        }
    }

    /// Plan only: no folders are created and nothing is downloaded.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub async fn plan_and_execute(
        &self,
        range: &DateRange,
        root: &Path,
        local: &LocalFileSet,
    ) -> SyncResult<SyncReport> {
        self.plan_and_execute_with(range, root, local, |_| {}).await
    }

    /// Process every date in `range` in ascending order, reporting progress
    /// through `on_progress`. The first error aborts the run.
    pub async fn plan_and_execute_with<F>(
        &self,
        range: &DateRange,
        root: &Path,
        local: &LocalFileSet,
        mut on_progress: F,
    ) -> SyncResult<SyncReport>
    where
        F: FnMut(Progress<'_>),
    {
        let mut report = SyncReport {
            outcomes: Vec::with_capacity(range.len()),
            dry_run: self.dry_run,
        };

        for date in range.days() {
            on_progress(Progress::Searching(date));
            let outcome = self.sync_date(date, root, local).await?;
            on_progress(Progress::Finished(&outcome));
            report.outcomes.push(outcome);
        }

        Ok(report)
    }

    /// Search, diff and download a single date.
    pub async fn sync_date(
        &self,
        date: NaiveDate,
        root: &Path,
        local: &LocalFileSet,
    ) -> SyncResult<DateOutcome> {
        let records = self.index.search_by_date(date).await?;

        if records.is_empty() {
            tracing::debug!(%date, "No media items found");
            return Ok(DateOutcome::no_items(date));
        }

        let total = records.len();
        let to_download = plan_downloads(records, local, date);
        let folder = folder_for(root, date);

        tracing::debug!(
            %date,
            new = to_download.len(),
            total,
            "{}/{} new items found",
            to_download.len(),
            total
        );

        if !self.dry_run {
            if !folder.exists() {
                std::fs::create_dir_all(&folder)?;
                tracing::debug!(folder = %folder.display(), "Created folder");
            }
            if !to_download.is_empty() {
                self.downloader.fetch_all(&to_download, &folder).await?;
            }
        }

        Ok(DateOutcome {
            date,
            folder: Some(folder),
            status: DateStatus::Synced {
                downloaded: to_download.len(),
                total,
            },
        })
    }
}

/// Records queried for `date` that are not present locally, in remote order.
pub fn plan_downloads(
    records: Vec<MediaRecord>,
    local: &LocalFileSet,
    date: NaiveDate,
) -> Vec<MediaRecord> {
    records
        .into_iter()
        .filter(|record| !local.contains(record, date))
        .collect()
}
