//! Per-date outcomes of a sync run.

use std::path::PathBuf;

use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateStatus {
    /// The remote search returned nothing for this date.
    NoItems,
    /// `downloaded` of `total` remote items were missing locally.
    Synced { downloaded: usize, total: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateOutcome {
    pub date: NaiveDate,
    /// `<root>/<year>/<month>`, set whenever the date had remote items.
    pub folder: Option<PathBuf>,
    pub status: DateStatus,
}

impl DateOutcome {
    pub fn no_items(date: NaiveDate) -> Self {
        DateOutcome {
            date,
            folder: None,
            status: DateStatus::NoItems,
        }
    }

    pub fn downloaded(&self) -> usize {
        match self.status {
            DateStatus::NoItems => 0,
            DateStatus::Synced { downloaded, .. } => downloaded,
        }
    }

    pub fn total(&self) -> usize {
        match self.status {
            DateStatus::NoItems => 0,
            DateStatus::Synced { total, .. } => total,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncTotals {
    pub dates: usize,
    pub dates_with_items: usize,
    pub found: usize,
    pub downloaded: usize,
    pub skipped: usize,
}

/// Ordered outcomes for every date processed in a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub outcomes: Vec<DateOutcome>,
    pub dry_run: bool,
}

impl SyncReport {
    pub fn totals(&self) -> SyncTotals {
        self.outcomes
            .iter()
            .fold(SyncTotals::default(), |mut totals, outcome| {
                totals.dates += 1;
                if outcome.status != DateStatus::NoItems {
                    totals.dates_with_items += 1;
                }
                totals.found += outcome.total();
                totals.downloaded += outcome.downloaded();
                totals.skipped += outcome.total() - outcome.downloaded();
                totals
            })
    }
}
