//! Terminal rendering for sync results.

use std::path::Path;

use chrono::{Datelike, NaiveDate};
use gphotos_core::sync::{SyncReport, SyncTotals};
use gphotos_core::{DateOutcome, DateRange, DateStatus};
use owo_colors::OwoColorize;

/// Extension trait for TUI rendering with colors.
pub trait Render {
    fn render(&self) -> String;
}

fn render_date(date: NaiveDate) -> String {
    format!("{} / {:02} / {:02}", date.year(), date.month(), date.day())
}

pub fn render_header(range: &DateRange, destination: &Path, dry_run: bool) -> String {
    let header = format!(
        "Checking photos from {} to {} into {}",
        range.from(),
        range.to(),
        destination.display()
    );
    if dry_run {
        format!("{header} {}", "(dry run)".yellow())
    } else {
        header
    }
}

impl Render for DateOutcome {
    fn render(&self) -> String {
        let date = render_date(self.date);
        match self.status {
            DateStatus::NoItems => format!("No media items found for date: {date}")
                .dimmed()
                .to_string(),
            DateStatus::Synced { downloaded, total } => {
                let counts = format!("{downloaded}/{total}");
                let counts = if downloaded > 0 {
                    counts.green().to_string()
                } else {
                    counts.dimmed().to_string()
                };
                format!("{counts} new items found for date: {date}")
            }
        }
    }
}

impl Render for SyncTotals {
    fn render(&self) -> String {
        format!(
            "{} dates checked, {} with media: {} found, {} downloaded, {} already present",
            self.dates,
            self.dates_with_items,
            self.found,
            self.downloaded.green(),
            self.skipped
        )
    }
}

impl Render for SyncReport {
    fn render(&self) -> String {
        let totals = self.totals().render();
        if self.dry_run {
            format!("{totals} {}", "(dry run, nothing written)".yellow())
        } else {
            totals
        }
    }
}
