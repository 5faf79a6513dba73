use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use gphotos_core::config::GphotosConfig;
use gphotos_core::sync::Progress;
use gphotos_core::{DateRange, Identity, LocalFileSet, SyncError, SyncPlanner, ValidationError};
use gphotos_provider_google::{CredentialProvider, GoogleDownloader, GooglePhotosClient};
use indicatif::ProgressBar;

use crate::render::{Render, render_header};
use crate::utils::tui::create_spinner;

pub struct GetOptions {
    pub destination: PathBuf,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub dry_run: bool,
    pub identity: Identity,
    pub range_years_only: bool,
}

/// Expand `~` and require an existing directory.
pub fn resolve_destination(destination: &Path) -> Result<PathBuf, SyncError> {
    let expanded = PathBuf::from(shellexpand::tilde(&destination.to_string_lossy()).into_owned());

    if !expanded.is_dir() {
        return Err(ValidationError::DestinationMissing(expanded).into());
    }
    Ok(expanded)
}

pub async fn run(options: GetOptions) -> Result<()> {
    let destination = resolve_destination(&options.destination)?;
    let today = Local::now().date_naive();
    let range = DateRange::from_args(options.from, options.to, today).map_err(SyncError::from)?;

    let config = GphotosConfig::load()?;
    let credentials = CredentialProvider::from_config(&config)?;
    // Any consent prompt has to happen before the spinner starts drawing.
    credentials.get_token().await?;

    println!("{}", render_header(&range, &destination, options.dry_run));

    let years = range.years();
    let scope = options.range_years_only.then_some(&years);
    let local = LocalFileSet::build(&destination, scope, options.identity)
        .with_context(|| format!("Failed to scan {}", destination.display()))?;

    tracing::debug!(
        files = local.len(),
        identity = ?local.identity(),
        "Local inventory ready"
    );

    let planner = SyncPlanner::new(
        GooglePhotosClient::new(credentials, config.search_timeout()),
        GoogleDownloader::new(config.download_timeout()),
    )
    .dry_run(options.dry_run);

    let mut spinner: Option<ProgressBar> = None;
    let result = planner
        .plan_and_execute_with(&range, &destination, &local, |progress| match progress {
            Progress::Searching(date) => {
                spinner = Some(create_spinner(format!("Checking {date}")));
            }
            Progress::Finished(outcome) => {
                if let Some(spinner) = spinner.take() {
                    spinner.finish_and_clear();
                }
                println!("{}", outcome.render());
            }
        })
        .await;

    if let Some(spinner) = spinner.take() {
        spinner.finish_and_clear();
    }

    let report = result?;
    println!("\n{}", report.render());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_destination_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");

        let err = resolve_destination(&missing).unwrap_err();

        assert_eq!(err.exit_code(), 1);
        assert!(err.to_string().contains("does NOT exist"));
    }

    #[test]
    fn file_is_not_a_destination() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.jpg");
        std::fs::write(&file, b"x").unwrap();

        assert!(resolve_destination(&file).is_err());
    }

    #[test]
    fn existing_folder_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(resolve_destination(dir.path()).unwrap(), dir.path());
    }
}
