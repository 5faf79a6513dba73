//! Fetches media bytes from their base URLs.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use gphotos_core::media::is_plain_filename;
use gphotos_core::{Downloader, MediaRecord, SyncError, SyncResult, ValidationError};

/// Base URL suffix requesting the original bytes. Videos are also fetched
/// with `=d`, which yields the stored file rather than a transcode.
const FULL_RESOLUTION: &str = "=d";

pub struct GoogleDownloader {
    http: reqwest::Client,
    timeout: Duration,
}

impl GoogleDownloader {
    pub fn new(timeout: Duration) -> Self {
        GoogleDownloader {
            http: reqwest::Client::new(),
            timeout,
        }
    }

    async fn fetch_one(&self, record: &MediaRecord, folder: &Path) -> SyncResult<()> {
        if !is_plain_filename(&record.filename) {
            return Err(ValidationError::UnsafeFilename(record.filename.clone()).into());
        }

        let url = format!("{}{FULL_RESOLUTION}", record.base_url);
        let response = self
            .http
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                SyncError::Network(format!("Download of {} failed: {e}", record.filename))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::Network(format!(
                "Download of {} returned {status}",
                record.filename
            )));
        }

        let bytes = response.bytes().await.map_err(|e| {
            SyncError::Network(format!("Download of {} failed: {e}", record.filename))
        })?;

        let path = folder.join(&record.filename);
        tokio::fs::write(&path, &bytes).await?;

        tracing::debug!(
            file = %path.display(),
            bytes = bytes.len(),
            kind = ?record.kind(),
            width = ?record.width,
            height = ?record.height,
            "Downloaded {}",
            record.filename
        );
        Ok(())
    }
}

#[async_trait]
impl Downloader for GoogleDownloader {
    async fn fetch_all(&self, plan: &[MediaRecord], folder: &Path) -> SyncResult<usize> {
        for record in plan {
            self.fetch_one(record, folder).await?;
        }
        Ok(plan.len())
    }
}
