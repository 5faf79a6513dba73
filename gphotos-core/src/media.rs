//! Remote media items and where they land on disk.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One media item returned by a date-filtered search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaRecord {
    pub id: String,
    /// Filename as reported by the provider; also the local file name.
    pub filename: String,
    /// Content URL. Needs a size suffix before it can be fetched.
    pub base_url: String,
    pub creation_time: DateTime<Utc>,
    pub mime_type: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Photo,
    Video,
    Other,
}

impl MediaRecord {
    pub fn creation_date(&self) -> NaiveDate {
        self.creation_time.date_naive()
    }

    pub fn kind(&self) -> MediaKind {
        if self.mime_type.starts_with("image/") {
            MediaKind::Photo
        } else if self.mime_type.starts_with("video/") {
            MediaKind::Video
        } else {
            MediaKind::Other
        }
    }
}

/// Folder for media created on `date`: `<root>/<year>/<month, two digits>`.
pub fn folder_for(root: &Path, date: NaiveDate) -> PathBuf {
    root.join(format!("{:04}", date.year()))
        .join(format!("{:02}", date.month()))
}

/// Whether a remote filename can be written as-is inside a folder.
pub fn is_plain_filename(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && !name.contains('\0')
}
