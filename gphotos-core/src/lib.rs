//! Core types for gphotos-sync.
//!
//! This crate holds everything that does not talk to Google:
//! - `DateRange`, `MediaRecord` and the on-disk `year/month` layout
//! - `LocalFileSet`, the inventory of files already downloaded
//! - `SyncPlanner`, which drives one remote search per day and downloads
//!   whatever is missing locally
//! - the `MediaIndex` / `Downloader` traits providers implement

pub mod config;
pub mod date_range;
pub mod error;
pub mod inventory;
pub mod media;
pub mod remote;
pub mod sync;

pub use date_range::DateRange;
pub use error::{SyncError, SyncResult, ValidationError};
pub use inventory::{Identity, LocalFileSet};
pub use media::{MediaKind, MediaRecord};
pub use remote::{Downloader, MediaIndex};
pub use sync::{DateOutcome, DateStatus, SyncPlanner, SyncReport};
