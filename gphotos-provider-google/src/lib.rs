//! Google Photos Library API provider for gphotos-sync.
//!
//! Implements the `MediaIndex` and `Downloader` traits from gphotos-core and
//! owns the OAuth installed-app flow plus the token cache.

pub mod app_config;
pub mod credentials;
pub mod download;
pub mod oauth;
pub mod photos;
pub mod session;

#[cfg(test)]
mod test_support;

pub use credentials::CredentialProvider;
pub use download::GoogleDownloader;
pub use photos::GooglePhotosClient;
pub use session::{Token, TokenCache};
