//! OAuth client secret for the Google provider.
//!
//! User-provided JSON downloaded from the Google Cloud console, stored at
//!   <credentials_dir>/gphotos_credentials.json

use std::path::Path;

use gphotos_core::{SyncError, SyncResult};
use serde::Deserialize;

const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

fn default_auth_uri() -> String {
    DEFAULT_AUTH_URI.to_string()
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// Google OAuth client credentials.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClientSecret {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

/// The console wraps the credentials in an `installed` or `web` object.
#[derive(Deserialize)]
struct ClientSecretFile {
    installed: Option<ClientSecret>,
    web: Option<ClientSecret>,
}

impl ClientSecret {
    pub fn load(path: &Path) -> SyncResult<Self> {
        if !path.is_file() {
            return Err(SyncError::Config(format!(
                "Unable to read credentials file on {}\n\n\
                Download an OAuth client ID (type \"Desktop app\") from\n\
                https://console.cloud.google.com/apis/credentials and save it there.",
                path.display()
            )));
        }

        let contents = std::fs::read_to_string(path).map_err(|e| {
            SyncError::Config(format!(
                "Failed to read credentials from {}: {e}",
                path.display()
            ))
        })?;

        Self::parse(&contents).map_err(|e| match e {
            SyncError::Config(msg) => {
                SyncError::Config(format!("{msg} (in {})", path.display()))
            }
            other => other,
        })
    }

    pub fn parse(contents: &str) -> SyncResult<Self> {
        let file: ClientSecretFile = serde_json::from_str(contents)
            .map_err(|e| SyncError::Config(format!("Failed to parse client secret: {e}")))?;

        file.installed.or(file.web).ok_or_else(|| {
            SyncError::Config("Client secret has neither an \"installed\" nor a \"web\" section".into())
        })
    }
}
