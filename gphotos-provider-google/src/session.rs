//! OAuth tokens for the Photos Library API and their on-disk cache.

use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeDelta, Utc};
use gphotos_core::{SyncError, SyncResult};
use serde::{Deserialize, Serialize};

pub const API_NAME: &str = "photoslibrary";
pub const API_VERSION: &str = "v1";
pub const SCOPES: &[&str] = &["https://www.googleapis.com/auth/photoslibrary.readonly"];

/// Tokens this close to expiry are treated as expired.
const EXPIRY_SKEW_SECS: i64 = 60;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    scopes: Vec<String>,
}

impl Token {
    pub fn new(
        access_token: String,
        refresh_token: Option<String>,
        expires_in: Option<i64>,
        scopes: Vec<String>,
    ) -> Self {
        Token {
            access_token,
            refresh_token: refresh_token.filter(|t| !t.is_empty()),
            expires_at: expires_in.and_then(expiry_from_now),
            scopes,
        }
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    /// Usable as-is at `now`. A token without an expiry never expires.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => now + TimeDelta::seconds(EXPIRY_SKEW_SECS) < expires_at,
            None => true,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }

    pub fn can_refresh(&self) -> bool {
        self.refresh_token.is_some()
    }

    /// Whether this token was granted every scope in `wanted`.
    pub fn covers(&self, wanted: &[&str]) -> bool {
        wanted.iter().all(|w| self.scopes.iter().any(|s| s == w))
    }

    /// A refreshed token. Google usually omits the refresh token on
    /// refresh, in which case the current one is kept.
    pub fn refreshed(&self, next: Token) -> Token {
        Token {
            refresh_token: next.refresh_token.or_else(|| self.refresh_token.clone()),
            scopes: if next.scopes.is_empty() {
                self.scopes.clone()
            } else {
                next.scopes
            },
            ..next
        }
    }
}

/// Absolute expiry for a relative `expires_in`. A lifetime too large to
/// represent means no expiry; a hugely negative one means already expired.
fn expiry_from_now(secs: i64) -> Option<DateTime<Utc>> {
    let now = Utc::now();
    match TimeDelta::try_seconds(secs).and_then(|delta| now.checked_add_signed(delta)) {
        Some(expires_at) => Some(expires_at),
        None if secs < 0 => Some(now),
        None => None,
    }
}

/// `token_<api>_<version>.toml` inside the credentials folder.
pub struct TokenCache {
    path: PathBuf,
}

impl TokenCache {
    pub fn new(path: PathBuf) -> Self {
        TokenCache { path }
    }

    pub fn in_dir(credentials_dir: &Path) -> Self {
        Self::new(credentials_dir.join(format!("token_{API_NAME}_{API_VERSION}.toml")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The cached token, if any. An unreadable or corrupt cache is logged
    /// and treated as absent so the consent flow can replace it.
    pub fn load(&self) -> Option<Token> {
        if !self.path.exists() {
            return None;
        }

        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "Failed to read token cache: {e}");
                return None;
            }
        };

        match toml::from_str(&contents) {
            Ok(token) => Some(token),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "Ignoring corrupt token cache: {e}");
                None
            }
        }
    }

    pub fn save(&self, token: &Token) -> SyncResult<()> {
        let contents = toml::to_string_pretty(token)
            .map_err(|e| SyncError::Config(format!("Failed to serialize token: {e}")))?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(&self.path, contents)?;

        // Owner-only, the file holds OAuth tokens:
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))?;
        }

        tracing::debug!(path = %self.path.display(), "Saved token");
        Ok(())
    }
}
