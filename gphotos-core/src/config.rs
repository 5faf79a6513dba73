//! Global gphotos configuration.
//!
//! Read from `~/.config/gphotos/config.toml` (created with every option
//! commented out on first run) and overridden by `GPHOTOS_*` environment
//! variables, e.g. `GPHOTOS_REDIRECT_PORT=8090`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::{SyncError, SyncResult};

static DEFAULT_CREDENTIALS_DIR: &str = "~/.config/gphotos/credentials";
static DEFAULT_CLIENT_SECRET_FILE: &str = "gphotos_credentials.json";
const DEFAULT_REDIRECT_PORT: u16 = 8080;
const DEFAULT_SEARCH_TIMEOUT_SECS: u64 = 10;
const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = 30;

fn default_credentials_dir() -> PathBuf {
    PathBuf::from(DEFAULT_CREDENTIALS_DIR)
}

fn default_client_secret_file() -> String {
    DEFAULT_CLIENT_SECRET_FILE.to_string()
}

fn default_redirect_port() -> u16 {
    DEFAULT_REDIRECT_PORT
}

fn default_search_timeout_secs() -> u64 {
    DEFAULT_SEARCH_TIMEOUT_SECS
}

fn default_download_timeout_secs() -> u64 {
    DEFAULT_DOWNLOAD_TIMEOUT_SECS
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct GphotosConfig {
    /// Folder holding the OAuth client secret and the cached token.
    #[serde(default = "default_credentials_dir")]
    pub credentials_dir: PathBuf,

    /// Client secret JSON downloaded from the Google Cloud console,
    /// relative to `credentials_dir`.
    #[serde(default = "default_client_secret_file")]
    pub client_secret_file: String,

    /// Local port receiving the OAuth redirect.
    #[serde(default = "default_redirect_port")]
    pub redirect_port: u16,

    #[serde(default = "default_search_timeout_secs")]
    pub search_timeout_secs: u64,

    #[serde(default = "default_download_timeout_secs")]
    pub download_timeout_secs: u64,
}

impl Default for GphotosConfig {
    fn default() -> Self {
        GphotosConfig {
            credentials_dir: default_credentials_dir(),
            client_secret_file: default_client_secret_file(),
            redirect_port: DEFAULT_REDIRECT_PORT,
            search_timeout_secs: DEFAULT_SEARCH_TIMEOUT_SECS,
            download_timeout_secs: DEFAULT_DOWNLOAD_TIMEOUT_SECS,
        }
    }
}

impl GphotosConfig {
    pub fn config_path() -> SyncResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| SyncError::Config("Could not determine config directory".into()))?
            .join("gphotos");

        Ok(config_dir.join("config.toml"))
    }

    /// Load the global config, creating a commented default file if none exists.
    pub fn load() -> SyncResult<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> SyncResult<Self> {
        Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(Environment::with_prefix("GPHOTOS").try_parsing(true))
            .build()
            .map_err(|e| SyncError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| SyncError::Config(e.to_string()))
    }

    /// Credentials folder with `~` expanded.
    pub fn credentials_path(&self) -> PathBuf {
        let expanded = shellexpand::tilde(&self.credentials_dir.to_string_lossy()).into_owned();
        PathBuf::from(expanded)
    }

    pub fn client_secret_path(&self) -> PathBuf {
        self.credentials_path().join(&self.client_secret_file)
    }

    pub fn search_timeout(&self) -> Duration {
        Duration::from_secs(self.search_timeout_secs)
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }

    pub fn create_default_config(path: &Path) -> SyncResult<()> {
        let contents = format!(
            "\
# gphotos configuration

# Where the OAuth client secret and the cached token live:
# credentials_dir = \"{DEFAULT_CREDENTIALS_DIR}\"

# Client secret JSON from https://console.cloud.google.com/apis/credentials
# client_secret_file = \"{DEFAULT_CLIENT_SECRET_FILE}\"

# Local port receiving the OAuth redirect:
# redirect_port = {DEFAULT_REDIRECT_PORT}

# Per-request timeouts in seconds:
# search_timeout_secs = {DEFAULT_SEARCH_TIMEOUT_SECS}
# download_timeout_secs = {DEFAULT_DOWNLOAD_TIMEOUT_SECS}
"
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                SyncError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| SyncError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }
}
