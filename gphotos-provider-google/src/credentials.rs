//! Produces a valid bearer token: cached, refreshed or freshly consented.

use std::path::Path;

use gphotos_core::config::GphotosConfig;
use gphotos_core::{SyncError, SyncResult};

use crate::app_config::ClientSecret;
use crate::oauth::OAuthClient;
use crate::session::{SCOPES, Token, TokenCache};

pub struct CredentialProvider {
    oauth: OAuthClient,
    cache: TokenCache,
}

impl CredentialProvider {
    pub fn new(oauth: OAuthClient, cache: TokenCache) -> Self {
        CredentialProvider { oauth, cache }
    }

    /// Load the client secret named by `config`. Fails with a `Config`
    /// error when the secret file is missing.
    pub fn from_config(config: &GphotosConfig) -> SyncResult<Self> {
        let secret = ClientSecret::load(&config.client_secret_path())?;
        let oauth = OAuthClient::new(secret, config.redirect_port);
        let cache = TokenCache::in_dir(&config.credentials_path());

        Ok(Self::new(oauth, cache))
    }

    pub fn cache_path(&self) -> &Path {
        self.cache.path()
    }

    pub async fn get_token(&self) -> SyncResult<Token> {
        let cached = self.cache.load();

        if let Some(token) = cached.as_ref().filter(|t| t.is_valid() && t.covers(SCOPES)) {
            tracing::debug!("Using cached token");
            return Ok(token.clone());
        }

        if let Some(token) = cached.filter(|t| t.can_refresh() && t.covers(SCOPES)) {
            match self.oauth.refresh(&token).await {
                Ok(refreshed) => {
                    tracing::debug!("Refreshed access token");
                    self.cache.save(&refreshed)?;
                    return Ok(refreshed);
                }
                Err(SyncError::Auth(reason)) => {
                    tracing::warn!("Token refresh rejected, asking for consent again: {reason}");
                }
                Err(e) => return Err(e),
            }
        }

        let token = self.oauth.authorize().await?;
        self.cache.save(&token)?;
        tracing::info!(path = %self.cache.path().display(), "Authorization complete");

        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::serve_once;

    fn provider(dir: &Path) -> CredentialProvider {
        let secret = ClientSecret::parse(r#"{"installed": {"client_id": "id", "client_secret": "s"}}"#)
            .unwrap();
        CredentialProvider::new(OAuthClient::new(secret, 0), TokenCache::in_dir(dir))
    }

    #[tokio::test]
    async fn valid_cached_token_is_returned_without_network() {
        let dir = tempfile::tempdir().unwrap();
        let provider = provider(dir.path());
        let token = Token::new(
            "cached".into(),
            Some("refresh".into()),
            Some(3600),
            SCOPES.iter().map(|s| s.to_string()).collect(),
        );
        TokenCache::in_dir(dir.path()).save(&token).unwrap();

        let got = provider.get_token().await.unwrap();

        assert_eq!(got.access_token(), "cached");
    }

    fn expired_token(refresh: &str) -> Token {
        Token::new(
            "stale".into(),
            Some(refresh.into()),
            Some(-10),
            SCOPES.iter().map(|s| s.to_string()).collect(),
        )
    }

    fn provider_against(token_uri: &str, redirect_port: u16, dir: &Path) -> CredentialProvider {
        let secret = ClientSecret {
            client_id: "id".into(),
            client_secret: "s".into(),
            auth_uri: "https://accounts.google.com/o/oauth2/auth".into(),
            token_uri: token_uri.into(),
        };
        CredentialProvider::new(
            OAuthClient::new(secret, redirect_port),
            TokenCache::in_dir(dir),
        )
    }

    #[tokio::test]
    async fn expired_token_is_refreshed_and_cached() {
        let (token_uri, server) = serve_once(
            "/token",
            "200 OK",
            r#"{"access_token": "fresh", "expires_in": 3599, "token_type": "Bearer"}"#,
        )
        .await;
        let dir = tempfile::tempdir().unwrap();
        TokenCache::in_dir(dir.path()).save(&expired_token("r1")).unwrap();
        let provider = provider_against(&token_uri, 0, dir.path());

        let got = provider.get_token().await.unwrap();

        assert_eq!(got.access_token(), "fresh");
        assert_eq!(got.refresh_token(), Some("r1"));
        assert!(got.is_valid());
        assert_eq!(TokenCache::in_dir(dir.path()).load(), Some(got));

        let request = server.await.unwrap();
        assert!(request.request_line.starts_with("POST /token "));
        assert!(request.body.contains("grant_type=refresh_token"));
        assert!(request.body.contains("refresh_token=r1"));
    }

    #[tokio::test]
    async fn rejected_refresh_falls_through_to_consent() {
        let (token_uri, _server) = serve_once(
            "/token",
            "400 Bad Request",
            r#"{"error": "invalid_grant"}"#,
        )
        .await;
        // Keep the callback port busy so consent stops at the bind, before any browser.
        let busy = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = busy.local_addr().unwrap().port();
        let dir = tempfile::tempdir().unwrap();
        TokenCache::in_dir(dir.path()).save(&expired_token("r1")).unwrap();
        let provider = provider_against(&token_uri, port, dir.path());

        let err = provider.get_token().await.unwrap_err();

        assert!(
            matches!(&err, SyncError::Auth(msg) if msg.contains("callback listener")),
            "unexpected error: {err}"
        );
    }

    #[tokio::test]
    async fn token_endpoint_outage_is_fatal() {
        let (token_uri, _server) = serve_once("/token", "503 Service Unavailable", "").await;
        let dir = tempfile::tempdir().unwrap();
        TokenCache::in_dir(dir.path()).save(&expired_token("r1")).unwrap();
        let provider = provider_against(&token_uri, 0, dir.path());

        let err = provider.get_token().await.unwrap_err();

        assert!(matches!(err, SyncError::Network(_)));
        assert_eq!(err.exit_code(), 4);
        let cached = TokenCache::in_dir(dir.path()).load().unwrap();
        assert_eq!(cached.access_token(), "stale");
    }

    #[test]
    fn missing_client_secret_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = GphotosConfig {
            credentials_dir: dir.path().to_path_buf(),
            ..GphotosConfig::default()
        };

        let err = CredentialProvider::from_config(&config).err().unwrap();
        assert_eq!(err.exit_code(), 10);
    }

    #[test]
    fn cache_lives_in_credentials_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("gphotos_credentials.json"),
            r#"{"installed": {"client_id": "id", "client_secret": "s"}}"#,
        )
        .unwrap();
        let config = GphotosConfig {
            credentials_dir: dir.path().to_path_buf(),
            ..GphotosConfig::default()
        };

        let provider = CredentialProvider::from_config(&config).unwrap();
        assert_eq!(
            provider.cache_path(),
            dir.path().join("token_photoslibrary_v1.toml")
        );
    }
}
