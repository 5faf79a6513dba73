//! Installed-app OAuth flow: consent in the browser, redirect to a local
//! listener, code exchange and refresh against the token endpoint.

use std::time::Duration;

use gphotos_core::{SyncError, SyncResult};
use reqwest::StatusCode;
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use url::Url;

use crate::app_config::ClientSecret;
use crate::session::{SCOPES, Token};

const TOKEN_TIMEOUT: Duration = Duration::from_secs(30);

/// Query parameters Google sends to the redirect URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackParams {
    pub code: String,
    pub state: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
    /// Space-separated granted scopes.
    scope: Option<String>,
}

impl From<TokenResponse> for Token {
    fn from(response: TokenResponse) -> Self {
        let scopes = response
            .scope
            .map(|s| s.split_whitespace().map(String::from).collect())
            .unwrap_or_default();

        Token::new(
            response.access_token,
            response.refresh_token,
            response.expires_in,
            scopes,
        )
    }
}

pub struct OAuthClient {
    secret: ClientSecret,
    redirect_port: u16,
    http: reqwest::Client,
}

impl OAuthClient {
    pub fn new(secret: ClientSecret, redirect_port: u16) -> Self {
        OAuthClient {
            secret,
            redirect_port,
            http: reqwest::Client::new(),
        }
    }

    pub fn redirect_uri(&self) -> String {
        format!("http://localhost:{}/callback", self.redirect_port)
    }

    fn redirect_address(&self) -> String {
        format!("127.0.0.1:{}", self.redirect_port)
    }

    /// Browser URL asking the user to grant read-only library access.
    pub fn consent_url(&self, state: &str) -> SyncResult<Url> {
        let mut url = Url::parse(&self.secret.auth_uri)
            .map_err(|e| SyncError::Config(format!("Invalid auth_uri in client secret: {e}")))?;

        url.query_pairs_mut()
            .append_pair("client_id", &self.secret.client_id)
            .append_pair("redirect_uri", &self.redirect_uri())
            .append_pair("response_type", "code")
            .append_pair("scope", &SCOPES.join(" "))
            .append_pair("access_type", "offline")
            .append_pair("prompt", "consent")
            .append_pair("state", state);

        Ok(url)
    }

    /// Run the interactive consent flow and return a fresh token.
    pub async fn authorize(&self) -> SyncResult<Token> {
        let state = uuid::Uuid::new_v4().to_string();
        let auth_url = self.consent_url(&state)?;

        // Bind before printing the URL so a fast redirect cannot miss us.
        let listener = TcpListener::bind(self.redirect_address())
            .await
            .map_err(|e| {
                SyncError::Auth(format!(
                    "Failed to bind OAuth callback listener on {}: {e}",
                    self.redirect_address()
                ))
            })?;

        eprintln!("\nOpen this URL in your browser to authorize read-only access to Google Photos:\n");
        eprintln!("{auth_url}\n");

        if open::that(auth_url.as_str()).is_err() {
            eprintln!("(Could not open browser automatically, please copy the URL above)");
        }

        let params = wait_for_callback(&listener).await?;

        if params.state != state {
            return Err(SyncError::Auth(
                "OAuth state mismatch, refusing the authorization code".into(),
            ));
        }

        tracing::info!("Received authorization code, exchanging for tokens");
        self.exchange_code(&params.code).await
    }

    pub async fn exchange_code(&self, code: &str) -> SyncResult<Token> {
        let redirect_uri = self.redirect_uri();
        let form = [
            ("code", code),
            ("client_id", self.secret.client_id.as_str()),
            ("client_secret", self.secret.client_secret.as_str()),
            ("redirect_uri", redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ];

        self.token_request(&form).await.map(Token::from)
    }

    /// Exchange the refresh token of `token` for a new access token.
    /// A rejection by the server is an `Auth` error.
    pub async fn refresh(&self, token: &Token) -> SyncResult<Token> {
        let refresh_token = token
            .refresh_token()
            .ok_or_else(|| SyncError::Auth("Token has no refresh token".into()))?;

        let form = [
            ("refresh_token", refresh_token),
            ("client_id", self.secret.client_id.as_str()),
            ("client_secret", self.secret.client_secret.as_str()),
            ("grant_type", "refresh_token"),
        ];

        let response = self.token_request(&form).await?;
        Ok(token.refreshed(response.into()))
    }

    async fn token_request(&self, form: &[(&str, &str)]) -> SyncResult<TokenResponse> {
        let response = self
            .http
            .post(&self.secret.token_uri)
            .form(form)
            .timeout(TOKEN_TIMEOUT)
            .send()
            .await
            .map_err(|e| SyncError::Network(format!("Token request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(token_error(status, &body));
        }

        response
            .json()
            .await
            .map_err(|e| SyncError::Network(format!("Failed to parse token response: {e}")))
    }
}

/// Client errors from the token endpoint mean the grant or client was
/// rejected; anything else is treated as transient.
fn token_error(status: StatusCode, body: &str) -> SyncError {
    if status.is_client_error() {
        SyncError::Auth(format!("Token endpoint rejected the request ({status}): {body}"))
    } else {
        SyncError::Network(format!("Token endpoint returned {status}: {body}"))
    }
}

async fn wait_for_callback(listener: &TcpListener) -> SyncResult<CallbackParams> {
    let (stream, _) = listener
        .accept()
        .await
        .map_err(|e| SyncError::Auth(format!("Failed to accept OAuth callback: {e}")))?;

    let mut reader = BufReader::new(stream);
    let mut request_line = String::new();
    reader
        .read_line(&mut request_line)
        .await
        .map_err(|e| SyncError::Auth(format!("Failed to read OAuth callback: {e}")))?;

    let params = parse_callback_request(&request_line);

    let (title, detail) = match &params {
        Ok(_) => (
            "Authentication successful!",
            "You can close this window and return to the terminal.",
        ),
        Err(_) => (
            "Authentication failed",
            "Return to the terminal for details.",
        ),
    };
    let response = format!(
        "HTTP/1.1 200 OK\r\n\
        Content-Type: text/html\r\n\
        Connection: close\r\n\
        \r\n\
        <html><body><h1>{title}</h1><p>{detail}</p></body></html>"
    );

    let mut stream = reader.into_inner();
    stream.write_all(response.as_bytes()).await?;
    stream.flush().await?;

    params
}

/// Extract `code` and `state` from the request line of the redirect, e.g.
/// `GET /callback?code=...&state=... HTTP/1.1`.
pub fn parse_callback_request(request_line: &str) -> SyncResult<CallbackParams> {
    let target = request_line
        .split_whitespace()
        .nth(1)
        .ok_or_else(|| SyncError::Auth("Invalid HTTP request on OAuth callback".into()))?;

    let url = Url::parse(&format!("http://localhost{target}"))
        .map_err(|e| SyncError::Auth(format!("Invalid OAuth callback URL: {e}")))?;

    let param = |name: &str| {
        url.query_pairs()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
    };

    if let Some(error) = param("error") {
        return Err(SyncError::Auth(format!("Authorization denied: {error}")));
    }

    let code = param("code").ok_or_else(|| SyncError::Auth("No code in OAuth callback".into()))?;
    let state =
        param("state").ok_or_else(|| SyncError::Auth("No state in OAuth callback".into()))?;

    Ok(CallbackParams { code, state })
}
