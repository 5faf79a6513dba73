//! Date-filtered search over the Photos Library API.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use gphotos_core::{MediaIndex, MediaRecord, SyncError, SyncResult};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;

use crate::credentials::CredentialProvider;

pub const SEARCH_URL: &str = "https://photoslibrary.googleapis.com/v1/mediaItems:search";
const PAGE_SIZE: u32 = 100;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResponse {
    #[serde(default)]
    media_items: Vec<GoogleMediaItem>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleMediaItem {
    id: String,
    filename: String,
    base_url: String,
    #[serde(default)]
    mime_type: String,
    #[serde(default)]
    media_metadata: MediaMetadata,
}

/// Width and height come back as strings (int64 in the API).
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MediaMetadata {
    creation_time: Option<DateTime<Utc>>,
    width: Option<String>,
    height: Option<String>,
}

impl GoogleMediaItem {
    fn into_record(self, queried: NaiveDate) -> MediaRecord {
        let creation_time = self
            .media_metadata
            .creation_time
            .unwrap_or_else(|| queried.and_time(NaiveTime::MIN).and_utc());

        MediaRecord {
            id: self.id,
            filename: self.filename,
            base_url: self.base_url,
            creation_time,
            mime_type: self.mime_type,
            width: self.media_metadata.width.and_then(|w| w.parse().ok()),
            height: self.media_metadata.height.and_then(|h| h.parse().ok()),
        }
    }
}

pub struct GooglePhotosClient {
    credentials: CredentialProvider,
    http: reqwest::Client,
    search_url: String,
    timeout: Duration,
}

impl GooglePhotosClient {
    pub fn new(credentials: CredentialProvider, timeout: Duration) -> Self {
        GooglePhotosClient {
            credentials,
            http: reqwest::Client::new(),
            search_url: SEARCH_URL.to_string(),
            timeout,
        }
    }

    /// Send searches to `url` instead of the public endpoint.
    pub fn with_search_url(mut self, url: impl Into<String>) -> Self {
        self.search_url = url.into();
        self
    }
}

#[async_trait]
impl MediaIndex for GooglePhotosClient {
    async fn search_by_date(&self, date: NaiveDate) -> SyncResult<Vec<MediaRecord>> {
        let token = self.credentials.get_token().await?;

        tracing::debug!(%date, "Searching media items");

        let response = self
            .http
            .post(&self.search_url)
            .bearer_auth(token.access_token())
            .json(&search_body(date))
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| SyncError::Network(format!("Search for {date} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(api_error(status, &body));
        }

        let body = response
            .text()
            .await
            .map_err(|e| SyncError::Network(format!("Search for {date} failed: {e}")))?;

        parse_search_response(&body, date)
    }
}

fn search_body(date: NaiveDate) -> serde_json::Value {
    json!({
        "pageSize": PAGE_SIZE,
        "filters": {
            "dateFilter": {
                "dates": [{
                    "year": date.year(),
                    "month": date.month(),
                    "day": date.day(),
                }]
            }
        }
    })
}

/// Only the first page is used.
fn parse_search_response(body: &str, date: NaiveDate) -> SyncResult<Vec<MediaRecord>> {
    // The API answers `{}` for a day without media.
    let response: SearchResponse = if body.trim().is_empty() {
        SearchResponse::default()
    } else {
        serde_json::from_str(body)
            .map_err(|e| SyncError::Network(format!("Malformed search response for {date}: {e}")))?
    };

    if response.next_page_token.is_some() {
        tracing::warn!(
            %date,
            "More than {PAGE_SIZE} items on this date, only the first {} are synced",
            response.media_items.len()
        );
    }

    Ok(response
        .media_items
        .into_iter()
        .map(|item| item.into_record(date))
        .collect())
}

fn api_error(status: StatusCode, body: &str) -> SyncError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            SyncError::Auth(format!("Photos Library API returned {status}: {body}"))
        }
        _ => SyncError::Network(format!("Photos Library API returned {status}: {body}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_config::ClientSecret;
    use crate::oauth::OAuthClient;
    use crate::session::{SCOPES, Token, TokenCache};
    use crate::test_support::serve_once;
    use chrono::TimeZone;
    use gphotos_core::MediaKind;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn search_body_filters_on_one_date() {
        assert_eq!(
            search_body(day(2023, 3, 7)),
            json!({
                "pageSize": 100,
                "filters": {"dateFilter": {"dates": [{"year": 2023, "month": 3, "day": 7}]}}
            })
        );
    }

    #[test]
    fn parses_media_items() {
        let body = r#"{
            "mediaItems": [
                {
                    "id": "AF1Qip",
                    "productUrl": "https://photos.google.com/lr/photo/AF1Qip",
                    "baseUrl": "https://lh3.googleusercontent.com/lr/AF1Qip",
                    "mimeType": "image/jpeg",
                    "mediaMetadata": {
                        "creationTime": "2023-11-15T09:41:12Z",
                        "width": "4032",
                        "height": "3024",
                        "photo": {"cameraMake": "Google"}
                    },
                    "filename": "PXL_20231115_094112.jpg"
                },
                {
                    "id": "AF1Qiq",
                    "baseUrl": "https://lh3.googleusercontent.com/lr/AF1Qiq",
                    "mimeType": "video/mp4",
                    "mediaMetadata": {"creationTime": "2023-11-15T18:00:00Z"},
                    "filename": "VID_1.mp4"
                }
            ]
        }"#;

        let records = parse_search_response(body, day(2023, 11, 15)).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].filename, "PXL_20231115_094112.jpg");
        assert_eq!(
            records[0].creation_time,
            Utc.with_ymd_and_hms(2023, 11, 15, 9, 41, 12).unwrap()
        );
        assert_eq!(records[0].width, Some(4032));
        assert_eq!(records[0].kind(), MediaKind::Photo);
        assert_eq!(records[1].kind(), MediaKind::Video);
        assert_eq!(records[1].height, None);
    }

    #[test]
    fn empty_day_has_no_records() {
        assert!(parse_search_response("{}", day(2023, 1, 1)).unwrap().is_empty());
        assert!(parse_search_response("", day(2023, 1, 1)).unwrap().is_empty());
    }

    #[test]
    fn missing_creation_time_falls_back_to_queried_date() {
        let body = r#"{"mediaItems": [{"id": "x", "filename": "a.jpg", "baseUrl": "https://b"}]}"#;

        let records = parse_search_response(body, day(2022, 2, 28)).unwrap();

        assert_eq!(records[0].creation_date(), day(2022, 2, 28));
    }

    #[test]
    fn truncated_page_still_returns_first_page() {
        let body = r#"{
            "mediaItems": [{"id": "x", "filename": "a.jpg", "baseUrl": "https://b"}],
            "nextPageToken": "CkgKQnR5"
        }"#;

        assert_eq!(parse_search_response(body, day(2022, 2, 28)).unwrap().len(), 1);
    }

    #[test]
    fn malformed_body_is_a_network_error() {
        let err = parse_search_response("<html>", day(2022, 2, 28)).unwrap_err();
        assert_eq!(err.exit_code(), 4);
    }

    fn client_with_cached_token(dir: &std::path::Path, url: &str) -> GooglePhotosClient {
        let secret = ClientSecret::parse(r#"{"installed": {"client_id": "id", "client_secret": "s"}}"#)
            .unwrap();
        let cache = TokenCache::in_dir(dir);
        cache
            .save(&Token::new(
                "tok-123".into(),
                None,
                Some(3600),
                SCOPES.iter().map(|s| s.to_string()).collect(),
            ))
            .unwrap();

        let credentials = CredentialProvider::new(OAuthClient::new(secret, 0), cache);
        GooglePhotosClient::new(credentials, Duration::from_secs(5)).with_search_url(url)
    }

    #[tokio::test]
    async fn search_posts_date_filter_with_bearer_token() {
        let (url, server) = serve_once(
            "/v1/mediaItems:search",
            "200 OK",
            r#"{"mediaItems": [{"id": "x", "filename": "a.jpg", "baseUrl": "https://b",
                "mimeType": "image/jpeg", "mediaMetadata": {"creationTime": "2023-11-15T08:00:00Z"}}]}"#,
        )
        .await;
        let dir = tempfile::tempdir().unwrap();
        let client = client_with_cached_token(dir.path(), &url);

        let records = client.search_by_date(day(2023, 11, 15)).await.unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].filename, "a.jpg");

        let request = server.await.unwrap();
        assert!(request.request_line.starts_with("POST /v1/mediaItems:search "));
        assert_eq!(request.header("authorization"), Some("Bearer tok-123"));
        let body: serde_json::Value = serde_json::from_str(&request.body).unwrap();
        assert_eq!(body, search_body(day(2023, 11, 15)));
    }

    #[tokio::test]
    async fn unauthorized_search_is_an_auth_error() {
        let (url, _server) = serve_once(
            "/v1/mediaItems:search",
            "401 Unauthorized",
            r#"{"error": {"code": 401, "status": "UNAUTHENTICATED"}}"#,
        )
        .await;
        let dir = tempfile::tempdir().unwrap();
        let client = client_with_cached_token(dir.path(), &url);

        let err = client.search_by_date(day(2023, 11, 15)).await.unwrap_err();

        assert!(matches!(err, SyncError::Auth(_)));
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn status_mapping() {
        assert_eq!(api_error(StatusCode::UNAUTHORIZED, "").exit_code(), 3);
        assert_eq!(api_error(StatusCode::FORBIDDEN, "").exit_code(), 3);
        assert_eq!(api_error(StatusCode::TOO_MANY_REQUESTS, "").exit_code(), 4);
        assert_eq!(api_error(StatusCode::INTERNAL_SERVER_ERROR, "").exit_code(), 4);
    }
}
