use reqwest::StatusCode;
use tracing::debug;

use crate::{
    config::SyncConfig,
    error::{Result, SyncError},
    types::{ApiErrorResponse, SearchResponse},
};

pub const SEARCH_PATH: &str = "/youtube/v3/search";

/// Only the first page is ever requested.
pub const PAGE_SIZE: u32 = 10;

/// Thin client for the YouTube Data API v3 `search` endpoint.
#[derive(Clone)]
pub struct YouTubeClient {
    http: reqwest::Client,
    api_base: String,
    api_key: String,
}

impl YouTubeClient {
    pub fn new(http: reqwest::Client, config: &SyncConfig) -> Self {
        Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }

    pub fn search_url(&self) -> String {
        format!("{}{}", self.api_base, SEARCH_PATH)
    }

    /// Fetch the newest videos of a channel, most recently published first.
    pub async fn search_latest(&self, channel_id: &str) -> Result<SearchResponse> {
        let max_results = PAGE_SIZE.to_string();
        let url = self.search_url();
        debug!(%url, channel_id, "requesting latest uploads");

        let response = self
            .http
            .get(&url)
            .query(&[
                ("key", self.api_key.as_str()),
                ("channelId", channel_id),
                ("part", "snippet,id"),
                ("order", "date"),
                ("maxResults", max_results.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            return Err(status_error(status, &body));
        }

        Ok(serde_json::from_slice(&body)?)
    }
}

fn status_error(status: StatusCode, body: &[u8]) -> SyncError {
    let Ok(envelope) = serde_json::from_slice::<ApiErrorResponse>(body) else {
        return SyncError::ApiStatus {
            status,
            message: String::from_utf8_lossy(body).into_owned(),
        };
    };

    let quota = envelope
        .error
        .errors
        .iter()
        .any(|e| matches!(e.reason.as_str(), "quotaExceeded" | "dailyLimitExceeded"))
        || envelope
            .error
            .message
            .starts_with("The request cannot be completed because you have exceeded your");

    if status == StatusCode::FORBIDDEN && quota {
        SyncError::QuotaExceeded {
            message: envelope.error.message,
        }
    } else {
        SyncError::ApiStatus {
            status,
            message: envelope.error.message,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode as AxumStatus;
    use serde_json::json;

    fn client_for(base_url: &str) -> YouTubeClient {
        let config = SyncConfig::new("test-key", "UC123").with_api_base(base_url);
        YouTubeClient::new(reqwest::Client::new(), &config)
    }

    #[tokio::test]
    async fn sends_the_expected_query() {
        let server = fake::serve(AxumStatus::OK, json!({ "items": [] })).await;

        client_for(&server.base_url)
            .search_latest("UC123")
            .await
            .unwrap();

        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        let params = &requests[0];
        assert_eq!(params["key"], "test-key");
        assert_eq!(params["channelId"], "UC123");
        assert_eq!(params["part"], "snippet,id");
        assert_eq!(params["order"], "date");
        assert_eq!(params["maxResults"], "10");
    }

    #[tokio::test]
    async fn quota_exhaustion_is_surfaced() {
        let server = fake::serve(
            AxumStatus::FORBIDDEN,
            json!({
                "error": {
                    "code": 403,
                    "message": "The request cannot be completed because you have exceeded your quota.",
                    "errors": [{ "reason": "quotaExceeded" }]
                }
            }),
        )
        .await;

        let err = client_for(&server.base_url)
            .search_latest("UC123")
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::QuotaExceeded { .. }));
    }

    #[tokio::test]
    async fn other_statuses_carry_the_api_message() {
        let server = fake::serve(
            AxumStatus::BAD_REQUEST,
            json!({ "error": { "code": 400, "message": "API key not valid." } }),
        )
        .await;

        let err = client_for(&server.base_url)
            .search_latest("UC123")
            .await
            .unwrap_err();

        match err {
            SyncError::ApiStatus { status, message } => {
                assert_eq!(status, StatusCode::BAD_REQUEST);
                assert_eq!(message, "API key not valid.");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn trailing_slash_in_base_is_ignored() {
        let client = client_for("http://localhost:1234/");
        assert_eq!(client.search_url(), "http://localhost:1234/youtube/v3/search");
    }
}
