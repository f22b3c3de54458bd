use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use super::traits::{RefreshedToken, TokenRefresher};
use crate::error::JobError;

/// Instagram Graph API long-lived token refresh.
///
/// `GET refresh_access_token?grant_type=ig_refresh_token&access_token=...`
/// Token lifetime: 60 days. A token can be refreshed once it is at least
/// 24 hours old and has not expired yet.
pub struct InstagramRefresher {
    refresh_url: String,
    http: reqwest::Client,
}

// Raw body from the refresh endpoint, success or Graph API error.
#[derive(Debug, Deserialize)]
struct InstagramTokenResponse {
    access_token: Option<String>,
    expires_in: Option<i64>,
    error: Option<GraphApiError>,
}

#[derive(Debug, Deserialize)]
struct GraphApiError {
    message: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    code: Option<i64>,
}

impl InstagramRefresher {
    pub fn new(refresh_url: &str, timeout: Duration) -> Result<Self, JobError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| JobError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            refresh_url: refresh_url.to_string(),
            http,
        })
    }
}

/// Turn a raw refresh response into a token, or a refresh error carrying
/// whatever the provider said.
fn parse_refresh_response(status: u16, body: &str) -> Result<RefreshedToken, JobError> {
    let parsed: InstagramTokenResponse = serde_json::from_str(body).map_err(|e| {
        JobError::Refresh(format!("HTTP {status}: unreadable response ({e})"))
    })?;

    match parsed.access_token {
        Some(access_token) if !access_token.trim().is_empty() => Ok(RefreshedToken {
            access_token,
            expires_in: parsed.expires_in,
        }),
        _ => {
            let detail = match parsed.error {
                Some(err) => format!(
                    "{} (type: {}, code: {})",
                    err.message.as_deref().unwrap_or("unknown error"),
                    err.kind.as_deref().unwrap_or("unknown"),
                    err.code.map(|c| c.to_string()).unwrap_or_else(|| "-".into()),
                ),
                None => "response has no access_token".into(),
            };
            Err(JobError::Refresh(format!("HTTP {status}: {detail}")))
        }
    }
}

#[async_trait]
impl TokenRefresher for InstagramRefresher {
    fn id(&self) -> &str {
        "instagram"
    }

    async fn refresh(&self, current_token: &str) -> Result<RefreshedToken, JobError> {
        let resp = self
            .http
            .get(&self.refresh_url)
            .query(&[
                ("grant_type", "ig_refresh_token"),
                ("access_token", current_token),
            ])
            .send()
            .await
            .map_err(|e| JobError::Refresh(format!("Refresh request failed: {}", e.without_url())))?;

        let status = resp.status().as_u16();
        let body = resp
            .text()
            .await
            .map_err(|e| JobError::Refresh(format!("Failed to read refresh response: {}", e.without_url())))?;

        parse_refresh_response(status, &body)
    }
}
