use async_trait::async_trait;

use crate::error::JobError;

/// A token returned by the provider's refresh endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct RefreshedToken {
    pub access_token: String,
    /// Lifetime in seconds. Absent when the provider does not report one.
    pub expires_in: Option<i64>,
}

/// Exchanges a still-valid long-lived token for a new one.
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    /// Provider identifier (e.g., "instagram").
    fn id(&self) -> &str;

    /// Call the refresh endpoint once. No retries.
    ///
    /// Any response without an access token is a `JobError::Refresh`.
    async fn refresh(&self, current_token: &str) -> Result<RefreshedToken, JobError>;
}
