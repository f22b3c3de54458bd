use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Errors produced by one run of the token refresh job.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    // ── Caller ──────────────────────────────────────────────────────────
    #[error("Unauthorized")]
    Unauthorized,

    // ── Job steps ───────────────────────────────────────────────────────
    #[error("Token lookup failed: {0}")]
    Lookup(String),

    #[error("Token refresh failed: {0}")]
    Refresh(String),

    #[error("Token persist failed: {0}")]
    Persist(String),

    // ── Internal ────────────────────────────────────────────────────────
    #[error("Configuration error: {0}")]
    Config(String),
}

impl JobError {
    /// Stable machine-readable kind, used in response bodies and alerts.
    pub fn code(&self) -> &'static str {
        match self {
            JobError::Unauthorized => "unauthorized",
            JobError::Lookup(_) => "lookup_error",
            JobError::Refresh(_) => "refresh_error",
            JobError::Persist(_) => "persist_error",
            JobError::Config(_) => "config_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            JobError::Unauthorized => StatusCode::UNAUTHORIZED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Failure of the alert side channel. Logged by the job, never returned to the caller.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Alert request failed: {0}")]
    Transport(String),

    #[error("Alert provider rejected the message ({status}): {body}")]
    Rejected { status: u16, body: String },
}

impl IntoResponse for JobError {
    fn into_response(self) -> Response {
        let body = json!({
            "success": false,
            "error": self.to_string(),
            "code": self.code(),
        });

        (self.status(), axum::Json(body)).into_response()
    }
}
