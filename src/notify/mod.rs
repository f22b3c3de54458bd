//! Operator alerts for failed refresh runs.
//!
//! Alerts are best effort: the job logs a `NotifyError` and moves on.

mod resend;

pub use resend::ResendNotifier;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use tracing::info;

use crate::error::{JobError, NotifyError};

pub const ALERT_SUBJECT: &str = "Instagram token refresh failed";

/// What went wrong in one job run.
#[derive(Debug, Clone, PartialEq)]
pub struct FailureAlert {
    pub code: &'static str,
    pub message: String,
    pub occurred_at: DateTime<Utc>,
}

impl FailureAlert {
    pub fn from_error(err: &JobError, occurred_at: DateTime<Utc>) -> Self {
        Self {
            code: err.code(),
            message: err.to_string(),
            occurred_at,
        }
    }

    pub fn subject(&self) -> &'static str {
        ALERT_SUBJECT
    }

    /// Plain-text body with the error and an RFC 3339 timestamp.
    pub fn text_body(&self) -> String {
        format!(
            "The scheduled Instagram token refresh failed.\n\n\
             Error: {}\n\
             Kind: {}\n\
             Time: {}\n",
            self.message,
            self.code,
            self.occurred_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        )
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Channel name for logs.
    fn channel(&self) -> &str;

    async fn notify(&self, alert: &FailureAlert) -> Result<(), NotifyError>;
}

/// Used when no alert channel is configured. Only logs.
pub struct DisabledNotifier;

#[async_trait]
impl Notifier for DisabledNotifier {
    fn channel(&self) -> &str {
        "disabled"
    }

    async fn notify(&self, alert: &FailureAlert) -> Result<(), NotifyError> {
        info!(code = alert.code, "Alerting not configured, skipping email");
        Ok(())
    }
}
