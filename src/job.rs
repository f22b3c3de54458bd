//! The token refresh job: check expiry, maybe refresh, persist, report.
//!
//! One invocation is one best-effort attempt. No retries; a failure is
//! reported to the caller and to the alert channel, and the next scheduled
//! run tries again.

use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::auth::verify_cron_secret;
use crate::config::Config;
use crate::error::JobError;
use crate::notify::{FailureAlert, Notifier};
use crate::providers::TokenRefresher;
use crate::store::{NewTokenRecord, TokenStore};

/// When to refresh, and what lifetime to assume when none is reported.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RefreshPolicy {
    /// Refresh once `days_left <= threshold_days`.
    pub threshold_days: i64,
    pub default_expires_in: i64,
}

impl RefreshPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            threshold_days: config.refresh_threshold_days,
            default_expires_in: config.default_expires_in,
        }
    }

    pub fn needs_refresh(&self, days_left: i64) -> bool {
        days_left <= self.threshold_days
    }
}

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    /// Token has more than the threshold left; nothing was written.
    StillValid { days_left: i64 },
    /// A new token was fetched and stored.
    Refreshed { expires_in: i64 },
}

impl IntoResponse for JobOutcome {
    fn into_response(self) -> Response {
        let body = match self {
            JobOutcome::StillValid { days_left } => json!({
                "success": true,
                "message": "Token still valid",
                "days_left": days_left,
            }),
            JobOutcome::Refreshed { expires_in } => json!({
                "success": true,
                "message": "Token refreshed successfully",
                "expires_in": expires_in,
            }),
        };
        Json(body).into_response()
    }
}

pub struct TokenRefreshJob {
    cron_secret: String,
    policy: RefreshPolicy,
    store: Arc<dyn TokenStore>,
    refresher: Arc<dyn TokenRefresher>,
    notifier: Arc<dyn Notifier>,
}

impl TokenRefreshJob {
    pub fn new(
        cron_secret: impl Into<String>,
        policy: RefreshPolicy,
        store: Arc<dyn TokenStore>,
        refresher: Arc<dyn TokenRefresher>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            cron_secret: cron_secret.into(),
            policy,
            store,
            refresher,
            notifier,
        }
    }

    /// Serve one scheduler request.
    ///
    /// Bad credentials short-circuit with 401 before anything else runs.
    pub async fn handle(&self, headers: &HeaderMap) -> Response {
        if let Err(e) = verify_cron_secret(headers, &self.cron_secret) {
            warn!("Rejected refresh request with missing or invalid credentials");
            return e.into_response();
        }

        match self.run_and_report(Utc::now()).await {
            Ok(outcome) => outcome.into_response(),
            Err(e) => e.into_response(),
        }
    }

    /// Run the job and send an alert if it fails. Alert failures are only logged.
    pub async fn run_and_report(&self, now: DateTime<Utc>) -> Result<JobOutcome, JobError> {
        match self.run(now).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                error!(code = e.code(), "Token refresh job failed: {e}");
                let alert = FailureAlert::from_error(&e, now);
                if let Err(notify_err) = self.notifier.notify(&alert).await {
                    warn!(
                        channel = self.notifier.channel(),
                        "Failed to send failure alert: {notify_err}"
                    );
                }
                Err(e)
            }
        }
    }

    /// Lookup, expiry decision, refresh and persist. No alerting.
    pub async fn run(&self, now: DateTime<Utc>) -> Result<JobOutcome, JobError> {
        let current = self
            .store
            .latest()
            .await?
            .ok_or_else(|| JobError::Lookup("no token record found".into()))?;

        if current.access_token.trim().is_empty() {
            return Err(JobError::Lookup(format!(
                "token record {} has an empty access token",
                current.id
            )));
        }

        let days_left = current.days_left(now, self.policy.default_expires_in)?;
        info!(
            store = self.store.backend(),
            record_id = current.id,
            days_left,
            "Current token {}",
            mask_token(&current.access_token)
        );

        if !self.policy.needs_refresh(days_left) {
            info!(
                days_left,
                threshold = self.policy.threshold_days,
                "Token still valid, skipping refresh"
            );
            return Ok(JobOutcome::StillValid { days_left });
        }

        let refreshed = self.refresher.refresh(&current.access_token).await?;
        let expires_in = refreshed
            .expires_in
            .unwrap_or(self.policy.default_expires_in);

        self.store
            .insert(&NewTokenRecord {
                access_token: refreshed.access_token,
                expires_in,
            })
            .await?;

        info!(
            provider = self.refresher.id(),
            expires_in, "Refreshed token stored"
        );
        Ok(JobOutcome::Refreshed { expires_in })
    }
}

/// Keep only the ends of a token for log lines.
pub fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 8 {
        return "****".into();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}…{tail}")
}
