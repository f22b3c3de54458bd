use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

use super::{FailureAlert, Notifier};
use crate::config::AlertConfig;
use crate::error::{JobError, NotifyError};

/// Sends failure alerts as email through the Resend API.
pub struct ResendNotifier {
    endpoint: String,
    api_key: String,
    from: String,
    to: String,
    http: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    text: String,
}

impl ResendNotifier {
    pub fn new(config: &AlertConfig, timeout: Duration) -> Result<Self, JobError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| JobError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            endpoint: config.endpoint.clone(),
            api_key: config.resend_api_key.clone(),
            from: config.from.clone(),
            to: config.to.clone(),
            http,
        })
    }

    fn payload<'a>(&'a self, alert: &'a FailureAlert) -> SendEmailRequest<'a> {
        SendEmailRequest {
            from: &self.from,
            to: [self.to.as_str()],
            subject: alert.subject(),
            text: alert.text_body(),
        }
    }
}

#[async_trait]
impl Notifier for ResendNotifier {
    fn channel(&self) -> &str {
        "resend"
    }

    async fn notify(&self, alert: &FailureAlert) -> Result<(), NotifyError> {
        let resp = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&self.payload(alert))
            .send()
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected { status, body });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_payload_shape() {
        let config = AlertConfig {
            resend_api_key: "re_test".into(),
            endpoint: crate::config::DEFAULT_RESEND_URL.into(),
            to: "ops@example.com".into(),
            from: "alerts@example.com".into(),
        };
        let notifier = ResendNotifier::new(&config, Duration::from_secs(5)).unwrap();
        let alert = FailureAlert::from_error(&JobError::Persist("disk full".into()), Utc::now());

        let json = serde_json::to_value(notifier.payload(&alert)).unwrap();
        assert_eq!(json["from"], "alerts@example.com");
        assert_eq!(json["to"], serde_json::json!(["ops@example.com"]));
        assert_eq!(json["subject"], "Instagram token refresh failed");
        assert!(json["text"].as_str().unwrap().contains("disk full"));
    }
}
