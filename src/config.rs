use anyhow::{bail, Context, Result};
use std::time::Duration;

/// Default refresh endpoint for Instagram long-lived tokens.
pub const DEFAULT_REFRESH_URL: &str = "https://graph.instagram.com/refresh_access_token";

/// Lifetime of a long-lived Instagram token (60 days).
pub const DEFAULT_EXPIRES_IN: i64 = 60 * 24 * 60 * 60;

/// Resend "send email" endpoint.
pub const DEFAULT_RESEND_URL: &str = "https://api.resend.com/emails";

/// Where token rows are kept.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreConfig {
    Postgres { database_url: String },
    Supabase { url: String, key: String },
}

/// Failure alert settings. Present only when both the API key and recipient are set.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertConfig {
    pub resend_api_key: String,
    /// Resend "send email" endpoint.
    pub endpoint: String,
    pub to: String,
    pub from: String,
}

/// Application configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // ── Server ──────────────────────────────────────────────────────────
    pub host: String,
    pub port: u16,

    // ── Caller auth ─────────────────────────────────────────────────────
    /// Shared secret the scheduler sends as `Authorization: Bearer <secret>`.
    pub cron_secret: String,

    // ── Token store ─────────────────────────────────────────────────────
    pub store: StoreConfig,
    pub token_table: String,

    // ── Refresh policy ──────────────────────────────────────────────────
    pub refresh_url: String,
    /// Refresh when the token has this many days left or fewer.
    pub refresh_threshold_days: i64,
    /// Lifetime assumed when the provider or the stored row omits `expires_in`.
    pub default_expires_in: i64,
    pub http_timeout: Duration,

    // ── Alerts ──────────────────────────────────────────────────────────
    pub alert: Option<AlertConfig>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let cron_secret = var("CRON_SECRET").context("CRON_SECRET is required")?;

        let store = match (var("DATABASE_URL"), var("SUPABASE_URL"), var("SUPABASE_KEY")) {
            (Some(database_url), _, _) => StoreConfig::Postgres { database_url },
            (None, Some(url), Some(key)) => {
                url::Url::parse(&url).context("SUPABASE_URL is not a valid URL")?;
                StoreConfig::Supabase {
                    url: url.trim_end_matches('/').to_string(),
                    key,
                }
            }
            _ => bail!("a token store is required: set DATABASE_URL, or SUPABASE_URL and SUPABASE_KEY"),
        };

        let refresh_url = var("IG_REFRESH_URL").unwrap_or_else(|| DEFAULT_REFRESH_URL.into());
        url::Url::parse(&refresh_url).context("IG_REFRESH_URL is not a valid URL")?;

        let token_table = var("TOKEN_TABLE").unwrap_or_else(|| "instagram_token".into());
        if !token_table
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            bail!("TOKEN_TABLE may only contain letters, digits and underscores");
        }

        let alert = match (var("RESEND_API_KEY"), var("ALERT_EMAIL_TO")) {
            (Some(resend_api_key), Some(to)) => {
                let endpoint = var("RESEND_API_URL").unwrap_or_else(|| DEFAULT_RESEND_URL.into());
                url::Url::parse(&endpoint).context("RESEND_API_URL is not a valid URL")?;
                Some(AlertConfig {
                    resend_api_key,
                    endpoint,
                    to,
                    from: var("ALERT_EMAIL_FROM").unwrap_or_else(|| "alerts@resend.dev".into()),
                })
            }
            _ => None,
        };

        let refresh_threshold_days: i64 = var("REFRESH_THRESHOLD_DAYS")
            .unwrap_or_else(|| "10".into())
            .parse()
            .context("Invalid REFRESH_THRESHOLD_DAYS")?;
        if refresh_threshold_days < 0 {
            bail!("REFRESH_THRESHOLD_DAYS must not be negative");
        }

        let default_expires_in = var("DEFAULT_EXPIRES_IN")
            .map(|v| v.parse())
            .transpose()
            .context("Invalid DEFAULT_EXPIRES_IN")?
            .unwrap_or(DEFAULT_EXPIRES_IN);
        if default_expires_in <= 0 {
            bail!("DEFAULT_EXPIRES_IN must be a positive number of seconds");
        }

        let http_timeout_secs: u64 = var("HTTP_TIMEOUT_SECS")
            .unwrap_or_else(|| "10".into())
            .parse()
            .context("Invalid HTTP_TIMEOUT_SECS")?;
        if http_timeout_secs == 0 {
            bail!("HTTP_TIMEOUT_SECS must be at least 1");
        }

        Ok(Config {
            host: var("HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: var("PORT")
                .unwrap_or_else(|| "3000".into())
                .parse()
                .context("Invalid PORT")?,
            cron_secret,
            store,
            token_table,
            refresh_url,
            refresh_threshold_days,
            default_expires_in,
            http_timeout: Duration::from_secs(http_timeout_secs),
            alert,
        })
    }
}
