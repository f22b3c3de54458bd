//! Supabase REST (PostgREST) token store.
//!
//! Talks to `{SUPABASE_URL}/rest/v1/{table}` with the service key in both the
//! `apikey` and `Authorization` headers.

use async_trait::async_trait;
use std::time::Duration;

use super::{NewTokenRecord, TokenRecord, TokenStore};
use crate::error::JobError;

const SELECT_COLUMNS: &str = "id,access_token,expires_in,created_at,updated_at";

pub struct SupabaseTokenStore {
    base_url: String,
    key: String,
    table: String,
    http: reqwest::Client,
}

impl SupabaseTokenStore {
    pub fn new(base_url: &str, key: &str, table: &str, timeout: Duration) -> Result<Self, JobError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| JobError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            key: key.to_string(),
            table: table.to_string(),
            http,
        })
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.table)
    }

    fn request(&self, method: reqwest::Method) -> reqwest::RequestBuilder {
        self.http
            .request(method, self.table_url())
            .header("apikey", &self.key)
            .bearer_auth(&self.key)
    }
}

/// Parse a PostgREST result set into at most one record.
fn parse_latest(body: &str) -> Result<Option<TokenRecord>, JobError> {
    let rows: Vec<TokenRecord> = serde_json::from_str(body)
        .map_err(|e| JobError::Lookup(format!("malformed Supabase response: {e}")))?;
    Ok(rows.into_iter().next())
}

#[async_trait]
impl TokenStore for SupabaseTokenStore {
    fn backend(&self) -> &str {
        "supabase"
    }

    async fn latest(&self) -> Result<Option<TokenRecord>, JobError> {
        let resp = self
            .request(reqwest::Method::GET)
            .query(&[
                ("select", SELECT_COLUMNS),
                ("order", "updated_at.desc,created_at.desc,id.desc"),
                ("limit", "1"),
            ])
            .send()
            .await
            .map_err(|e| JobError::Lookup(format!("Supabase request failed: {e}")))?;

        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(JobError::Lookup(format!(
                "Supabase returned HTTP {status}: {body}"
            )));
        }

        parse_latest(&body)
    }

    async fn insert(&self, record: &NewTokenRecord) -> Result<(), JobError> {
        let resp = self
            .request(reqwest::Method::POST)
            .header("Prefer", "return=minimal")
            .json(record)
            .send()
            .await
            .map_err(|e| JobError::Persist(format!("Supabase request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(JobError::Persist(format!(
                "Supabase returned HTTP {status}: {body}"
            )));
        }

        Ok(())
    }
}
