//! In-process token store for tests and local dry runs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

use super::{NewTokenRecord, TokenRecord, TokenStore};
use crate::error::JobError;

#[derive(Default)]
pub struct MemoryTokenStore {
    rows: RwLock<Vec<TokenRecord>>,
    fail_inserts: AtomicBool,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record as if it had been written at `written_at`.
    pub async fn seed(&self, access_token: &str, expires_in: Option<i64>, written_at: DateTime<Utc>) {
        let mut rows = self.rows.write().await;
        let id = rows.len() as i64 + 1;
        rows.push(TokenRecord {
            id,
            access_token: access_token.to_string(),
            expires_in,
            created_at: written_at,
            updated_at: written_at,
        });
    }

    /// Make every subsequent insert fail with a persist error.
    pub fn set_fail_inserts(&self, fail: bool) {
        self.fail_inserts.store(fail, Ordering::SeqCst);
    }

    /// All rows, oldest first.
    pub async fn rows(&self) -> Vec<TokenRecord> {
        self.rows.read().await.clone()
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    fn backend(&self) -> &str {
        "memory"
    }

    async fn latest(&self) -> Result<Option<TokenRecord>, JobError> {
        let rows = self.rows.read().await;
        Ok(rows
            .iter()
            .max_by_key(|r| (r.updated_at, r.created_at, r.id))
            .cloned())
    }

    async fn insert(&self, record: &NewTokenRecord) -> Result<(), JobError> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(JobError::Persist("memory store is read-only".into()));
        }

        let mut rows = self.rows.write().await;
        let now = Utc::now();
        let id = rows.len() as i64 + 1;
        rows.push(TokenRecord {
            id,
            access_token: record.access_token.clone(),
            expires_in: Some(record.expires_in),
            created_at: now,
            updated_at: now,
        });
        Ok(())
    }
}
