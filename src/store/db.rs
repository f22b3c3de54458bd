//! PostgreSQL-backed token store.
//!
//! One table (default `instagram_token`), append-only:
//! `id`, `access_token`, `expires_in`, `created_at`, `updated_at`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use tracing::debug;

use super::{NewTokenRecord, TokenRecord, TokenStore};
use crate::error::JobError;

/// Token store backed by PostgreSQL.
pub struct PgTokenStore {
    pool: PgPool,
    table: String,
}

impl PgTokenStore {
    /// Connect a small pool. `table` must already be validated as a plain identifier.
    pub async fn new(db_url: &str, table: &str) -> Result<Self, JobError> {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(2)
            .connect(db_url)
            .await
            .map_err(|e| JobError::Config(format!("Failed to connect to PostgreSQL: {e}")))?;

        Ok(Self {
            pool,
            table: table.to_string(),
        })
    }

    /// Create the token table if it does not exist yet.
    pub async fn migrate(&self) -> Result<(), JobError> {
        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {table} (
                id              BIGSERIAL PRIMARY KEY,
                access_token    TEXT NOT NULL,
                expires_in      BIGINT,
                created_at      TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at      TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
            table = self.table
        ))
        .execute(&self.pool)
        .await
        .map_err(|e| JobError::Config(format!("Migration failed: {e}")))?;

        sqlx::query(&format!(
            "CREATE INDEX IF NOT EXISTS idx_{table}_recent ON {table}(updated_at DESC, created_at DESC)",
            table = self.table
        ))
        .execute(&self.pool)
        .await
        .map_err(|e| JobError::Config(format!("Migration failed: {e}")))?;

        Ok(())
    }
}

#[async_trait]
impl TokenStore for PgTokenStore {
    fn backend(&self) -> &str {
        "postgres"
    }

    async fn latest(&self) -> Result<Option<TokenRecord>, JobError> {
        let row = sqlx::query(&format!(
            r#"
            SELECT id, access_token, expires_in, created_at, updated_at
            FROM {table}
            ORDER BY updated_at DESC, created_at DESC, id DESC
            LIMIT 1
            "#,
            table = self.table
        ))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| JobError::Lookup(format!("database error: {e}")))?;

        let row = match row {
            Some(r) => r,
            None => return Ok(None),
        };

        let decode = |e: sqlx::Error| JobError::Lookup(format!("malformed token row: {e}"));
        let created_at: DateTime<Utc> = row.try_get(3).map_err(decode)?;
        let updated_at: DateTime<Utc> = row.try_get(4).map_err(decode)?;

        Ok(Some(TokenRecord {
            id: row.try_get(0).map_err(decode)?,
            access_token: row.try_get(1).map_err(decode)?,
            expires_in: row.try_get(2).map_err(decode)?,
            created_at,
            updated_at,
        }))
    }

    async fn insert(&self, record: &NewTokenRecord) -> Result<(), JobError> {
        let row = sqlx::query(&format!(
            "INSERT INTO {table} (access_token, expires_in) VALUES ($1, $2) RETURNING id",
            table = self.table
        ))
        .bind(&record.access_token)
        .bind(record.expires_in)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| JobError::Persist(format!("database error: {e}")))?;

        let id: i64 = row
            .try_get(0)
            .map_err(|e| JobError::Persist(format!("unexpected insert result: {e}")))?;
        debug!(id, "Inserted token row");
        Ok(())
    }
}
