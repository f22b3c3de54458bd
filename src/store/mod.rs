//! Token store: append-only history of Instagram access tokens.
//!
//! The current token is always the most recently written row. The job only
//! ever inserts; older rows stay behind as history.
//!
//! Backends:
//! - `db`: PostgreSQL through sqlx
//! - `supabase`: Supabase REST (PostgREST) over HTTP
//! - `memory`: in-process, for tests and dry runs

pub mod db;
pub mod memory;
pub mod supabase;

pub use db::PgTokenStore;
pub use memory::MemoryTokenStore;
pub use supabase::SupabaseTokenStore;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::error::JobError;

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

/// A stored credential plus its issuance time and lifetime.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TokenRecord {
    pub id: i64,
    pub access_token: String,
    /// Lifetime in seconds as reported by the provider. May be absent on old rows.
    pub expires_in: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TokenRecord {
    /// `updated_at + expires_in`, using `default_expires_in` when the row has no lifetime.
    ///
    /// A lifetime that does not fit a timestamp is a lookup error.
    pub fn expires_at(&self, default_expires_in: i64) -> Result<DateTime<Utc>, JobError> {
        let lifetime = self.expires_in.unwrap_or(default_expires_in);
        TimeDelta::try_seconds(lifetime)
            .and_then(|delta| self.updated_at.checked_add_signed(delta))
            .ok_or_else(|| {
                JobError::Lookup(format!(
                    "stored lifetime out of range on token record {}: {lifetime}s",
                    self.id
                ))
            })
    }

    /// Whole days until expiry, rounded down. Negative once the token has expired.
    pub fn days_left(&self, now: DateTime<Utc>, default_expires_in: i64) -> Result<i64, JobError> {
        let remaining = self.expires_at(default_expires_in)? - now;
        Ok(remaining.num_seconds().div_euclid(SECONDS_PER_DAY))
    }
}

/// Row payload for a freshly refreshed token.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewTokenRecord {
    pub access_token: String,
    pub expires_in: i64,
}

/// Persistence for token records.
///
/// `latest` failures are lookup errors, `insert` failures are persist errors.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Short backend name for logs ("postgres", "supabase", "memory").
    fn backend(&self) -> &str;

    /// The single most recent record, if any.
    async fn latest(&self) -> Result<Option<TokenRecord>, JobError>;

    /// Append a new record. Existing rows are never touched.
    async fn insert(&self, record: &NewTokenRecord) -> Result<(), JobError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn record(updated_at: DateTime<Utc>, expires_in: Option<i64>) -> TokenRecord {
        TokenRecord {
            id: 1,
            access_token: "IGQV-current".into(),
            expires_in,
            created_at: updated_at,
            updated_at,
        }
    }

    #[test]
    fn test_days_left_floors_partial_days() {
        let written = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let rec = record(written, Some(5_184_000));
        // 60 days lifetime, 49.5 days elapsed -> 10.5 days left -> 10
        let now = written + Duration::hours(49 * 24 + 12);
        assert_eq!(rec.days_left(now, 0).unwrap(), 10);
    }

    #[test]
    fn test_days_left_negative_after_expiry() {
        let written = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let rec = record(written, Some(86_400));
        // expired one hour ago -> floor(-1/24) = -1
        let now = written + Duration::hours(25);
        assert_eq!(rec.days_left(now, 0).unwrap(), -1);
    }

    #[test]
    fn test_missing_lifetime_uses_default() {
        let written = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let rec = record(written, None);
        assert_eq!(rec.expires_at(5_184_000).unwrap(), written + Duration::days(60));
        assert_eq!(rec.days_left(written, 5_184_000).unwrap(), 60);
    }

    #[test]
    fn test_out_of_range_lifetime_is_lookup_error() {
        let written = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        for lifetime in [10_000_000_000_000_000, i64::MAX, i64::MIN] {
            let rec = record(written, Some(lifetime));
            let err = rec.days_left(written, 5_184_000).unwrap_err();
            assert!(matches!(err, JobError::Lookup(ref m) if m.contains("out of range")));
        }
    }
}
