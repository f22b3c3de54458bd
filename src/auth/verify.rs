//! Caller verification for the scheduler-triggered endpoint.
//!
//! The scheduler authenticates with `Authorization: Bearer <CRON_SECRET>`.

use axum::http::{header::AUTHORIZATION, HeaderMap};

use crate::error::JobError;

/// Check the `Authorization` header against the expected bearer value.
///
/// Missing header, non-UTF-8 value, wrong scheme or wrong secret are all
/// `Unauthorized`. An empty secret never matches.
pub fn verify_cron_secret(headers: &HeaderMap, cron_secret: &str) -> Result<(), JobError> {
    if cron_secret.is_empty() {
        return Err(JobError::Unauthorized);
    }

    let provided = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(JobError::Unauthorized)?;

    let expected = format!("Bearer {cron_secret}");
    if !constant_time_eq(provided.as_bytes(), expected.as_bytes()) {
        return Err(JobError::Unauthorized);
    }

    Ok(())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(auth: Option<&str>) -> HeaderMap {
        let mut map = HeaderMap::new();
        if let Some(value) = auth {
            map.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn test_matching_bearer_passes() {
        assert!(verify_cron_secret(&headers(Some("Bearer s3cret")), "s3cret").is_ok());
    }

    #[test]
    fn test_rejections() {
        let cases = [
            None,
            Some("s3cret"),
            Some("Bearer wrong"),
            Some("bearer s3cret"),
            Some("Bearer s3cret "),
            Some("Basic czNjcmV0"),
        ];
        for case in cases {
            let result = verify_cron_secret(&headers(case), "s3cret");
            assert!(matches!(result, Err(JobError::Unauthorized)), "accepted {case:?}");
        }
    }

    #[test]
    fn test_empty_secret_never_matches() {
        assert!(verify_cron_secret(&headers(Some("Bearer ")), "").is_err());
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"abcd"));
    }
}
