//! Access-token expiry inspection.
//!
//! The backend issues JWT bearer tokens. The only claim the console cares
//! about is `exp`: tokens are refreshed client-side once their embedded
//! expiry passes, without any signature verification (the server remains the
//! authority; this check just avoids sending requests that would 401).

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TokenError {
    #[error("Token is not in header.payload.signature form")]
    Malformed,

    #[error("Failed to decode token payload: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("Failed to parse token claims: {0}")]
    Claims(#[from] serde_json::Error),

    #[error("Token expiry is out of range")]
    ExpiryOutOfRange,
}

#[derive(Debug, Deserialize)]
struct Claims {
    exp: i64,
}

/// Decode the expiry timestamp from a JWT's payload segment.
pub fn expiry(token: &str) -> Result<DateTime<Utc>, TokenError> {
    let payload = token.split('.').nth(1).ok_or(TokenError::Malformed)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload)?;
    let claims: Claims = serde_json::from_slice(&bytes)?;
    Utc.timestamp_opt(claims.exp, 0)
        .single()
        .ok_or(TokenError::ExpiryOutOfRange)
}

/// Check whether a token's embedded expiry is at or before `now`.
/// Tokens that cannot be decoded are treated as expired, which forces a
/// refresh on the next request rather than failing the request itself.
pub fn is_expired(token: &str, now: DateTime<Utc>) -> bool {
    match expiry(token) {
        Ok(exp) => exp <= now,
        Err(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    /// Build an unsigned token with the given exp claim
    fn token_with_exp(exp: i64) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"exp":{},"sub":"admin"}}"#, exp));
        format!("{}.{}.sig", header, payload)
    }

    #[test]
    fn test_expiry_roundtrip() {
        let exp = Utc::now().timestamp() + 600;
        let token = token_with_exp(exp);
        assert_eq!(expiry(&token).unwrap().timestamp(), exp);
    }

    #[test]
    fn test_future_token_not_expired() {
        let now = Utc::now();
        let token = token_with_exp((now + Duration::minutes(10)).timestamp());
        assert!(!is_expired(&token, now));
    }

    #[test]
    fn test_past_token_expired() {
        let now = Utc::now();
        let token = token_with_exp((now - Duration::minutes(10)).timestamp());
        assert!(is_expired(&token, now));
    }

    #[test]
    fn test_expiry_exactly_now_is_expired() {
        let now = Utc::now();
        let token = token_with_exp(now.timestamp());
        let now = Utc.timestamp_opt(now.timestamp(), 0).unwrap();
        assert!(is_expired(&token, now));
    }

    #[test]
    fn test_garbage_tokens_treated_as_expired() {
        let now = Utc::now();
        assert!(is_expired("", now));
        assert!(is_expired("not-a-jwt", now));
        assert!(is_expired("a.!!!not-base64!!!.c", now));

        // Valid base64 but no exp claim
        let payload = URL_SAFE_NO_PAD.encode(br#"{"sub":"admin"}"#);
        assert!(is_expired(&format!("h.{}.s", payload), now));
    }

    #[test]
    fn test_malformed_error_kinds() {
        assert!(matches!(expiry("nodots"), Err(TokenError::Malformed)));
        assert!(matches!(expiry("a.???.c"), Err(TokenError::Decode(_))));
    }
}
