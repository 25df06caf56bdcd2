//! Access token expiry checks
//!
//! Reads the `exp` claim from the token's payload segment. Signatures are
//! not verified; the token is only inspected to decide whether to refresh.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use serde_json::{Map, Value};

use azauth_domain::constants::{DEFAULT_REFRESH_SKEW_SECS, MAX_REFRESH_SKEW_SECS};
use azauth_domain::{AuthError, Result};

/// Decides whether an access token is still usable
#[derive(Debug, Clone, Copy)]
pub struct TokenExpiryChecker {
    skew: Duration,
}

impl Default for TokenExpiryChecker {
    fn default() -> Self {
        Self::new(DEFAULT_REFRESH_SKEW_SECS)
    }
}

impl TokenExpiryChecker {
    /// Treat tokens expiring within `skew_seconds` as already expired.
    ///
    /// The skew is clamped to `0..=MAX_REFRESH_SKEW_SECS`.
    #[must_use]
    pub fn new(skew_seconds: i64) -> Self {
        let seconds = skew_seconds.clamp(0, MAX_REFRESH_SKEW_SECS);
        Self { skew: Duration::try_seconds(seconds).unwrap_or_else(Duration::zero) }
    }

    #[must_use]
    pub const fn skew(&self) -> Duration {
        self.skew
    }

    /// Decode the claims object of a JWT without verifying it.
    ///
    /// # Errors
    /// `AuthError::InvalidToken` when the token has no payload segment or the
    /// payload is not a base64url JSON object.
    pub fn decode_claims(token: &str) -> Result<Map<String, Value>> {
        let payload = token
            .split('.')
            .nth(1)
            .filter(|segment| !segment.is_empty())
            .ok_or_else(|| AuthError::InvalidToken("token has no claims segment".into()))?;

        let bytes = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .map_err(|e| AuthError::InvalidToken(format!("claims are not base64url: {e}")))?;

        match serde_json::from_slice::<Value>(&bytes) {
            Ok(Value::Object(claims)) => Ok(claims),
            Ok(_) => Err(AuthError::InvalidToken("claims are not a JSON object".into())),
            Err(e) => Err(AuthError::InvalidToken(format!("claims are not JSON: {e}"))),
        }
    }

    /// Expiry instant from the `exp` claim (seconds since the epoch).
    ///
    /// # Errors
    /// `AuthError::InvalidToken` when the claims cannot be decoded or `exp`
    /// is missing.
    pub fn expires_at(token: &str) -> Result<DateTime<Utc>> {
        let claims = Self::decode_claims(token)?;
        let exp = match claims.get("exp") {
            Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
            _ => None,
        }
        .ok_or_else(|| AuthError::InvalidToken("token has no numeric 'exp' claim".into()))?;

        DateTime::from_timestamp(exp, 0)
            .ok_or_else(|| AuthError::InvalidToken(format!("'exp' out of range: {exp}")))
    }

    /// Whether the token is valid for at least the skew window.
    ///
    /// Tokens that cannot be decoded are reported as not fresh so callers
    /// fall back to refreshing them.
    #[must_use]
    pub fn is_fresh(&self, token: &str) -> bool {
        self.is_fresh_at(token, Utc::now())
    }

    #[must_use]
    pub fn is_fresh_at(&self, token: &str, now: DateTime<Utc>) -> bool {
        match Self::expires_at(token) {
            Ok(expires_at) => now
                .checked_add_signed(self.skew)
                .is_some_and(|deadline| expires_at > deadline),
            Err(err) => {
                tracing::debug!(error = %err, "treating undecodable access token as expired");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::mocks::jwt_with_claims;

    fn token_expiring_in(seconds: i64) -> String {
        jwt_with_claims(&serde_json::json!({ "exp": Utc::now().timestamp() + seconds }))
    }

    #[test]
    fn token_beyond_skew_is_fresh() {
        let checker = TokenExpiryChecker::new(60);
        assert!(checker.is_fresh(&token_expiring_in(3600)));
    }

    #[test]
    fn token_inside_skew_is_stale() {
        let checker = TokenExpiryChecker::new(60);
        assert!(!checker.is_fresh(&token_expiring_in(30)));
        assert!(!checker.is_fresh(&token_expiring_in(-10)));
    }

    #[test]
    fn zero_skew_only_rejects_expired_tokens() {
        let checker = TokenExpiryChecker::new(0);
        assert!(checker.is_fresh(&token_expiring_in(30)));
    }

    #[test]
    fn extreme_skew_is_clamped() {
        let checker = TokenExpiryChecker::new(i64::MAX);
        assert_eq!(checker.skew(), Duration::seconds(MAX_REFRESH_SKEW_SECS));
        assert!(!checker.is_fresh(&token_expiring_in(3600)));
        assert!(checker.is_fresh(&token_expiring_in(MAX_REFRESH_SKEW_SECS + 3600)));

        assert_eq!(TokenExpiryChecker::new(i64::MIN).skew(), Duration::zero());
    }

    #[test]
    fn skew_past_the_end_of_time_is_not_fresh() {
        let checker = TokenExpiryChecker::new(60);
        let token = jwt_with_claims(&serde_json::json!({ "exp": 4_102_444_800_i64 }));
        assert!(!checker.is_fresh_at(&token, DateTime::<Utc>::MAX_UTC));
    }

    #[test]
    fn undecodable_tokens_are_stale() {
        let checker = TokenExpiryChecker::default();
        assert!(!checker.is_fresh("not-a-jwt"));
        assert!(!checker.is_fresh("a.!!!.c"));
        assert!(!checker.is_fresh(&jwt_with_claims(&serde_json::json!({ "sub": "x" }))));
    }

    #[test]
    fn exp_may_be_a_string() {
        let token = jwt_with_claims(&serde_json::json!({ "exp": "1700000000" }));
        let expires = TokenExpiryChecker::expires_at(&token).unwrap();
        assert_eq!(expires.timestamp(), 1_700_000_000);
    }

    #[test]
    fn decode_claims_reports_invalid_token() {
        let err = TokenExpiryChecker::decode_claims("header-only").unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken(_)));
    }
}
