//! Request-scoped values produced during interactive logins
//!
//! None of these are persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::ProviderError;

/// Device code issued by the identity provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceCodeInfo {
    /// Code the user types on the verification page
    pub user_code: String,
    /// Opaque code the client redeems
    pub device_code: String,
    /// Page where the user enters `user_code`
    pub verification_url: String,
    /// Seconds until the device code expires
    pub expires_in: u64,
    /// Seconds to wait between redemption attempts
    pub interval: u64,
    /// Human readable instructions from the provider, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl DeviceCodeInfo {
    /// Instructions shown to the user, preferring the provider's own text.
    #[must_use]
    pub fn instructions(&self) -> String {
        match self.message.as_deref().filter(|m| !m.trim().is_empty()) {
            Some(message) => message.to_string(),
            None => format!(
                "To sign in, use a web browser to open the page {} and enter the code {} to authenticate.",
                self.verification_url, self.user_code
            ),
        }
    }
}

/// Query parameters captured by the login callback listener
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackResult {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
}

/// What a callback means for the login
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// Authorization code to exchange
    Code(String),
    /// Provider reported a failure
    Error(ProviderError),
    /// Neither code nor error
    Empty,
}

impl CallbackResult {
    /// Whether this request carries anything the login waits for.
    #[must_use]
    pub fn is_qualifying(&self) -> bool {
        !matches!(self.outcome(), CallbackOutcome::Empty)
    }

    /// Classify the callback. An `error` wins over a `code`.
    #[must_use]
    pub fn outcome(&self) -> CallbackOutcome {
        let present = |v: &Option<String>| v.as_deref().filter(|s| !s.is_empty()).map(str::to_owned);

        if let Some(error) = present(&self.error) {
            return CallbackOutcome::Error(ProviderError::new(
                error,
                present(&self.error_description),
            ));
        }
        match present(&self.code) {
            Some(code) => CallbackOutcome::Code(code),
            None => CallbackOutcome::Empty,
        }
    }
}

/// Bare access token returned by credentials that are not persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub token: String,
    pub expires_on: Option<DateTime<Utc>>,
}

impl AccessToken {
    #[must_use]
    pub fn new(token: impl Into<String>, expires_on: Option<DateTime<Utc>>) -> Self {
        Self { token: token.into(), expires_on }
    }

    /// Whether the token is still valid `skew_seconds` from now. Tokens
    /// without a known expiry are never considered fresh.
    #[must_use]
    pub fn is_fresh(&self, skew_seconds: i64) -> bool {
        self.expires_on
            .is_some_and(|exp| exp > Utc::now() + chrono::Duration::seconds(skew_seconds))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_only_callback_yields_code() {
        let result = CallbackResult { code: Some("abc".into()), ..Default::default() };
        assert_eq!(result.outcome(), CallbackOutcome::Code("abc".into()));
        assert!(result.is_qualifying());
    }

    #[test]
    fn error_callback_carries_description() {
        let result = CallbackResult {
            code: None,
            error: Some("access_denied".into()),
            error_description: Some("user cancelled".into()),
        };
        match result.outcome() {
            CallbackOutcome::Error(err) => {
                assert_eq!(err.error, "access_denied");
                assert_eq!(err.error_description.as_deref(), Some("user cancelled"));
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn empty_values_do_not_qualify() {
        let result = CallbackResult { code: Some(String::new()), ..Default::default() };
        assert_eq!(result.outcome(), CallbackOutcome::Empty);
        assert!(!CallbackResult::default().is_qualifying());
    }

    #[test]
    fn instructions_fall_back_to_generated_text() {
        let info = DeviceCodeInfo {
            user_code: "ABCD-EFGH".into(),
            device_code: "dc".into(),
            verification_url: "https://microsoft.com/devicelogin".into(),
            expires_in: 900,
            interval: 5,
            message: None,
        };
        let text = info.instructions();
        assert!(text.contains("ABCD-EFGH"));
        assert!(text.contains("https://microsoft.com/devicelogin"));
    }

    #[test]
    fn access_token_freshness() {
        let fresh = AccessToken::new("t", Some(Utc::now() + chrono::Duration::seconds(600)));
        assert!(fresh.is_fresh(60));
        let stale = AccessToken::new("t", Some(Utc::now() + chrono::Duration::seconds(30)));
        assert!(!stale.is_fresh(60));
        assert!(!AccessToken::new("t", None).is_fresh(0));
    }
}
