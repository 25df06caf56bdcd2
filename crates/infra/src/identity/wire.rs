//! Azure AD v1 response bodies
//!
//! The v1 endpoints send numeric fields such as `expires_in` as JSON strings,
//! so those fields accept either form.

use azauth_core::TokenExpiryChecker;
use azauth_domain::{
    AccessToken, AuthError, AzureEnvironment, Credential, DeviceCodeInfo, ProviderError, Result,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(i64),
    String(String),
}

fn number_or_string<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<NumberOrString>::deserialize(deserializer)?;
    Ok(match value {
        Some(NumberOrString::Number(n)) => Some(n),
        Some(NumberOrString::String(s)) => s.trim().parse().ok(),
        None => None,
    })
}

/// Successful token endpoint response
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub id_token: Option<String>,
    #[serde(default)]
    pub resource: Option<String>,
    #[serde(default, deserialize_with = "number_or_string")]
    pub expires_in: Option<i64>,
    #[serde(default, deserialize_with = "number_or_string")]
    pub expires_on: Option<i64>,
}

impl TokenResponse {
    /// Absolute expiry, preferring `expires_on` over `expires_in`.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_on
            .and_then(|ts| DateTime::from_timestamp(ts, 0))
            .or_else(|| self.expires_in.map(|secs| Utc::now() + chrono::Duration::seconds(secs)))
    }

    /// Convert into a credential for `environment`.
    ///
    /// User claims come from the unsigned ID token when one was issued.
    pub fn into_credential(self, environment: AzureEnvironment) -> Result<Credential> {
        if self.access_token.trim().is_empty() {
            return Err(AuthError::Internal("token response has an empty access_token".into()));
        }

        let user_info = self
            .id_token
            .as_deref()
            .and_then(|token| TokenExpiryChecker::decode_claims(token).ok())
            .map(serde_json::Value::Object);
        let refresh_token = self.refresh_token.filter(|t| !t.trim().is_empty());

        let mut credential = Credential::new(self.access_token, refresh_token, environment);
        if let Some(token_type) = self.token_type.filter(|t| !t.is_empty()) {
            credential.access_token_type = token_type;
        }
        credential.is_multiple_resource_refresh_token =
            credential.refresh_token.is_some() && self.resource.is_some();
        credential.id_token = self.id_token;
        credential.user_info = user_info;
        Ok(credential)
    }

    pub fn into_access_token(self) -> Result<AccessToken> {
        if self.access_token.trim().is_empty() {
            return Err(AuthError::Internal("token response has an empty access_token".into()));
        }
        let expires_on = self.expires_at();
        Ok(AccessToken::new(self.access_token, expires_on))
    }
}

/// Device code endpoint response
#[derive(Debug, Deserialize)]
pub struct DeviceCodeResponse {
    pub user_code: String,
    pub device_code: String,
    #[serde(alias = "verification_uri")]
    pub verification_url: String,
    #[serde(default, deserialize_with = "number_or_string")]
    pub expires_in: Option<i64>,
    #[serde(default, deserialize_with = "number_or_string")]
    pub interval: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
}

impl From<DeviceCodeResponse> for DeviceCodeInfo {
    fn from(value: DeviceCodeResponse) -> Self {
        let non_negative = |v: Option<i64>| v.map_or(0, |n| u64::try_from(n).unwrap_or(0));
        Self {
            user_code: value.user_code,
            device_code: value.device_code,
            verification_url: value.verification_url,
            expires_in: non_negative(value.expires_in),
            interval: non_negative(value.interval),
            message: value.message,
        }
    }
}

/// Parse an OAuth error body; `None` when the body is not one.
pub fn provider_error(body: &str) -> Option<ProviderError> {
    serde_json::from_str::<ProviderError>(body).ok().filter(|e| !e.error.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_fields_accept_strings() {
        let response: TokenResponse = serde_json::from_str(
            r#"{ "access_token": "a", "expires_in": "3599", "expires_on": 1700000000 }"#,
        )
        .unwrap();
        assert_eq!(response.expires_in, Some(3599));
        assert_eq!(response.expires_at().unwrap().timestamp(), 1_700_000_000);
    }

    #[test]
    fn device_code_response_maps_to_info() {
        let response: DeviceCodeResponse = serde_json::from_str(
            r#"{ "user_code": "ABC", "device_code": "dc", "verification_url": "https://microsoft.com/devicelogin",
                 "expires_in": "900", "interval": "5", "message": "go sign in" }"#,
        )
        .unwrap();
        let info = DeviceCodeInfo::from(response);
        assert_eq!(info.expires_in, 900);
        assert_eq!(info.interval, 5);
        assert_eq!(info.message.as_deref(), Some("go sign in"));
    }

    #[test]
    fn credential_carries_id_token_claims() {
        let id_token = azauth_core::testing::mocks::jwt_with_claims(
            &serde_json::json!({ "upn": "dev@contoso.com" }),
        );
        let response = TokenResponse {
            access_token: "a".into(),
            token_type: Some("Bearer".into()),
            refresh_token: Some("r".into()),
            id_token: Some(id_token),
            resource: Some("https://management.core.windows.net/".into()),
            expires_in: None,
            expires_on: None,
        };

        let credential = response.into_credential(AzureEnvironment::AzureChina).unwrap();

        assert_eq!(credential.user_info.unwrap()["upn"], "dev@contoso.com");
        assert!(credential.is_multiple_resource_refresh_token);
        assert_eq!(credential.environment, AzureEnvironment::AzureChina);
    }

    #[test]
    fn error_bodies_are_recognised() {
        let err = provider_error(r#"{ "error": "invalid_grant", "error_description": "AADSTS70008" }"#)
            .unwrap();
        assert_eq!(err.to_string(), "invalid_grant: AADSTS70008");
        assert!(provider_error("<html>bad gateway</html>").is_none());
    }
}
