//! Persisted Azure credential
//!
//! The unit of state of the whole subsystem. Created by a login, refresh or
//! CLI translation; mutated in place only by refresh; persisted as a single
//! JSON document.

use serde::{Deserialize, Deserializer, Serialize};

use super::environment::AzureEnvironment;

fn default_token_type() -> String {
    "Bearer".to_string()
}

/// A present `userInfo` key stays `Some`, even when its value is `null`.
fn present_value<'de, D>(deserializer: D) -> Result<Option<serde_json::Value>, D::Error>
where
    D: Deserializer<'de>,
{
    serde_json::Value::deserialize(deserializer).map(Some)
}

/// Access/refresh token pair with identity metadata
///
/// Field names follow the on-disk `azure-secret.json` format (camelCase).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    /// Token type reported by the identity provider (normally "Bearer")
    #[serde(default = "default_token_type")]
    pub access_token_type: String,

    /// OpenID Connect ID token, when the provider issued one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,

    /// Opaque identity claims (decoded from the ID token)
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "present_value")]
    pub user_info: Option<serde_json::Value>,

    /// Short-lived bearer token
    pub access_token: String,

    /// Long-lived token used to mint new access tokens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// Whether the refresh token can be redeemed for any resource
    #[serde(default)]
    pub is_multiple_resource_refresh_token: bool,

    /// Subscription selected by the user, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_subscription: Option<String>,

    /// Cloud the tokens were issued for
    #[serde(default)]
    pub environment: AzureEnvironment,
}

impl Credential {
    /// Create a bearer credential for the given cloud.
    #[must_use]
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: Option<String>,
        environment: AzureEnvironment,
    ) -> Self {
        Self {
            access_token_type: default_token_type(),
            id_token: None,
            user_info: None,
            access_token: access_token.into(),
            refresh_token,
            is_multiple_resource_refresh_token: false,
            default_subscription: None,
            environment,
        }
    }

    /// Refresh token if present and non-blank.
    #[must_use]
    pub fn usable_refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref().filter(|token| !token.trim().is_empty())
    }

    /// Whether this credential can be refreshed without user interaction.
    #[must_use]
    pub fn is_refreshable(&self) -> bool {
        self.usable_refresh_token().is_some()
    }

    /// Apply a refresh result.
    ///
    /// The access token is always replaced. The refresh token rotates only
    /// when the provider issued a new one. Subscription and environment are
    /// properties of the session, not of the token, and are kept.
    pub fn apply_refresh(&mut self, refreshed: Self) {
        self.access_token = refreshed.access_token;
        self.access_token_type = refreshed.access_token_type;
        if let Some(token) = refreshed.refresh_token.filter(|t| !t.trim().is_empty()) {
            self.refresh_token = Some(token);
        }
        if refreshed.id_token.is_some() {
            self.id_token = refreshed.id_token;
        }
        if refreshed.user_info.is_some() {
            self.user_info = refreshed.user_info;
        }
        self.is_multiple_resource_refresh_token |= refreshed.is_multiple_resource_refresh_token;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Credential {
        Credential {
            access_token_type: "Bearer".to_string(),
            id_token: Some("id.token.sig".to_string()),
            user_info: Some(serde_json::json!({ "upn": "dev@contoso.com" })),
            access_token: "access".to_string(),
            refresh_token: Some("refresh".to_string()),
            is_multiple_resource_refresh_token: true,
            default_subscription: Some("00000000-0000-0000-0000-000000000001".to_string()),
            environment: AzureEnvironment::AzureChina,
        }
    }

    #[test]
    fn serializes_with_file_field_names() {
        let json = serde_json::to_value(sample()).unwrap();
        for key in [
            "accessTokenType",
            "idToken",
            "userInfo",
            "accessToken",
            "refreshToken",
            "isMultipleResourceRefreshToken",
            "defaultSubscription",
            "environment",
        ] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
        assert_eq!(json["environment"], "azure_china");
    }

    #[test]
    fn json_round_trip_is_lossless() {
        let original = sample();
        let text = serde_json::to_string(&original).unwrap();
        let parsed: Credential = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn null_user_info_survives_round_trip() {
        let original = Credential { user_info: Some(serde_json::Value::Null), ..sample() };
        let text = serde_json::to_string(&original).unwrap();
        assert!(text.contains(r#""userInfo":null"#));

        let parsed: Credential = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn minimal_document_fills_defaults() {
        let parsed: Credential =
            serde_json::from_str(r#"{ "accessToken": "a", "environment": "" }"#).unwrap();
        assert_eq!(parsed.access_token_type, "Bearer");
        assert_eq!(parsed.environment, AzureEnvironment::Azure);
        assert_eq!(parsed.user_info, None);
        assert!(!parsed.is_refreshable());
    }

    #[test]
    fn apply_refresh_keeps_refresh_token_when_not_rotated() {
        let mut credential = sample();
        credential.apply_refresh(Credential::new("new-access", None, AzureEnvironment::Azure));

        assert_eq!(credential.access_token, "new-access");
        assert_eq!(credential.refresh_token.as_deref(), Some("refresh"));
        assert_eq!(credential.environment, AzureEnvironment::AzureChina);
        assert!(credential.default_subscription.is_some());
    }

    #[test]
    fn apply_refresh_rotates_refresh_token() {
        let mut credential = sample();
        credential.apply_refresh(Credential::new(
            "new-access",
            Some("new-refresh".to_string()),
            AzureEnvironment::Azure,
        ));
        assert_eq!(credential.usable_refresh_token(), Some("new-refresh"));
    }
}
