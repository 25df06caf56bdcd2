//! Azure CLI profile and token cache formats
//!
//! Read-only views of `azureProfile.json` and `accessTokens.json`. Unknown
//! fields are ignored.

use serde::{Deserialize, Serialize};

/// Contents of `azureProfile.json`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CliProfile {
    #[serde(default)]
    pub subscriptions: Vec<CliSubscription>,
}

impl CliProfile {
    /// The subscription marked `isDefault`.
    #[must_use]
    pub fn default_subscription(&self) -> Option<&CliSubscription> {
        self.subscriptions.iter().find(|s| s.is_default)
    }
}

/// One subscription entry of the CLI profile
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CliSubscription {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub environment_name: String,
    #[serde(default)]
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub user: Option<CliUser>,
}

impl CliSubscription {
    /// Account the subscription was logged in with (UPN or client id).
    #[must_use]
    pub fn account_name(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.name.as_str()).filter(|n| !n.is_empty())
    }
}

/// Account that owns a subscription entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CliUser {
    pub name: String,
    /// `user` or `servicePrincipal`
    #[serde(rename = "type", default)]
    pub kind: String,
}

/// One entry of `accessTokens.json`
///
/// Service principal entries carry `servicePrincipalId` and keep the client
/// secret in `accessToken`. User entries carry `userId` and a refresh token.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CliTokenEntry {
    #[serde(default)]
    pub service_principal_id: Option<String>,
    #[serde(default)]
    pub service_principal_tenant: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub certificate_file: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub resource: Option<String>,
    #[serde(default)]
    pub expires_on: Option<String>,
    #[serde(default, rename = "isMRRT")]
    pub is_mrrt: bool,
    #[serde(default, rename = "_authority")]
    pub authority: Option<String>,
    #[serde(default, rename = "_clientId")]
    pub client_id: Option<String>,
}

impl CliTokenEntry {
    /// Non-empty service principal id, if this is a service principal entry.
    #[must_use]
    pub fn service_principal(&self) -> Option<&str> {
        self.service_principal_id.as_deref().filter(|id| !id.trim().is_empty())
    }

    /// Whether this entry belongs to `account` (case-insensitive).
    #[must_use]
    pub fn matches_account(&self, account: &str) -> bool {
        let owner = self.service_principal().or(self.user_id.as_deref());
        owner.is_some_and(|owner| owner.eq_ignore_ascii_case(account))
    }
}
