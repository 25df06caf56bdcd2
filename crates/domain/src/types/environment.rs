//! Azure cloud environments
//!
//! Every credential is stamped with the short name of the cloud it was issued
//! for. Parsing is total: blank or unknown names map to the public cloud.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A named deployment of the Azure platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AzureEnvironment {
    /// Public Azure cloud
    #[default]
    Azure,
    /// Azure operated by 21Vianet
    AzureChina,
    /// Azure Germany (sovereign)
    AzureGermany,
    /// Azure US Government
    AzureUsGovernment,
}

impl AzureEnvironment {
    /// All known clouds, public cloud first.
    pub const ALL: [Self; 4] =
        [Self::Azure, Self::AzureChina, Self::AzureGermany, Self::AzureUsGovernment];

    /// Parse a short name or an Azure CLI environment name.
    ///
    /// Accepts `azure`, `azure_china`, `azure_germany`, `azure_us_government`
    /// and the CLI names `AzureCloud`, `AzureChinaCloud`, `AzureGermanCloud`,
    /// `AzureUSGovernment`, case-insensitively. Anything else is `Azure`.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "azure_china" | "azurechinacloud" | "azure-china" => Self::AzureChina,
            "azure_germany" | "azuregermancloud" | "azure-germany" => Self::AzureGermany,
            "azure_us_government" | "azureusgovernment" | "azure-us-government" => {
                Self::AzureUsGovernment
            }
            _ => Self::Azure,
        }
    }

    /// Short name persisted in the credential file.
    #[must_use]
    pub const fn short_name(self) -> &'static str {
        match self {
            Self::Azure => "azure",
            Self::AzureChina => "azure_china",
            Self::AzureGermany => "azure_germany",
            Self::AzureUsGovernment => "azure_us_government",
        }
    }

    /// Name used by the Azure CLI profile (`environmentName`).
    #[must_use]
    pub const fn cli_name(self) -> &'static str {
        match self {
            Self::Azure => "AzureCloud",
            Self::AzureChina => "AzureChinaCloud",
            Self::AzureGermany => "AzureGermanCloud",
            Self::AzureUsGovernment => "AzureUSGovernment",
        }
    }

    /// Azure Active Directory authority, with trailing slash.
    #[must_use]
    pub const fn active_directory_endpoint(self) -> &'static str {
        match self {
            Self::Azure => "https://login.microsoftonline.com/",
            Self::AzureChina => "https://login.chinacloudapi.cn/",
            Self::AzureGermany => "https://login.microsoftonline.de/",
            Self::AzureUsGovernment => "https://login.microsoftonline.us/",
        }
    }

    /// Classic management endpoint. This is the `resource` interactive logins
    /// request, so the resulting refresh token can be redeemed for ARM too.
    #[must_use]
    pub const fn management_endpoint(self) -> &'static str {
        match self {
            Self::Azure => "https://management.core.windows.net/",
            Self::AzureChina => "https://management.core.chinacloudapi.cn/",
            Self::AzureGermany => "https://management.core.cloudapi.de/",
            Self::AzureUsGovernment => "https://management.core.usgovcloudapi.net/",
        }
    }

    /// Azure Resource Manager endpoint.
    #[must_use]
    pub const fn resource_manager_endpoint(self) -> &'static str {
        match self {
            Self::Azure => "https://management.azure.com/",
            Self::AzureChina => "https://management.chinacloudapi.cn/",
            Self::AzureGermany => "https://management.microsoftazure.de/",
            Self::AzureUsGovernment => "https://management.usgovcloudapi.net/",
        }
    }
}

impl std::fmt::Display for AzureEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.short_name())
    }
}

/// Map any environment name to its short name.
///
/// Total over all inputs and idempotent: `short_name(short_name(x)) ==
/// short_name(x)`.
#[must_use]
pub fn short_name(full_name: &str) -> &'static str {
    AzureEnvironment::from_name(full_name).short_name()
}

impl Serialize for AzureEnvironment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.short_name())
    }
}

impl<'de> Deserialize<'de> for AzureEnvironment {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.map(|name| Self::from_name(&name)).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_cli_names_to_short_names() {
        assert_eq!(short_name("AzureCloud"), "azure");
        assert_eq!(short_name("AzureChinaCloud"), "azure_china");
        assert_eq!(short_name("AzureGermanCloud"), "azure_germany");
        assert_eq!(short_name("AzureUSGovernment"), "azure_us_government");
    }

    #[test]
    fn blank_and_unknown_default_to_public_cloud() {
        assert_eq!(short_name(""), "azure");
        assert_eq!(short_name("   "), "azure");
        assert_eq!(short_name("AzureMoonCloud"), "azure");
    }

    #[test]
    fn short_name_is_idempotent() {
        for name in ["AzureCloud", "azurechinacloud", "AZUREUSGOVERNMENT", "", "bogus"] {
            let once = short_name(name);
            assert_eq!(short_name(once), once);
        }
        for env in AzureEnvironment::ALL {
            assert_eq!(AzureEnvironment::from_name(env.short_name()), env);
            assert_eq!(AzureEnvironment::from_name(env.cli_name()), env);
        }
    }

    #[test]
    fn deserializes_unknown_and_null_as_azure() {
        let env: AzureEnvironment = serde_json::from_str("\"somewhere_else\"").unwrap();
        assert_eq!(env, AzureEnvironment::Azure);

        let env: AzureEnvironment = serde_json::from_str("null").unwrap();
        assert_eq!(env, AzureEnvironment::Azure);

        let env: AzureEnvironment = serde_json::from_str("\"azure_china\"").unwrap();
        assert_eq!(env, AzureEnvironment::AzureChina);
        assert_eq!(serde_json::to_string(&env).unwrap(), "\"azure_china\"");
    }

    #[test]
    fn endpoints_end_with_slash() {
        for env in AzureEnvironment::ALL {
            assert!(env.active_directory_endpoint().ends_with('/'));
            assert!(env.management_endpoint().ends_with('/'));
            assert!(env.resource_manager_endpoint().ends_with('/'));
        }
    }
}
