//! Where a resolved credential came from

use serde::{Deserialize, Serialize};

use crate::impl_label_conversions;

/// Credential source selected by the resolver chain, in precedence order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialSource {
    /// Explicit service principal configuration
    ExplicitConfig,
    /// Persisted `azure-secret.json`
    PersistedFile,
    /// Ambient managed identity (Cloud Shell)
    ManagedIdentity,
    /// Service principal found in the Azure CLI cache
    CliServicePrincipal,
    /// User account found in the Azure CLI cache
    CliAccount,
}

impl_label_conversions!(CredentialSource {
    ExplicitConfig => "explicit_config",
    PersistedFile => "persisted_file",
    ManagedIdentity => "managed_identity",
    CliServicePrincipal => "cli_service_principal",
    CliAccount => "cli_account",
});

impl CredentialSource {
    /// Whether the credential came from the Azure CLI cache.
    #[must_use]
    pub const fn is_cli(self) -> bool {
        matches!(self, Self::CliServicePrincipal | Self::CliAccount)
    }
}
