//! Service principal configuration and secrets

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::environment::AzureEnvironment;
use crate::errors::{AuthError, Result};

/// Explicit service principal configuration supplied by the caller
///
/// `key` and `certificate_password` may be protected values; they are passed
/// through the secret decryptor before use.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ServicePrincipalConfig {
    pub client: String,
    pub tenant: String,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub certificate: Option<PathBuf>,
    #[serde(default)]
    pub certificate_password: Option<String>,
    #[serde(default)]
    pub environment: AzureEnvironment,
}

impl std::fmt::Debug for ServicePrincipalConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServicePrincipalConfig")
            .field("client", &self.client)
            .field("tenant", &self.tenant)
            .field("key", &self.key.as_ref().map(|_| "[redacted]"))
            .field("certificate", &self.certificate)
            .field("certificate_password", &self.certificate_password.as_ref().map(|_| "[redacted]"))
            .field("environment", &self.environment)
            .finish()
    }
}

fn blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}

impl ServicePrincipalConfig {
    /// Check required fields before any I/O.
    ///
    /// # Errors
    /// Returns `AuthError::Config` naming the first missing field.
    pub fn validate(&self) -> Result<()> {
        if self.client.trim().is_empty() {
            return Err(AuthError::Config("service principal 'client' is required".into()));
        }
        if self.tenant.trim().is_empty() {
            return Err(AuthError::Config("service principal 'tenant' is required".into()));
        }
        match (&self.certificate, blank(self.key.as_deref())) {
            (Some(path), _) => {
                if path.as_os_str().is_empty() {
                    return Err(AuthError::Config(
                        "service principal 'certificate' path is empty".into(),
                    ));
                }
                if blank(self.certificate_password.as_deref()) {
                    return Err(AuthError::Config(
                        "service principal 'certificate_password' is required with a certificate"
                            .into(),
                    ));
                }
                Ok(())
            }
            (None, false) => Ok(()),
            (None, true) => Err(AuthError::Config(
                "service principal requires either 'key' or 'certificate'".into(),
            )),
        }
    }
}

/// How a service principal proves its identity
#[derive(Clone, PartialEq, Eq)]
pub enum ClientSecret {
    /// Shared key
    Key(String),
    /// PEM bundle holding the certificate and its RSA private key
    Certificate { path: PathBuf, password: Option<String> },
}

impl std::fmt::Debug for ClientSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Key(_) => f.write_str("Key([redacted])"),
            Self::Certificate { path, .. } => {
                f.debug_struct("Certificate").field("path", path).finish_non_exhaustive()
            }
        }
    }
}

/// Resolved service principal identity ready for the client-credentials grant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServicePrincipal {
    pub client_id: String,
    pub tenant_id: String,
    pub secret: ClientSecret,
    pub environment: AzureEnvironment,
}
