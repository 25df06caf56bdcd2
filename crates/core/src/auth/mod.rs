//! Credential acquisition and token lifecycle

pub mod acquirer;
pub mod authorization_code;
pub mod credentials;
pub mod device_code;
pub mod expiry;
pub mod lazy;
pub mod ports;
pub mod refresher;
pub mod resolver;

pub use acquirer::{LoginExecutor, TokenAcquirer};
pub use authorization_code::{build_authorization_url, AuthorizationCodeFlow};
pub use credentials::{CliAccountCredential, ManagedIdentityCredential, ServicePrincipalCredential};
pub use device_code::DeviceCodeFlow;
pub use expiry::TokenExpiryChecker;
pub use lazy::LazyTokenCredential;
pub use refresher::TokenRefresher;
pub use resolver::{CredentialResolver, ResolvedCredential};

use azauth_domain::{AuthError, Result};

fn require_non_empty(value: &str, what: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AuthError::Config(format!("{what} is required")));
    }
    Ok(())
}
