//! Port interfaces for credential acquisition
//!
//! These traits define the boundaries between the login and refresh logic
//! and the infrastructure that talks to Azure AD, the browser, the local
//! loopback listener and the file system.

use std::time::Duration;

use async_trait::async_trait;
use azauth_domain::{
    AccessToken, AzureEnvironment, CallbackResult, CliProfile, CliTokenEntry,
    Credential, DeviceCodeInfo, Result, ServicePrincipal,
};

/// Token endpoint operations of the Azure AD identity provider
///
/// Provider-side OAuth errors are reported as `AuthError::Provider` carrying
/// the provider's `error`/`error_description`. Timeouts of the underlying
/// transport are reported as `AuthError::Timeout`.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Public client id used for user logins
    fn client_id(&self) -> &str;

    /// Authorization endpoint the browser is sent to
    fn authorization_endpoint(&self, environment: AzureEnvironment) -> String;

    /// Redeem an authorization code for a credential
    async fn exchange_authorization_code(
        &self,
        environment: AzureEnvironment,
        code: &str,
        redirect_uri: &str,
    ) -> Result<Credential>;

    /// Start a device-code login
    async fn request_device_code(&self, environment: AzureEnvironment) -> Result<DeviceCodeInfo>;

    /// Try once to redeem a device code
    ///
    /// Returns `AuthError::Provider` with `authorization_pending` while the
    /// user has not finished signing in.
    async fn redeem_device_code(
        &self,
        environment: AzureEnvironment,
        device_code: &DeviceCodeInfo,
    ) -> Result<Credential>;

    /// Redeem a refresh token. `resource` defaults to the management endpoint.
    async fn refresh_token(
        &self,
        environment: AzureEnvironment,
        refresh_token: &str,
        resource: Option<&str>,
    ) -> Result<Credential>;

    /// Client-credentials grant for a service principal
    async fn client_credentials(
        &self,
        principal: &ServicePrincipal,
        resource: &str,
    ) -> Result<AccessToken>;

    /// Token from the ambient managed identity endpoint
    async fn managed_identity_token(&self, resource: &str) -> Result<AccessToken>;
}

/// Durable storage for the single persisted credential
#[async_trait]
pub trait CredentialRepository: Send + Sync {
    /// Load the credential; `AuthError::Storage` when absent or unreadable
    async fn load(&self) -> Result<Credential>;

    /// Replace the stored credential
    async fn save(&self, credential: &Credential) -> Result<()>;

    /// Remove the stored credential; succeeds when nothing is stored
    async fn delete(&self) -> Result<()>;

    /// Whether a credential is currently stored
    async fn exists(&self) -> bool;
}

/// Opens URLs in the user's browser
pub trait BrowserLauncher: Send + Sync {
    /// Whether a browser can be launched in this session
    fn is_supported(&self) -> bool;

    fn open(&self, url: &str) -> Result<()>;
}

/// Starts one-shot loopback listeners for the authorization-code redirect
#[async_trait]
pub trait CallbackListenerFactory: Send + Sync {
    /// Bind a fresh listener on an ephemeral local port
    async fn start(&self) -> Result<Box<dyn CallbackListener>>;
}

/// A running loopback listener
#[async_trait]
pub trait CallbackListener: Send + Sync {
    /// Redirect URI to register in the authorization request
    fn redirect_uri(&self) -> String;

    /// Wait for the first request carrying a code or an error
    ///
    /// Fails with `AuthError::Timeout` when nothing arrives within `timeout`.
    async fn wait(&self, timeout: Duration) -> Result<CallbackResult>;

    /// Stop listening. Safe to call more than once.
    async fn stop(&self);
}

/// User-facing guidance during interactive logins
pub trait LoginPrompt: Send + Sync {
    /// The browser was sent to `url`
    fn browser_opened(&self, url: &str);

    /// The user must complete a device-code login
    fn device_code(&self, info: &DeviceCodeInfo);
}

/// Reveals protected configuration values
pub trait SecretDecryptor: Send + Sync {
    fn decrypt(&self, value: &str) -> Result<String>;
}

/// Decryptor for configurations that carry secrets in clear text
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaintextSecrets;

impl SecretDecryptor for PlaintextSecrets {
    fn decrypt(&self, value: &str) -> Result<String> {
        Ok(value.to_string())
    }
}

/// Read access to process environment variables
pub trait AmbientEnvironment: Send + Sync {
    fn var(&self, name: &str) -> Option<String>;

    fn is_set(&self, name: &str) -> bool {
        self.var(name).is_some_and(|value| !value.is_empty())
    }
}

/// Read-only view of the Azure CLI's profile and token cache
#[async_trait]
pub trait CliCacheSource: Send + Sync {
    async fn load_profile(&self) -> Result<CliProfile>;

    async fn load_token_cache(&self) -> Result<Vec<CliTokenEntry>>;
}

/// Anything that can produce a bearer token for a resource
#[async_trait]
pub trait TokenCredential: Send + Sync {
    async fn get_token(&self, resource: &str) -> Result<String>;
}
