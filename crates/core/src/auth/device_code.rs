//! Device-code login
//!
//! The user signs in on another device while this process polls the token
//! endpoint at the provider-supplied interval.

use std::sync::Arc;
use std::time::Duration;

use azauth_domain::constants::DEFAULT_DEVICE_CODE_INTERVAL_SECS;
use azauth_domain::{AuthError, AzureEnvironment, Credential, DeviceCodeInfo, Result};
use tracing::{debug, info};

use super::ports::{IdentityProvider, LoginPrompt};

/// Interactive login for sessions without a usable browser
pub struct DeviceCodeFlow {
    provider: Arc<dyn IdentityProvider>,
    prompt: Arc<dyn LoginPrompt>,
}

impl DeviceCodeFlow {
    pub fn new(provider: Arc<dyn IdentityProvider>, prompt: Arc<dyn LoginPrompt>) -> Self {
        Self { provider, prompt }
    }

    /// Request a device code, show it to the user and poll until redeemed.
    ///
    /// # Errors
    /// - `AuthError::Timeout` when the code expires before the user signs in
    /// - `AuthError::LoginFailed` for any provider error other than
    ///   `authorization_pending`
    pub async fn run(&self, environment: AzureEnvironment) -> Result<Credential> {
        let info = self.provider.request_device_code(environment).await?;
        self.prompt.device_code(&info);
        self.poll(environment, &info).await
    }

    /// Poll the token endpoint for an already issued device code.
    ///
    /// Sleeps one interval before each attempt and makes at most
    /// `ceil(expires_in / interval)` attempts.
    pub async fn poll(&self, environment: AzureEnvironment, info: &DeviceCodeInfo) -> Result<Credential> {
        let interval = effective_interval(info.interval);
        let mut remaining = info.expires_in;
        let mut attempts = 0_u32;

        while remaining > 0 {
            tokio::time::sleep(Duration::from_secs(interval)).await;
            attempts += 1;

            match self.provider.redeem_device_code(environment, info).await {
                Ok(mut credential) => {
                    credential.environment = environment;
                    info!(environment = %environment, attempts, "device code login completed");
                    return Ok(credential);
                }
                Err(AuthError::Provider(err)) if err.is_authorization_pending() => {
                    debug!(attempts, "device code not yet approved");
                }
                Err(AuthError::Provider(err)) | Err(AuthError::LoginFailed(err)) => {
                    return Err(AuthError::LoginFailed(err));
                }
                Err(err) => return Err(err),
            }

            remaining = remaining.saturating_sub(interval);
        }

        Err(AuthError::Timeout(format!(
            "device code expired after {} minutes without sign-in",
            info.expires_in / 60
        )))
    }
}

/// Providers may send an interval of zero; poll at the default pace then.
const fn effective_interval(interval: u64) -> u64 {
    if interval == 0 {
        DEFAULT_DEVICE_CODE_INTERVAL_SECS
    } else {
        interval
    }
}
