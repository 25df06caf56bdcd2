//! Token acquisition strategies
//!
//! A `TokenAcquirer` names how a credential is obtained; the
//! `LoginExecutor` runs it against the configured flows.

use std::sync::Arc;
use std::time::Duration;

use azauth_domain::{AuthError, AzureEnvironment, Credential, Result};
use tracing::info;

use super::authorization_code::AuthorizationCodeFlow;
use super::device_code::DeviceCodeFlow;
use super::ports::{BrowserLauncher, CallbackListenerFactory, IdentityProvider, LoginPrompt};
use super::refresher::TokenRefresher;

/// How to obtain a credential
#[derive(Clone, PartialEq, Eq)]
pub enum TokenAcquirer {
    /// Browser sign-in with a loopback redirect
    AuthorizationCode,
    /// Sign-in on another device
    DeviceCode,
    /// Redeem an existing refresh token
    Refresh { refresh_token: String },
}

impl TokenAcquirer {
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::AuthorizationCode => "authorization_code",
            Self::DeviceCode => "device_code",
            Self::Refresh { .. } => "refresh_token",
        }
    }
}

impl std::fmt::Debug for TokenAcquirer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Runs a `TokenAcquirer` for an environment
pub struct LoginExecutor {
    authorization_code: AuthorizationCodeFlow,
    device_code: DeviceCodeFlow,
    refresher: TokenRefresher,
}

impl LoginExecutor {
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        browser: Arc<dyn BrowserLauncher>,
        listeners: Arc<dyn CallbackListenerFactory>,
        prompt: Arc<dyn LoginPrompt>,
        callback_timeout: Duration,
    ) -> Self {
        Self {
            authorization_code: AuthorizationCodeFlow::new(
                provider.clone(),
                browser,
                listeners,
                prompt.clone(),
                callback_timeout,
            ),
            device_code: DeviceCodeFlow::new(provider.clone(), prompt),
            refresher: TokenRefresher::new(provider),
        }
    }

    /// Obtain a credential for `environment`.
    ///
    /// # Errors
    /// Whatever the selected flow reports. A timed-out refresh becomes
    /// `AuthError::Refresh`, and a credential without an access token is
    /// rejected as `AuthError::Internal`.
    pub async fn acquire(
        &self,
        acquirer: &TokenAcquirer,
        environment: AzureEnvironment,
    ) -> Result<Credential> {
        let credential = match acquirer {
            TokenAcquirer::AuthorizationCode => self.authorization_code.run(environment).await?,
            TokenAcquirer::DeviceCode => self.device_code.run(environment).await?,
            TokenAcquirer::Refresh { refresh_token } => self
                .refresher
                .refresh(environment, refresh_token)
                .await?
                .ok_or_else(|| AuthError::Refresh("refresh request timed out".into()))?,
        };

        if credential.access_token.is_empty() {
            return Err(AuthError::Internal(format!(
                "{} login returned no access token",
                acquirer.label()
            )));
        }

        info!(grant = acquirer.label(), environment = %environment, "credential acquired");
        Ok(credential)
    }
}
