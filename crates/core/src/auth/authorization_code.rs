//! Browser-based authorization-code login
//!
//! Opens the Azure AD sign-in page, waits on a loopback listener for the
//! redirect and exchanges the returned code for a credential.

use std::sync::Arc;
use std::time::Duration;

use azauth_domain::{AuthError, AzureEnvironment, CallbackOutcome, Credential, Result};
use tracing::{debug, info, warn};

use super::ports::{
    BrowserLauncher, CallbackListener, CallbackListenerFactory, IdentityProvider, LoginPrompt,
};

/// Build the authorization request URL sent to the browser.
#[must_use]
pub fn build_authorization_url(
    endpoint: &str,
    client_id: &str,
    redirect_uri: &str,
    resource: &str,
) -> String {
    format!(
        "{}?response_type=code&client_id={}&redirect_uri={}&resource={}&prompt=select_account",
        endpoint,
        urlencoding::encode(client_id),
        urlencoding::encode(redirect_uri),
        urlencoding::encode(resource),
    )
}

/// Interactive login through the system browser
pub struct AuthorizationCodeFlow {
    provider: Arc<dyn IdentityProvider>,
    browser: Arc<dyn BrowserLauncher>,
    listeners: Arc<dyn CallbackListenerFactory>,
    prompt: Arc<dyn LoginPrompt>,
    timeout: Duration,
}

impl AuthorizationCodeFlow {
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        browser: Arc<dyn BrowserLauncher>,
        listeners: Arc<dyn CallbackListenerFactory>,
        prompt: Arc<dyn LoginPrompt>,
        timeout: Duration,
    ) -> Self {
        Self { provider, browser, listeners, prompt, timeout }
    }

    /// Run the login for `environment`.
    ///
    /// The listener is stopped exactly once on every path after it started.
    ///
    /// # Errors
    /// - `AuthError::Interactive` when no browser can be launched
    /// - `AuthError::Timeout` when the redirect does not arrive in time
    /// - `AuthError::LoginFailed` when the redirect carries a provider error
    pub async fn run(&self, environment: AzureEnvironment) -> Result<Credential> {
        if !self.browser.is_supported() {
            return Err(AuthError::Interactive(
                "no browser is available; use the device code login instead".into(),
            ));
        }

        let listener = self.listeners.start().await?;
        let redirect_uri = listener.redirect_uri();
        let outcome = self.await_redirect(listener.as_ref(), environment, &redirect_uri).await;
        listener.stop().await;

        let code = match outcome? {
            CallbackOutcome::Code(code) => code,
            CallbackOutcome::Error(err) => {
                warn!(error = %err, "sign-in page reported an error");
                return Err(AuthError::LoginFailed(err));
            }
            CallbackOutcome::Empty => {
                return Err(AuthError::Internal(
                    "callback carried neither an authorization code nor an error".into(),
                ));
            }
        };

        debug!(environment = %environment, "exchanging authorization code");
        let mut credential =
            self.provider.exchange_authorization_code(environment, &code, &redirect_uri).await?;
        credential.environment = environment;
        info!(environment = %environment, "authorization code login completed");
        Ok(credential)
    }

    async fn await_redirect(
        &self,
        listener: &dyn CallbackListener,
        environment: AzureEnvironment,
        redirect_uri: &str,
    ) -> Result<CallbackOutcome> {
        let url = build_authorization_url(
            &self.provider.authorization_endpoint(environment),
            self.provider.client_id(),
            redirect_uri,
            environment.management_endpoint(),
        );

        self.browser.open(&url)?;
        self.prompt.browser_opened(&url);

        let callback = listener.wait(self.timeout).await.map_err(|err| match err {
            AuthError::Timeout(_) => AuthError::Timeout(format!(
                "no sign-in response within {} seconds",
                self.timeout.as_secs()
            )),
            other => other,
        })?;
        Ok(callback.outcome())
    }
}
