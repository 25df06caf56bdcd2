//! Token credentials that are not backed by the credential file

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use azauth_domain::{
    AccessToken, AuthError, AzureEnvironment, CliTokenEntry, Result, ServicePrincipal,
};
use tokio::sync::Mutex;
use tracing::debug;

use super::expiry::TokenExpiryChecker;
use super::ports::{IdentityProvider, TokenCredential};

/// Per-resource cache of bearer tokens
struct TokenCache {
    tokens: Mutex<HashMap<String, AccessToken>>,
    skew_seconds: i64,
}

impl TokenCache {
    fn new(skew_seconds: i64) -> Self {
        Self { tokens: Mutex::new(HashMap::new()), skew_seconds }
    }

    async fn get_or_fetch<F, Fut>(&self, resource: &str, fetch: F) -> Result<String>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<AccessToken>>,
    {
        let mut tokens = self.tokens.lock().await;
        if let Some(token) = tokens.get(resource).filter(|t| t.is_fresh(self.skew_seconds)) {
            return Ok(token.token.clone());
        }
        let token = fetch().await?;
        let value = token.token.clone();
        tokens.insert(resource.to_string(), token);
        Ok(value)
    }
}

/// Client-credentials grant for a service principal
pub struct ServicePrincipalCredential {
    principal: ServicePrincipal,
    provider: Arc<dyn IdentityProvider>,
    cache: TokenCache,
}

impl ServicePrincipalCredential {
    pub fn new(
        principal: ServicePrincipal,
        provider: Arc<dyn IdentityProvider>,
        skew_seconds: i64,
    ) -> Self {
        Self { principal, provider, cache: TokenCache::new(skew_seconds) }
    }

    #[must_use]
    pub const fn principal(&self) -> &ServicePrincipal {
        &self.principal
    }
}

#[async_trait]
impl TokenCredential for ServicePrincipalCredential {
    async fn get_token(&self, resource: &str) -> Result<String> {
        let (provider, principal) = (&self.provider, &self.principal);
        self.cache
            .get_or_fetch(resource, move || async move {
                debug!(client_id = %principal.client_id, resource, "requesting service principal token");
                provider.client_credentials(principal, resource).await
            })
            .await
    }
}

/// Token from the ambient managed identity (Cloud Shell, Azure VMs)
pub struct ManagedIdentityCredential {
    provider: Arc<dyn IdentityProvider>,
    cache: TokenCache,
}

impl ManagedIdentityCredential {
    pub fn new(provider: Arc<dyn IdentityProvider>, skew_seconds: i64) -> Self {
        Self { provider, cache: TokenCache::new(skew_seconds) }
    }
}

#[async_trait]
impl TokenCredential for ManagedIdentityCredential {
    async fn get_token(&self, resource: &str) -> Result<String> {
        let provider = &self.provider;
        self.cache
            .get_or_fetch(resource, move || async move {
                debug!(resource, "requesting managed identity token");
                provider.managed_identity_token(resource).await
            })
            .await
    }
}

/// User account signed in through the Azure CLI
///
/// Refreshes keep the new tokens in memory only; the CLI's own cache file is
/// never written.
pub struct CliAccountCredential {
    entry: CliTokenEntry,
    environment: AzureEnvironment,
    provider: Arc<dyn IdentityProvider>,
    checker: TokenExpiryChecker,
    state: Mutex<CliTokens>,
}

struct CliTokens {
    access_token: String,
    refresh_token: Option<String>,
}

impl CliAccountCredential {
    pub fn new(
        entry: CliTokenEntry,
        environment: AzureEnvironment,
        provider: Arc<dyn IdentityProvider>,
        checker: TokenExpiryChecker,
    ) -> Self {
        let state = CliTokens {
            access_token: entry.access_token.clone().unwrap_or_default(),
            refresh_token: entry.refresh_token.clone(),
        };
        Self { entry, environment, provider, checker, state: Mutex::new(state) }
    }

    #[must_use]
    pub fn account(&self) -> Option<&str> {
        self.entry.user_id.as_deref()
    }
}

#[async_trait]
impl TokenCredential for CliAccountCredential {
    async fn get_token(&self, resource: &str) -> Result<String> {
        let mut state = self.state.lock().await;
        if self.checker.is_fresh(&state.access_token) {
            return Ok(state.access_token.clone());
        }

        let refresh_token = state
            .refresh_token
            .clone()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| {
                AuthError::Refresh("Azure CLI token expired and has no refresh token".into())
            })?;
        let target = self.entry.resource.as_deref().unwrap_or(resource);

        debug!(environment = %self.environment, resource = target, "refreshing Azure CLI token");
        let refreshed =
            self.provider.refresh_token(self.environment, &refresh_token, Some(target)).await?;

        state.access_token = refreshed.access_token;
        if let Some(rotated) = refreshed.refresh_token.filter(|t| !t.trim().is_empty()) {
            state.refresh_token = Some(rotated);
        }
        Ok(state.access_token.clone())
    }
}
