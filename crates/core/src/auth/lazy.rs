//! Refresh-on-demand wrapper around a persisted credential

use std::sync::Arc;

use async_trait::async_trait;
use azauth_domain::{AuthError, Credential, Result};
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::expiry::TokenExpiryChecker;
use super::ports::{CredentialRepository, TokenCredential};
use super::refresher::TokenRefresher;

/// Serves the stored access token and refreshes it when it nears expiry
///
/// The check, refresh and save run under one lock, so concurrent callers
/// that find an expired token trigger a single refresh and all observe its
/// result.
pub struct LazyTokenCredential {
    credential: Mutex<Credential>,
    checker: TokenExpiryChecker,
    refresher: TokenRefresher,
    repository: Arc<dyn CredentialRepository>,
}

impl LazyTokenCredential {
    pub fn new(
        credential: Credential,
        checker: TokenExpiryChecker,
        refresher: TokenRefresher,
        repository: Arc<dyn CredentialRepository>,
    ) -> Self {
        Self { credential: Mutex::new(credential), checker, refresher, repository }
    }

    /// Current access token, refreshed and persisted first if stale.
    ///
    /// The token is issued for the credential's management resource;
    /// `resource` is only recorded in logs.
    ///
    /// # Errors
    /// `AuthError::Config` when a refresh is needed but the credential holds
    /// no refresh token, `AuthError::Refresh` when the refresh timed out, and
    /// provider or storage errors unchanged. The in-memory credential is left
    /// untouched on failure.
    pub async fn access_token(&self, resource: &str) -> Result<String> {
        let mut credential = self.credential.lock().await;
        if self.checker.is_fresh(&credential.access_token) {
            return Ok(credential.access_token.clone());
        }

        debug!(resource, environment = %credential.environment, "access token stale, refreshing");
        let refresh_token = credential.refresh_token.clone().unwrap_or_default();
        let refreshed = self
            .refresher
            .refresh(credential.environment, &refresh_token)
            .await?
            .ok_or_else(|| AuthError::Refresh("refresh request timed out".into()))?;

        let mut updated = credential.clone();
        updated.apply_refresh(refreshed);
        self.repository.save(&updated).await?;
        *credential = updated;

        info!(environment = %credential.environment, "access token refreshed and saved");
        Ok(credential.access_token.clone())
    }

    /// Snapshot of the current credential
    pub async fn credential(&self) -> Credential {
        self.credential.lock().await.clone()
    }
}

#[async_trait]
impl TokenCredential for LazyTokenCredential {
    async fn get_token(&self, resource: &str) -> Result<String> {
        self.access_token(resource).await
    }
}
