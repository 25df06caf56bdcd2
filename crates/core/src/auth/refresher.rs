//! Refresh-token redemption

use std::sync::Arc;

use azauth_domain::{AuthError, AzureEnvironment, Credential, Result};
use tracing::{debug, warn};

use super::ports::IdentityProvider;

/// Turns a refresh token into a new credential
#[derive(Clone)]
pub struct TokenRefresher {
    provider: Arc<dyn IdentityProvider>,
}

impl TokenRefresher {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self { provider }
    }

    /// Redeem `refresh_token` against the token endpoint of `environment`.
    ///
    /// Returns `Ok(None)` when the provider call timed out; callers decide
    /// whether that is fatal. The returned credential is stamped with
    /// `environment`.
    ///
    /// # Errors
    /// `AuthError::Config` for an empty refresh token; provider and network
    /// errors are propagated unchanged.
    pub async fn refresh(
        &self,
        environment: AzureEnvironment,
        refresh_token: &str,
    ) -> Result<Option<Credential>> {
        super::require_non_empty(refresh_token, "refresh token")?;

        debug!(environment = %environment, "redeeming refresh token");
        match self.provider.refresh_token(environment, refresh_token, None).await {
            Ok(mut credential) => {
                credential.environment = environment;
                Ok(Some(credential))
            }
            Err(AuthError::Timeout(message)) => {
                warn!(environment = %environment, %message, "refresh request timed out");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::mocks::MockIdentityProvider;
    use azauth_domain::ProviderError;

    #[tokio::test]
    async fn refresh_stamps_requested_environment() {
        let provider = Arc::new(MockIdentityProvider::new());
        provider.set_refresh_result(Ok(Credential::new(
            "new-access",
            Some("new-refresh".into()),
            AzureEnvironment::Azure,
        )));
        let refresher = TokenRefresher::new(provider.clone());

        let refreshed =
            refresher.refresh(AzureEnvironment::AzureChina, "rt").await.unwrap().unwrap();

        assert_eq!(refreshed.access_token, "new-access");
        assert_eq!(refreshed.environment, AzureEnvironment::AzureChina);
        assert_eq!(provider.refresh_calls(), 1);
    }

    #[tokio::test]
    async fn empty_refresh_token_is_rejected_without_calling_provider() {
        let provider = Arc::new(MockIdentityProvider::new());
        let refresher = TokenRefresher::new(provider.clone());

        let err = refresher.refresh(AzureEnvironment::Azure, "  ").await.unwrap_err();

        assert!(matches!(err, AuthError::Config(_)));
        assert_eq!(provider.refresh_calls(), 0);
    }

    #[tokio::test]
    async fn provider_timeout_yields_none() {
        let provider = Arc::new(MockIdentityProvider::new());
        provider.set_refresh_result(Err(AuthError::Timeout("slow".into())));
        let refresher = TokenRefresher::new(provider);

        assert!(refresher.refresh(AzureEnvironment::Azure, "rt").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn provider_rejection_propagates() {
        let provider = Arc::new(MockIdentityProvider::new());
        provider.set_refresh_result(Err(AuthError::Provider(ProviderError::new(
            "invalid_grant",
            Some("refresh token revoked".into()),
        ))));
        let refresher = TokenRefresher::new(provider);

        let err = refresher.refresh(AzureEnvironment::Azure, "rt").await.unwrap_err();
        assert_eq!(err.provider_error().map(|e| e.error.as_str()), Some("invalid_grant"));
    }
}
