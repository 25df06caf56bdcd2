//! Non-interactive credential discovery
//!
//! Walks the credential sources in precedence order: explicit service
//! principal configuration, the persisted credential file, an ambient
//! managed identity, then the Azure CLI cache. A source that is absent or
//! unreadable is skipped; an explicitly supplied configuration is never
//! skipped and reports its own errors.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use azauth_domain::constants::CLOUD_SHELL_MARKER_ENV;
use azauth_domain::{
    AzureEnvironment, ClientSecret, CliSubscription, CliTokenEntry, CredentialSource, Result,
    ServicePrincipal, ServicePrincipalConfig,
};
use tracing::{debug, info};

use super::credentials::{
    CliAccountCredential, ManagedIdentityCredential, ServicePrincipalCredential,
};
use super::expiry::TokenExpiryChecker;
use super::lazy::LazyTokenCredential;
use super::ports::{
    AmbientEnvironment, CliCacheSource, CredentialRepository, IdentityProvider, SecretDecryptor,
    TokenCredential,
};
use super::refresher::TokenRefresher;

/// Outcome of a successful resolution
pub struct ResolvedCredential {
    source: CredentialSource,
    environment: AzureEnvironment,
    default_subscription: Option<String>,
    credential: Arc<dyn TokenCredential>,
}

impl ResolvedCredential {
    #[must_use]
    pub const fn source(&self) -> CredentialSource {
        self.source
    }

    #[must_use]
    pub const fn environment(&self) -> AzureEnvironment {
        self.environment
    }

    #[must_use]
    pub fn default_subscription(&self) -> Option<&str> {
        self.default_subscription.as_deref()
    }

    #[must_use]
    pub fn token_credential(&self) -> Arc<dyn TokenCredential> {
        self.credential.clone()
    }
}

impl std::fmt::Debug for ResolvedCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedCredential")
            .field("source", &self.source)
            .field("environment", &self.environment)
            .field("default_subscription", &self.default_subscription)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl TokenCredential for ResolvedCredential {
    async fn get_token(&self, resource: &str) -> Result<String> {
        self.credential.get_token(resource).await
    }
}

/// Precedence chain over every non-interactive credential source
pub struct CredentialResolver {
    provider: Arc<dyn IdentityProvider>,
    repository: Arc<dyn CredentialRepository>,
    ambient: Arc<dyn AmbientEnvironment>,
    cli: Arc<dyn CliCacheSource>,
    decryptor: Arc<dyn SecretDecryptor>,
    checker: TokenExpiryChecker,
}

impl CredentialResolver {
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        repository: Arc<dyn CredentialRepository>,
        ambient: Arc<dyn AmbientEnvironment>,
        cli: Arc<dyn CliCacheSource>,
        decryptor: Arc<dyn SecretDecryptor>,
        checker: TokenExpiryChecker,
    ) -> Self {
        Self { provider, repository, ambient, cli, decryptor, checker }
    }

    /// Find the first available credential.
    ///
    /// # Errors
    /// Only errors from an explicit configuration are returned; every other
    /// source is skipped when unavailable and `Ok(None)` reports that none
    /// was found.
    pub async fn resolve(
        &self,
        explicit: Option<&ServicePrincipalConfig>,
    ) -> Result<Option<ResolvedCredential>> {
        if let Some(config) = explicit {
            let resolved = self.from_explicit(config)?;
            info!(source = %resolved.source, "using explicit service principal");
            return Ok(Some(resolved));
        }

        let resolved = match self.from_persisted().await {
            Some(resolved) => Some(resolved),
            None => match self.from_managed_identity() {
                Some(resolved) => Some(resolved),
                None => self.from_cli().await,
            },
        };

        match &resolved {
            Some(found) => info!(
                source = %found.source,
                environment = %found.environment,
                "resolved credential"
            ),
            None => debug!("no credential source available"),
        }
        Ok(resolved)
    }

    fn from_explicit(&self, config: &ServicePrincipalConfig) -> Result<ResolvedCredential> {
        config.validate()?;

        let secret = match &config.certificate {
            Some(path) => ClientSecret::Certificate {
                path: path.clone(),
                password: config
                    .certificate_password
                    .as_deref()
                    .map(|p| self.decryptor.decrypt(p))
                    .transpose()?,
            },
            None => {
                let key = config.key.as_deref().unwrap_or_default();
                ClientSecret::Key(self.decryptor.decrypt(key)?)
            }
        };

        let principal = ServicePrincipal {
            client_id: config.client.trim().to_string(),
            tenant_id: config.tenant.trim().to_string(),
            secret,
            environment: config.environment,
        };
        Ok(self.service_principal(principal, CredentialSource::ExplicitConfig, None))
    }

    async fn from_persisted(&self) -> Option<ResolvedCredential> {
        let credential = match self.repository.load().await {
            Ok(credential) => credential,
            Err(err) => {
                debug!(error = %err, "no usable persisted credential");
                return None;
            }
        };

        let environment = credential.environment;
        let default_subscription = credential.default_subscription.clone();
        let lazy = LazyTokenCredential::new(
            credential,
            self.checker,
            TokenRefresher::new(self.provider.clone()),
            self.repository.clone(),
        );
        Some(ResolvedCredential {
            source: CredentialSource::PersistedFile,
            environment,
            default_subscription,
            credential: Arc::new(lazy),
        })
    }

    fn from_managed_identity(&self) -> Option<ResolvedCredential> {
        if self.ambient.var(CLOUD_SHELL_MARKER_ENV).is_none() {
            return None;
        }
        let credential =
            ManagedIdentityCredential::new(self.provider.clone(), self.checker.skew().num_seconds());
        Some(ResolvedCredential {
            source: CredentialSource::ManagedIdentity,
            environment: AzureEnvironment::Azure,
            default_subscription: None,
            credential: Arc::new(credential),
        })
    }

    async fn from_cli(&self) -> Option<ResolvedCredential> {
        let profile = self
            .cli
            .load_profile()
            .await
            .map_err(|err| debug!(error = %err, "Azure CLI profile unavailable"))
            .ok()?;
        let Some(subscription) = profile.default_subscription() else {
            debug!("Azure CLI profile has no default subscription");
            return None;
        };
        let account = subscription.account_name()?;

        let entries = self
            .cli
            .load_token_cache()
            .await
            .map_err(|err| debug!(error = %err, "Azure CLI token cache unavailable"))
            .ok()?;
        let Some(entry) = entries.into_iter().find(|e| e.matches_account(account)) else {
            debug!(account, "no Azure CLI token entry for default account");
            return None;
        };

        let environment = AzureEnvironment::from_name(&subscription.environment_name);
        let default_subscription = Some(subscription.id.clone());

        if entry.service_principal().is_some() {
            let principal = cli_service_principal(&entry, subscription, environment)?;
            return Some(self.service_principal(
                principal,
                CredentialSource::CliServicePrincipal,
                default_subscription,
            ));
        }

        let credential = CliAccountCredential::new(
            entry,
            environment,
            self.provider.clone(),
            self.checker,
        );
        Some(ResolvedCredential {
            source: CredentialSource::CliAccount,
            environment,
            default_subscription,
            credential: Arc::new(credential),
        })
    }

    fn service_principal(
        &self,
        principal: ServicePrincipal,
        source: CredentialSource,
        default_subscription: Option<String>,
    ) -> ResolvedCredential {
        let environment = principal.environment;
        let credential = ServicePrincipalCredential::new(
            principal,
            self.provider.clone(),
            self.checker.skew().num_seconds(),
        );
        ResolvedCredential {
            source,
            environment,
            default_subscription,
            credential: Arc::new(credential),
        }
    }
}

/// Service principal from a CLI cache entry; the certificate file wins over
/// a cached key. Entries with neither are unusable.
fn cli_service_principal(
    entry: &CliTokenEntry,
    subscription: &CliSubscription,
    environment: AzureEnvironment,
) -> Option<ServicePrincipal> {
    let non_empty = |value: &Option<String>| value.clone().filter(|v| !v.trim().is_empty());

    let secret = match (non_empty(&entry.certificate_file), non_empty(&entry.access_token)) {
        (Some(path), _) => ClientSecret::Certificate { path: PathBuf::from(path), password: None },
        (None, Some(key)) => ClientSecret::Key(key),
        (None, None) => {
            debug!("Azure CLI service principal entry has no key or certificate");
            return None;
        }
    };
    let tenant_id = non_empty(&entry.service_principal_tenant)
        .or_else(|| non_empty(&subscription.tenant_id))?;

    Some(ServicePrincipal {
        client_id: entry.service_principal()?.to_string(),
        tenant_id,
        secret,
        environment,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::mocks::{
        jwt_expiring_in, InMemoryCredentialRepository, MapEnvironment, MockIdentityProvider,
        StaticCliCache,
    };
    use azauth_domain::{AuthError, CliProfile, CliUser, Credential};
    use crate::auth::ports::PlaintextSecrets;

    struct Sources {
        provider: Arc<MockIdentityProvider>,
        repository: Arc<InMemoryCredentialRepository>,
        ambient: MapEnvironment,
        cli: StaticCliCache,
    }

    impl Sources {
        fn empty() -> Self {
            Self {
                provider: Arc::new(MockIdentityProvider::new()),
                repository: Arc::new(InMemoryCredentialRepository::new()),
                ambient: MapEnvironment::default(),
                cli: StaticCliCache::default(),
            }
        }

        fn resolver(self) -> CredentialResolver {
            CredentialResolver::new(
                self.provider,
                self.repository,
                Arc::new(self.ambient),
                Arc::new(self.cli),
                Arc::new(PlaintextSecrets),
                TokenExpiryChecker::new(60),
            )
        }
    }

    fn explicit() -> ServicePrincipalConfig {
        ServicePrincipalConfig {
            client: "explicit-client".into(),
            tenant: "tenant".into(),
            key: Some("key".into()),
            ..Default::default()
        }
    }

    fn persisted() -> Credential {
        let mut credential = Credential::new(
            jwt_expiring_in(3600),
            Some("refresh".into()),
            AzureEnvironment::AzureGermany,
        );
        credential.default_subscription = Some("persisted-sub".into());
        credential
    }

    fn cli_profile(account: &str, kind: &str) -> CliProfile {
        CliProfile {
            subscriptions: vec![CliSubscription {
                id: "cli-sub".into(),
                is_default: true,
                environment_name: "AzureChinaCloud".into(),
                tenant_id: Some("profile-tenant".into()),
                user: Some(CliUser { name: account.into(), kind: kind.into() }),
                ..Default::default()
            }],
        }
    }

    fn cli_certificate_entry() -> CliTokenEntry {
        CliTokenEntry {
            service_principal_id: Some("cli-client".into()),
            service_principal_tenant: Some("cli-tenant".into()),
            certificate_file: Some("/home/dev/.azure/sp.pem".into()),
            ..Default::default()
        }
    }

    fn all_sources() -> Sources {
        let mut sources = Sources::empty();
        sources.repository = Arc::new(InMemoryCredentialRepository::with(persisted()));
        sources.ambient = MapEnvironment::with(CLOUD_SHELL_MARKER_ENV, "1");
        sources.cli = StaticCliCache::new(
            cli_profile("cli-client", "servicePrincipal"),
            vec![cli_certificate_entry()],
        );
        sources
    }

    #[tokio::test]
    async fn explicit_config_wins_over_everything() {
        let resolved = all_sources().resolver().resolve(Some(&explicit())).await.unwrap().unwrap();
        assert_eq!(resolved.source(), CredentialSource::ExplicitConfig);
    }

    #[tokio::test]
    async fn persisted_file_is_next() {
        let resolved = all_sources().resolver().resolve(None).await.unwrap().unwrap();
        assert_eq!(resolved.source(), CredentialSource::PersistedFile);
        assert_eq!(resolved.environment(), AzureEnvironment::AzureGermany);
        assert_eq!(resolved.default_subscription(), Some("persisted-sub"));
    }

    #[tokio::test]
    async fn managed_identity_follows_persisted_file() {
        let mut sources = all_sources();
        sources.repository = Arc::new(InMemoryCredentialRepository::new());

        let resolved = sources.resolver().resolve(None).await.unwrap().unwrap();
        assert_eq!(resolved.source(), CredentialSource::ManagedIdentity);
    }

    #[tokio::test]
    async fn cli_certificate_entry_is_last() {
        let mut sources = all_sources();
        sources.repository = Arc::new(InMemoryCredentialRepository::new());
        sources.ambient = MapEnvironment::default();
        let provider = sources.provider.clone();
        provider.set_client_credentials_result(Ok(azauth_domain::AccessToken::new("t", None)));

        let resolved = sources.resolver().resolve(None).await.unwrap().unwrap();

        assert_eq!(resolved.source(), CredentialSource::CliServicePrincipal);
        assert_eq!(resolved.environment(), AzureEnvironment::AzureChina);
        assert_eq!(resolved.default_subscription(), Some("cli-sub"));

        resolved.get_token("https://management.azure.com/").await.unwrap();
        let principal = provider.last_principal().unwrap();
        assert_eq!(principal.client_id, "cli-client");
        assert_eq!(principal.tenant_id, "cli-tenant");
        assert!(matches!(principal.secret, ClientSecret::Certificate { .. }));
    }

    #[tokio::test]
    async fn cli_user_entry_wraps_cached_tokens() {
        let mut sources = Sources::empty();
        sources.cli = StaticCliCache::new(
            cli_profile("Dev@Contoso.com", "user"),
            vec![CliTokenEntry {
                user_id: Some("dev@contoso.com".into()),
                access_token: Some(jwt_expiring_in(3600)),
                refresh_token: Some("r".into()),
                ..Default::default()
            }],
        );

        let resolved = sources.resolver().resolve(None).await.unwrap().unwrap();
        assert_eq!(resolved.source(), CredentialSource::CliAccount);
    }

    #[tokio::test]
    async fn nothing_available_resolves_to_none() {
        assert!(Sources::empty().resolver().resolve(None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unreadable_sources_are_skipped() {
        let mut sources = Sources::empty();
        sources.repository = Arc::new(InMemoryCredentialRepository::failing_loads());
        sources.cli = StaticCliCache::unreadable();

        assert!(sources.resolver().resolve(None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn cli_entry_without_secret_is_skipped() {
        let mut sources = Sources::empty();
        sources.cli = StaticCliCache::new(
            cli_profile("cli-client", "servicePrincipal"),
            vec![CliTokenEntry {
                service_principal_id: Some("cli-client".into()),
                ..Default::default()
            }],
        );

        assert!(sources.resolver().resolve(None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn invalid_explicit_config_fails_without_falling_through() {
        let mut config = explicit();
        config.key = None;

        let err = all_sources().resolver().resolve(Some(&config)).await.unwrap_err();
        assert!(matches!(err, AuthError::Config(_)));
    }
}
