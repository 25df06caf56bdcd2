//! Composition root wiring the adapters into the login services

use std::sync::Arc;

use azauth_core::{
    AmbientEnvironment, BrowserLauncher, CallbackListenerFactory, CliCacheSource,
    CredentialRepository, CredentialResolver, IdentityProvider, LazyTokenCredential,
    LoginExecutor, LoginPrompt, PlaintextSecrets, ResolvedCredential, SecretDecryptor,
    TokenAcquirer, TokenExpiryChecker, TokenRefresher,
};
use azauth_domain::constants::MSI_ENDPOINT_ENV;
use azauth_domain::{AuthConfig, AzureEnvironment, Credential, Result, ServicePrincipalConfig};
use tracing::info;

use crate::callback::LoopbackListenerFactory;
use crate::identity::AzureIdentityClient;
use crate::platform::{ConsolePrompt, ProcessEnvironment, SystemBrowser};
use crate::store::{azure_config_dir, AzureCliCache, FileCredentialStore};

/// The adapters behind every port used by [`AzureLogin`]
pub struct LoginAdapters {
    pub provider: Arc<dyn IdentityProvider>,
    pub repository: Arc<dyn CredentialRepository>,
    pub browser: Arc<dyn BrowserLauncher>,
    pub listeners: Arc<dyn CallbackListenerFactory>,
    pub prompt: Arc<dyn LoginPrompt>,
    pub ambient: Arc<dyn AmbientEnvironment>,
    pub cli: Arc<dyn CliCacheSource>,
    pub decryptor: Arc<dyn SecretDecryptor>,
}

impl LoginAdapters {
    /// Production adapters for `config`.
    ///
    /// # Errors
    /// `AuthError::Config` when no Azure configuration directory can be found
    /// and none is configured; HTTP client construction failures.
    pub fn for_config(config: &AuthConfig) -> Result<Self> {
        let dir = match &config.config_dir {
            Some(dir) => dir.clone(),
            None => azure_config_dir()?,
        };
        let ambient = ProcessEnvironment;
        let provider = AzureIdentityClient::new(config)?
            .with_msi_endpoint(ambient.var(MSI_ENDPOINT_ENV));

        Ok(Self {
            provider: Arc::new(provider),
            repository: Arc::new(FileCredentialStore::in_dir(&dir)),
            browser: Arc::new(SystemBrowser::new()),
            listeners: Arc::new(LoopbackListenerFactory::new(config.documentation_url.clone())),
            prompt: Arc::new(ConsolePrompt::new(config.quiet)),
            ambient: Arc::new(ambient),
            cli: Arc::new(AzureCliCache::new(dir)),
            decryptor: Arc::new(PlaintextSecrets),
        })
    }
}

/// Entry point for logins, credential discovery and logout
pub struct AzureLogin {
    provider: Arc<dyn IdentityProvider>,
    repository: Arc<dyn CredentialRepository>,
    executor: LoginExecutor,
    resolver: CredentialResolver,
    checker: TokenExpiryChecker,
}

impl AzureLogin {
    /// Wire the production adapters.
    ///
    /// # Errors
    /// See [`LoginAdapters::for_config`].
    pub fn from_config(config: AuthConfig) -> Result<Self> {
        let adapters = LoginAdapters::for_config(&config)?;
        Ok(Self::with_adapters(&config, adapters))
    }

    pub fn with_adapters(config: &AuthConfig, adapters: LoginAdapters) -> Self {
        let checker = TokenExpiryChecker::new(config.refresh_skew_seconds);
        let executor = LoginExecutor::new(
            adapters.provider.clone(),
            adapters.browser,
            adapters.listeners,
            adapters.prompt,
            config.callback_timeout(),
        );
        let resolver = CredentialResolver::new(
            adapters.provider.clone(),
            adapters.repository.clone(),
            adapters.ambient,
            adapters.cli,
            adapters.decryptor,
            checker,
        );

        Self {
            provider: adapters.provider,
            repository: adapters.repository,
            executor,
            resolver,
            checker,
        }
    }

    /// Browser login with the loopback redirect; the credential is saved.
    ///
    /// # Errors
    /// Flow errors unchanged, `AuthError::Storage` when saving fails.
    pub async fn login_interactive(&self, environment: AzureEnvironment) -> Result<Credential> {
        self.login(&TokenAcquirer::AuthorizationCode, environment).await
    }

    /// Device-code login; the credential is saved.
    ///
    /// # Errors
    /// Flow errors unchanged, `AuthError::Storage` when saving fails.
    pub async fn login_device_code(&self, environment: AzureEnvironment) -> Result<Credential> {
        self.login(&TokenAcquirer::DeviceCode, environment).await
    }

    async fn login(
        &self,
        acquirer: &TokenAcquirer,
        environment: AzureEnvironment,
    ) -> Result<Credential> {
        let credential = self.executor.acquire(acquirer, environment).await?;
        self.repository.save(&credential).await?;
        Ok(credential)
    }

    /// First available non-interactive credential.
    ///
    /// # Errors
    /// Only errors of an explicit configuration.
    pub async fn resolve(
        &self,
        explicit: Option<&ServicePrincipalConfig>,
    ) -> Result<Option<ResolvedCredential>> {
        self.resolver.resolve(explicit).await
    }

    /// Refresh-on-demand wrapper over the persisted credential.
    ///
    /// # Errors
    /// `AuthError::Storage` when nothing usable is stored.
    pub async fn lazy_credential(&self) -> Result<LazyTokenCredential> {
        let credential = self.repository.load().await?;
        Ok(LazyTokenCredential::new(
            credential,
            self.checker,
            TokenRefresher::new(self.provider.clone()),
            self.repository.clone(),
        ))
    }

    /// Forget the persisted credential.
    ///
    /// # Errors
    /// `AuthError::Storage` when the file exists but cannot be removed.
    pub async fn logout(&self) -> Result<()> {
        self.repository.delete().await?;
        info!("logged out");
        Ok(())
    }
}
