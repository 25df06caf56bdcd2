//! Shared fixtures for the infra integration tests

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use azauth_core::testing::mocks::{MapEnvironment, RecordingPrompt, StaticCliCache};
use azauth_core::{AmbientEnvironment, BrowserLauncher, CliCacheSource, PlaintextSecrets};
use azauth_domain::{AuthConfig, AuthError, Result};
use azauth_infra::{
    AzureIdentityClient, AzureLogin, FileCredentialStore, HttpClient, LoginAdapters,
    LoopbackListenerFactory,
};
use wiremock::MockServer;

/// Browser stand-in that follows the login redirect with a fixed query
pub struct RedirectingBrowser {
    query: String,
}

impl RedirectingBrowser {
    pub fn with_query(query: &str) -> Self {
        Self { query: query.to_string() }
    }
}

impl BrowserLauncher for RedirectingBrowser {
    fn is_supported(&self) -> bool {
        true
    }

    fn open(&self, url: &str) -> Result<()> {
        let url = reqwest::Url::parse(url).map_err(|e| AuthError::Interactive(e.to_string()))?;
        let redirect = url
            .query_pairs()
            .find(|(key, _)| key == "redirect_uri")
            .map(|(_, value)| value.into_owned())
            .ok_or_else(|| AuthError::Interactive("authorization URL has no redirect_uri".into()))?;

        let target = format!("{redirect}/?{}", self.query);
        tokio::spawn(async move {
            let client = reqwest::Client::builder().no_proxy().build().unwrap();
            let _ = client.get(target).send().await;
        });
        Ok(())
    }
}

pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

pub fn config_for(server: &MockServer, dir: &Path) -> AuthConfig {
    AuthConfig {
        client_id: "integration-client".into(),
        authority_host: Some(server.uri()),
        config_dir: Some(dir.to_path_buf()),
        callback_timeout_seconds: 10,
        quiet: true,
        ..AuthConfig::default()
    }
}

pub fn identity_client(config: &AuthConfig) -> AzureIdentityClient {
    let http = HttpClient::builder()
        .no_proxy()
        .timeout(Duration::from_secs(5))
        .base_backoff(Duration::from_millis(1))
        .max_attempts(1)
        .quiet(true)
        .build()
        .unwrap();
    AzureIdentityClient::with_http(http, config)
}

/// `AzureLogin` over the real HTTP client, store and loopback listener
pub fn login_with(
    config: &AuthConfig,
    browser: Arc<dyn BrowserLauncher>,
    ambient: Arc<dyn AmbientEnvironment>,
    cli: Arc<dyn CliCacheSource>,
) -> AzureLogin {
    let dir = config.config_dir.clone().unwrap();
    let adapters = LoginAdapters {
        provider: Arc::new(identity_client(config)),
        repository: Arc::new(FileCredentialStore::in_dir(dir)),
        browser,
        listeners: Arc::new(LoopbackListenerFactory::new(config.documentation_url.clone())),
        prompt: Arc::new(RecordingPrompt::default()),
        ambient,
        cli,
        decryptor: Arc::new(PlaintextSecrets),
    };
    AzureLogin::with_adapters(config, adapters)
}

pub fn simple_login(config: &AuthConfig, browser: Arc<dyn BrowserLauncher>) -> AzureLogin {
    login_with(
        config,
        browser,
        Arc::new(MapEnvironment::default()),
        Arc::new(StaticCliCache::default()),
    )
}
