//! Mock implementations of the core ports
//!
//! Each mock records how it was called and returns canned results.

// Allow missing error/panic docs for test mocks - they are designed to be simple
// and errors are clearly indicated by their return types
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use azauth_domain::{
    AccessToken, AuthError, AzureEnvironment, CallbackResult, CliProfile, CliTokenEntry,
    Credential, DeviceCodeInfo, ProviderError, Result, ServicePrincipal,
};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;

use crate::auth::ports::{
    AmbientEnvironment, BrowserLauncher, CallbackListener, CallbackListenerFactory,
    CliCacheSource, CredentialRepository, IdentityProvider, LoginPrompt,
};

/// Unsigned JWT carrying `claims`
pub fn jwt_with_claims(claims: &serde_json::Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.signature")
}

/// Unsigned JWT whose `exp` is `seconds` from now
pub fn jwt_expiring_in(seconds: i64) -> String {
    jwt_with_claims(&serde_json::json!({ "exp": Utc::now().timestamp() + seconds }))
}

fn one_hour() -> Option<chrono::DateTime<Utc>> {
    Some(Utc::now() + chrono::Duration::hours(1))
}

#[derive(Default)]
struct ProviderCalls {
    last_code: Option<String>,
    last_redirect_uri: Option<String>,
    last_refresh_token: Option<String>,
    last_refresh_resource: Option<String>,
    last_principal: Option<ServicePrincipal>,
}

/// Scriptable identity provider
pub struct MockIdentityProvider {
    exchange_result: Mutex<Option<Result<Credential>>>,
    device_code: Mutex<Option<DeviceCodeInfo>>,
    redemptions: Mutex<VecDeque<Result<Credential>>>,
    refresh_result: Mutex<Option<Result<Credential>>>,
    refresh_delay: Mutex<Option<Duration>>,
    client_credentials_result: Mutex<Option<Result<AccessToken>>>,
    managed_identity_result: Mutex<Option<Result<AccessToken>>>,
    calls: Mutex<ProviderCalls>,
    exchange_calls: AtomicUsize,
    redeem_calls: AtomicUsize,
    refresh_calls: AtomicUsize,
    client_credentials_calls: AtomicUsize,
    managed_identity_calls: AtomicUsize,
}

impl Default for MockIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockIdentityProvider {
    pub fn new() -> Self {
        Self {
            exchange_result: Mutex::new(None),
            device_code: Mutex::new(None),
            redemptions: Mutex::new(VecDeque::new()),
            refresh_result: Mutex::new(None),
            refresh_delay: Mutex::new(None),
            client_credentials_result: Mutex::new(None),
            managed_identity_result: Mutex::new(None),
            calls: Mutex::new(ProviderCalls::default()),
            exchange_calls: AtomicUsize::new(0),
            redeem_calls: AtomicUsize::new(0),
            refresh_calls: AtomicUsize::new(0),
            client_credentials_calls: AtomicUsize::new(0),
            managed_identity_calls: AtomicUsize::new(0),
        }
    }

    pub fn set_exchange_result(&self, result: Result<Credential>) {
        *self.exchange_result.lock().unwrap() = Some(result);
    }

    pub fn set_device_code(&self, info: DeviceCodeInfo) {
        *self.device_code.lock().unwrap() = Some(info);
    }

    /// Queue a redemption result; an empty queue answers `authorization_pending`.
    pub fn push_redemption(&self, result: Result<Credential>) {
        self.redemptions.lock().unwrap().push_back(result);
    }

    pub fn set_refresh_result(&self, result: Result<Credential>) {
        *self.refresh_result.lock().unwrap() = Some(result);
    }

    /// Make every refresh take `delay` before answering.
    pub fn set_refresh_delay(&self, delay: Duration) {
        *self.refresh_delay.lock().unwrap() = Some(delay);
    }

    pub fn set_client_credentials_result(&self, result: Result<AccessToken>) {
        *self.client_credentials_result.lock().unwrap() = Some(result);
    }

    pub fn set_managed_identity_result(&self, result: Result<AccessToken>) {
        *self.managed_identity_result.lock().unwrap() = Some(result);
    }

    pub fn exchange_calls(&self) -> usize {
        self.exchange_calls.load(Ordering::SeqCst)
    }

    pub fn redeem_calls(&self) -> usize {
        self.redeem_calls.load(Ordering::SeqCst)
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn client_credentials_calls(&self) -> usize {
        self.client_credentials_calls.load(Ordering::SeqCst)
    }

    pub fn managed_identity_calls(&self) -> usize {
        self.managed_identity_calls.load(Ordering::SeqCst)
    }

    pub fn last_code(&self) -> Option<String> {
        self.calls.lock().unwrap().last_code.clone()
    }

    pub fn last_redirect_uri(&self) -> Option<String> {
        self.calls.lock().unwrap().last_redirect_uri.clone()
    }

    pub fn last_refresh_token(&self) -> Option<String> {
        self.calls.lock().unwrap().last_refresh_token.clone()
    }

    pub fn last_refresh_resource(&self) -> Option<String> {
        self.calls.lock().unwrap().last_refresh_resource.clone()
    }

    pub fn last_principal(&self) -> Option<ServicePrincipal> {
        self.calls.lock().unwrap().last_principal.clone()
    }
}

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    fn client_id(&self) -> &str {
        "mock-client"
    }

    fn authorization_endpoint(&self, environment: AzureEnvironment) -> String {
        format!("{}common/oauth2/authorize", environment.active_directory_endpoint())
    }

    async fn exchange_authorization_code(
        &self,
        _environment: AzureEnvironment,
        code: &str,
        redirect_uri: &str,
    ) -> Result<Credential> {
        self.exchange_calls.fetch_add(1, Ordering::SeqCst);
        {
            let mut calls = self.calls.lock().unwrap();
            calls.last_code = Some(code.to_string());
            calls.last_redirect_uri = Some(redirect_uri.to_string());
        }
        self.exchange_result
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Err(AuthError::Internal("no exchange result configured".into())))
    }

    async fn request_device_code(&self, _environment: AzureEnvironment) -> Result<DeviceCodeInfo> {
        Ok(self.device_code.lock().unwrap().clone().unwrap_or_else(|| DeviceCodeInfo {
            user_code: "MOCK-CODE".into(),
            device_code: "mock-device-code".into(),
            verification_url: "https://microsoft.com/devicelogin".into(),
            expires_in: 900,
            interval: 5,
            message: None,
        }))
    }

    async fn redeem_device_code(
        &self,
        _environment: AzureEnvironment,
        _device_code: &DeviceCodeInfo,
    ) -> Result<Credential> {
        self.redeem_calls.fetch_add(1, Ordering::SeqCst);
        self.redemptions.lock().unwrap().pop_front().unwrap_or_else(|| {
            Err(AuthError::Provider(ProviderError::new("authorization_pending", None)))
        })
    }

    async fn refresh_token(
        &self,
        _environment: AzureEnvironment,
        refresh_token: &str,
        resource: Option<&str>,
    ) -> Result<Credential> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        {
            let mut calls = self.calls.lock().unwrap();
            calls.last_refresh_token = Some(refresh_token.to_string());
            calls.last_refresh_resource = resource.map(str::to_string);
        }
        let delay = *self.refresh_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.refresh_result.lock().unwrap().clone().unwrap_or_else(|| {
            Err(AuthError::Provider(ProviderError::new(
                "invalid_grant",
                Some("no refresh result configured".into()),
            )))
        })
    }

    async fn client_credentials(
        &self,
        principal: &ServicePrincipal,
        _resource: &str,
    ) -> Result<AccessToken> {
        self.client_credentials_calls.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().unwrap().last_principal = Some(principal.clone());
        self.client_credentials_result
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Ok(AccessToken::new("sp-token", one_hour())))
    }

    async fn managed_identity_token(&self, _resource: &str) -> Result<AccessToken> {
        self.managed_identity_calls.fetch_add(1, Ordering::SeqCst);
        self.managed_identity_result
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Ok(AccessToken::new("msi-token", one_hour())))
    }
}

/// In-memory credential store
#[derive(Default)]
pub struct InMemoryCredentialRepository {
    credential: Mutex<Option<Credential>>,
    fail_loads: bool,
    fail_saves: bool,
    saves: AtomicUsize,
}

impl InMemoryCredentialRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(credential: Credential) -> Self {
        Self { credential: Mutex::new(Some(credential)), ..Self::default() }
    }

    pub fn failing_loads() -> Self {
        Self { fail_loads: true, ..Self::default() }
    }

    pub fn failing_saves() -> Self {
        Self { fail_saves: true, ..Self::default() }
    }

    pub fn stored(&self) -> Option<Credential> {
        self.credential.lock().unwrap().clone()
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CredentialRepository for InMemoryCredentialRepository {
    async fn load(&self) -> Result<Credential> {
        if self.fail_loads {
            return Err(AuthError::Storage("credential file is not valid JSON".into()));
        }
        self.stored().ok_or_else(|| AuthError::Storage("no credential stored".into()))
    }

    async fn save(&self, credential: &Credential) -> Result<()> {
        if self.fail_saves {
            return Err(AuthError::Storage("disk full".into()));
        }
        self.saves.fetch_add(1, Ordering::SeqCst);
        *self.credential.lock().unwrap() = Some(credential.clone());
        Ok(())
    }

    async fn delete(&self) -> Result<()> {
        *self.credential.lock().unwrap() = None;
        Ok(())
    }

    async fn exists(&self) -> bool {
        self.credential.lock().unwrap().is_some()
    }
}

/// Browser that records the URLs it was asked to open
pub struct MockBrowser {
    supported: bool,
    fail: bool,
    opened: Mutex<Vec<String>>,
}

impl MockBrowser {
    pub fn supported() -> Self {
        Self { supported: true, fail: false, opened: Mutex::new(Vec::new()) }
    }

    pub fn unsupported() -> Self {
        Self { supported: false, ..Self::supported() }
    }

    /// Reports support but fails to launch.
    pub fn failing() -> Self {
        Self { fail: true, ..Self::supported() }
    }

    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }
}

impl BrowserLauncher for MockBrowser {
    fn is_supported(&self) -> bool {
        self.supported
    }

    fn open(&self, url: &str) -> Result<()> {
        if self.fail {
            return Err(AuthError::Interactive("browser failed to start".into()));
        }
        self.opened.lock().unwrap().push(url.to_string());
        Ok(())
    }
}

#[derive(Clone)]
enum Script {
    Respond(CallbackResult),
    TimeOut,
}

/// Listener factory whose listeners replay a fixed callback
pub struct ScriptedListeners {
    script: Script,
    starts: AtomicUsize,
    stops: Arc<AtomicUsize>,
}

impl ScriptedListeners {
    pub const REDIRECT_URI: &'static str = "http://localhost:51234";

    pub fn respond(result: CallbackResult) -> Self {
        Self::with_script(Script::Respond(result))
    }

    pub fn time_out() -> Self {
        Self::with_script(Script::TimeOut)
    }

    fn with_script(script: Script) -> Self {
        Self { script, starts: AtomicUsize::new(0), stops: Arc::new(AtomicUsize::new(0)) }
    }

    pub fn start_count(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stop_count(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CallbackListenerFactory for ScriptedListeners {
    async fn start(&self) -> Result<Box<dyn CallbackListener>> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedListener { script: self.script.clone(), stops: self.stops.clone() }))
    }
}

struct ScriptedListener {
    script: Script,
    stops: Arc<AtomicUsize>,
}

#[async_trait]
impl CallbackListener for ScriptedListener {
    fn redirect_uri(&self) -> String {
        ScriptedListeners::REDIRECT_URI.to_string()
    }

    async fn wait(&self, _timeout: Duration) -> Result<CallbackResult> {
        match &self.script {
            Script::Respond(result) => Ok(result.clone()),
            Script::TimeOut => Err(AuthError::Timeout("no callback".into())),
        }
    }

    async fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }
}

/// Prompt that records what it would have shown
#[derive(Default)]
pub struct RecordingPrompt {
    browser_urls: Mutex<Vec<String>>,
    device_codes: Mutex<Vec<String>>,
}

impl RecordingPrompt {
    pub fn browser_urls(&self) -> Vec<String> {
        self.browser_urls.lock().unwrap().clone()
    }

    pub fn device_codes(&self) -> Vec<String> {
        self.device_codes.lock().unwrap().clone()
    }
}

impl LoginPrompt for RecordingPrompt {
    fn browser_opened(&self, url: &str) {
        self.browser_urls.lock().unwrap().push(url.to_string());
    }

    fn device_code(&self, info: &DeviceCodeInfo) {
        self.device_codes.lock().unwrap().push(info.user_code.clone());
    }
}

/// Environment variables from a map
#[derive(Debug, Default, Clone)]
pub struct MapEnvironment(HashMap<String, String>);

impl MapEnvironment {
    pub fn with(name: &str, value: &str) -> Self {
        Self(HashMap::from([(name.to_string(), value.to_string())]))
    }
}

impl AmbientEnvironment for MapEnvironment {
    fn var(&self, name: &str) -> Option<String> {
        self.0.get(name).cloned()
    }
}

/// Fixed Azure CLI files; `None` behaves like a missing file
#[derive(Debug, Default, Clone)]
pub struct StaticCliCache {
    profile: Option<CliProfile>,
    entries: Option<Vec<CliTokenEntry>>,
    unreadable: bool,
}

impl StaticCliCache {
    pub fn new(profile: CliProfile, entries: Vec<CliTokenEntry>) -> Self {
        Self { profile: Some(profile), entries: Some(entries), unreadable: false }
    }

    pub fn unreadable() -> Self {
        Self { unreadable: true, ..Self::default() }
    }

    fn missing(&self, file: &str) -> AuthError {
        if self.unreadable {
            AuthError::Storage(format!("{file} is not valid JSON"))
        } else {
            AuthError::Storage(format!("{file} not found"))
        }
    }
}

#[async_trait]
impl CliCacheSource for StaticCliCache {
    async fn load_profile(&self) -> Result<CliProfile> {
        self.profile.clone().ok_or_else(|| self.missing("azureProfile.json"))
    }

    async fn load_token_cache(&self) -> Result<Vec<CliTokenEntry>> {
        self.entries.clone().ok_or_else(|| self.missing("accessTokens.json"))
    }
}
