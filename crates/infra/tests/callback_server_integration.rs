//! Loopback callback listener over real HTTP

mod support;

use std::sync::Arc;
use std::time::Duration;

use azauth_core::testing::mocks::{MockIdentityProvider, RecordingPrompt};
use azauth_core::{AuthorizationCodeFlow, CallbackListener, CallbackListenerFactory};
use azauth_domain::{AuthError, AzureEnvironment, Credential};
use azauth_infra::{LoopbackCallbackServer, LoopbackListenerFactory};
use support::{http_client, RedirectingBrowser};

const DOCS: &str = "https://learn.microsoft.com/cli/azure/authenticate-azure-cli";

#[tokio::test]
async fn request_after_first_callback_is_refused() {
    let server = LoopbackCallbackServer::start(DOCS).await.unwrap();
    let base = server.redirect_uri();

    let first = http_client().get(format!("{base}/?code=first")).send().await.unwrap();
    assert!(first.status().is_success());
    let result = server.wait(Duration::from_secs(5)).await.unwrap();
    assert_eq!(result.code.as_deref(), Some("first"));
    server.stop().await;

    let second = http_client().get(format!("{base}/?code=second")).send().await;
    assert!(second.is_err(), "listener should be closed after the first callback");
}

#[tokio::test]
async fn factory_starts_independent_listeners() {
    let factory = LoopbackListenerFactory::new(DOCS);

    let one = factory.start().await.unwrap();
    let two = factory.start().await.unwrap();

    assert_ne!(one.redirect_uri(), two.redirect_uri());
    assert!(one.redirect_uri().starts_with("http://localhost:"));
    one.stop().await;
    two.stop().await;
}

#[tokio::test]
async fn authorization_code_flow_exchanges_code_from_real_redirect() {
    let provider = Arc::new(MockIdentityProvider::new());
    provider.set_exchange_result(Ok(Credential::new("access", None, AzureEnvironment::Azure)));
    let prompt = Arc::new(RecordingPrompt::default());
    let flow = AuthorizationCodeFlow::new(
        provider.clone(),
        Arc::new(RedirectingBrowser::with_query("code=real-code&session_state=abc")),
        Arc::new(LoopbackListenerFactory::new(DOCS)),
        prompt.clone(),
        Duration::from_secs(10),
    );

    let credential = flow.run(AzureEnvironment::Azure).await.unwrap();

    assert_eq!(credential.access_token, "access");
    assert_eq!(provider.last_code().as_deref(), Some("real-code"));
    let redirect_uri = provider.last_redirect_uri().unwrap();
    assert!(redirect_uri.starts_with("http://localhost:"));
    assert_eq!(prompt.browser_urls().len(), 1);
    assert!(prompt.browser_urls()[0].contains("prompt=select_account"));
}

#[tokio::test]
async fn authorization_code_flow_times_out_without_redirect() {
    struct SilentBrowser;

    impl azauth_core::BrowserLauncher for SilentBrowser {
        fn is_supported(&self) -> bool {
            true
        }

        fn open(&self, _url: &str) -> azauth_domain::Result<()> {
            Ok(())
        }
    }

    let provider = Arc::new(MockIdentityProvider::new());
    let flow = AuthorizationCodeFlow::new(
        provider.clone(),
        Arc::new(SilentBrowser),
        Arc::new(LoopbackListenerFactory::new(DOCS)),
        Arc::new(RecordingPrompt::default()),
        Duration::from_millis(200),
    );

    let err = flow.run(AzureEnvironment::Azure).await.unwrap_err();

    assert!(matches!(err, AuthError::Timeout(_)));
    assert_eq!(provider.exchange_calls(), 0);
}
