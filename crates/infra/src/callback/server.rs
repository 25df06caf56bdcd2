//! One-shot loopback HTTP server receiving the login redirect
//!
//! The server answers the first request that carries `code` or `error`,
//! releases the single waiter and shuts itself down. Requests arriving after
//! that find the port closed.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::{Query, State};
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use azauth_core::{CallbackListener, CallbackListenerFactory};
use azauth_domain::{AuthError, CallbackOutcome, CallbackResult, Result};
use tokio::net::TcpListener;
use tokio::sync::{oneshot, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

const SUCCESS_TEMPLATE: &str = include_str!("templates/success.html");
const ERROR_TEMPLATE: &str = include_str!("templates/error.html");
const DOCUMENTATION_PLACEHOLDER: &str = "{{documentation_url}}";
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

fn lock<T>(mutex: &StdMutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// State shared between the HTTP handler and the waiting login
struct CallbackState {
    result: StdMutex<Option<CallbackResult>>,
    /// Starts with no permits; gains exactly one on callback or stop.
    arrived: Semaphore,
    released: AtomicBool,
    shutdown: StdMutex<Option<oneshot::Sender<()>>>,
    success_page: String,
    error_page: String,
}

impl CallbackState {
    fn release(&self) {
        if !self.released.swap(true, Ordering::SeqCst) {
            self.arrived.add_permits(1);
        }
    }

    fn shut_down(&self) {
        if let Some(tx) = lock(&self.shutdown).take() {
            let _ = tx.send(());
        }
    }
}

/// Loopback HTTP server that receives the authorization-code redirect.
pub struct LoopbackCallbackServer {
    port: u16,
    state: Arc<CallbackState>,
    handle: StdMutex<Option<JoinHandle<()>>>,
}

impl LoopbackCallbackServer {
    /// Start the server on an ephemeral loopback port.
    pub async fn start(documentation_url: &str) -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await.map_err(|err| {
            AuthError::Interactive(format!("failed to bind login callback listener: {err}"))
        })?;

        let port = listener
            .local_addr()
            .map_err(|err| AuthError::Interactive(format!("failed to determine port: {err}")))?
            .port();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let state = Arc::new(CallbackState {
            result: StdMutex::new(None),
            arrived: Semaphore::new(0),
            released: AtomicBool::new(false),
            shutdown: StdMutex::new(Some(shutdown_tx)),
            success_page: SUCCESS_TEMPLATE.replace(DOCUMENTATION_PLACEHOLDER, documentation_url),
            error_page: ERROR_TEMPLATE.replace(DOCUMENTATION_PLACEHOLDER, documentation_url),
        });

        let app = Router::new().route("/", get(handle_callback)).with_state(state.clone());

        let handle = tokio::spawn(async move {
            if let Err(err) = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await
            {
                error!(error = %err, "login callback server error");
            }
        });

        debug!(port, "login callback listener started");
        Ok(Self { port, state, handle: StdMutex::new(Some(handle)) })
    }

    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }
}

#[async_trait]
impl CallbackListener for LoopbackCallbackServer {
    fn redirect_uri(&self) -> String {
        format!("http://localhost:{}", self.port)
    }

    async fn wait(&self, timeout: Duration) -> Result<CallbackResult> {
        match tokio::time::timeout(timeout, self.state.arrived.acquire()).await {
            Err(_) => Err(AuthError::Timeout(format!(
                "no login callback within {} seconds",
                timeout.as_secs()
            ))),
            Ok(Err(_)) => Err(AuthError::Internal("login callback semaphore closed".into())),
            Ok(Ok(_permit)) => lock(&self.state.result).clone().ok_or_else(|| {
                AuthError::Interactive("login callback listener stopped before a response".into())
            }),
        }
    }

    async fn stop(&self) {
        self.state.release();
        self.state.shut_down();

        let handle = lock(&self.handle).take();
        if let Some(mut handle) = handle {
            match tokio::time::timeout(SHUTDOWN_GRACE, &mut handle).await {
                Ok(Err(err)) if err.is_panic() => {
                    error!(error = %err, "login callback server panicked");
                }
                Ok(_) => debug!(port = self.port, "login callback listener stopped"),
                Err(_) => {
                    warn!(port = self.port, "login callback listener did not drain; aborting");
                    handle.abort();
                }
            }
        }
    }
}

impl Drop for LoopbackCallbackServer {
    fn drop(&mut self) {
        self.state.release();
        self.state.shut_down();
        if let Some(handle) = lock(&self.handle).take() {
            if !handle.is_finished() {
                handle.abort();
            }
        }
    }
}

async fn handle_callback(
    State(state): State<Arc<CallbackState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Html<String> {
    let callback = CallbackResult {
        code: params.get("code").cloned(),
        error: params.get("error").cloned(),
        error_description: params.get("error_description").cloned(),
    };

    let page = match callback.outcome() {
        CallbackOutcome::Code(_) => &state.success_page,
        CallbackOutcome::Error(_) => &state.error_page,
        CallbackOutcome::Empty => {
            debug!("ignoring login callback without code or error");
            return Html(state.error_page.clone());
        }
    };

    {
        let mut slot = lock(&state.result);
        if slot.is_some() {
            return Html(page.clone());
        }
        *slot = Some(callback);
    }

    state.release();
    state.shut_down();
    Html(page.clone())
}

/// Starts a fresh [`LoopbackCallbackServer`] per login attempt
#[derive(Debug, Clone)]
pub struct LoopbackListenerFactory {
    documentation_url: String,
}

impl LoopbackListenerFactory {
    pub fn new(documentation_url: impl Into<String>) -> Self {
        Self { documentation_url: documentation_url.into() }
    }
}

#[async_trait]
impl CallbackListenerFactory for LoopbackListenerFactory {
    async fn start(&self) -> Result<Box<dyn CallbackListener>> {
        let server = LoopbackCallbackServer::start(&self.documentation_url).await?;
        Ok(Box::new(server))
    }
}
