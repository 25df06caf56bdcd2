use std::time::Duration;

use azauth_domain::{AuthError, Result};
use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response};
use tracing::{debug, trace};

use crate::errors::conversions::to_auth;

/// HTTP client for the identity endpoints.
///
/// Requests time out after the configured duration; only safe methods are
/// retried (see [`HttpClient::send`]).
///
/// A quiet client logs individual attempts at `trace` instead of `debug`,
/// which keeps device-code polling out of normal debug output.
#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
    max_attempts: usize,
    base_backoff: Duration,
    quiet: bool,
}

macro_rules! log_attempt {
    ($quiet:expr, $($arg:tt)+) => {
        if $quiet {
            trace!($($arg)+);
        } else {
            debug!($($arg)+);
        }
    };
}

impl HttpClient {
    /// Start building a new HTTP client.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Convenience constructor with default configuration.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    #[must_use]
    pub const fn is_quiet(&self) -> bool {
        self.quiet
    }

    /// Create a request builder using the underlying reqwest client.
    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.client.request(method, url)
    }

    /// Execute a request, retrying only methods that are safe to repeat.
    ///
    /// `GET`/`HEAD` requests are retried on server errors and transport
    /// failures with exponential backoff. Anything else (every token grant is
    /// a `POST`) goes out exactly once: authorization and device codes are
    /// single-use and a refresh must be a single exchange.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let request = builder.build().map_err(to_auth)?;
        let attempts = if request.method().is_safe() { self.max_attempts.max(1) } else { 1 };

        let method = request.method().clone();
        let url = request.url().clone();
        let mut pending = Some(request);

        for attempt in 1..=attempts {
            let request = match pending.take() {
                Some(request) => request,
                None => return Err(AuthError::Internal("request cannot be repeated".into())),
            };
            if attempt < attempts {
                pending = request.try_clone();
            }

            log_attempt!(self.quiet, attempt, %method, %url, "sending HTTP request");
            let retryable = attempt < attempts && pending.is_some();

            match self.client.execute(request).await {
                Ok(response) => {
                    let status = response.status();
                    log_attempt!(self.quiet, attempt, %method, %url, %status, "received HTTP response");

                    if retryable && status.is_server_error() {
                        self.sleep_with_backoff(attempt).await;
                        continue;
                    }
                    return Ok(response);
                }
                Err(err) => {
                    debug!(attempt, %method, %url, error = %err, "HTTP request failed");

                    if retryable && should_retry_error(&err) {
                        self.sleep_with_backoff(attempt).await;
                        continue;
                    }
                    return Err(to_auth(err));
                }
            }
        }

        Err(AuthError::Internal("http client exhausted retries without producing a result".into()))
    }

    fn backoff_delay(&self, retry_number: usize) -> Duration {
        let shift = retry_number.saturating_sub(1).min(8) as u32;
        let multiplier = 1u32 << shift;
        self.base_backoff.saturating_mul(multiplier)
    }

    async fn sleep_with_backoff(&self, retry_number: usize) {
        let delay = self.backoff_delay(retry_number);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
    max_attempts: usize,
    base_backoff: Duration,
    user_agent: Option<String>,
    quiet: bool,
    system_proxy: bool,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_attempts: 3,
            base_backoff: Duration::from_millis(200),
            user_agent: Some(concat!("azauth/", env!("CARGO_PKG_VERSION")).to_string()),
            quiet: false,
            system_proxy: true,
        }
    }
}

impl HttpClientBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Total attempts (initial try + retries) for `GET`/`HEAD` requests.
    pub fn max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn base_backoff(mut self, backoff: Duration) -> Self {
        self.base_backoff = backoff;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Ignore `HTTP_PROXY`/`HTTPS_PROXY` (loopback endpoints in tests).
    pub fn no_proxy(mut self) -> Self {
        self.system_proxy = false;
        self
    }

    pub fn build(self) -> Result<HttpClient> {
        let mut builder = ReqwestClient::builder().timeout(self.timeout);

        if !self.system_proxy {
            builder = builder.no_proxy();
        }

        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }

        let client = builder.build().map_err(to_auth)?;

        Ok(HttpClient {
            client,
            max_attempts: self.max_attempts.max(1),
            base_backoff: self.base_backoff,
            quiet: self.quiet,
        })
    }
}

fn should_retry_error(err: &reqwest::Error) -> bool {
    if err.is_timeout() || err.is_request() {
        return true;
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        if err.is_connect() {
            return true;
        }
    }
    false
}
