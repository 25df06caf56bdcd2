//! Error types used throughout the credential subsystem

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Provider error code sent while a device code awaits user approval.
pub const AUTHORIZATION_PENDING: &str = "authorization_pending";

/// OAuth error response from the identity provider
///
/// Standard OAuth 2.0 error format (RFC 6749 §5.2), also used for the
/// `error`/`error_description` query parameters of the login callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderError {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
}

impl ProviderError {
    #[must_use]
    pub fn new(error: impl Into<String>, error_description: Option<String>) -> Self {
        Self { error: error.into(), error_description }
    }

    /// The user has not approved the device code yet.
    #[must_use]
    pub fn is_authorization_pending(&self) -> bool {
        self.error == AUTHORIZATION_PENDING
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.error_description.as_deref().filter(|d| !d.is_empty()) {
            Some(desc) => write!(f, "{}: {}", self.error, desc),
            None => write!(f, "{}", self.error),
        }
    }
}

impl std::error::Error for ProviderError {}

/// Main error type for credential acquisition and refresh
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum AuthError {
    /// Missing or invalid configuration; never retried
    #[error("Configuration error: {0}")]
    Config(String),

    /// Browser or desktop integration unavailable
    #[error("Interactive login unavailable: {0}")]
    Interactive(String),

    /// Identity provider rejected an interactive login
    #[error("Login failed: {0}")]
    LoginFailed(ProviderError),

    /// Callback never arrived or device code expired
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Token endpoint error outside an interactive login
    #[error("Identity provider error: {0}")]
    Provider(ProviderError),

    /// Refresh produced no usable credential
    #[error("Token refresh failed: {0}")]
    Refresh(String),

    /// Token claims could not be decoded
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Network error: {0}")]
    Network(String),

    /// Credential or CLI cache file could not be read or written
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Distinguishes timeouts so callers can offer "try again".
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::Network(_))
    }

    /// Provider error code carried by this error, if any.
    #[must_use]
    pub fn provider_error(&self) -> Option<&ProviderError> {
        match self {
            Self::LoginFailed(err) | Self::Provider(err) => Some(err),
            _ => None,
        }
    }

    /// Stable label suitable for structured logging.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Interactive(_) => "interactive",
            Self::LoginFailed(_) => "login_failed",
            Self::Timeout(_) => "timeout",
            Self::Provider(_) => "provider",
            Self::Refresh(_) => "refresh",
            Self::InvalidToken(_) => "invalid_token",
            Self::Network(_) => "network",
            Self::Storage(_) => "storage",
            Self::Internal(_) => "internal",
        }
    }
}

/// Result type alias for credential operations
pub type Result<T> = std::result::Result<T, AuthError>;
