//! Configuration structures

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_CALLBACK_TIMEOUT_SECS, DEFAULT_CLIENT_ID, DEFAULT_DOCUMENTATION_URL,
    DEFAULT_REFRESH_SKEW_SECS, MAX_REFRESH_SKEW_SECS,
};
use crate::errors::{AuthError, Result};

fn default_client_id() -> String {
    DEFAULT_CLIENT_ID.to_string()
}

const fn default_callback_timeout() -> u64 {
    DEFAULT_CALLBACK_TIMEOUT_SECS
}

const fn default_refresh_skew() -> i64 {
    DEFAULT_REFRESH_SKEW_SECS
}

fn default_documentation_url() -> String {
    DEFAULT_DOCUMENTATION_URL.to_string()
}

/// Settings for logins, refresh and credential storage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Public client id registered with Azure AD
    #[serde(default = "default_client_id")]
    pub client_id: String,

    /// How long the authorization-code flow waits for the browser callback
    #[serde(default = "default_callback_timeout")]
    pub callback_timeout_seconds: u64,

    /// Tokens expiring within this window are refreshed
    #[serde(default = "default_refresh_skew")]
    pub refresh_skew_seconds: i64,

    /// Link rendered on the callback result page
    #[serde(default = "default_documentation_url")]
    pub documentation_url: String,

    /// Override of the Azure AD authority (sovereign proxies, tests)
    #[serde(default)]
    pub authority_host: Option<String>,

    /// Override of the directory holding the credential and CLI files
    #[serde(default)]
    pub config_dir: Option<PathBuf>,

    /// Demote per-request HTTP logging and skip console guidance
    #[serde(default)]
    pub quiet: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            client_id: default_client_id(),
            callback_timeout_seconds: default_callback_timeout(),
            refresh_skew_seconds: default_refresh_skew(),
            documentation_url: default_documentation_url(),
            authority_host: None,
            config_dir: None,
            quiet: false,
        }
    }
}

impl AuthConfig {
    #[must_use]
    pub const fn callback_timeout(&self) -> Duration {
        Duration::from_secs(self.callback_timeout_seconds)
    }

    /// Reject values that cannot be turned into durations.
    ///
    /// # Errors
    /// `AuthError::Config` when the refresh skew is negative or above a day.
    pub fn validate(&self) -> Result<()> {
        if !(0..=MAX_REFRESH_SKEW_SECS).contains(&self.refresh_skew_seconds) {
            return Err(AuthError::Config(format!(
                "refresh_skew_seconds must be between 0 and {MAX_REFRESH_SKEW_SECS}, got {}",
                self.refresh_skew_seconds
            )));
        }
        Ok(())
    }
}
