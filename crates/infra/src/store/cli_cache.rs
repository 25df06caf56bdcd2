//! Read-only access to the Azure CLI's cached login

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use azauth_core::CliCacheSource;
use azauth_domain::constants::{CLI_PROFILE_FILE_NAME, CLI_TOKEN_CACHE_FILE_NAME};
use azauth_domain::{AuthError, CliProfile, CliTokenEntry, Result};
use serde::de::DeserializeOwned;

use super::credential_file::azure_config_dir;
use crate::errors::conversions::to_auth;

const BOM: char = '\u{feff}';

/// Reads `azureProfile.json` and `accessTokens.json` from a CLI config dir
#[derive(Debug, Clone)]
pub struct AzureCliCache {
    dir: PathBuf,
}

impl AzureCliCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Cache in [`azure_config_dir`].
    ///
    /// # Errors
    /// Returns `AuthError::Config` when no configuration directory exists.
    pub fn default_location() -> Result<Self> {
        Ok(Self::new(azure_config_dir()?))
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn read<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let path = self.dir.join(name);
        let text = tokio::fs::read_to_string(&path).await.map_err(to_auth)?;
        // The CLI writes the profile with a byte order mark on some platforms.
        let text = text.strip_prefix(BOM).unwrap_or(&text);
        serde_json::from_str(text).map_err(|err| {
            AuthError::Storage(format!("failed to parse {}: {err}", path.display()))
        })
    }
}

#[async_trait]
impl CliCacheSource for AzureCliCache {
    async fn load_profile(&self) -> Result<CliProfile> {
        self.read(CLI_PROFILE_FILE_NAME).await
    }

    async fn load_token_cache(&self) -> Result<Vec<CliTokenEntry>> {
        self.read(CLI_TOKEN_CACHE_FILE_NAME).await
    }
}
