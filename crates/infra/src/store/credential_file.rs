//! Persisted credential file (`azure-secret.json`)
//!
//! One JSON document per user. Writes land in a temporary file in the same
//! directory and are renamed over the target, so a concurrent reader sees
//! either the old or the new document.

use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use azauth_core::CredentialRepository;
use azauth_domain::constants::{AZURE_CONFIG_DIR_ENV, AZURE_CONFIG_DIR_NAME, CREDENTIAL_FILE_NAME};
use azauth_domain::{AuthError, Credential, Result};
use tracing::{debug, info};

use crate::errors::conversions::to_auth;

/// Directory holding Azure configuration: `$AZURE_CONFIG_DIR`, else
/// `~/.azure`.
///
/// # Errors
/// Returns `AuthError::Config` when neither is available.
pub fn azure_config_dir() -> Result<PathBuf> {
    if let Some(dir) = std::env::var_os(AZURE_CONFIG_DIR_ENV).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir().map(|home| home.join(AZURE_CONFIG_DIR_NAME)).ok_or_else(|| {
        AuthError::Config(format!(
            "cannot locate the Azure configuration directory; set {AZURE_CONFIG_DIR_ENV}"
        ))
    })
}

/// Stores the credential as a JSON file
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the default location inside [`azure_config_dir`].
    ///
    /// # Errors
    /// Returns `AuthError::Config` when no configuration directory exists.
    pub fn default_location() -> Result<Self> {
        Ok(Self::in_dir(azure_config_dir()?))
    }

    /// Store named `azure-secret.json` inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(CREDENTIAL_FILE_NAME))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the stored credential.
    ///
    /// # Errors
    /// `AuthError::Storage` when the file is missing, unreadable or not a
    /// credential document.
    pub async fn load(&self) -> Result<Credential> {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(AuthError::Storage(format!(
                    "no credential stored at {}",
                    self.path.display()
                )));
            }
            Err(err) => return Err(to_auth(err)),
        };

        let credential: Credential = serde_json::from_str(&text).map_err(to_auth)?;
        debug!(path = %self.path.display(), environment = %credential.environment, "loaded credential");
        Ok(credential)
    }

    /// Replace the stored credential atomically.
    ///
    /// # Errors
    /// `AuthError::Storage` when the directory or file cannot be written.
    pub async fn save(&self, credential: &Credential) -> Result<()> {
        let body = serde_json::to_vec_pretty(credential).map_err(to_auth)?;
        let path = self.path.clone();

        tokio::task::spawn_blocking(move || write_atomically(&path, &body))
            .await
            .map_err(|err| AuthError::Internal(format!("credential write task failed: {err}")))??;

        info!(path = %self.path.display(), environment = %credential.environment, "credential saved");
        Ok(())
    }

    /// Remove the stored credential. Nothing stored is not an error.
    ///
    /// # Errors
    /// `AuthError::Storage` when the file exists but cannot be removed.
    pub async fn delete(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                info!(path = %self.path.display(), "credential removed");
                Ok(())
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(to_auth(err)),
        }
    }

    pub async fn exists(&self) -> bool {
        tokio::fs::try_exists(&self.path).await.unwrap_or(false)
    }
}

fn write_atomically(path: &Path, body: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir).map_err(to_auth)?;

    let mut file = tempfile::NamedTempFile::new_in(&dir).map_err(to_auth)?;
    file.write_all(body).map_err(to_auth)?;
    file.as_file().sync_all().map_err(to_auth)?;
    file.persist(path).map_err(|err| to_auth(err.error))?;
    Ok(())
}

#[async_trait]
impl CredentialRepository for FileCredentialStore {
    async fn load(&self) -> Result<Credential> {
        Self::load(self).await
    }

    async fn save(&self, credential: &Credential) -> Result<()> {
        Self::save(self, credential).await
    }

    async fn delete(&self) -> Result<()> {
        Self::delete(self).await
    }

    async fn exists(&self) -> bool {
        Self::exists(self).await
    }
}

fn store_for(path: Option<&Path>) -> Result<FileCredentialStore> {
    match path {
        Some(path) => Ok(FileCredentialStore::new(path)),
        None => FileCredentialStore::default_location(),
    }
}

/// Load the credential from `path`, or from the default location.
///
/// # Errors
/// See [`FileCredentialStore::load`].
pub async fn load(path: Option<&Path>) -> Result<Credential> {
    store_for(path)?.load().await
}

/// Save the credential to `path`, or to the default location.
///
/// # Errors
/// See [`FileCredentialStore::save`].
pub async fn save(credential: &Credential, path: Option<&Path>) -> Result<()> {
    store_for(path)?.save(credential).await
}
