//! File-backed credential storage and the Azure CLI cache reader

pub mod cli_cache;
pub mod credential_file;

pub use cli_cache::AzureCliCache;
pub use credential_file::{azure_config_dir, load, save, FileCredentialStore};
