//! Configuration loading
//!
//! Builds an [`AuthConfig`](azauth_domain::AuthConfig) from files and
//! `AZAUTH_*` environment variables.

pub mod loader;

pub use loader::{load, load_from_env, load_from_file, probe_config_paths};
