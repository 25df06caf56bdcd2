//! Configuration loader
//!
//! ## Loading Strategy
//! 1. Start from the first config file found by [`probe_config_paths`], or
//!    from defaults when there is none
//! 2. Apply `AZAUTH_*` environment variables on top
//!
//! ## Environment Variables
//! - `AZAUTH_CLIENT_ID`: public client id
//! - `AZAUTH_CALLBACK_TIMEOUT`: browser callback timeout in seconds
//! - `AZAUTH_REFRESH_SKEW`: refresh window in seconds
//! - `AZAUTH_DOCUMENTATION_URL`: link shown on the callback page
//! - `AZAUTH_AUTHORITY_HOST`: Azure AD authority override
//! - `AZAUTH_CONFIG_DIR`: directory for the credential and CLI files
//! - `AZAUTH_QUIET`: demote request logging (true/false)
//!
//! ## File Locations
//! `./azauth.toml`, `./azauth.json`, then `azauth.{toml,json}` in the user
//! config directory (`~/.config/azauth` on Linux).

use std::path::{Path, PathBuf};

use azauth_domain::{AuthConfig, AuthError, Result};

const ENV_CLIENT_ID: &str = "AZAUTH_CLIENT_ID";
const ENV_CALLBACK_TIMEOUT: &str = "AZAUTH_CALLBACK_TIMEOUT";
const ENV_REFRESH_SKEW: &str = "AZAUTH_REFRESH_SKEW";
const ENV_DOCUMENTATION_URL: &str = "AZAUTH_DOCUMENTATION_URL";
const ENV_AUTHORITY_HOST: &str = "AZAUTH_AUTHORITY_HOST";
const ENV_CONFIG_DIR: &str = "AZAUTH_CONFIG_DIR";
const ENV_QUIET: &str = "AZAUTH_QUIET";

/// Load configuration from the probed file (if any) and the environment.
///
/// # Errors
/// Returns `AuthError::Config` if a found file is invalid or an environment
/// variable has an invalid value.
pub fn load() -> Result<AuthConfig> {
    let base = match probe_config_paths() {
        Some(path) => load_from_file(&path)?,
        None => {
            tracing::debug!("no config file found, using defaults");
            AuthConfig::default()
        }
    };
    apply_overrides(base, |key| std::env::var(key).ok())
}

/// Defaults overlaid with `AZAUTH_*` environment variables.
///
/// # Errors
/// Returns `AuthError::Config` for unparsable numeric values.
pub fn load_from_env() -> Result<AuthConfig> {
    apply_overrides(AuthConfig::default(), |key| std::env::var(key).ok())
}

/// Load configuration from a file
///
/// Format is detected by extension (`.toml` or `.json`). Missing fields take
/// their defaults.
///
/// # Errors
/// Returns `AuthError::Config` if the file is missing, unreadable or invalid.
pub fn load_from_file(path: &Path) -> Result<AuthConfig> {
    if !path.exists() {
        return Err(AuthError::Config(format!("Config file not found: {}", path.display())));
    }

    tracing::info!(path = %path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(path)
        .map_err(|e| AuthError::Config(format!("Failed to read config file: {e}")))?;

    let config = parse_config(&contents, path)?;
    config.validate()?;
    Ok(config)
}

fn parse_config(contents: &str, path: &Path) -> Result<AuthConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| AuthError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| AuthError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(AuthError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// First existing config file among the standard locations.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.push(cwd.join("azauth.toml"));
        candidates.push(cwd.join("azauth.json"));
    }

    if let Some(config_dir) = dirs::config_dir() {
        let dir = config_dir.join("azauth");
        candidates.push(dir.join("azauth.toml"));
        candidates.push(dir.join("azauth.json"));
    }

    candidates.into_iter().find(|path| path.exists())
}

fn apply_overrides<F>(mut config: AuthConfig, lookup: F) -> Result<AuthConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(client_id) = lookup(ENV_CLIENT_ID) {
        config.client_id = client_id;
    }
    if let Some(timeout) = lookup(ENV_CALLBACK_TIMEOUT) {
        config.callback_timeout_seconds = timeout.trim().parse().map_err(|e| {
            AuthError::Config(format!("Invalid {ENV_CALLBACK_TIMEOUT}: {e}"))
        })?;
    }
    if let Some(skew) = lookup(ENV_REFRESH_SKEW) {
        config.refresh_skew_seconds = skew
            .trim()
            .parse()
            .map_err(|e| AuthError::Config(format!("Invalid {ENV_REFRESH_SKEW}: {e}")))?;
    }
    if let Some(url) = lookup(ENV_DOCUMENTATION_URL) {
        config.documentation_url = url;
    }
    if let Some(host) = lookup(ENV_AUTHORITY_HOST) {
        config.authority_host = Some(host);
    }
    if let Some(dir) = lookup(ENV_CONFIG_DIR) {
        config.config_dir = Some(PathBuf::from(dir));
    }
    if let Some(quiet) = lookup(ENV_QUIET) {
        config.quiet = parse_bool(&quiet);
    }

    config.validate()?;
    Ok(config)
}

/// Accepts `1`, `true`, `yes`, `on` (case-insensitive) as true.
fn parse_bool(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use once_cell::sync::Lazy;
    use tempfile::TempDir;

    use super::*;

    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_bool_parsing() {
        for value in ["1", "true", "YES", " on "] {
            assert!(parse_bool(value), "{value} should be true");
        }
        for value in ["0", "false", "no", "off", "maybe"] {
            assert!(!parse_bool(value), "{value} should be false");
        }
    }

    #[test]
    fn test_overrides_replace_defaults() {
        let config = apply_overrides(
            AuthConfig::default(),
            lookup(&[
                (ENV_CLIENT_ID, "my-client"),
                (ENV_CALLBACK_TIMEOUT, "30"),
                (ENV_REFRESH_SKEW, "120"),
                (ENV_AUTHORITY_HOST, "http://127.0.0.1:9000/"),
                (ENV_CONFIG_DIR, "/tmp/azure"),
                (ENV_QUIET, "true"),
            ]),
        )
        .unwrap();

        assert_eq!(config.client_id, "my-client");
        assert_eq!(config.callback_timeout_seconds, 30);
        assert_eq!(config.refresh_skew_seconds, 120);
        assert_eq!(config.authority_host.as_deref(), Some("http://127.0.0.1:9000/"));
        assert_eq!(config.config_dir, Some(PathBuf::from("/tmp/azure")));
        assert!(config.quiet);
    }

    #[test]
    fn test_blank_overrides_are_ignored() {
        let config =
            apply_overrides(AuthConfig::default(), lookup(&[(ENV_CLIENT_ID, "  ")])).unwrap();
        assert_eq!(config, AuthConfig::default());
    }

    #[test]
    fn test_invalid_number_is_config_error() {
        let result =
            apply_overrides(AuthConfig::default(), lookup(&[(ENV_CALLBACK_TIMEOUT, "soon")]));
        assert!(matches!(result, Err(AuthError::Config(msg)) if msg.contains(ENV_CALLBACK_TIMEOUT)));
    }

    #[test]
    fn test_out_of_range_skew_is_config_error() {
        for skew in ["9223372036854775807", "-5", "86401"] {
            let result = apply_overrides(AuthConfig::default(), lookup(&[(ENV_REFRESH_SKEW, skew)]));
            assert!(
                matches!(result, Err(AuthError::Config(ref msg)) if msg.contains("refresh_skew_seconds")),
                "{skew}: {result:?}"
            );
        }
    }

    #[test]
    fn test_load_from_file_rejects_out_of_range_skew() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("azauth.toml");
        std::fs::write(&path, "refresh_skew_seconds = 9223372036854775807\n").unwrap();

        assert!(matches!(load_from_file(&path), Err(AuthError::Config(_))));
    }

    #[test]
    fn test_load_from_env_reads_process_environment() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        std::env::set_var(ENV_REFRESH_SKEW, "90");

        let result = load_from_env();

        std::env::remove_var(ENV_REFRESH_SKEW);
        assert_eq!(result.unwrap().refresh_skew_seconds, 90);
    }

    #[test]
    fn test_load_from_file_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("azauth.toml");
        std::fs::write(&path, "client_id = \"toml-client\"\ncallback_timeout_seconds = 45\n")
            .unwrap();

        let config = load_from_file(&path).unwrap();

        assert_eq!(config.client_id, "toml-client");
        assert_eq!(config.callback_timeout_seconds, 45);
        assert_eq!(config.refresh_skew_seconds, 60);
    }

    #[test]
    fn test_load_from_file_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("azauth.json");
        std::fs::write(&path, r#"{ "quiet": true, "authority_host": "https://login.example/" }"#)
            .unwrap();

        let config = load_from_file(&path).unwrap();

        assert!(config.quiet);
        assert_eq!(config.authority_host.as_deref(), Some("https://login.example/"));
    }

    #[test]
    fn test_load_from_file_not_found() {
        let result = load_from_file(Path::new("/nonexistent/azauth.json"));
        assert!(matches!(result, Err(AuthError::Config(_))));
    }

    #[test]
    fn test_parse_config_invalid_and_unsupported() {
        assert!(parse_config("{ \"quiet\": ", Path::new("a.json")).is_err());
        assert!(parse_config("quiet: true", Path::new("a.yaml")).is_err());
    }
}
