//! Well-known names and defaults
//!
//! Centralized location for file names, environment variables and protocol
//! constants shared by every crate.

// Files
pub const CREDENTIAL_FILE_NAME: &str = "azure-secret.json";
pub const AZURE_CONFIG_DIR_NAME: &str = ".azure";
pub const CLI_PROFILE_FILE_NAME: &str = "azureProfile.json";
pub const CLI_TOKEN_CACHE_FILE_NAME: &str = "accessTokens.json";

// Environment variables
pub const AZURE_CONFIG_DIR_ENV: &str = "AZURE_CONFIG_DIR";
/// Present inside Azure Cloud Shell; signals an ambient managed identity.
pub const CLOUD_SHELL_MARKER_ENV: &str = "ACC_CLOUD";
pub const MSI_ENDPOINT_ENV: &str = "MSI_ENDPOINT";

// Defaults
pub const DEFAULT_CLIENT_ID: &str = "777acee8-5286-4d6e-8b05-f7c851d8ed0a";
pub const DEFAULT_CALLBACK_TIMEOUT_SECS: u64 = 180;
pub const DEFAULT_REFRESH_SKEW_SECS: i64 = 60;
pub const MAX_REFRESH_SKEW_SECS: i64 = 86_400;
pub const DEFAULT_DEVICE_CODE_INTERVAL_SECS: u64 = 5;
pub const DEFAULT_DOCUMENTATION_URL: &str =
    "https://learn.microsoft.com/cli/azure/authenticate-azure-cli";
pub const COMMON_TENANT: &str = "common";

// OAuth grants
pub const GRANT_AUTHORIZATION_CODE: &str = "authorization_code";
pub const GRANT_REFRESH_TOKEN: &str = "refresh_token";
pub const GRANT_CLIENT_CREDENTIALS: &str = "client_credentials";
pub const GRANT_DEVICE_CODE: &str = "urn:ietf:params:oauth:grant-type:device_code";
pub const CLIENT_ASSERTION_TYPE_JWT: &str = "urn:ietf:params:oauth:client-assertion-type:jwt-bearer";

// Managed identity
pub const IMDS_ENDPOINT: &str = "http://169.254.169.254/metadata/identity/oauth2/token";
pub const IMDS_API_VERSION: &str = "2018-02-01";
