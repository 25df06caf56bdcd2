//! Domain types and models

pub mod cli;
pub mod credential;
pub mod environment;
pub mod login;
pub mod service_principal;
pub mod source;

pub use cli::{CliProfile, CliSubscription, CliTokenEntry, CliUser};
pub use credential::Credential;
pub use environment::{short_name, AzureEnvironment};
pub use login::{AccessToken, CallbackOutcome, CallbackResult, DeviceCodeInfo};
pub use service_principal::{ClientSecret, ServicePrincipal, ServicePrincipalConfig};
pub use source::CredentialSource;
