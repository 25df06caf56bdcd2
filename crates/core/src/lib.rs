//! # azauth Core
//!
//! Login flows and token lifecycle logic - no infrastructure dependencies.
//!
//! This crate contains:
//! - Port interfaces (traits) for the identity provider, storage, browser,
//!   loopback listener and CLI cache
//! - The authorization-code and device-code logins
//! - Refresh, expiry checks and the refresh-on-demand credential
//! - The resolver chain over non-interactive sources
//!
//! ## Architecture Principles
//! - Only depends on `azauth-domain`
//! - No HTTP, file system or browser code
//! - All external dependencies via traits

pub mod auth;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use auth::ports::{
    AmbientEnvironment, BrowserLauncher, CallbackListener, CallbackListenerFactory,
    CliCacheSource, CredentialRepository, IdentityProvider, LoginPrompt, PlaintextSecrets,
    SecretDecryptor, TokenCredential,
};
pub use auth::{
    AuthorizationCodeFlow, CredentialResolver, DeviceCodeFlow, LazyTokenCredential,
    LoginExecutor, ResolvedCredential, TokenAcquirer, TokenExpiryChecker, TokenRefresher,
};
