//! # azauth Infrastructure
//!
//! Infrastructure implementations of the core ports.
//!
//! This crate contains:
//! - The Azure AD HTTP client (token, device code and managed identity)
//! - The loopback callback server for browser logins
//! - The credential file store and Azure CLI cache reader
//! - Browser, console and environment adapters
//! - Configuration loading and tracing setup
//! - [`AzureLogin`], which wires everything together
//!
//! ## Architecture
//! - Implements traits defined in `azauth-core`
//! - Contains all "impure" code (HTTP, files, browser)

pub mod callback;
pub mod config;
pub mod errors;
pub mod http;
pub mod identity;
pub mod login;
pub mod observability;
pub mod platform;
pub mod store;

pub use callback::{LoopbackCallbackServer, LoopbackListenerFactory};
pub use errors::InfraError;
pub use http::HttpClient;
pub use identity::{AzureIdentityClient, ClientCertificate};
pub use login::{AzureLogin, LoginAdapters};
pub use observability::init_tracing;
pub use platform::{ConsolePrompt, ProcessEnvironment, SystemBrowser};
pub use store::{AzureCliCache, FileCredentialStore};
