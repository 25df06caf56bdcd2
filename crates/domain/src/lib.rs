//! # azauth Domain
//!
//! Data types, configuration and errors for Azure credential acquisition.
//!
//! This crate contains:
//! - The persisted `Credential` and the `AzureEnvironment` table
//! - Transient login values (device codes, callback results)
//! - Azure CLI file formats
//! - The `AuthError` taxonomy and `Result` alias
//!
//! ## Architecture
//! - No dependencies on other azauth crates
//! - No I/O

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
