//! Azure AD identity provider adapter

pub mod assertion;
pub mod client;
pub mod wire;

pub use assertion::ClientCertificate;
pub use client::AzureIdentityClient;
