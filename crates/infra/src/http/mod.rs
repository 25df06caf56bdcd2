//! HTTP transport shared by the identity adapters

pub mod client;

pub use client::{HttpClient, HttpClientBuilder};
