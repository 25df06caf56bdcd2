//! Loopback listener for the authorization-code redirect

pub mod server;

pub use server::{LoopbackCallbackServer, LoopbackListenerFactory};
