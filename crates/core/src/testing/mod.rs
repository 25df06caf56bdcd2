//! Test doubles for the core ports
//!
//! Compiled for this crate's tests and for dependents enabling the
//! `test-utils` feature.

pub mod mocks;
