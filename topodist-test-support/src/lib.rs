//! Shared test utilities used across topodist crates.

pub mod env;
pub mod proptest_profile;
pub mod tracing;
