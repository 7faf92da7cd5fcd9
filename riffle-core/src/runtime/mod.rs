//! Async runtime management for yielders
//!
//! Provides the Tokio runtime that hosts background reader tasks.

pub mod executor;

pub use executor::{RuntimeConfig, YielderRuntime};
