//! STATLINE — sports statistics collection pipeline.
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod cache;
pub mod client;
pub mod collect;
pub mod config;
pub mod fetch;
pub mod snapshot;
pub mod sources;
pub mod store;
pub mod types;
