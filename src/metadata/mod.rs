//! Catalog metadata layer
//!
//! This module provides the resource-call abstraction over the data-source
//! backend, the demand-driven cache built on top of it, and an in-process
//! fixture backend for the CLI and tests.

pub mod cache;
pub mod fixture;
pub mod resource;

// Re-export main types
pub use cache::{FetchOutcome, FetchState, MetadataCache};
pub use fixture::MetadataFixture;
pub use resource::{ColumnInfo, Defaults, ResourceClient, ResourceRequest};
