//! Read-only access to the container-orchestration cluster.
//!
//! Provides the `ClusterReader` trait the query dispatcher is written
//! against, an HTTP implementation for the API server's REST endpoints, and
//! a seeded `MockClusterReader` for tests and sample mode.

pub mod config;
pub mod error;
pub mod http;
pub mod mock;
pub mod reader;
pub mod types;

// Re-export key types for convenience
pub use config::{ClusterConfig, ClusterMode};
pub use error::{ClusterError, ClusterResult};
pub use http::HttpClusterReader;
pub use mock::MockClusterReader;
pub use reader::ClusterReader;
pub use types::*;
