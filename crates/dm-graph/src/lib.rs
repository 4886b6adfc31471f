//! dm-graph - Directory service client for dirmirror
//!
//! This crate provides the `DirectoryClient` trait, the `GraphClient`
//! implementation over HTTPS/JSON with OData paging, and bearer token
//! providers. The `test-support` feature adds `InMemoryDirectory`.

pub mod auth;
pub mod client;
pub mod error;
#[cfg(any(test, feature = "test-support"))]
pub mod memory;
pub mod odata;
pub mod traits;

pub use auth::{provider_from_config, ClientCredentials, StaticToken, TokenProvider};
pub use client::GraphClient;
pub use error::{GraphError, GraphResult};
#[cfg(any(test, feature = "test-support"))]
pub use memory::InMemoryDirectory;
pub use traits::{DirectoryClient, EntityQuery};
