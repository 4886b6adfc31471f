//! dm-store - List-store abstraction for dirmirror
//!
//! This crate provides the `ListStore` trait and implementations for a
//! site list reached through the graph API and for a local DuckDB table.

pub mod duckdb;
pub mod error;
#[cfg(any(test, feature = "test-support"))]
pub mod memory;
pub mod sharepoint;
pub mod traits;

pub use duckdb::DuckDbListStore;
pub use error::{StoreError, StoreResult};
#[cfg(any(test, feature = "test-support"))]
pub use memory::InMemoryListStore;
pub use sharepoint::SharePointListStore;
pub use traits::{ListStore, RowFields};
