//! Query execution port
//!
//! The caching decorator never talks to a backend itself; it hands the
//! collection and the current options to a [`QueryExecutor`]. Transport,
//! authentication and session handling belong to the implementation.

pub mod memory;

use crate::error::Result;
use crate::query::{QueryOptions, Record};
use async_trait::async_trait;

pub use memory::MemoryQueryExecutor;

#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Run the query described by `collection` and `options`
    ///
    /// `use_elevated_access` asks the backend to bypass per-object access
    /// rules (a master key on Parse-style services).
    async fn find(
        &self,
        collection: &str,
        options: &QueryOptions,
        use_elevated_access: bool,
    ) -> Result<Vec<Record>>;
}
