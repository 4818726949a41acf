#[cfg(any(test, feature = "testing"))]
pub mod memory;

#[cfg(any(test, feature = "testing"))]
pub use memory::InMemoryRecordStore;

use crate::types::{Evidence, InsertOutcome, Query, Record, RecordId};
use anyhow::Result;

/// Remote record operations the tools delegate to.
///
/// The AbraFlexi REST client implements this; dispatch only ever talks to the
/// trait so it can run against any backend.
#[async_trait::async_trait]
pub trait RecordStore: Send + Sync {
    /// List records of an evidence matching the query
    async fn list(&self, evidence: &Evidence, query: &Query) -> Result<Vec<Record>>;

    /// Load a single record, `None` when it does not exist
    async fn get(&self, evidence: &Evidence, id: &RecordId) -> Result<Option<Record>>;

    /// Create a record
    async fn insert(&self, evidence: &Evidence, record: Record) -> Result<InsertOutcome>;

    /// Overwrite the given fields of an existing record
    async fn update(&self, evidence: &Evidence, id: &RecordId, fields: Record) -> Result<()>;

    /// Delete an existing record
    async fn delete(&self, evidence: &Evidence, id: &RecordId) -> Result<()>;
}
