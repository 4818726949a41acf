//! `RecordStore` backed by the AbraFlexi REST API.

use crate::client::AbraFlexiClient;
use abraflexi_core::{Evidence, InsertOutcome, Query, Record, RecordId, RecordStore};
use anyhow::{Context, Result};

#[async_trait::async_trait]
impl RecordStore for AbraFlexiClient {
    async fn list(&self, evidence: &Evidence, query: &Query) -> Result<Vec<Record>> {
        self.read_only(evidence.clone())
            .list(query)
            .await
            .with_context(|| format!("GET {}", evidence))
    }

    async fn get(&self, evidence: &Evidence, id: &RecordId) -> Result<Option<Record>> {
        self.read_only(evidence.clone())
            .get(id)
            .await
            .with_context(|| format!("GET {}/{}", evidence, id))
    }

    async fn insert(&self, evidence: &Evidence, record: Record) -> Result<InsertOutcome> {
        self.read_write(evidence.clone())
            .insert(record)
            .await
            .with_context(|| format!("PUT {}", evidence))
    }

    async fn update(&self, evidence: &Evidence, id: &RecordId, fields: Record) -> Result<()> {
        self.read_write(evidence.clone())
            .update(id, fields)
            .await
            .with_context(|| format!("PUT {}/{}", evidence, id))
    }

    async fn delete(&self, evidence: &Evidence, id: &RecordId) -> Result<()> {
        self.read_write(evidence.clone())
            .delete(id)
            .await
            .with_context(|| format!("DELETE {}/{}", evidence, id))
    }
}
