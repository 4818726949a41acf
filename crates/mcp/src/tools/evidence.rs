// Generic tools addressing any evidence by name

use super::args::{self, EvidenceLookupArgs, EvidenceRecordArgs};
use super::envelope::Payload;
use super::ops;
use super::records::{detail_schema, ids_schema, limit_schema, record_ref_properties};
use super::registry::{json_schema_fields, json_schema_object, json_schema_string, Tool};
use crate::protocol::ToolSchema;
use abraflexi_core::catalog;
use abraflexi_core::{Evidence, Record, RecordStore, ToolAccess, ToolError};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

fn evidence_schema() -> Value {
    json_schema_string("Evidence name (e.g., 'faktura-vydana', 'adresar', 'cenik')")
}

/// Validate a caller-supplied evidence name.
fn resolve(name: &str) -> Result<Evidence, ToolError> {
    let evidence = Evidence::new(name)?;
    match catalog::describe(evidence.as_str()) {
        Some(info) => debug!(evidence = %evidence, description = info.description, "Generic evidence access"),
        None => debug!(evidence = %evidence, "Generic access to an evidence outside the catalog"),
    }
    Ok(evidence)
}

pub struct EvidenceGetTool {
    store: Arc<dyn RecordStore>,
}

impl EvidenceGetTool {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }
}

#[async_trait::async_trait]
impl Tool for EvidenceGetTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "evidence_get".to_string(),
            description: "Get records from any AbraFlexi evidence".to_string(),
            input_schema: json_schema_object(
                json!({
                    "evidence": evidence_schema(),
                    "ids": ids_schema("record"),
                    "filter_expr": json_schema_string(
                        "AbraFlexi filter expression (e.g., \"nazev like '*ACME*'\"); ignored when ids are given"
                    ),
                    "limit": limit_schema(),
                    "detail": detail_schema()
                }),
                vec!["evidence"],
            ),
        }
    }

    async fn execute(&self, arguments: Value) -> Result<Payload, ToolError> {
        let args: EvidenceLookupArgs = args::parse("evidence_get", arguments)?;
        let query = args.query()?;
        let evidence = resolve(&args.evidence)?;

        ops::fetch(self.store.as_ref(), &evidence, &query).await
    }
}

pub struct EvidenceCreateTool {
    store: Arc<dyn RecordStore>,
}

impl EvidenceCreateTool {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }
}

#[derive(Debug, Deserialize)]
struct EvidenceCreateArgs {
    evidence: String,
    data: Record,
}

#[async_trait::async_trait]
impl Tool for EvidenceCreateTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "evidence_create".to_string(),
            description: "Create a new record in any AbraFlexi evidence".to_string(),
            input_schema: json_schema_object(
                json!({
                    "evidence": evidence_schema(),
                    "data": json_schema_fields("Record data")
                }),
                vec!["evidence", "data"],
            ),
        }
    }

    async fn execute(&self, arguments: Value) -> Result<Payload, ToolError> {
        let args: EvidenceCreateArgs = args::parse("evidence_create", arguments)?;
        if args.data.is_empty() {
            return Err(ToolError::validation("data must contain at least one field"));
        }
        let evidence = resolve(&args.evidence)?;

        ops::create(self.store.as_ref(), &evidence, args.data).await
    }

    fn access(&self) -> ToolAccess {
        ToolAccess::Write
    }
}

pub struct EvidenceUpdateTool {
    store: Arc<dyn RecordStore>,
}

impl EvidenceUpdateTool {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }
}

#[async_trait::async_trait]
impl Tool for EvidenceUpdateTool {
    fn schema(&self) -> ToolSchema {
        let mut properties = record_ref_properties("record", true);
        properties.insert("evidence".to_string(), evidence_schema());

        ToolSchema {
            name: "evidence_update".to_string(),
            description: "Update a record in any AbraFlexi evidence".to_string(),
            input_schema: json_schema_object(Value::Object(properties), vec!["evidence"]),
        }
    }

    async fn execute(&self, arguments: Value) -> Result<Payload, ToolError> {
        let args: EvidenceRecordArgs = args::parse("evidence_update", arguments)?;
        let (name, record) = args.split();
        let id = record.identifier()?;
        let fields = record.fields()?;
        let evidence = resolve(&name)?;

        ops::update(self.store.as_ref(), &evidence, &id, fields).await
    }

    fn access(&self) -> ToolAccess {
        ToolAccess::Write
    }
}

pub struct EvidenceDeleteTool {
    store: Arc<dyn RecordStore>,
}

impl EvidenceDeleteTool {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }
}

#[async_trait::async_trait]
impl Tool for EvidenceDeleteTool {
    fn schema(&self) -> ToolSchema {
        let mut properties = record_ref_properties("record", false);
        properties.insert("evidence".to_string(), evidence_schema());

        ToolSchema {
            name: "evidence_delete".to_string(),
            description: "Delete a record from any AbraFlexi evidence".to_string(),
            input_schema: json_schema_object(Value::Object(properties), vec!["evidence"]),
        }
    }

    async fn execute(&self, arguments: Value) -> Result<Payload, ToolError> {
        let args: EvidenceRecordArgs = args::parse("evidence_delete", arguments)?;
        let (name, record) = args.split();
        let id = record.identifier()?;
        let evidence = resolve(&name)?;

        ops::delete(self.store.as_ref(), &evidence, &id).await
    }

    fn access(&self) -> ToolAccess {
        ToolAccess::Write
    }
}

/// Lists the well-known evidences; never touches the remote server.
pub struct EvidenceListTool;

#[async_trait::async_trait]
impl Tool for EvidenceListTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "evidence_list".to_string(),
            description: "List commonly used AbraFlexi evidences".to_string(),
            input_schema: json_schema_object(json!({}), vec![]),
        }
    }

    async fn execute(&self, _arguments: Value) -> Result<Payload, ToolError> {
        let evidences = catalog::known_evidences();

        let mut payload = Payload::new();
        payload.insert("count".to_string(), Value::from(evidences.len()));
        payload.insert("evidences".to_string(), json!(evidences));
        Ok(payload)
    }
}
