// Typed evidences and their get / update / delete tools

use super::args::{self, Criteria, LookupArgs, RecordRefArgs};
use super::envelope::Payload;
use super::ops;
use super::registry::{
    json_schema_array, json_schema_fields, json_schema_id, json_schema_integer,
    json_schema_object, json_schema_string, Tool,
};
use crate::protocol::ToolSchema;
use abraflexi_core::catalog;
use abraflexi_core::{Evidence, RecordStore, ToolAccess, ToolError};
use serde_json::{Map, Value};
use std::sync::Arc;

/// An evidence with its own family of tools (`{prefix}_get`, `{prefix}_create`, ...)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypedEvidence {
    pub prefix: &'static str,
    pub evidence: &'static str,
    pub plural: &'static str,
    pub singular: &'static str,
    pub criteria: Criteria,
}

impl TypedEvidence {
    pub fn evidence(&self) -> Result<Evidence, ToolError> {
        Evidence::new(self.evidence)
    }

    pub fn tool_name(&self, operation: &str) -> String {
        format!("{}_{}", self.prefix, operation)
    }
}

pub const ISSUED_INVOICES: TypedEvidence = TypedEvidence {
    prefix: "invoice_issued",
    evidence: catalog::ISSUED_INVOICES,
    plural: "issued invoices",
    singular: "issued invoice",
    criteria: Criteria {
        code: true,
        name: false,
    },
};

pub const RECEIVED_INVOICES: TypedEvidence = TypedEvidence {
    prefix: "invoice_received",
    evidence: catalog::RECEIVED_INVOICES,
    plural: "received invoices",
    singular: "received invoice",
    criteria: Criteria {
        code: true,
        name: false,
    },
};

pub const CONTACTS: TypedEvidence = TypedEvidence {
    prefix: "contact",
    evidence: catalog::CONTACTS,
    plural: "contacts/companies",
    singular: "contact",
    criteria: Criteria {
        code: true,
        name: true,
    },
};

pub const PRODUCTS: TypedEvidence = TypedEvidence {
    prefix: "product",
    evidence: catalog::PRODUCTS,
    plural: "products",
    singular: "product",
    criteria: Criteria {
        code: true,
        name: true,
    },
};

pub const BANK_TRANSACTIONS: TypedEvidence = TypedEvidence {
    prefix: "bank_transaction",
    evidence: catalog::BANK,
    plural: "bank transactions",
    singular: "bank transaction",
    criteria: Criteria {
        code: false,
        name: false,
    },
};

pub(crate) fn detail_schema() -> Value {
    json_schema_string("Detail level: summary (default), id, full or custom:field1,field2")
}

pub(crate) fn ids_schema(singular: &str) -> Value {
    json_schema_array(
        json_schema_id("Record id"),
        &format!("List of {} IDs to retrieve", singular),
    )
}

pub(crate) fn limit_schema() -> Value {
    json_schema_integer("Maximum number of results (0 or absent: no limit)")
}

pub(crate) fn record_ref_properties(singular: &str, with_data: bool) -> Map<String, Value> {
    let mut properties = Map::new();
    properties.insert(
        "id".to_string(),
        json_schema_id(&format!("{} ID", capitalize(singular))),
    );
    properties.insert(
        "kod".to_string(),
        json_schema_string(&format!(
            "{} code (alternative to id, with or without the code: prefix)",
            capitalize(singular)
        )),
    );
    if with_data {
        properties.insert("data".to_string(), json_schema_fields("Fields to update"));
    }
    properties
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `{prefix}_get`: list records filtered by ids, code and name
pub struct RecordGetTool {
    store: Arc<dyn RecordStore>,
    target: TypedEvidence,
}

impl RecordGetTool {
    pub fn new(store: Arc<dyn RecordStore>, target: TypedEvidence) -> Self {
        Self { store, target }
    }
}

#[async_trait::async_trait]
impl Tool for RecordGetTool {
    fn schema(&self) -> ToolSchema {
        let mut properties = Map::new();
        properties.insert("ids".to_string(), ids_schema(self.target.singular));
        if self.target.criteria.code {
            properties.insert(
                "kod".to_string(),
                json_schema_string(&format!("{} code to search for", capitalize(self.target.singular))),
            );
        }
        if self.target.criteria.name {
            properties.insert(
                "nazev".to_string(),
                json_schema_string("Name to search for (partial match)"),
            );
        }
        properties.insert("limit".to_string(), limit_schema());
        properties.insert("detail".to_string(), detail_schema());

        ToolSchema {
            name: self.target.tool_name("get"),
            description: format!(
                "Get {} ({}) from AbraFlexi",
                self.target.plural, self.target.evidence
            ),
            input_schema: json_schema_object(Value::Object(properties), vec![]),
        }
    }

    async fn execute(&self, arguments: Value) -> Result<Payload, ToolError> {
        let args: LookupArgs = args::parse(&self.target.tool_name("get"), arguments)?;
        let query = args.into_query(self.target.criteria)?;
        let evidence = self.target.evidence()?;

        ops::fetch(self.store.as_ref(), &evidence, &query).await
    }
}

/// `{prefix}_update`: overwrite fields of a record addressed by id or code
pub struct RecordUpdateTool {
    store: Arc<dyn RecordStore>,
    target: TypedEvidence,
}

impl RecordUpdateTool {
    pub fn new(store: Arc<dyn RecordStore>, target: TypedEvidence) -> Self {
        Self { store, target }
    }
}

#[async_trait::async_trait]
impl Tool for RecordUpdateTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.target.tool_name("update"),
            description: format!("Update an existing {} in AbraFlexi", self.target.singular),
            input_schema: json_schema_object(
                Value::Object(record_ref_properties(self.target.singular, true)),
                vec![],
            ),
        }
    }

    async fn execute(&self, arguments: Value) -> Result<Payload, ToolError> {
        let args: RecordRefArgs = args::parse(&self.target.tool_name("update"), arguments)?;
        let id = args.identifier()?;
        let fields = args.fields()?;
        let evidence = self.target.evidence()?;

        ops::update(self.store.as_ref(), &evidence, &id, fields).await
    }

    fn access(&self) -> ToolAccess {
        ToolAccess::Write
    }
}

/// `{prefix}_delete`: remove a record addressed by id or code
pub struct RecordDeleteTool {
    store: Arc<dyn RecordStore>,
    target: TypedEvidence,
}

impl RecordDeleteTool {
    pub fn new(store: Arc<dyn RecordStore>, target: TypedEvidence) -> Self {
        Self { store, target }
    }
}

#[async_trait::async_trait]
impl Tool for RecordDeleteTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.target.tool_name("delete"),
            description: format!("Delete an existing {} from AbraFlexi", self.target.singular),
            input_schema: json_schema_object(
                Value::Object(record_ref_properties(self.target.singular, false)),
                vec![],
            ),
        }
    }

    async fn execute(&self, arguments: Value) -> Result<Payload, ToolError> {
        let args: RecordRefArgs = args::parse(&self.target.tool_name("delete"), arguments)?;
        let id = args.identifier()?;
        let evidence = self.target.evidence()?;

        ops::delete(self.store.as_ref(), &evidence, &id).await
    }

    fn access(&self) -> ToolAccess {
        ToolAccess::Write
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{body, invoices, record};
    use crate::tools::ToolRegistry;
    use abraflexi_core::{AccessGate, InMemoryRecordStore};
    use serde_json::json;

    fn registry(store: Arc<InMemoryRecordStore>, gate: AccessGate) -> ToolRegistry {
        let mut registry = ToolRegistry::new(gate);
        for target in [ISSUED_INVOICES, CONTACTS, BANK_TRANSACTIONS] {
            registry.register(Arc::new(RecordGetTool::new(store.clone(), target)));
            registry.register(Arc::new(RecordUpdateTool::new(store.clone(), target)));
            registry.register(Arc::new(RecordDeleteTool::new(store.clone(), target)));
        }
        registry
    }

    #[tokio::test]
    async fn test_get_with_limit() {
        let store = Arc::new(InMemoryRecordStore::new());
        store.seed(catalog::ISSUED_INVOICES, invoices(5));
        let registry = registry(store.clone(), AccessGate::read_only());

        let result = registry
            .call("invoice_issued_get", json!({"limit": 5}))
            .await
            .unwrap();
        let body = body(&result);
        assert_eq!(body["success"], json!(true));
        assert_eq!(body["evidence"], json!("faktura-vydana"));
        assert_eq!(body["count"], json!(5));
        assert_eq!(body["records"].as_array().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_get_empty_evidence() {
        let store = Arc::new(InMemoryRecordStore::new());
        let registry = registry(store, AccessGate::read_only());

        let result = registry
            .call("invoice_issued_get", json!({"limit": 5}))
            .await
            .unwrap();
        assert_eq!(result.is_error, None);
        let body = body(&result);
        assert_eq!(body["count"], json!(0));
        assert_eq!(body["records"], json!([]));
    }

    #[tokio::test]
    async fn test_contact_get_by_name() {
        let store = Arc::new(InMemoryRecordStore::new());
        store.seed(
            catalog::CONTACTS,
            vec![
                record(json!({"kod": "ACME", "nazev": "Acme s.r.o."})),
                record(json!({"kod": "GLOBEX", "nazev": "Globex a.s."})),
            ],
        );
        let registry = registry(store, AccessGate::read_only());

        let result = registry
            .call("contact_get", json!({"nazev": "acme"}))
            .await
            .unwrap();
        let body = body(&result);
        assert_eq!(body["count"], json!(1));
        assert_eq!(body["records"][0]["kod"], json!("ACME"));
    }

    #[tokio::test]
    async fn test_update_requires_identifier_locally() {
        let store = Arc::new(InMemoryRecordStore::new());
        let registry = registry(store.clone(), AccessGate::read_write());

        for tool in ["contact_update", "contact_delete", "invoice_issued_delete"] {
            let result = registry
                .call(tool, json!({"data": {"nazev": "X"}}))
                .await
                .unwrap();
            assert_eq!(result.is_error, Some(true));
            let body = body(&result);
            assert_eq!(body["error"], json!("validation"));
            assert!(body["message"]
                .as_str()
                .unwrap()
                .contains("Either id or kod must be provided"));
        }
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn test_update_missing_record() {
        let store = Arc::new(InMemoryRecordStore::new());
        let registry = registry(store.clone(), AccessGate::read_write());

        let result = registry
            .call("contact_update", json!({"kod": "NOBODY", "data": {"email": "x@y.cz"}}))
            .await
            .unwrap();
        let body = body(&result);
        assert_eq!(body["error"], json!("not_found"));
        assert_eq!(body["message"], json!("Record not found in adresar: code:NOBODY"));
        assert_eq!(store.calls(), 1);
    }

    #[tokio::test]
    async fn test_update_and_delete_by_code() {
        let store = Arc::new(InMemoryRecordStore::new());
        store.seed(
            catalog::CONTACTS,
            vec![record(json!({"kod": "ACME", "nazev": "Acme s.r.o."}))],
        );
        let registry = registry(store.clone(), AccessGate::read_write());

        let result = registry
            .call(
                "contact_update",
                json!({"kod": "code:ACME", "data": {"email": "info@acme.cz"}}),
            )
            .await
            .unwrap();
        let updated = body(&result);
        assert_eq!(updated["success"], json!(true));
        assert_eq!(updated["identifier"], json!("code:ACME"));

        let result = registry
            .call("contact_get", json!({"kod": "ACME", "detail": "full"}))
            .await
            .unwrap();
        assert_eq!(body(&result)["records"][0]["email"], json!("info@acme.cz"));

        let result = registry
            .call("contact_delete", json!({"kod": "ACME"}))
            .await
            .unwrap();
        assert_eq!(body(&result)["success"], json!(true));
        assert!(store.is_empty(catalog::CONTACTS));
    }

    #[tokio::test]
    async fn test_delete_blocked_when_read_only() {
        let store = Arc::new(InMemoryRecordStore::new());
        store.seed(catalog::ISSUED_INVOICES, invoices(1));
        let registry = registry(store.clone(), AccessGate::read_only());

        let result = registry
            .call("invoice_issued_delete", json!({"id": "1"}))
            .await
            .unwrap();
        assert_eq!(body(&result)["error"], json!("permission_denied"));
        assert_eq!(store.calls(), 0);
        assert_eq!(store.len(catalog::ISSUED_INVOICES), 1);
    }

    #[test]
    fn test_bank_get_schema_has_no_code_or_name() {
        let store = Arc::new(InMemoryRecordStore::new());
        let schema = RecordGetTool::new(store, BANK_TRANSACTIONS).schema();
        let properties = schema.input_schema["properties"].as_object().unwrap();
        assert!(properties.contains_key("ids"));
        assert!(!properties.contains_key("kod"));
        assert!(!properties.contains_key("nazev"));
    }
}
