// Contact / company creation (adresar)

use super::args::{self, merge_extra};
use super::envelope::Payload;
use super::ops;
use super::records::CONTACTS;
use super::registry::{json_schema_fields, json_schema_object, json_schema_string, Tool};
use crate::protocol::ToolSchema;
use abraflexi_core::{Record, RecordStore, ToolAccess, ToolError};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

pub struct ContactCreateTool {
    store: Arc<dyn RecordStore>,
}

impl ContactCreateTool {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }
}

#[derive(Debug, Deserialize)]
struct ContactCreateArgs {
    kod: String,
    nazev: String,
    email: Option<String>,
    tel: Option<String>,
    extra_fields: Option<Record>,
}

#[async_trait::async_trait]
impl Tool for ContactCreateTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: CONTACTS.tool_name("create"),
            description: "Create a new contact/company in AbraFlexi".to_string(),
            input_schema: json_schema_object(
                json!({
                    "kod": json_schema_string("Contact code (unique identifier)"),
                    "nazev": json_schema_string("Contact/company name"),
                    "email": json_schema_string("Email address"),
                    "tel": json_schema_string("Phone number"),
                    "extra_fields": json_schema_fields("Additional contact fields")
                }),
                vec!["kod", "nazev"],
            ),
        }
    }

    async fn execute(&self, arguments: Value) -> Result<Payload, ToolError> {
        let args: ContactCreateArgs = args::parse(&CONTACTS.tool_name("create"), arguments)?;

        let mut record = Record::new();
        record.insert("kod".to_string(), Value::String(args::required("kod", args.kod)?));
        record.insert(
            "nazev".to_string(),
            Value::String(args::required("nazev", args.nazev)?),
        );
        if let Some(email) = args::non_blank(args.email) {
            record.insert("email".to_string(), Value::String(email));
        }
        if let Some(tel) = args::non_blank(args.tel) {
            record.insert("tel".to_string(), Value::String(tel));
        }
        merge_extra(&mut record, args.extra_fields);

        let evidence = CONTACTS.evidence()?;
        ops::create(self.store.as_ref(), &evidence, record).await
    }

    fn access(&self) -> ToolAccess {
        ToolAccess::Write
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::body;
    use crate::tools::{RecordGetTool, ToolRegistry};
    use abraflexi_core::{catalog, AccessGate, InMemoryRecordStore};

    fn registry(store: Arc<InMemoryRecordStore>, gate: AccessGate) -> ToolRegistry {
        let mut registry = ToolRegistry::new(gate);
        registry.register(Arc::new(ContactCreateTool::new(store.clone())));
        registry.register(Arc::new(RecordGetTool::new(store, CONTACTS)));
        registry
    }

    #[tokio::test]
    async fn test_create_blocked_when_read_only() {
        let store = Arc::new(InMemoryRecordStore::new());
        let registry = registry(store.clone(), AccessGate::read_only());

        let result = registry
            .call("contact_create", json!({"kod": "ACME", "nazev": "Acme s.r.o."}))
            .await
            .unwrap();
        assert_eq!(result.is_error, Some(true));
        let body = body(&result);
        assert_eq!(body["success"], json!(false));
        assert_eq!(body["error"], json!("permission_denied"));
        assert!(body["message"].as_str().unwrap().contains("Permission denied"));
        assert_eq!(store.calls(), 0);
        assert!(store.is_empty(catalog::CONTACTS));
    }

    #[tokio::test]
    async fn test_create_then_get_by_code() {
        let store = Arc::new(InMemoryRecordStore::new());
        let registry = registry(store.clone(), AccessGate::read_write());

        let result = registry
            .call(
                "contact_create",
                json!({"kod": "ACME", "nazev": "Acme s.r.o.", "email": "info@acme.cz", "tel": " "}),
            )
            .await
            .unwrap();
        let created = body(&result);
        assert_eq!(created["kod"], json!("ACME"));

        let result = registry
            .call("contact_get", json!({"kod": "code:ACME"}))
            .await
            .unwrap();
        let fetched = body(&result);
        assert_eq!(fetched["count"], json!(1));
        assert_eq!(fetched["records"][0]["kod"], json!("ACME"));
        assert_eq!(fetched["records"][0]["email"], json!("info@acme.cz"));
        assert!(fetched["records"][0].get("tel").is_none());
        assert_eq!(fetched["records"][0]["id"], created["id"]);
    }
}
