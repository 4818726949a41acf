// Invoice creation (issued and received)

use super::args::{self, merge_extra};
use super::envelope::Payload;
use super::ops;
use super::records::TypedEvidence;
use super::registry::{
    json_schema_array, json_schema_fields, json_schema_object, json_schema_string, Tool,
};
use crate::protocol::ToolSchema;
use abraflexi_core::{Record, RecordStore, ToolAccess, ToolError};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

/// `invoice_issued_create` / `invoice_received_create`
pub struct InvoiceCreateTool {
    store: Arc<dyn RecordStore>,
    target: TypedEvidence,
}

impl InvoiceCreateTool {
    pub fn new(store: Arc<dyn RecordStore>, target: TypedEvidence) -> Self {
        Self { store, target }
    }
}

#[derive(Debug, Deserialize)]
struct InvoiceCreateArgs {
    kod: String,
    firma: String,
    datum_vystaveni: Option<String>,
    polozky: Option<Vec<Record>>,
    extra_fields: Option<Record>,
}

impl InvoiceCreateArgs {
    fn into_record(self) -> Result<Record, ToolError> {
        let mut record = Record::new();
        record.insert("kod".to_string(), Value::String(args::required("kod", self.kod)?));
        record.insert(
            "firma".to_string(),
            Value::String(args::required("firma", self.firma)?),
        );

        if let Some(issued) = args::non_blank(self.datum_vystaveni) {
            let issued = args::date("datum_vystaveni", &issued)?;
            record.insert("datVyst".to_string(), Value::String(issued));
        }
        if let Some(items) = self.polozky.filter(|items| !items.is_empty()) {
            record.insert(
                "polozkyFaktury".to_string(),
                Value::Array(items.into_iter().map(Value::Object).collect()),
            );
        }

        merge_extra(&mut record, self.extra_fields);
        Ok(record)
    }
}

#[async_trait::async_trait]
impl Tool for InvoiceCreateTool {
    fn schema(&self) -> ToolSchema {
        let party = if self.target.prefix.ends_with("received") {
            "Supplier reference (e.g., 'code:SUPPLIER01')"
        } else {
            "Customer reference (e.g., 'code:CUSTOMER01')"
        };

        ToolSchema {
            name: self.target.tool_name("create"),
            description: format!("Create a new {} in AbraFlexi", self.target.singular),
            input_schema: json_schema_object(
                json!({
                    "kod": json_schema_string("Invoice code (unique identifier)"),
                    "firma": json_schema_string(party),
                    "datum_vystaveni": json_schema_string("Issue date (YYYY-MM-DD format)"),
                    "polozky": json_schema_array(
                        json!({"type": "object"}),
                        "Invoice items/lines"
                    ),
                    "extra_fields": json_schema_fields("Additional invoice fields")
                }),
                vec!["kod", "firma"],
            ),
        }
    }

    async fn execute(&self, arguments: Value) -> Result<Payload, ToolError> {
        let args: InvoiceCreateArgs = args::parse(&self.target.tool_name("create"), arguments)?;
        let record = args.into_record()?;
        let evidence = self.target.evidence()?;

        ops::create(self.store.as_ref(), &evidence, record).await
    }

    fn access(&self) -> ToolAccess {
        ToolAccess::Write
    }
}
