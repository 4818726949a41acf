// Bank transaction creation (banka)

use super::args::{self, merge_extra};
use super::envelope::Payload;
use super::ops;
use super::records::BANK_TRANSACTIONS;
use super::registry::{
    json_schema_fields, json_schema_number, json_schema_object, json_schema_string, Tool,
};
use crate::protocol::ToolSchema;
use abraflexi_core::{Record, RecordStore, ToolAccess, ToolError};
use serde::Deserialize;
use serde_json::{json, Number, Value};
use std::sync::Arc;

pub struct BankTransactionCreateTool {
    store: Arc<dyn RecordStore>,
}

impl BankTransactionCreateTool {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }
}

#[derive(Debug, Deserialize)]
struct BankTransactionCreateArgs {
    banka: String,
    datum: String,
    castka: f64,
    popis: Option<String>,
    extra_fields: Option<Record>,
}

#[async_trait::async_trait]
impl Tool for BankTransactionCreateTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: BANK_TRANSACTIONS.tool_name("create"),
            description: "Create a new bank transaction in AbraFlexi".to_string(),
            input_schema: json_schema_object(
                json!({
                    "banka": json_schema_string("Bank account reference (e.g., 'code:BANK01')"),
                    "datum": json_schema_string("Transaction date (YYYY-MM-DD format)"),
                    "castka": json_schema_number("Transaction amount"),
                    "popis": json_schema_string("Transaction description"),
                    "extra_fields": json_schema_fields("Additional transaction fields")
                }),
                vec!["banka", "datum", "castka"],
            ),
        }
    }

    async fn execute(&self, arguments: Value) -> Result<Payload, ToolError> {
        let args: BankTransactionCreateArgs =
            args::parse(&BANK_TRANSACTIONS.tool_name("create"), arguments)?;

        let amount = Number::from_f64(args.castka)
            .ok_or_else(|| ToolError::validation("castka must be a finite number"))?;

        let mut record = Record::new();
        record.insert(
            "banka".to_string(),
            Value::String(args::required("banka", args.banka)?),
        );
        record.insert(
            "datum".to_string(),
            Value::String(args::date("datum", &args.datum)?),
        );
        record.insert("castka".to_string(), Value::Number(amount));
        if let Some(popis) = args::non_blank(args.popis) {
            record.insert("popis".to_string(), Value::String(popis));
        }
        merge_extra(&mut record, args.extra_fields);

        let evidence = BANK_TRANSACTIONS.evidence()?;
        ops::create(self.store.as_ref(), &evidence, record).await
    }

    fn access(&self) -> ToolAccess {
        ToolAccess::Write
    }
}
