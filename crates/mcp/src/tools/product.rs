// Product creation (cenik)

use super::args::{self, merge_extra};
use super::envelope::Payload;
use super::ops;
use super::records::PRODUCTS;
use super::registry::{
    json_schema_fields, json_schema_number, json_schema_object, json_schema_string, Tool,
};
use crate::protocol::ToolSchema;
use abraflexi_core::{Record, RecordStore, ToolAccess, ToolError};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

pub struct ProductCreateTool {
    store: Arc<dyn RecordStore>,
}

impl ProductCreateTool {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }
}

#[derive(Debug, Deserialize)]
struct ProductCreateArgs {
    kod: String,
    nazev: String,
    cena: Option<f64>,
    extra_fields: Option<Record>,
}

#[async_trait::async_trait]
impl Tool for ProductCreateTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: PRODUCTS.tool_name("create"),
            description: "Create a new product in AbraFlexi".to_string(),
            input_schema: json_schema_object(
                json!({
                    "kod": json_schema_string("Product code (unique identifier)"),
                    "nazev": json_schema_string("Product name"),
                    "cena": json_schema_number("Product price"),
                    "extra_fields": json_schema_fields("Additional product fields")
                }),
                vec!["kod", "nazev"],
            ),
        }
    }

    async fn execute(&self, arguments: Value) -> Result<Payload, ToolError> {
        let args: ProductCreateArgs = args::parse(&PRODUCTS.tool_name("create"), arguments)?;

        let mut record = Record::new();
        record.insert("kod".to_string(), Value::String(args::required("kod", args.kod)?));
        record.insert(
            "nazev".to_string(),
            Value::String(args::required("nazev", args.nazev)?),
        );
        if let Some(price) = args.cena {
            let price = serde_json::Number::from_f64(price)
                .ok_or_else(|| ToolError::validation("cena must be a finite number"))?;
            record.insert("cenaZakl".to_string(), Value::Number(price));
        }
        merge_extra(&mut record, args.extra_fields);

        let evidence = PRODUCTS.evidence()?;
        ops::create(self.store.as_ref(), &evidence, record).await
    }

    fn access(&self) -> ToolAccess {
        ToolAccess::Write
    }
}
