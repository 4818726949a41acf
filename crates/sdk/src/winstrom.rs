//! The `winstrom` JSON envelope wrapping every AbraFlexi payload.

use abraflexi_core::{Evidence, Record};
use serde::Deserialize;
use serde_json::{json, Value};

/// Top-level key of every request and response body.
pub const ROOT: &str = "winstrom";

/// Wrap a single record for a write request.
pub fn wrap_record(evidence: &Evidence, record: Record) -> Value {
    let mut inner = serde_json::Map::new();
    inner.insert("@version".to_string(), json!("1.0"));
    inner.insert(
        evidence.as_str().to_string(),
        Value::Array(vec![Value::Object(record)]),
    );

    let mut root = serde_json::Map::new();
    root.insert(ROOT.to_string(), Value::Object(inner));
    Value::Object(root)
}

/// Extract the record list of `evidence` from a read response.
///
/// A response without the evidence key carries no records.
pub fn records(body: Value, evidence: &Evidence) -> Vec<Record> {
    let Value::Object(mut root) = body else {
        return Vec::new();
    };
    let Some(Value::Object(mut inner)) = root.remove(ROOT) else {
        return Vec::new();
    };
    match inner.remove(evidence.as_str()) {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(record) => Some(record),
                _ => None,
            })
            .collect(),
        Some(Value::Object(record)) => vec![record],
        _ => Vec::new(),
    }
}

/// Body of a write (insert/update/delete) response.
#[derive(Debug, Default, Deserialize)]
pub struct WriteBody {
    #[serde(default)]
    pub success: Option<Value>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub results: Vec<WriteResult>,
}

/// Per-record result of a write.
#[derive(Debug, Default, Deserialize)]
pub struct WriteResult {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub errors: Vec<RemoteMessage>,
}

/// Validation message reported by the server.
#[derive(Debug, Deserialize)]
pub struct RemoteMessage {
    #[serde(default)]
    pub message: String,
    #[serde(default, rename = "for")]
    pub field: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WriteEnvelope {
    winstrom: WriteBody,
}

impl WriteBody {
    /// Parse a write response; an empty or foreign body yields the default.
    pub fn parse(body: &Value) -> Self {
        serde_json::from_value::<WriteEnvelope>(body.clone())
            .map(|envelope| envelope.winstrom)
            .unwrap_or_default()
    }

    /// `success` is sent as `"true"`/`"false"`; absent means success.
    pub fn succeeded(&self) -> bool {
        match &self.success {
            None => true,
            Some(Value::Bool(ok)) => *ok,
            Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
            Some(_) => false,
        }
    }

    /// First id reported in the results, as text.
    pub fn first_id(&self) -> Option<String> {
        self.results.iter().find_map(|r| match r.id.as_ref()? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
    }

    /// Human-readable description of why the write failed.
    pub fn failure_message(&self) -> String {
        let errors: Vec<String> = self
            .results
            .iter()
            .flat_map(|r| r.errors.iter())
            .map(|e| match &e.field {
                Some(field) => format!("{}: {}", field, e.message),
                None => e.message.clone(),
            })
            .collect();

        if !errors.is_empty() {
            return errors.join("; ");
        }
        self.message
            .clone()
            .unwrap_or_else(|| "request was not successful".to_string())
    }
}

/// Best-effort error text from any response body.
pub fn error_message(body: &Value) -> Option<String> {
    let inner = body.get(ROOT)?;
    let write = WriteBody::parse(body);
    if write.results.iter().any(|r| !r.errors.is_empty()) {
        return Some(write.failure_message());
    }
    inner
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invoices() -> Evidence {
        Evidence::new("faktura-vydana").unwrap()
    }

    #[test]
    fn test_records_extraction() {
        let body = json!({
            "winstrom": {
                "@version": "1.0",
                "faktura-vydana": [
                    {"id": "1", "kod": "VF1-0001/2024"},
                    {"id": "2", "kod": "VF1-0002/2024"}
                ]
            }
        });
        let records = records(body, &invoices());
        assert_eq!(records.len(), 2);
        assert_eq!(records[1]["kod"], json!("VF1-0002/2024"));
    }

    #[test]
    fn test_records_missing_key_is_empty() {
        let body = json!({"winstrom": {"@version": "1.0"}});
        assert!(records(body, &invoices()).is_empty());
        assert!(records(Value::Null, &invoices()).is_empty());
    }

    #[test]
    fn test_wrap_record() {
        let mut record = Record::new();
        record.insert("kod".to_string(), json!("X"));
        let body = wrap_record(&invoices(), record);
        assert_eq!(body["winstrom"]["faktura-vydana"][0]["kod"], json!("X"));
    }

    #[test]
    fn test_write_body_success() {
        let body = json!({
            "winstrom": {
                "@version": "1.0",
                "success": "true",
                "stats": {"created": "1", "updated": "0", "deleted": "0", "skipped": "0", "failed": "0"},
                "results": [{"id": "123", "request-id": "X", "ref": "/c/demo/adresar/123.json"}]
            }
        });
        let write = WriteBody::parse(&body);
        assert!(write.succeeded());
        assert_eq!(write.first_id(), Some("123".to_string()));
    }

    #[test]
    fn test_write_body_failure() {
        let body = json!({
            "winstrom": {
                "success": "false",
                "results": [{"errors": [
                    {"message": "Value must be unique", "for": "kod"},
                    {"message": "Name is required"}
                ]}]
            }
        });
        let write = WriteBody::parse(&body);
        assert!(!write.succeeded());
        assert_eq!(
            write.failure_message(),
            "kod: Value must be unique; Name is required"
        );
        assert_eq!(
            error_message(&body).unwrap(),
            "kod: Value must be unique; Name is required"
        );
    }

    #[test]
    fn test_write_body_tolerates_empty_response() {
        let write = WriteBody::parse(&Value::Null);
        assert!(write.succeeded());
        assert_eq!(write.first_id(), None);
    }
}
