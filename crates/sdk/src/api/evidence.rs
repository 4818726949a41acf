//! Evidence endpoints: read-only and read-write handles.

use crate::client::AbraFlexiClient;
use crate::error::{AbraFlexiError, AbraFlexiResult};
use crate::winstrom::{self, WriteBody};
use abraflexi_core::{DetailLevel, Evidence, InsertOutcome, Query, Record, RecordId};
use std::ops::Deref;
use tracing::debug;
use url::Url;

/// Read access to one evidence.
pub struct ReadOnlyEvidence<'a> {
    client: &'a AbraFlexiClient,
    evidence: Evidence,
}

impl<'a> ReadOnlyEvidence<'a> {
    pub(crate) fn new(client: &'a AbraFlexiClient, evidence: Evidence) -> Self {
        Self { client, evidence }
    }

    pub fn evidence(&self) -> &Evidence {
        &self.evidence
    }

    /// `/c/{company}/{evidence}.json`, or `/c/{company}/{evidence}/{item}.json`.
    fn url(&self, item: Option<&str>) -> AbraFlexiResult<Url> {
        let company = self.client.config().company.as_str();
        match item {
            None => {
                let collection = format!("{}.json", self.evidence);
                self.client
                    .http
                    .build_url(&["c", company, collection.as_str()])
            }
            Some(item) => {
                let item = format!("{}.json", item);
                self.client
                    .http
                    .build_url(&["c", company, self.evidence.as_str(), item.as_str()])
            }
        }
    }

    pub(crate) fn record_url(&self, id: &RecordId) -> AbraFlexiResult<Url> {
        self.url(Some(&id.to_string()))
    }

    pub(crate) fn collection_url(&self) -> AbraFlexiResult<Url> {
        self.url(None)
    }

    /// List records matching the query.
    pub async fn list(&self, query: &Query) -> AbraFlexiResult<Vec<Record>> {
        let url = match &query.filter {
            Some(filter) => self.url(Some(&format!("({})", filter)))?,
            None => self.collection_url()?,
        };

        let mut params = vec![("detail", query.detail.to_string())];
        if let Some(limit) = query.limit {
            params.push(("limit", limit.to_string()));
        }

        let body = self.client.http.get_json(url, &params).await?;
        let records = winstrom::records(body, &self.evidence);
        debug!(evidence = %self.evidence, count = records.len(), "Listed records");
        Ok(records)
    }

    /// Load a single record with all fields; `None` when it does not exist.
    pub async fn get(&self, id: &RecordId) -> AbraFlexiResult<Option<Record>> {
        let url = self.record_url(id)?;
        let params = [("detail", DetailLevel::Full.to_string())];

        match self.client.http.get_json(url, &params).await {
            Ok(body) => Ok(winstrom::records(body, &self.evidence).into_iter().next()),
            Err(AbraFlexiError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Read-write access to one evidence.
pub struct ReadWriteEvidence<'a> {
    read: ReadOnlyEvidence<'a>,
}

impl<'a> Deref for ReadWriteEvidence<'a> {
    type Target = ReadOnlyEvidence<'a>;

    fn deref(&self) -> &Self::Target {
        &self.read
    }
}

impl<'a> ReadWriteEvidence<'a> {
    pub(crate) fn new(client: &'a AbraFlexiClient, evidence: Evidence) -> Self {
        Self {
            read: ReadOnlyEvidence::new(client, evidence),
        }
    }

    /// Create a record and return the id assigned by the server.
    pub async fn insert(&self, record: Record) -> AbraFlexiResult<InsertOutcome> {
        let url = self.collection_url()?;
        let body = winstrom::wrap_record(self.evidence(), record);

        let response = self.read.client.http.put_json(url, &body).await?;
        let write = checked(&response)?;
        let id = write.first_id();
        debug!(evidence = %self.evidence(), id = ?id, "Inserted record");
        Ok(InsertOutcome { id })
    }

    /// Overwrite the given fields of an existing record.
    pub async fn update(&self, id: &RecordId, fields: Record) -> AbraFlexiResult<()> {
        let url = self.record_url(id)?;
        let body = winstrom::wrap_record(self.evidence(), fields);

        let response = self.read.client.http.put_json(url, &body).await?;
        checked(&response)?;
        debug!(evidence = %self.evidence(), id = %id, "Updated record");
        Ok(())
    }

    /// Delete a record.
    pub async fn delete(&self, id: &RecordId) -> AbraFlexiResult<()> {
        let url = self.record_url(id)?;

        let response = self.read.client.http.delete_json(url).await?;
        checked(&response)?;
        debug!(evidence = %self.evidence(), id = %id, "Deleted record");
        Ok(())
    }
}

/// A 2xx write response can still report `success: "false"`.
fn checked(response: &serde_json::Value) -> AbraFlexiResult<WriteBody> {
    let write = WriteBody::parse(response);
    if !write.succeeded() {
        return Err(AbraFlexiError::Api {
            status: 200,
            message: write.failure_message(),
        });
    }
    Ok(write)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Credentials, RetryConfig};
    use abraflexi_core::Filter;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> AbraFlexiClient {
        AbraFlexiClient::builder()
            .base_url(server.uri())
            .company("demo")
            .credentials(Credentials::Basic {
                login: "winstrom".to_string(),
                password: "winstrom".to_string(),
            })
            .retry_config(RetryConfig::no_retry())
            .build()
            .unwrap()
    }

    fn evidence(name: &str) -> Evidence {
        Evidence::new(name).unwrap()
    }

    fn invoices(count: usize) -> serde_json::Value {
        let items: Vec<_> = (1..=count)
            .map(|i| json!({"id": i.to_string(), "kod": format!("VF1-{:04}/2024", i)}))
            .collect();
        json!({"winstrom": {"@version": "1.0", "faktura-vydana": items}})
    }

    #[tokio::test]
    async fn test_list_with_limit_and_detail() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/c/demo/faktura-vydana.json"))
            .and(query_param("detail", "summary"))
            .and(query_param("limit", "5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(invoices(5)))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server);
        let query = Query {
            limit: Some(5),
            ..Default::default()
        };
        let records = client
            .read_only(evidence("faktura-vydana"))
            .list(&query)
            .await
            .unwrap();
        assert_eq!(records.len(), 5);
    }

    #[tokio::test]
    async fn test_list_empty_evidence() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/c/demo/faktura-vydana.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(invoices(0)))
            .mount(&server)
            .await;

        let records = client(&server)
            .read_only(evidence("faktura-vydana"))
            .list(&Query::default())
            .await
            .unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_list_with_filter_in_path() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/c/demo/adresar/(kod='ACME').json"))
            .and(query_param("detail", "full"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "winstrom": {"adresar": [{"id": "7", "kod": "ACME"}]}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let query = Query {
            filter: Some(Filter::CodeEq("ACME".to_string())),
            detail: DetailLevel::Full,
            limit: None,
        };
        let records = client(&server)
            .read_only(evidence("adresar"))
            .list(&query)
            .await
            .unwrap();
        assert_eq!(records[0]["kod"], json!("ACME"));
    }

    #[tokio::test]
    async fn test_get_by_code_and_missing() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/c/demo/cenik/code:WIDGET.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "winstrom": {"cenik": [{"id": "3", "kod": "WIDGET"}]}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/c/demo/cenik/99.json"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "winstrom": {"success": "false", "message": "Record not found"}
            })))
            .mount(&server)
            .await;

        let client = client(&server);
        let products = client.read_only(evidence("cenik"));

        let found = products.get(&RecordId::code("WIDGET")).await.unwrap().unwrap();
        assert_eq!(found["id"], json!("3"));

        assert!(products.get(&RecordId::Numeric(99)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_returns_remote_id() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/c/demo/adresar.json"))
            .and(body_json(json!({
                "winstrom": {"@version": "1.0", "adresar": [{"kod": "ACME", "nazev": "Acme"}]}
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "winstrom": {
                    "@version": "1.0",
                    "success": "true",
                    "results": [{"id": "101", "ref": "/c/demo/adresar/101.json"}]
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut record = Record::new();
        record.insert("kod".to_string(), json!("ACME"));
        record.insert("nazev".to_string(), json!("Acme"));

        let outcome = client(&server)
            .read_write(evidence("adresar"))
            .insert(record)
            .await
            .unwrap();
        assert_eq!(outcome.id.as_deref(), Some("101"));
    }

    #[tokio::test]
    async fn test_insert_validation_failure() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/c/demo/adresar.json"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "winstrom": {
                    "success": "false",
                    "results": [{"errors": [{"message": "Code must be unique", "for": "kod"}]}]
                }
            })))
            .mount(&server)
            .await;

        let result = client(&server)
            .read_write(evidence("adresar"))
            .insert(Record::new())
            .await;

        match result {
            Err(AbraFlexiError::Api { status, message }) => {
                assert_eq!(status, 400);
                assert_eq!(message, "kod: Code must be unique");
            }
            other => panic!("Expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_success_false_in_2xx_is_error() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/c/demo/cenik/code:X.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "winstrom": {"success": "false", "message": "Locked record"}
            })))
            .mount(&server)
            .await;

        let result = client(&server)
            .read_write(evidence("cenik"))
            .update(&RecordId::code("X"), Record::new())
            .await;
        assert!(matches!(result, Err(AbraFlexiError::Api { message, .. }) if message == "Locked record"));
    }

    #[tokio::test]
    async fn test_update_and_delete_address_record() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/c/demo/faktura-vydana/12.json"))
            .and(body_json(json!({
                "winstrom": {"@version": "1.0", "faktura-vydana": [{"popis": "Updated"}]}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "winstrom": {"success": "true", "results": [{"id": "12"}]}
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/c/demo/faktura-vydana/12.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "winstrom": {"success": "true"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server);
        let invoices = client.read_write(evidence("faktura-vydana"));

        let mut fields = Record::new();
        fields.insert("popis".to_string(), json!("Updated"));
        invoices.update(&RecordId::Numeric(12), fields).await.unwrap();
        invoices.delete(&RecordId::Numeric(12)).await.unwrap();
    }
}
