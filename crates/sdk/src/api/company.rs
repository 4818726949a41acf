//! Company endpoint, used as a connectivity check.

use crate::client::AbraFlexiClient;
use crate::error::AbraFlexiResult;
use serde::Serialize;
use serde_json::Value;

/// Company API for checking the connection and credentials.
pub struct CompanyApi<'a> {
    client: &'a AbraFlexiClient,
}

impl<'a> CompanyApi<'a> {
    pub(crate) fn new(client: &'a AbraFlexiClient) -> Self {
        Self { client }
    }

    /// Fetch the configured company's descriptor.
    pub async fn info(&self) -> AbraFlexiResult<CompanyInfo> {
        let company = self.client.config().company.as_str();
        let document = format!("{}.json", company);
        let url = self.client.http.build_url(&["c", document.as_str()])?;

        let body = self.client.http.get_json(url, &[]).await?;
        Ok(CompanyInfo::from_body(company, &body))
    }
}

/// Basic facts about a company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompanyInfo {
    pub db_name: String,
    pub name: Option<String>,
    pub state: Option<String>,
}

impl CompanyInfo {
    fn from_body(company: &str, body: &Value) -> Self {
        let entry = match body.pointer("/companies/company") {
            Some(Value::Array(items)) => items.first(),
            other => other,
        };
        let field = |name: &str| {
            entry
                .and_then(|e| e.get(name))
                .and_then(Value::as_str)
                .map(str::to_string)
        };

        Self {
            db_name: field("dbNazev").unwrap_or_else(|| company.to_string()),
            name: field("nazev"),
            state: field("stavEnum"),
        }
    }
}
