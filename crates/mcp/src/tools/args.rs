// Tool argument shapes and their translation into queries and records

use abraflexi_core::{
    parse_numeric_id, DetailLevel, Filter, Query, Record, RecordId, ToolError, CODE_PREFIX,
};
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};

/// Deserialize tool arguments; a missing `arguments` object counts as `{}`.
pub fn parse<T: DeserializeOwned>(tool: &str, arguments: Value) -> Result<T, ToolError> {
    let arguments = match arguments {
        Value::Null => Value::Object(Map::new()),
        other => other,
    };
    serde_json::from_value(arguments).map_err(|e| ToolError::validation(format!("{}: {}", tool, e)))
}

/// Record id as sent by clients: `12` or `"12"`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum IdArg {
    Number(u64),
    Text(String),
}

impl IdArg {
    pub fn as_text(&self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s.clone(),
        }
    }

    pub fn numeric(&self) -> Result<u64, ToolError> {
        match self {
            Self::Number(n) => Ok(*n),
            Self::Text(s) => parse_numeric_id(s),
        }
    }
}

/// Lookup criteria a typed evidence accepts besides `ids`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Criteria {
    pub code: bool,
    pub name: bool,
}

/// Arguments of the typed `*_get` tools
#[derive(Debug, Default, Deserialize)]
pub struct LookupArgs {
    pub ids: Option<Vec<IdArg>>,
    pub kod: Option<String>,
    pub nazev: Option<String>,
    pub limit: Option<u32>,
    pub detail: Option<String>,
}

impl LookupArgs {
    /// AND together every non-empty criterion the evidence supports.
    pub fn into_query(self, criteria: Criteria) -> Result<Query, ToolError> {
        let mut filters = Vec::new();

        if let Some(ids) = id_filter(self.ids.as_deref())? {
            filters.push(ids);
        }
        if criteria.code {
            if let Some(kod) = non_blank(self.kod) {
                filters.push(Filter::CodeEq(strip_code_prefix(&kod).to_string()));
            }
        }
        if criteria.name {
            if let Some(nazev) = non_blank(self.nazev) {
                filters.push(Filter::NameLike(nazev));
            }
        }

        Ok(Query {
            filter: Filter::all(filters),
            detail: detail(self.detail.as_deref())?,
            limit: limit(self.limit),
        })
    }
}

/// Arguments of `evidence_get`
#[derive(Debug, Deserialize)]
pub struct EvidenceLookupArgs {
    pub evidence: String,
    pub ids: Option<Vec<IdArg>>,
    pub filter_expr: Option<String>,
    pub limit: Option<u32>,
    pub detail: Option<String>,
}

impl EvidenceLookupArgs {
    /// `ids` take precedence over a raw filter expression.
    pub fn query(&self) -> Result<Query, ToolError> {
        let filter = match id_filter(self.ids.as_deref())? {
            Some(ids) => Some(ids),
            None => non_blank(self.filter_expr.clone()).map(Filter::Raw),
        };

        Ok(Query {
            filter,
            detail: detail(self.detail.as_deref())?,
            limit: limit(self.limit),
        })
    }
}

/// `id` / `kod` / `data` of the update and delete tools
#[derive(Debug, Default, Deserialize)]
pub struct RecordRefArgs {
    pub id: Option<IdArg>,
    pub kod: Option<String>,
    pub data: Option<Record>,
}

impl RecordRefArgs {
    pub fn identifier(&self) -> Result<RecordId, ToolError> {
        let id = self.id.as_ref().map(IdArg::as_text);
        RecordId::from_parts(id.as_deref(), self.kod.as_deref())
    }

    /// Fields to overwrite; an update with nothing to change is rejected.
    pub fn fields(self) -> Result<Record, ToolError> {
        match self.data {
            Some(data) if !data.is_empty() => Ok(data),
            _ => Err(ToolError::validation(
                "data must contain at least one field to update",
            )),
        }
    }
}

/// Same as [`RecordRefArgs`], addressed to a caller-chosen evidence
#[derive(Debug, Deserialize)]
pub struct EvidenceRecordArgs {
    pub evidence: String,
    pub id: Option<IdArg>,
    pub kod: Option<String>,
    pub data: Option<Record>,
}

impl EvidenceRecordArgs {
    pub fn split(self) -> (String, RecordRefArgs) {
        let record = RecordRefArgs {
            id: self.id,
            kod: self.kod,
            data: self.data,
        };
        (self.evidence, record)
    }
}

pub fn id_filter(ids: Option<&[IdArg]>) -> Result<Option<Filter>, ToolError> {
    match ids {
        None | Some([]) => Ok(None),
        Some(ids) => {
            let ids = ids
                .iter()
                .map(IdArg::numeric)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Some(Filter::IdIn(ids)))
        }
    }
}

pub fn detail(raw: Option<&str>) -> Result<DetailLevel, ToolError> {
    raw.map(|s| s.parse::<DetailLevel>())
        .transpose()
        .map(Option::unwrap_or_default)
}

/// `0` means no limit.
pub fn limit(raw: Option<u32>) -> Option<u32> {
    raw.filter(|l| *l > 0)
}

/// A `YYYY-MM-DD` date, normalized.
pub fn date(field: &str, value: &str) -> Result<String, ToolError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map(|d| d.format("%Y-%m-%d").to_string())
        .map_err(|_| {
            ToolError::validation(format!(
                "{} must be a date in YYYY-MM-DD format, got '{}'",
                field, value
            ))
        })
}

pub fn required(field: &str, value: String) -> Result<String, ToolError> {
    non_blank(Some(value)).ok_or_else(|| ToolError::validation(format!("{} must not be empty", field)))
}

pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn strip_code_prefix(kod: &str) -> &str {
    kod.strip_prefix(CODE_PREFIX).unwrap_or(kod)
}

/// `extra_fields` go in last and win over the named parameters.
pub fn merge_extra(record: &mut Record, extra: Option<Record>) {
    if let Some(extra) = extra {
        record.extend(extra);
    }
}
