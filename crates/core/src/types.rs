use crate::error::ToolError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A row of an evidence: field name to value, passed through untouched.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Reserved prefix for addressing a record by its code.
pub const CODE_PREFIX: &str = "code:";

/// Name of a remote evidence (e.g. `faktura-vydana`, `adresar`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Evidence(String);

impl Evidence {
    /// Validate and wrap an evidence name.
    ///
    /// Only lowercase ASCII letters, digits and `-` are accepted, so the name
    /// can be embedded in a URL path as-is.
    pub fn new(name: impl Into<String>) -> Result<Self, ToolError> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(ToolError::validation("Evidence name must not be empty"));
        }
        if !trimmed
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(ToolError::validation(format!(
                "Invalid evidence name '{}': only lowercase letters, digits and '-' are allowed",
                trimmed
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Evidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Evidence {
    type Error = ToolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Evidence> for String {
    fn from(value: Evidence) -> Self {
        value.0
    }
}

/// How a single record is addressed on the remote server
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RecordId {
    Numeric(u64),
    Code(String),
}

impl RecordId {
    /// Build a code identifier, dropping a redundant `code:` prefix.
    pub fn code(code: impl Into<String>) -> Self {
        let code = code.into();
        match code.strip_prefix(CODE_PREFIX) {
            Some(stripped) => Self::Code(stripped.to_string()),
            None => Self::Code(code),
        }
    }

    /// Resolve the `id` / `kod` argument pair of update and delete tools.
    ///
    /// The numeric id wins when both are present; blank values count as absent.
    pub fn from_parts(id: Option<&str>, kod: Option<&str>) -> Result<Self, ToolError> {
        let id = id.map(str::trim).filter(|s| !s.is_empty());
        let kod = kod.map(str::trim).filter(|s| !s.is_empty());

        match (id, kod) {
            (Some(id), _) => parse_numeric_id(id).map(Self::Numeric),
            (None, Some(kod)) => {
                let id = Self::code(kod);
                if matches!(&id, Self::Code(c) if c.is_empty()) {
                    return Err(ToolError::validation("kod must not be empty"));
                }
                Ok(id)
            }
            (None, None) => Err(ToolError::validation("Either id or kod must be provided")),
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(id) => write!(f, "{}", id),
            Self::Code(code) => write!(f, "{}{}", CODE_PREFIX, code),
        }
    }
}

impl FromStr for RecordId {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.starts_with(CODE_PREFIX) {
            return Self::from_parts(None, Some(s));
        }
        parse_numeric_id(s).map(Self::Numeric)
    }
}

/// Parse a record id that must be a non-negative integer.
pub fn parse_numeric_id(raw: &str) -> Result<u64, ToolError> {
    raw.trim()
        .parse::<u64>()
        .map_err(|_| ToolError::validation(format!("Invalid record id '{}': expected a number", raw)))
}

/// Which fields the remote server returns per record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DetailLevel {
    Id,
    #[default]
    Summary,
    Full,
    Custom(Vec<String>),
}

impl fmt::Display for DetailLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id => f.write_str("id"),
            Self::Summary => f.write_str("summary"),
            Self::Full => f.write_str("full"),
            Self::Custom(fields) => write!(f, "custom:{}", fields.join(",")),
        }
    }
}

impl FromStr for DetailLevel {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s {
            "id" => Ok(Self::Id),
            "summary" | "" => Ok(Self::Summary),
            "full" => Ok(Self::Full),
            _ => {
                let Some(fields) = s.strip_prefix("custom:") else {
                    return Err(ToolError::validation(format!(
                        "Invalid detail level '{}': expected id, summary, full or custom:field1,field2",
                        s
                    )));
                };
                let fields: Vec<String> = fields
                    .split(',')
                    .map(str::trim)
                    .filter(|f| !f.is_empty())
                    .map(str::to_string)
                    .collect();
                if fields.is_empty() {
                    return Err(ToolError::validation(
                        "custom detail level needs at least one field",
                    ));
                }
                Ok(Self::Custom(fields))
            }
        }
    }
}

/// Structured filter, rendered to the remote filter syntax at the HTTP boundary
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    IdIn(Vec<u64>),
    CodeEq(String),
    NameLike(String),
    /// Caller-supplied expression, passed through verbatim
    Raw(String),
    And(Vec<Filter>),
}

impl Filter {
    /// Conjunction of the given filters; `None` when there is nothing to filter on.
    pub fn all(mut filters: Vec<Filter>) -> Option<Filter> {
        match filters.len() {
            0 => None,
            1 => filters.pop(),
            _ => Some(Filter::And(filters)),
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IdIn(ids) => {
                let ids: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
                write!(f, "id in ({})", ids.join(","))
            }
            Self::CodeEq(code) => write!(f, "kod='{}'", escape_literal(code)),
            Self::NameLike(name) => write!(f, "nazev like '*{}*'", escape_literal(name)),
            Self::Raw(expr) => f.write_str(expr),
            Self::And(parts) => {
                let parts: Vec<String> = parts.iter().map(|p| p.to_string()).collect();
                f.write_str(&parts.join(" AND "))
            }
        }
    }
}

fn escape_literal(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

/// Parameters of a list request against one evidence
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pub filter: Option<Filter>,
    pub detail: DetailLevel,
    pub limit: Option<u32>,
}

/// Result of inserting a record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertOutcome {
    /// Identifier assigned by the remote server, when it reported one
    pub id: Option<String>,
}
