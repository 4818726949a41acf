use serde::Serialize;

/// Caller-visible failure of a tool invocation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ToolError {
    /// A mutating tool was called while the server is read-only
    #[error("Permission denied: server is in read-only mode - write operations are not allowed")]
    ReadOnly,

    /// Missing or malformed arguments, rejected before reaching the remote server
    #[error("Invalid arguments: {0}")]
    Validation(String),

    /// The addressed record does not exist
    #[error("Record not found in {evidence}: {identifier}")]
    NotFound { evidence: String, identifier: String },

    /// Anything reported by the remote client (auth, network, server-side rejection)
    #[error("AbraFlexi request failed: {0}")]
    Remote(String),
}

/// Machine-readable failure kind carried in the failure envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    PermissionDenied,
    Validation,
    NotFound,
    Remote,
}

impl ToolError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Flatten a store error, keeping the whole context chain in the message.
    pub fn remote(err: anyhow::Error) -> Self {
        Self::Remote(format!("{:#}", err))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ReadOnly => ErrorKind::PermissionDenied,
            Self::Validation(_) => ErrorKind::Validation,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Remote(_) => ErrorKind::Remote,
        }
    }
}
