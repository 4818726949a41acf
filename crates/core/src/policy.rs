// Access policy: the process-wide read-only gate for mutating tools

use crate::error::ToolError;

/// Whether a tool only reads or also mutates remote records
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ToolAccess {
    Read,
    Write,
}

/// Read-only / read-write gate.
///
/// Built once at startup and never reconfigured; every write tool is checked
/// against it before anything is sent to the remote server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessGate {
    read_only: bool,
}

impl AccessGate {
    pub fn new(read_only: bool) -> Self {
        Self { read_only }
    }

    pub fn read_only() -> Self {
        Self::new(true)
    }

    pub fn read_write() -> Self {
        Self::new(false)
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Fail with [`ToolError::ReadOnly`] unless writes are allowed.
    pub fn check_write(&self) -> Result<(), ToolError> {
        if self.read_only {
            tracing::debug!("Write rejected by read-only gate");
            return Err(ToolError::ReadOnly);
        }
        Ok(())
    }

    /// Check a tool of the given access kind; reads always pass.
    pub fn check(&self, access: ToolAccess) -> Result<(), ToolError> {
        match access {
            ToolAccess::Read => Ok(()),
            ToolAccess::Write => self.check_write(),
        }
    }
}

impl Default for AccessGate {
    fn default() -> Self {
        Self::read_only()
    }
}

/// Interpret an environment toggle: `true`, `1` and `yes` (any case) are truthy.
pub fn parse_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes"
    )
}
