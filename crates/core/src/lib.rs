// Core types and functionality for the AbraFlexi MCP server

pub mod catalog;
pub mod error;
pub mod policy;
pub mod store;
pub mod types;

pub use error::{ErrorKind, ToolError};
pub use policy::{AccessGate, ToolAccess};
pub use store::RecordStore;

#[cfg(any(test, feature = "testing"))]
pub use store::InMemoryRecordStore;
pub use types::*;
