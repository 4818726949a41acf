//! API endpoint handles.

pub mod company;
pub mod evidence;

pub use company::CompanyApi;
pub use evidence::{ReadOnlyEvidence, ReadWriteEvidence};
