//! # AbraFlexi SDK
//!
//! Minimal async client for the AbraFlexi REST API.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use abraflexi_core::{Evidence, Query};
//! use abraflexi_sdk::{AbraFlexiClient, AbraFlexiResult};
//!
//! #[tokio::main]
//! async fn main() -> AbraFlexiResult<()> {
//!     let client = AbraFlexiClient::builder()
//!         .base_url("https://demo.flexibee.eu:5434")
//!         .company("demo")
//!         .basic_auth("winstrom", "winstrom")
//!         .build()?;
//!
//!     // Check the connection
//!     let company = client.company().info().await?;
//!     println!("Connected to {}", company.db_name);
//!
//!     // List a few contacts
//!     let contacts = Evidence::new("adresar").expect("valid evidence name");
//!     let query = Query { limit: Some(5), ..Default::default() };
//!     let records = client.read_only(contacts).list(&query).await?;
//!     println!("Found {} contacts", records.len());
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod store;
pub mod transport;
pub mod winstrom;

// Re-export main client
pub use client::{AbraFlexiClient, AbraFlexiClientBuilder};
pub use config::{ClientConfig, Credentials, RetryConfig};
pub use error::{AbraFlexiError, AbraFlexiResult};

pub use api::company::CompanyInfo;
