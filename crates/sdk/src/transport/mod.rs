//! Transport layer for the AbraFlexi client.

pub mod http;

pub use http::HttpTransport;
