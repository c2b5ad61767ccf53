//! odmcp: public open-data APIs exposed as schema-described tools.
//!
//! Each provider wraps one upstream HTTP API. Tool arguments are validated
//! against a JSON schema generated from the input type, turned into a query
//! string, fetched, parsed into typed responses and rendered as text.

pub mod config;
pub mod error;
pub mod http;
pub mod providers;
pub mod query;
pub mod schema;
pub mod server;
pub mod tools;
pub mod types;

pub use error::{ToolError, ValidationErrors, Violation};
pub use tools::{Endpoint, Tool, ToolRegistry};
