//! dynamock_client - list DynamoDB tables and read a table's status.
//!
//! Works against AWS or any DynamoDB-compatible endpoint, such as the
//! `dynamock` server.

pub mod cli;
pub mod config;
pub mod error;
pub mod output;
pub mod tables;

pub use config::{create_client, ConnectionConfig, EndpointOverride};
pub use error::{ClientError, Result};
pub use tables::{describe_table_status, list_table_names, TableSummary};
