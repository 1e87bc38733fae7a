//! dynamock_core - in-memory DynamoDB engine.
//!
//! Functional core of the dynamock project: wire types for the DynamoDB JSON
//! protocol, attribute value semantics, and the table/database operations.
//! Nothing in here performs I/O; the `dynamock` crate wraps it in an HTTP shell.

pub mod engine;
pub mod error;
pub mod model;
pub mod serde;

pub use engine::{Database, Table};
pub use error::{error_status_code, DynamockError, Result};
