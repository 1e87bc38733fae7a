//! dynamock - an in-memory DynamoDB mock server.
//!
//! Imperative shell around `dynamock_core`: an axum router that speaks the
//! DynamoDB JSON 1.0 protocol and keeps every table in memory.

pub mod app;
pub mod config;
pub mod handlers;
pub mod state;

pub use app::create_app;
pub use config::Config;
pub use state::AppState;
