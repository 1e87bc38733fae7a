//! Shared server state.
//!
//! One [`Database`] behind a Tokio `RwLock`: read operations share the read
//! lock, anything that mutates a table takes the write lock.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;

use dynamock_core::model::{
    AttributeDefinition, CreateTableRequest, KeySchemaElement, ProvisionedThroughput,
    ScalarAttributeType,
};
use dynamock_core::Database;

use crate::config::Config;

/// Shared application state, cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<RwLock<Database>>,
    pub config: Config,
}

impl AppState {
    /// Empty database sized from `config`.
    pub fn new(config: Config) -> Self {
        Self::with_database(Database::new(config.max_list_tables), config)
    }

    pub fn with_database(db: Database, config: Config) -> Self {
        Self {
            db: Arc::new(RwLock::new(db)),
            config,
        }
    }

    /// Creates the database with one demo table per name.
    ///
    /// Each table has a string hash key `id` and 5/5 provisioned throughput.
    pub fn seeded(config: Config, table_names: &[String]) -> dynamock_core::Result<Self> {
        let mut db = Database::new(config.max_list_tables);
        for name in table_names {
            db.create_table(&seed_table_request(name), Utc::now())?;
        }
        Ok(Self::with_database(db, config))
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Config::from_env())
    }
}

fn seed_table_request(name: &str) -> CreateTableRequest {
    CreateTableRequest {
        table_name: name.to_string(),
        attribute_definitions: vec![AttributeDefinition::new("id", ScalarAttributeType::S)],
        key_schema: vec![KeySchemaElement::hash("id")],
        provisioned_throughput: Some(ProvisionedThroughput::new(5, 5)),
        billing_mode: None,
        local_secondary_indexes: vec![],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_seeded_creates_tables() {
        let state = AppState::seeded(
            Config::default(),
            &["bar".to_string(), "baz".to_string()],
        )
        .unwrap();

        assert_eq!(state.db.read().await.table_count(), 2);
    }

    #[test]
    fn test_seeded_rejects_invalid_name() {
        let result = AppState::seeded(Config::default(), &["x".to_string()]);
        assert!(result.is_err());
    }
}
