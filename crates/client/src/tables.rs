//! Table listing and status lookup.

use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::TableStatus;
use aws_sdk_dynamodb::Client;
use serde::Serialize;

use crate::error::{ClientError, Result};

/// What the client reports about one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableSummary {
    pub name: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_count: Option<i64>,
}

/// Lists every table name, following `LastEvaluatedTableName` across pages.
pub async fn list_table_names(client: &Client) -> Result<Vec<String>> {
    let mut names = Vec::new();
    let mut start: Option<String> = None;

    loop {
        let output = client
            .list_tables()
            .set_exclusive_start_table_name(start.take())
            .send()
            .await
            .map_err(|err| ClientError::Sdk(DisplayErrorContext(&err).to_string()))?;

        names.extend(output.table_names().iter().cloned());
        tracing::debug!(count = names.len(), "listed table page");

        match output.last_evaluated_table_name() {
            Some(last) => start = Some(last.to_string()),
            None => break,
        }
    }

    Ok(names)
}

/// Reads the status of one table.
pub async fn describe_table_status(client: &Client, table_name: &str) -> Result<TableSummary> {
    if table_name.is_empty() {
        return Err(ClientError::InvalidInput(
            "table name must not be empty".to_string(),
        ));
    }

    let output = match client.describe_table().table_name(table_name).send().await {
        Ok(output) => output,
        Err(err) => {
            let not_found = err
                .as_service_error()
                .is_some_and(|e| e.is_resource_not_found_exception());
            return Err(if not_found {
                ClientError::TableNotFound {
                    table: table_name.to_string(),
                }
            } else {
                ClientError::Sdk(DisplayErrorContext(&err).to_string())
            });
        }
    };

    let table = output
        .table()
        .ok_or_else(|| ClientError::Sdk("DescribeTable returned no table".to_string()))?;

    Ok(TableSummary {
        name: table.table_name().unwrap_or(table_name).to_string(),
        status: status_label(table.table_status()).to_string(),
        item_count: table.item_count(),
    })
}

/// Wire name of a table status, `UNKNOWN` when absent or unrecognised.
pub fn status_label(status: Option<&TableStatus>) -> &'static str {
    match status {
        Some(TableStatus::Active) => "ACTIVE",
        Some(TableStatus::Creating) => "CREATING",
        Some(TableStatus::Updating) => "UPDATING",
        Some(TableStatus::Deleting) => "DELETING",
        Some(TableStatus::Archiving) => "ARCHIVING",
        Some(TableStatus::Archived) => "ARCHIVED",
        Some(TableStatus::InaccessibleEncryptionCredentials) => {
            "INACCESSIBLE_ENCRYPTION_CREDENTIALS"
        }
        _ => "UNKNOWN",
    }
}
