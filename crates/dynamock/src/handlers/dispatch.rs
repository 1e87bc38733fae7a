//! `POST /` - the DynamoDB JSON 1.0 entry point.
//!
//! The operation comes from the `X-Amz-Target` header
//! (`DynamoDB_20120810.<Operation>`); the body is that operation's request.

use std::str::FromStr;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::{de::DeserializeOwned, Serialize};
use uuid::Uuid;

use dynamock_core::model::{
    BatchGetItemRequest, BatchWriteItemRequest, CreateTableRequest, DeleteItemRequest,
    DeleteTableRequest, DescribeTableRequest, GetItemRequest, ListTablesRequest, PutItemRequest,
    QueryRequest, ScanRequest, UpdateItemRequest, UpdateTableRequest,
};
use dynamock_core::{DynamockError, Result};

use super::{ApiError, AMZ_JSON_CONTENT_TYPE};
use crate::state::AppState;

pub const TARGET_HEADER: &str = "x-amz-target";
pub const REQUEST_ID_HEADER: &str = "x-amzn-requestid";

/// Operations the mock understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    CreateTable,
    DescribeTable,
    DeleteTable,
    UpdateTable,
    ListTables,
    PutItem,
    GetItem,
    DeleteItem,
    UpdateItem,
    Query,
    Scan,
    BatchGetItem,
    BatchWriteItem,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::CreateTable => "CreateTable",
            Operation::DescribeTable => "DescribeTable",
            Operation::DeleteTable => "DeleteTable",
            Operation::UpdateTable => "UpdateTable",
            Operation::ListTables => "ListTables",
            Operation::PutItem => "PutItem",
            Operation::GetItem => "GetItem",
            Operation::DeleteItem => "DeleteItem",
            Operation::UpdateItem => "UpdateItem",
            Operation::Query => "Query",
            Operation::Scan => "Scan",
            Operation::BatchGetItem => "BatchGetItem",
            Operation::BatchWriteItem => "BatchWriteItem",
        }
    }

    /// Parses a full target such as `DynamoDB_20120810.ListTables`.
    ///
    /// Only the segment after the last `.` is significant.
    pub fn from_target(target: &str) -> Result<Self> {
        let name = target.rsplit('.').next().unwrap_or(target);
        name.parse()
    }
}

impl FromStr for Operation {
    type Err = DynamockError;

    fn from_str(s: &str) -> Result<Self> {
        let operation = match s {
            "CreateTable" => Operation::CreateTable,
            "DescribeTable" => Operation::DescribeTable,
            "DeleteTable" => Operation::DeleteTable,
            "UpdateTable" => Operation::UpdateTable,
            "ListTables" => Operation::ListTables,
            "PutItem" => Operation::PutItem,
            "GetItem" => Operation::GetItem,
            "DeleteItem" => Operation::DeleteItem,
            "UpdateItem" => Operation::UpdateItem,
            "Query" => Operation::Query,
            "Scan" => Operation::Scan,
            "BatchGetItem" => Operation::BatchGetItem,
            "BatchWriteItem" => Operation::BatchWriteItem,
            other => {
                return Err(DynamockError::UnknownOperation(format!(
                    "Unknown operation: {}",
                    other
                )))
            }
        };
        Ok(operation)
    }
}

/// POST / - Dispatch one DynamoDB API call.
pub async fn dispatch(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let mut response = match handle(&state, &headers, &body).await {
        Ok(json) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, AMZ_JSON_CONTENT_TYPE)],
            json,
        )
            .into_response(),
        Err(error) => ApiError(error).into_response(),
    };

    if let Ok(request_id) = HeaderValue::from_str(&Uuid::new_v4().to_string()) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(REQUEST_ID_HEADER), request_id);
    }
    response
}

async fn handle(state: &AppState, headers: &HeaderMap, body: &[u8]) -> Result<String> {
    let target = headers
        .get(TARGET_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| DynamockError::UnknownOperation("Missing X-Amz-Target header".to_string()))?;
    let operation = Operation::from_target(target)?;
    tracing::debug!(operation = operation.as_str(), "dispatching");

    match operation {
        Operation::CreateTable => {
            let request: CreateTableRequest = decode(body)?;
            tracing::debug!(table = %request.table_name, "CreateTable");
            encode(&state.db.write().await.create_table(&request, Utc::now())?)
        }
        Operation::DescribeTable => {
            let request: DescribeTableRequest = decode(body)?;
            tracing::debug!(table = %request.table_name, "DescribeTable");
            encode(&state.db.read().await.describe_table(&request, Utc::now())?)
        }
        Operation::DeleteTable => {
            let request: DeleteTableRequest = decode(body)?;
            tracing::debug!(table = %request.table_name, "DeleteTable");
            encode(&state.db.write().await.delete_table(&request, Utc::now())?)
        }
        Operation::UpdateTable => {
            let request: UpdateTableRequest = decode(body)?;
            tracing::debug!(table = %request.table_name, "UpdateTable");
            encode(&state.db.write().await.update_table(&request, Utc::now())?)
        }
        Operation::ListTables => {
            let request: ListTablesRequest = decode(body)?;
            encode(&state.db.read().await.list_tables(&request)?)
        }
        Operation::PutItem => {
            let request: PutItemRequest = decode(body)?;
            tracing::debug!(table = %request.table_name, "PutItem");
            encode(&state.db.write().await.put_item(&request)?)
        }
        Operation::GetItem => {
            let request: GetItemRequest = decode(body)?;
            tracing::debug!(table = %request.table_name, "GetItem");
            encode(&state.db.read().await.get_item(&request)?)
        }
        Operation::DeleteItem => {
            let request: DeleteItemRequest = decode(body)?;
            tracing::debug!(table = %request.table_name, "DeleteItem");
            encode(&state.db.write().await.delete_item(&request)?)
        }
        Operation::UpdateItem => {
            let request: UpdateItemRequest = decode(body)?;
            tracing::debug!(table = %request.table_name, "UpdateItem");
            encode(&state.db.write().await.update_item(&request)?)
        }
        Operation::Query => {
            let request: QueryRequest = decode(body)?;
            tracing::debug!(table = %request.table_name, "Query");
            encode(&state.db.read().await.query(&request)?)
        }
        Operation::Scan => {
            let request: ScanRequest = decode(body)?;
            tracing::debug!(table = %request.table_name, "Scan");
            encode(&state.db.read().await.scan(&request)?)
        }
        Operation::BatchGetItem => {
            let request: BatchGetItemRequest = decode(body)?;
            tracing::debug!(tables = request.request_items.len(), "BatchGetItem");
            encode(&state.db.read().await.batch_get_item(&request)?)
        }
        Operation::BatchWriteItem => {
            let request: BatchWriteItemRequest = decode(body)?;
            tracing::debug!(tables = request.request_items.len(), "BatchWriteItem");
            encode(&state.db.write().await.batch_write_item(&request)?)
        }
    }
}

/// Decodes a request body. An empty body is treated as `{}`.
fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    let body = if body.iter().all(u8::is_ascii_whitespace) {
        b"{}".as_slice()
    } else {
        body
    };
    serde_json::from_slice(body).map_err(|e| DynamockError::Serialization(e.to_string()))
}

fn encode<T: Serialize>(response: &T) -> Result<String> {
    serde_json::to_string(response).map_err(|e| DynamockError::Internal(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_from_target() {
        assert_eq!(
            Operation::from_target("DynamoDB_20120810.ListTables").unwrap(),
            Operation::ListTables
        );
        assert_eq!(
            Operation::from_target("BatchWriteItem").unwrap(),
            Operation::BatchWriteItem
        );
    }

    #[test]
    fn test_unknown_operation() {
        let err = Operation::from_target("DynamoDB_20120810.ExecuteStatement").unwrap_err();
        assert_eq!(err.error_name(), "UnknownOperationException");
    }

    #[test]
    fn test_decode_empty_body_as_empty_object() {
        let request: ListTablesRequest = decode(b"").unwrap();
        assert_eq!(request, ListTablesRequest::default());
    }

    #[test]
    fn test_decode_malformed_body() {
        let err = decode::<ListTablesRequest>(b"{not json").unwrap_err();
        assert!(matches!(err, DynamockError::Serialization(_)));
    }
}
