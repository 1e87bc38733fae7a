//! Wire and domain types for the DynamoDB JSON protocol.

mod attribute;
mod requests;
mod schema;

pub use attribute::{
    add_numbers, normalize_number, parse_number, values_equal, AttributeValue, Item,
    ScalarAttributeType,
};
pub use requests::{
    AttributeAction, AttributeValueUpdate, BatchGetItemRequest, BatchGetItemResponse,
    BatchWriteItemRequest, BatchWriteItemResponse, ComparisonOperator, Condition,
    ConsumedCapacity, CreateTableRequest, CreateTableResponse, DeleteItemRequest,
    DeleteItemResponse, DeleteRequest, DeleteTableRequest, DeleteTableResponse,
    DescribeTableRequest, DescribeTableResponse, ExpectedAttributeValue, GetItemRequest,
    GetItemResponse, KeysAndAttributes, ListTablesRequest, ListTablesResponse, PutItemRequest,
    PutItemResponse, PutRequest, QueryRequest, QueryResponse, ReturnConsumedCapacity,
    ReturnValues, ScanRequest, ScanResponse, Select, UpdateItemRequest, UpdateItemResponse,
    UpdateTableRequest, UpdateTableResponse, WriteRequest,
};
pub use schema::{
    AttributeDefinition, BillingMode, BillingModeSummary, KeySchemaElement, KeyType,
    LocalSecondaryIndex, LocalSecondaryIndexDescription, Projection, ProjectionType,
    ProvisionedThroughput, ProvisionedThroughputDescription, TableDescription, TableStatus,
};
