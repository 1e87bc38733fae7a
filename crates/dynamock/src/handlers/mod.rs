pub mod dispatch;
pub mod error;
pub mod health;

pub use error::ApiError;

/// Content type of every DynamoDB JSON 1.0 response.
pub const AMZ_JSON_CONTENT_TYPE: &str = "application/x-amz-json-1.0";
