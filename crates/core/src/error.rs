use thiserror::Error;

/// Namespace prefix DynamoDB puts in front of exception names in `__type`.
pub const ERROR_TYPE_PREFIX: &str = "com.amazonaws.dynamodb.v20120810#";

/// Errors returned by engine operations.
///
/// Each variant corresponds to a DynamoDB exception name so that SDK clients
/// can match on the error code they already know.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DynamockError {
    #[error("{0}")]
    Validation(String),
    #[error("Requested resource not found: Table: {table_name} not found")]
    ResourceNotFound { table_name: String },
    #[error("Table already exists: {table_name}")]
    ResourceInUse { table_name: String },
    #[error("The conditional request failed")]
    ConditionalCheckFailed,
    #[error("{0}")]
    Serialization(String),
    #[error("{0}")]
    UnknownOperation(String),
    #[error("{0}")]
    Internal(String),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, DynamockError>;

impl DynamockError {
    /// Shorthand for a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Shorthand for a missing table.
    pub fn table_not_found(table_name: impl Into<String>) -> Self {
        Self::ResourceNotFound {
            table_name: table_name.into(),
        }
    }

    /// The DynamoDB exception name for this error.
    pub fn error_name(&self) -> &'static str {
        match self {
            DynamockError::Validation(_) => "ValidationException",
            DynamockError::ResourceNotFound { .. } => "ResourceNotFoundException",
            DynamockError::ResourceInUse { .. } => "ResourceInUseException",
            DynamockError::ConditionalCheckFailed => "ConditionalCheckFailedException",
            DynamockError::Serialization(_) => "SerializationException",
            DynamockError::UnknownOperation(_) => "UnknownOperationException",
            DynamockError::Internal(_) => "InternalServerError",
        }
    }

    /// The fully qualified `__type` value sent on the wire.
    pub fn error_type(&self) -> String {
        format!("{}{}", ERROR_TYPE_PREFIX, self.error_name())
    }

    /// JSON error body in the shape the DynamoDB JSON protocol uses.
    pub fn to_body(&self) -> serde_json::Value {
        serde_json::json!({
            "__type": self.error_type(),
            "message": self.to_string(),
        })
    }
}

/// Maps a [`DynamockError`] to an HTTP status code.
///
/// DynamoDB reports every client-side fault as 400 and reserves 500 for
/// internal errors.
///
/// # Examples
///
/// ```
/// use dynamock_core::{error_status_code, DynamockError};
///
/// let error = DynamockError::table_not_found("users");
/// assert_eq!(error_status_code(&error), 400);
/// ```
pub fn error_status_code(error: &DynamockError) -> u16 {
    match error {
        DynamockError::Validation(_)
        | DynamockError::ResourceNotFound { .. }
        | DynamockError::ResourceInUse { .. }
        | DynamockError::ConditionalCheckFailed
        | DynamockError::Serialization(_)
        | DynamockError::UnknownOperation(_) => 400,
        DynamockError::Internal(_) => 500,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_not_found_display() {
        let error = DynamockError::table_not_found("users");
        assert_eq!(
            error.to_string(),
            "Requested resource not found: Table: users not found"
        );
    }

    #[test]
    fn test_resource_in_use_display() {
        let error = DynamockError::ResourceInUse {
            table_name: "users".to_string(),
        };
        assert_eq!(error.to_string(), "Table already exists: users");
    }

    #[test]
    fn test_error_type_is_namespaced() {
        assert_eq!(
            DynamockError::ConditionalCheckFailed.error_type(),
            "com.amazonaws.dynamodb.v20120810#ConditionalCheckFailedException"
        );
    }

    #[test]
    fn test_to_body_shape() {
        let body = DynamockError::validation("bad key").to_body();
        assert_eq!(
            body["__type"],
            "com.amazonaws.dynamodb.v20120810#ValidationException"
        );
        assert_eq!(body["message"], "bad key");
    }

    #[test]
    fn test_client_errors_map_to_400() {
        assert_eq!(error_status_code(&DynamockError::validation("x")), 400);
        assert_eq!(error_status_code(&DynamockError::table_not_found("t")), 400);
        assert_eq!(
            error_status_code(&DynamockError::UnknownOperation("Nope".to_string())),
            400
        );
    }

    #[test]
    fn test_internal_maps_to_500() {
        let error = DynamockError::Internal("lock poisoned".to_string());
        assert_eq!(error_status_code(&error), 500);
        assert_eq!(error.error_name(), "InternalServerError");
    }
}
