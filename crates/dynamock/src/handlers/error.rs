use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use dynamock_core::{error_status_code, DynamockError};

use super::AMZ_JSON_CONTENT_TYPE;

/// A [`DynamockError`] rendered as a DynamoDB error response.
#[derive(Debug)]
pub struct ApiError(pub DynamockError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status_code = StatusCode::from_u16(error_status_code(&self.0))
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status_code.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        } else {
            tracing::debug!(error_type = self.0.error_name(), error = %self.0, "request rejected");
        }

        (
            status_code,
            [(header::CONTENT_TYPE, AMZ_JSON_CONTENT_TYPE)],
            self.0.to_body().to_string(),
        )
            .into_response()
    }
}

impl From<DynamockError> for ApiError {
    fn from(err: DynamockError) -> Self {
        Self(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    #[tokio::test]
    async fn test_not_found_renders_dynamodb_body() {
        let response = ApiError(DynamockError::table_not_found("users")).into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            AMZ_JSON_CONTENT_TYPE
        );

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            json["__type"],
            "com.amazonaws.dynamodb.v20120810#ResourceNotFoundException"
        );
    }

    #[test]
    fn test_internal_error_is_500() {
        let response = ApiError(DynamockError::Internal("boom".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
