//! JSON error responses

use aws_service_bridge_core::{BridgeError, ErrorKind};
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::error;
use serde::Serialize;

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

/// An error response: status code plus `{"error": <kind>, "message": <text>}`
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorBody,
}

impl ApiError {
    pub fn new(status: StatusCode, error: &str, message: impl ToString) -> Self {
        Self {
            status,
            body: ErrorBody {
                error: error.to_string(),
                message: message.to_string(),
            },
        }
    }

    pub fn not_configured(what: &str) -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "not_configured",
            format!("{what} is not configured on this server"),
        )
    }

    pub fn internal(message: impl ToString) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
    }
}

pub(crate) fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
        ErrorKind::OperationFailed => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::Transport => StatusCode::BAD_GATEWAY,
        ErrorKind::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::TimedOut => StatusCode::GATEWAY_TIMEOUT,
        ErrorKind::Configuration => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<BridgeError> for ApiError {
    fn from(err: BridgeError) -> Self {
        let kind = err.kind();
        Self::new(status_for(kind), kind.as_str(), err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            ErrorKind::InvalidInput.as_str(),
            rejection.body_text(),
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!("{} {}: {}", self.status, self.body.error, self.body.message);
        }
        (self.status, Json(self.body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_service_bridge_core::WaitError;
    use rstest::rstest;

    #[rstest]
    #[case(ErrorKind::InvalidInput, StatusCode::BAD_REQUEST)]
    #[case(ErrorKind::OperationFailed, StatusCode::UNPROCESSABLE_ENTITY)]
    #[case(ErrorKind::Transport, StatusCode::BAD_GATEWAY)]
    #[case(ErrorKind::Cancelled, StatusCode::SERVICE_UNAVAILABLE)]
    #[case(ErrorKind::TimedOut, StatusCode::GATEWAY_TIMEOUT)]
    #[case(ErrorKind::Configuration, StatusCode::INTERNAL_SERVER_ERROR)]
    fn test_status_for_kind(#[case] kind: ErrorKind, #[case] expected: StatusCode) {
        assert_eq!(status_for(kind), expected);
    }

    #[test]
    fn test_bridge_error_body() {
        let err = ApiError::from(BridgeError::from(WaitError::OperationFailed(
            "syntax error".to_string(),
        )));
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            err.body,
            ErrorBody {
                error: "operation_failed".to_string(),
                message: "Operation failed: syntax error".to_string(),
            }
        );
    }
}
