use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use spaceout_core::CoreError;

#[derive(Debug)]
pub enum AppError {
    AuthenticationError(String),
    ValidationError(String),
    InsufficientFunds { requested: i64, available: i64 },
    PaymentRequired(String),
    ServiceUnavailable(String),
    InternalServerError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::AuthenticationError(msg) => (StatusCode::UNAUTHORIZED, json!({ "error": msg })),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            AppError::InsufficientFunds { requested, available } => (
                StatusCode::PAYMENT_REQUIRED,
                json!({
                    "error": "Insufficient budget",
                    "requested_minor": requested,
                    "available_minor": available,
                }),
            ),
            AppError::PaymentRequired(msg) => (StatusCode::PAYMENT_REQUIRED, json!({ "error": msg })),
            AppError::ServiceUnavailable(msg) => {
                tracing::error!("Store unavailable: {}", msg);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    json!({ "error": "Service temporarily unavailable, please retry", "retryable": true }),
                )
            }
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": "Internal Server Error" }))
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidParameter(msg) | CoreError::InvalidAmount(msg) => AppError::ValidationError(msg),
            CoreError::InsufficientFunds { requested, available } => {
                AppError::InsufficientFunds { requested, available }
            }
            CoreError::StoreUnavailable(msg) => AppError::ServiceUnavailable(msg),
            CoreError::NotAuthenticated => AppError::AuthenticationError("Sign in required".to_string()),
            CoreError::PaymentNotConfirmed(msg) => AppError::PaymentRequired(msg),
            CoreError::CorruptRecord(msg) => AppError::InternalServerError(msg),
        }
    }
}
