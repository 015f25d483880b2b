use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use yatra_core::CoreError;
use yatra_order::WebhookError;

#[derive(Debug)]
pub enum AppError {
    ValidationError(String),
    AuthenticationError(String),
    NotFoundError(String),
    /// Gateway detail is logged, never returned.
    PaymentCreationFailed(String),
    VerificationFailed(String),
    InternalServerError(String),
    Anyhow(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::AuthenticationError(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::PaymentCreationFailed(msg) => {
                tracing::error!("Payment creation failed: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Payment creation failed".to_string())
            }
            AppError::VerificationFailed(msg) => {
                tracing::error!("Payment verification failed: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Failed to verify payment".to_string())
            }
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
            AppError::Anyhow(err) => {
                tracing::error!("Internal Server Error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ValidationError(msg) => AppError::ValidationError(msg),
            CoreError::PaymentCreationFailed(e) => AppError::PaymentCreationFailed(e.to_string()),
            CoreError::VerificationFailed(e) => AppError::VerificationFailed(e.to_string()),
            CoreError::RandomSourceUnavailable(msg) => AppError::PaymentCreationFailed(msg),
        }
    }
}

impl From<WebhookError> for AppError {
    fn from(err: WebhookError) -> Self {
        match err {
            WebhookError::Malformed(msg) => AppError::ValidationError(msg),
            other => AppError::AuthenticationError(other.to_string()),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::ValidationError(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::ValidationError(rejection.body_text())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Anyhow(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yatra_core::GatewayError;

    #[test]
    fn test_gateway_detail_not_exposed() {
        let err: AppError = CoreError::PaymentCreationFailed(GatewayError::Status {
            status: 401,
            message: "authentication Failed".to_string(),
        })
        .into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_webhook_error_status() {
        let unauthorized = AppError::from(WebhookError::InvalidSignature).into_response();
        assert_eq!(unauthorized.status(), StatusCode::UNAUTHORIZED);

        let malformed = AppError::from(WebhookError::Malformed("eof".into())).into_response();
        assert_eq!(malformed.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_validation_is_bad_request() {
        let response =
            AppError::from(CoreError::ValidationError("ticketCount must be at least 1".into()))
                .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
