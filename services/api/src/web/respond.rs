//! services/api/src/web/respond.rs
//!
//! Maps `PortError` values onto HTTP responses. Error bodies are always
//! `{ "message": ... }`.

use axum::http::StatusCode;
use axum::Json;
use readwell_core::ports::PortError;
use serde::Serialize;
use tracing::error;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct ErrorBody {
    pub message: String,
}

pub type ErrorResponse = (StatusCode, Json<ErrorBody>);

pub fn error_body(status: StatusCode, message: impl Into<String>) -> ErrorResponse {
    (
        status,
        Json(ErrorBody {
            message: message.into(),
        }),
    )
}

/// Validation -> 400, NotFound -> 404, Unauthorized -> 401, Upstream -> 503,
/// everything else -> 500 with the detail logged rather than leaked.
pub fn port_error(err: PortError) -> ErrorResponse {
    match err {
        PortError::Validation(message) => error_body(StatusCode::BAD_REQUEST, message),
        PortError::NotFound(message) => error_body(StatusCode::NOT_FOUND, message),
        PortError::Unauthorized => error_body(StatusCode::UNAUTHORIZED, "Unauthorized"),
        PortError::Upstream(message) => {
            error!("Upstream failure: {message}");
            error_body(
                StatusCode::SERVICE_UNAVAILABLE,
                "Catalog service is unavailable",
            )
        }
        PortError::Unexpected(message) => {
            error!("Unexpected failure: {message}");
            error_body(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error",
            )
        }
    }
}
