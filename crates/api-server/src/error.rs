//! HTTP error responses

use axum::{http::StatusCode, Json};
use serde::Serialize;
use tracing::error;

use tasknest_core::Error;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub type RouteError = (StatusCode, Json<ErrorResponse>);

pub fn route_error(status: StatusCode, error: impl Into<String>) -> RouteError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
}

pub fn unauthorized(error: impl Into<String>) -> RouteError {
    route_error(StatusCode::UNAUTHORIZED, error)
}

pub fn status_for(err: &Error) -> StatusCode {
    match err {
        Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
        Error::NotSignedIn | Error::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        Error::TaskNotFound(_) => StatusCode::NOT_FOUND,
        Error::InvalidTransition { .. } | Error::Conflict(_) => StatusCode::CONFLICT,
        Error::Storage(_) | Error::Io(_) | Error::Serialization(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Map a core error onto a JSON error response
pub fn core_error(err: Error) -> RouteError {
    let status = status_for(&err);
    if status.is_server_error() {
        error!("request failed: {}", err);
    }
    route_error(status, err.to_string())
}
