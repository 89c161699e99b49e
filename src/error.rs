// src/error.rs
use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use serde_json::json;

// Bad input is ValidationError (400), an id that does not resolve in the
// caller's org is Reference (422), a missing or archived sale is NotFound
// (404). Each maps to a fixed status and machine-readable code below.
#[derive(Debug)]
pub enum AppError {
    DatabaseError(sqlx::Error),
    Unauthorized(String),
    NotFound(String),
    Reference(String),
    ValidationError(String),
    Conflict(String),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::ValidationError(msg.into())
    }

    pub fn reference(msg: impl Into<String>) -> Self {
        AppError::Reference(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        AppError::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        AppError::Conflict(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        AppError::Unauthorized(msg.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, error_message) = match self {
            AppError::DatabaseError(e) => {
                tracing::error!(error = %e, "Database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal",
                    "Database error occurred".to_string(),
                )
            }
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            AppError::Reference(msg) => (StatusCode::UNPROCESSABLE_ENTITY, "reference", msg),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, "validation", msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg),
        };

        let body = Json(json!({
            "error": error_message,
            "code": code,
        }));

        (status, body).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::DatabaseError(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kinds_map_to_distinct_statuses() {
        let cases = [
            (AppError::validation("bad"), StatusCode::BAD_REQUEST),
            (AppError::reference("dangling"), StatusCode::UNPROCESSABLE_ENTITY),
            (AppError::not_found("gone"), StatusCode::NOT_FOUND),
            (AppError::conflict("dup"), StatusCode::CONFLICT),
            (AppError::unauthorized("no"), StatusCode::UNAUTHORIZED),
        ];
        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }
}
