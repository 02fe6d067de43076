//! Error handling for the Warehouse Operations Platform
//!
//! Every failure is answered with the `{ success: false, error }` body; the
//! code tells clients which error kind occurred.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use shared::{ApiErrorBody, ApiErrorDetail, DomainError};
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    // Validation errors
    #[error("Validation error: {message}")]
    Validation { field: String, message: String },

    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    #[error("Conflict: {message}")]
    Conflict { resource: String, message: String },

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Business logic errors
    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    #[error("Insufficient stock: {0}")]
    InsufficientStock(String),

    // External service errors
    #[error("External service error: {0}")]
    ExternalService(String),

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    fn status_and_detail(&self) -> (StatusCode, ApiErrorDetail) {
        let detail = |code: &str, message: String, field: Option<String>| ApiErrorDetail {
            code: code.to_string(),
            message,
            field,
        };

        match self {
            AppError::Unauthorized(message) => (
                StatusCode::UNAUTHORIZED,
                detail("UNAUTHORIZED", message.clone(), None),
            ),
            AppError::Validation { field, message } => (
                StatusCode::BAD_REQUEST,
                detail("VALIDATION_ERROR", message.clone(), Some(field.clone())),
            ),
            AppError::DuplicateEntry(field) => (
                StatusCode::CONFLICT,
                detail(
                    "CONFLICT",
                    format!("A record with this {} already exists", field),
                    Some(field.clone()),
                ),
            ),
            AppError::Conflict { resource, message } => (
                StatusCode::CONFLICT,
                detail("CONFLICT", message.clone(), Some(resource.clone())),
            ),
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                detail("NOT_FOUND", format!("{} not found", resource), None),
            ),
            AppError::InvalidStateTransition(message) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                detail("INVALID_STATE_TRANSITION", message.clone(), None),
            ),
            AppError::InsufficientStock(message) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                detail("INSUFFICIENT_STOCK", message.clone(), None),
            ),
            AppError::ExternalService(_) => (
                StatusCode::BAD_GATEWAY,
                detail(
                    "EXTERNAL_SERVICE_ERROR",
                    "An upstream service failed".to_string(),
                    None,
                ),
            ),
            AppError::DatabaseError(_) | AppError::Internal(_) | AppError::InternalError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                detail(
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                    None,
                ),
            ),
        }
    }
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        let message = err.to_string();
        match err {
            DomainError::Validation { field, message } => AppError::Validation { field, message },
            DomainError::NotFound(resource) => AppError::NotFound(resource),
            DomainError::InvalidTransition { .. } => AppError::InvalidStateTransition(message),
            DomainError::Conflict { entity, .. } => AppError::Conflict {
                resource: entity.to_string(),
                message,
            },
            DomainError::InsufficientStock { .. } => AppError::InsufficientStock(message),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
        fields.sort_by(|a, b| a.0.cmp(b.0));

        match fields.first() {
            Some((field, errs)) => {
                let message = errs
                    .first()
                    .and_then(|e| e.message.as_ref().map(|m| m.to_string()))
                    .unwrap_or_else(|| format!("{} is invalid", field));
                AppError::validation(field.to_string(), message)
            }
            None => AppError::validation("body", "Request is invalid"),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!("Rejected request body: {}", rejection.body_text());
        let message = match rejection {
            JsonRejection::JsonDataError(_) => "Request body does not match the expected fields and types",
            JsonRejection::JsonSyntaxError(_) => "Request body is not valid JSON",
            JsonRejection::MissingJsonContentType(_) => "Expected request with `Content-Type: application/json`",
            _ => "Request body could not be read",
        };
        AppError::validation("body", message)
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        tracing::debug!("Rejected path parameters: {}", rejection.body_text());
        AppError::validation("path", "Path parameter is malformed")
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        tracing::debug!("Rejected query string: {}", rejection.body_text());
        AppError::validation("query", "Query string is malformed")
    }
}

/// Maps unique-key violations to a conflict on the violated constraint
pub fn map_unique_violation(err: sqlx::Error, field: &str) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::DuplicateEntry(field.to_string())
        }
        _ => AppError::DatabaseError(err),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_detail) = self.status_and_detail();

        if status.is_server_error() {
            tracing::error!("Error: {:?}", self);
        } else {
            tracing::warn!(code = %error_detail.code, "Request rejected: {}", self);
        }

        (
            status,
            Json(ApiErrorBody {
                success: false,
                error: error_detail,
            }),
        )
            .into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_errors_map_to_distinct_statuses() {
        let cases = vec![
            (DomainError::validation("sku", "sku is required"), StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            (DomainError::not_found("GRN"), StatusCode::NOT_FOUND, "NOT_FOUND"),
            (
                DomainError::invalid_transition("transfer", "loading", "completed"),
                StatusCode::UNPROCESSABLE_ENTITY,
                "INVALID_STATE_TRANSITION",
            ),
            (
                DomainError::Conflict {
                    entity: "GRN",
                    expected: 1,
                    actual: 2,
                },
                StatusCode::CONFLICT,
                "CONFLICT",
            ),
            (
                DomainError::InsufficientStock {
                    sku: "SKU-1".to_string(),
                    location: "A-01".to_string(),
                    available: 1,
                    requested: 2,
                },
                StatusCode::UNPROCESSABLE_ENTITY,
                "INSUFFICIENT_STOCK",
            ),
        ];

        for (domain, status, code) in cases {
            let (actual_status, detail) = AppError::from(domain).status_and_detail();
            assert_eq!(actual_status, status);
            assert_eq!(detail.code, code);
        }
    }

    #[test]
    fn test_validation_error_names_field() {
        let (_, detail) = AppError::from(DomainError::validation("notes", "notes is required"))
            .status_and_detail();
        assert_eq!(detail.field.as_deref(), Some("notes"));
    }

    #[test]
    fn test_internal_errors_hide_details() {
        let (status, detail) = AppError::Internal("connection reset by peer".to_string())
            .status_and_detail();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!detail.message.contains("peer"));
    }
}
