//! Client error taxonomy
//!
//! Server error codes map onto one variant each; anything that never reached
//! a well-formed answer is a network error.

use shared::{ApiErrorBody, DomainError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Validation error on {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid state transition: {0}")]
    InvalidTransition(String),

    /// The entity changed since it was loaded
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Insufficient stock: {0}")]
    InsufficientStock(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Unexpected response ({status}): {message}")]
    Unexpected { status: u16, message: String },
}

impl ClientError {
    /// Map a non-2xx response onto the taxonomy
    pub fn from_response(status: u16, body: &str) -> Self {
        let Ok(parsed) = serde_json::from_str::<ApiErrorBody>(body) else {
            return ClientError::Unexpected {
                status,
                message: body.chars().take(200).collect(),
            };
        };
        let detail = parsed.error;

        match detail.code.as_str() {
            "VALIDATION_ERROR" => ClientError::Validation {
                field: detail.field.unwrap_or_default(),
                message: detail.message,
            },
            "NOT_FOUND" => ClientError::NotFound(detail.message),
            "INVALID_STATE_TRANSITION" => ClientError::InvalidTransition(detail.message),
            "CONFLICT" => ClientError::Conflict(detail.message),
            "INSUFFICIENT_STOCK" => ClientError::InsufficientStock(detail.message),
            "UNAUTHORIZED" => ClientError::Unauthorized(detail.message),
            _ => ClientError::Unexpected {
                status,
                message: detail.message,
            },
        }
    }

    /// Whether retrying the same call later could succeed
    pub fn is_transient(&self) -> bool {
        match self {
            ClientError::Network(_) => true,
            ClientError::Unexpected { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl From<DomainError> for ClientError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation { field, message } => ClientError::Validation { field, message },
            DomainError::NotFound(resource) => ClientError::NotFound(resource),
            DomainError::InvalidTransition { .. } => ClientError::InvalidTransition(err.to_string()),
            DomainError::Conflict { .. } => ClientError::Conflict(err.to_string()),
            DomainError::InsufficientStock { .. } => ClientError::InsufficientStock(err.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for ClientError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let (field, message) = errors
            .field_errors()
            .into_iter()
            .next()
            .map(|(field, errs)| {
                let message = errs
                    .first()
                    .and_then(|e| e.message.as_ref())
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{} is invalid", field));
                (field.to_string(), message)
            })
            .unwrap_or_else(|| ("request".to_string(), "Invalid request".to_string()));
        ClientError::Validation { field, message }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_maps_server_codes() {
        let body = r#"{"success":false,"error":{"code":"INVALID_STATE_TRANSITION","message":"transfer cannot move from 'loading' to 'completed'"}}"#;
        assert!(matches!(
            ClientError::from_response(422, body),
            ClientError::InvalidTransition(_)
        ));

        let body = r#"{"success":false,"error":{"code":"VALIDATION_ERROR","message":"Notes are required","field":"notes"}}"#;
        match ClientError::from_response(400, body) {
            ClientError::Validation { field, .. } => assert_eq!(field, "notes"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_unparseable_body_is_unexpected() {
        let err = ClientError::from_response(502, "<html>Bad Gateway</html>");
        assert!(matches!(err, ClientError::Unexpected { status: 502, .. }));
        assert!(err.is_transient());
    }

    #[test]
    fn test_conflict_is_not_transient() {
        let body = r#"{"success":false,"error":{"code":"CONFLICT","message":"stale"}}"#;
        assert!(!ClientError::from_response(409, body).is_transient());
    }
}
