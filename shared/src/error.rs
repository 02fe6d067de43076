//! Domain error taxonomy shared by every component

use thiserror::Error;

/// Errors raised by domain rules, independent of transport or storage
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DomainError {
    /// Missing or malformed required field
    #[error("{field}: {message}")]
    Validation { field: String, message: String },

    /// Referenced entity does not exist
    #[error("{0} not found")]
    NotFound(String),

    /// Status change not permitted from the current state
    #[error("{entity} cannot move from '{from}' to '{to}'")]
    InvalidTransition {
        entity: &'static str,
        from: String,
        to: String,
    },

    /// The caller's base state is stale
    #[error("{entity} was modified concurrently (expected version {expected}, found {actual})")]
    Conflict {
        entity: &'static str,
        expected: i64,
        actual: i64,
    },

    /// A stock movement would take a location below zero
    #[error("insufficient stock for {sku} at {location}: available {available}, requested {requested}")]
    InsufficientStock {
        sku: String,
        location: String,
        available: i64,
        requested: i64,
    },
}

impl DomainError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        DomainError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        DomainError::NotFound(resource.into())
    }

    pub fn invalid_transition(
        entity: &'static str,
        from: impl std::fmt::Display,
        to: impl std::fmt::Display,
    ) -> Self {
        DomainError::InvalidTransition {
            entity,
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    /// Machine-readable code used on the wire
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::Validation { .. } => "VALIDATION_ERROR",
            DomainError::NotFound(_) => "NOT_FOUND",
            DomainError::InvalidTransition { .. } => "INVALID_STATE_TRANSITION",
            DomainError::Conflict { .. } => "CONFLICT",
            DomainError::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
        }
    }
}

pub type DomainResult<T> = Result<T, DomainError>;

/// Reject a mutation whose assumed base version is not the stored one.
///
/// `expected == None` means the caller did not send a version token.
pub fn check_version(entity: &'static str, expected: Option<i64>, actual: i64) -> DomainResult<()> {
    match expected {
        Some(expected) if expected != actual => Err(DomainError::Conflict {
            entity,
            expected,
            actual,
        }),
        _ => Ok(()),
    }
}
