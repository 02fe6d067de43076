//! Common types used across the platform

use serde::{Deserialize, Serialize};

/// Success envelope returned by every backend endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiEnvelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// A response body that is either wrapped in [`ApiEnvelope`] or bare.
///
/// Consumers must accept both shapes.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ApiPayload<T> {
    Envelope(ApiEnvelope<T>),
    Bare(T),
}

impl<T> ApiPayload<T> {
    pub fn into_data(self) -> T {
        match self {
            ApiPayload::Envelope(envelope) => envelope.data,
            ApiPayload::Bare(data) => data,
        }
    }
}

/// Error body returned on any failed request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiErrorBody {
    pub success: bool,
    pub error: ApiErrorDetail,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

/// An entity that can be merged into a client cache by key and version
pub trait Versioned {
    type Key: Ord + Clone + std::fmt::Debug;

    fn key(&self) -> Self::Key;

    /// Monotonic write counter; append-only records stay at 1
    fn version(&self) -> i64 {
        1
    }
}

/// Result of a bulk SKU import
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_accepts_envelope() {
        let payload: ApiPayload<Vec<i32>> =
            serde_json::from_str(r#"{"success":true,"data":[1,2,3]}"#).unwrap();
        assert_eq!(payload.into_data(), vec![1, 2, 3]);
    }

    #[test]
    fn test_payload_accepts_bare_array() {
        let payload: ApiPayload<Vec<i32>> = serde_json::from_str("[4,5]").unwrap();
        assert_eq!(payload.into_data(), vec![4, 5]);
    }

    #[test]
    fn test_payload_accepts_bare_object() {
        let payload: ApiPayload<ImportSummary> =
            serde_json::from_str(r#"{"imported":3,"skipped":1}"#).unwrap();
        assert_eq!(
            payload.into_data(),
            ImportSummary {
                imported: 3,
                skipped: 1
            }
        );
    }

    #[test]
    fn test_error_body_is_not_a_payload() {
        let body = r#"{"success":false,"error":{"code":"NOT_FOUND","message":"GRN not found"}}"#;
        assert!(serde_json::from_str::<ApiPayload<Vec<i32>>>(body).is_err());
        let error: ApiErrorBody = serde_json::from_str(body).unwrap();
        assert_eq!(error.error.code, "NOT_FOUND");
        assert_eq!(error.error.field, None);
    }
}
