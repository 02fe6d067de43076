//! HTTP handlers
//!
//! Handlers validate the request shape, call one service operation and wrap
//! the result in the `{ success, data }` envelope.

use axum::{
    extract::{FromRequest, FromRequestParts},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use shared::ApiEnvelope;

use crate::error::{AppError, AppResult};
use crate::services::export::export_to_csv;

pub mod equipment;
pub mod exceptions;
pub mod health;
pub mod inbound;
pub mod inventory;
pub mod outbound;
pub mod quality;
pub mod transfers;
pub mod workforce;

pub use equipment::*;
pub use exceptions::*;
pub use health::*;
pub use inbound::*;
pub use inventory::*;
pub use outbound::*;
pub use quality::*;
pub use transfers::*;
pub use workforce::*;

/// JSON request body; decode failures answer with `VALIDATION_ERROR`
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);

/// Path parameters; a malformed id answers with `VALIDATION_ERROR`
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct PathParam<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct QueryParams<T>(pub T);

/// Handler result carrying the success envelope
pub type ApiResult<T> = AppResult<Json<ApiEnvelope<T>>>;

pub(crate) fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(ApiEnvelope::ok(data)))
}

/// `?format=csv` switch for list endpoints
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub format: Option<String>, // "json" or "csv"
}

impl ListQuery {
    pub fn wants_csv(&self) -> bool {
        self.format
            .as_deref()
            .map(|f| f.eq_ignore_ascii_case("csv"))
            .unwrap_or(false)
    }
}

/// Serve `rows` as a CSV attachment
pub(crate) fn csv_response<T: Serialize>(filename: &str, rows: &[T]) -> AppResult<Response> {
    let csv = export_to_csv(rows)?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        csv,
    )
        .into_response())
}
