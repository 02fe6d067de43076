//! Inter-warehouse transfer HTTP handlers

use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Json,
};
use shared::{
    ApiEnvelope, CreateTransferRequest, TransferTelemetryRequest, UpdateTransferStatusRequest,
    WarehouseTransfer,
};
use uuid::Uuid;
use validator::Validate;

use super::{csv_response, ok, ApiResult, JsonBody, ListQuery, PathParam, QueryParams};
use crate::error::AppResult;
use crate::services::export::TransferCsvRow;
use crate::services::TransferService;
use crate::AppState;

/// List transfers as JSON or CSV
pub async fn list_transfers(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<ListQuery>,
) -> AppResult<Response> {
    let service = TransferService::new(state.db.clone());
    let transfers = service.list_transfers().await?;

    if query.wants_csv() {
        let rows: Vec<TransferCsvRow> = transfers.iter().map(TransferCsvRow::from).collect();
        return csv_response("transfers.csv", &rows);
    }
    Ok(Json(ApiEnvelope::ok(transfers)).into_response())
}

pub async fn create_transfer(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<CreateTransferRequest>,
) -> ApiResult<WarehouseTransfer> {
    input.validate()?;
    let service = TransferService::new(state.db.clone());
    ok(service.create_transfer(input).await?)
}

pub async fn update_transfer_status(
    State(state): State<AppState>,
    PathParam(transfer_id): PathParam<Uuid>,
    JsonBody(input): JsonBody<UpdateTransferStatusRequest>,
) -> ApiResult<WarehouseTransfer> {
    input.validate()?;
    let service = TransferService::new(state.db.clone());
    ok(service
        .update_status(transfer_id, input.status, input.expected_version)
        .await?)
}

/// Tracking feed for en-route transfers
pub async fn update_transfer_telemetry(
    State(state): State<AppState>,
    PathParam(transfer_id): PathParam<Uuid>,
    JsonBody(input): JsonBody<TransferTelemetryRequest>,
) -> ApiResult<WarehouseTransfer> {
    input.validate()?;
    let service = TransferService::new(state.db.clone());
    ok(service.update_telemetry(transfer_id, input).await?)
}
