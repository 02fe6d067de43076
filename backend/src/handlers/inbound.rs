//! Receiving HTTP handlers: GRNs and dock slots

use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Json,
};
use shared::{
    ApiEnvelope, CreateGrnRequest, DockSlot, Grn, LogDiscrepancyRequest, TransitionRequest, UpdateDockRequest,
};
use uuid::Uuid;
use validator::Validate;

use super::{csv_response, ok, ApiResult, JsonBody, ListQuery, PathParam, QueryParams};
use crate::error::AppResult;
use crate::services::export::GrnCsvRow;
use crate::services::ReceivingService;
use crate::AppState;

/// List GRNs as JSON or CSV
pub async fn list_grns(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<ListQuery>,
) -> AppResult<Response> {
    let service = ReceivingService::new(state.db.clone());
    let grns = service.list_grns().await?;

    if query.wants_csv() {
        let rows: Vec<GrnCsvRow> = grns.iter().map(GrnCsvRow::from).collect();
        return csv_response("grns.csv", &rows);
    }
    Ok(Json(ApiEnvelope::ok(grns)).into_response())
}

pub async fn create_grn(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<CreateGrnRequest>,
) -> ApiResult<Grn> {
    input.validate()?;
    let service = ReceivingService::new(state.db.clone());
    ok(service.create_grn(input).await?)
}

pub async fn start_grn(
    State(state): State<AppState>,
    PathParam(grn_id): PathParam<Uuid>,
    JsonBody(input): JsonBody<TransitionRequest>,
) -> ApiResult<Grn> {
    input.validate()?;
    let service = ReceivingService::new(state.db.clone());
    ok(service.start_grn(grn_id, input.expected_version).await?)
}

pub async fn complete_grn(
    State(state): State<AppState>,
    PathParam(grn_id): PathParam<Uuid>,
    JsonBody(input): JsonBody<TransitionRequest>,
) -> ApiResult<Grn> {
    input.validate()?;
    let service = ReceivingService::new(state.db.clone());
    ok(service.complete_grn(grn_id, input.expected_version).await?)
}

pub async fn log_discrepancy(
    State(state): State<AppState>,
    PathParam(grn_id): PathParam<Uuid>,
    JsonBody(input): JsonBody<LogDiscrepancyRequest>,
) -> ApiResult<Grn> {
    input.validate()?;
    let service = ReceivingService::new(state.db.clone());
    let grn = service
        .log_discrepancy(grn_id, input.discrepancy_type, &input.notes, input.expected_version)
        .await?;
    ok(grn)
}

pub async fn list_docks(State(state): State<AppState>) -> ApiResult<Vec<DockSlot>> {
    let service = ReceivingService::new(state.db.clone());
    ok(service.list_docks().await?)
}

pub async fn update_dock(
    State(state): State<AppState>,
    PathParam(dock_id): PathParam<Uuid>,
    JsonBody(input): JsonBody<UpdateDockRequest>,
) -> ApiResult<DockSlot> {
    input.validate()?;
    let service = ReceivingService::new(state.db.clone());
    ok(service.update_dock(dock_id, input).await?)
}
