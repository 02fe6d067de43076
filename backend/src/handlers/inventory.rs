//! Inventory ledger HTTP handlers

use axum::{
    extract::{Multipart, State},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use shared::{
    Adjustment, ApiEnvelope, CreateAdjustmentRequest, CreateCycleCountRequest,
    CreateInternalTransferRequest, CreateItemRequest, CreateLocationRequest, CycleCount,
    CycleCountProgressRequest, ImportSummary, InternalTransfer, InventoryItem, Location, StockAlert,
    TransitionRequest, UpdateInternalTransferStatusRequest,
};
use uuid::Uuid;
use validator::Validate;

use super::{csv_response, ok, ApiResult, JsonBody, ListQuery, PathParam, QueryParams};
use crate::error::{AppError, AppResult};
use crate::middleware::CurrentUser;
use crate::services::export::{AdjustmentCsvRow, ItemCsvRow};
use crate::services::inventory::parse_import;
use crate::services::InventoryService;
use crate::AppState;

// ============================================================================
// Items
// ============================================================================

/// List items as JSON or CSV
pub async fn list_items(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<ListQuery>,
) -> AppResult<Response> {
    let service = InventoryService::new(state.db.clone());
    let items = service.list_items().await?;

    if query.wants_csv() {
        let rows: Vec<ItemCsvRow> = items.iter().map(ItemCsvRow::from).collect();
        return csv_response("inventory.csv", &rows);
    }
    Ok(Json(ApiEnvelope::ok(items)).into_response())
}

pub async fn get_item(
    State(state): State<AppState>,
    PathParam(sku): PathParam<String>,
) -> ApiResult<InventoryItem> {
    let service = InventoryService::new(state.db.clone());
    ok(service.get_item(&sku).await?)
}

pub async fn create_item(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<CreateItemRequest>,
) -> ApiResult<InventoryItem> {
    input.validate()?;
    let service = InventoryService::new(state.db.clone());
    ok(service.create_item(input).await?)
}

/// Bulk SKU import from the multipart field `file`
pub async fn import_items(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<ImportSummary> {
    let mut file = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::validation("file", e.to_string()))?
    {
        if field.name() == Some("file") {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::validation("file", e.to_string()))?;
            file = Some(bytes);
        }
    }

    let bytes = file.ok_or_else(|| AppError::validation("file", "Multipart field 'file' is required"))?;
    let rows = parse_import(&bytes)?;

    let service = InventoryService::new(state.db.clone());
    ok(service.import_items(rows).await?)
}

// ============================================================================
// Locations
// ============================================================================

pub async fn list_locations(State(state): State<AppState>) -> ApiResult<Vec<Location>> {
    let service = InventoryService::new(state.db.clone());
    ok(service.list_locations().await?)
}

pub async fn create_location(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<CreateLocationRequest>,
) -> ApiResult<Location> {
    input.validate()?;
    let service = InventoryService::new(state.db.clone());
    ok(service.create_location(input).await?)
}

// ============================================================================
// Adjustments and alerts
// ============================================================================

/// List the adjustment ledger as JSON or CSV
pub async fn list_adjustments(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<ListQuery>,
) -> AppResult<Response> {
    let service = InventoryService::new(state.db.clone());
    let adjustments = service.list_adjustments().await?;

    if query.wants_csv() {
        let rows: Vec<AdjustmentCsvRow> = adjustments.iter().map(AdjustmentCsvRow::from).collect();
        return csv_response("adjustments.csv", &rows);
    }
    Ok(Json(ApiEnvelope::ok(adjustments)).into_response())
}

/// Record one stock delta, attributed to the current operator
pub async fn create_adjustment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    JsonBody(input): JsonBody<CreateAdjustmentRequest>,
) -> ApiResult<Adjustment> {
    input.validate()?;
    let service = InventoryService::new(state.db.clone());
    ok(service.create_adjustment(&user.display_name, input).await?)
}

pub async fn list_stock_alerts(State(state): State<AppState>) -> ApiResult<Vec<StockAlert>> {
    let service = InventoryService::new(state.db.clone());
    let policy = state.config.inventory.alert_policy();
    ok(service.list_stock_alerts(&policy, Utc::now().date_naive()).await?)
}

// ============================================================================
// Cycle counts
// ============================================================================

pub async fn list_cycle_counts(State(state): State<AppState>) -> ApiResult<Vec<CycleCount>> {
    let service = InventoryService::new(state.db.clone());
    ok(service.list_cycle_counts().await?)
}

pub async fn create_cycle_count(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<CreateCycleCountRequest>,
) -> ApiResult<CycleCount> {
    input.validate()?;
    let service = InventoryService::new(state.db.clone());
    ok(service.create_cycle_count(input).await?)
}

pub async fn start_cycle_count(
    State(state): State<AppState>,
    PathParam(count_id): PathParam<Uuid>,
    JsonBody(input): JsonBody<TransitionRequest>,
) -> ApiResult<CycleCount> {
    input.validate()?;
    let service = InventoryService::new(state.db.clone());
    ok(service.start_cycle_count(count_id, input.expected_version).await?)
}

pub async fn record_cycle_count_progress(
    State(state): State<AppState>,
    PathParam(count_id): PathParam<Uuid>,
    JsonBody(input): JsonBody<CycleCountProgressRequest>,
) -> ApiResult<CycleCount> {
    input.validate()?;
    let service = InventoryService::new(state.db.clone());
    ok(service.record_cycle_count_progress(count_id, input).await?)
}

pub async fn complete_cycle_count(
    State(state): State<AppState>,
    PathParam(count_id): PathParam<Uuid>,
    JsonBody(input): JsonBody<TransitionRequest>,
) -> ApiResult<CycleCount> {
    input.validate()?;
    let service = InventoryService::new(state.db.clone());
    let policy = state.config.inventory.cycle_count_policy();
    ok(service
        .complete_cycle_count(count_id, input.expected_version, &policy)
        .await?)
}

// ============================================================================
// Internal transfers
// ============================================================================

pub async fn list_internal_transfers(State(state): State<AppState>) -> ApiResult<Vec<InternalTransfer>> {
    let service = InventoryService::new(state.db.clone());
    ok(service.list_internal_transfers().await?)
}

pub async fn create_internal_transfer(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<CreateInternalTransferRequest>,
) -> ApiResult<InternalTransfer> {
    input.validate()?;
    let service = InventoryService::new(state.db.clone());
    ok(service.create_internal_transfer(input).await?)
}

pub async fn update_internal_transfer_status(
    State(state): State<AppState>,
    PathParam(transfer_id): PathParam<Uuid>,
    JsonBody(input): JsonBody<UpdateInternalTransferStatusRequest>,
) -> ApiResult<InternalTransfer> {
    input.validate()?;
    let service = InventoryService::new(state.db.clone());
    ok(service
        .update_internal_transfer_status(transfer_id, input.status, input.expected_version)
        .await?)
}
