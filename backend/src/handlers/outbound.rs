//! Outbound HTTP handlers: picklists, pickers, batches, multi-order picks
//! and routes

use axum::extract::State;
use shared::{
    AssignPickerRequest, BatchOrder, BatchProgressRequest, CreateBatchRequest,
    CreateMultiOrderPickRequest, CreatePickerRequest, CreatePicklistRequest, CreateRouteRequest,
    MultiOrderPick, PickerAssignment, PickerBreakRequest, PicklistOrder, PicklistQuery, PicklistView,
    RouteOptimization, TransitionRequest, UpdatePickedQtyRequest,
};
use uuid::Uuid;
use validator::Validate;

use super::{ok, ApiResult, JsonBody, PathParam, QueryParams};
use crate::services::PickingService;
use crate::AppState;

// ============================================================================
// Picklists
// ============================================================================

/// List picklists, optionally restricted to the `auto` or `manual` view
pub async fn list_picklists(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<PicklistQuery>,
) -> ApiResult<Vec<PicklistOrder>> {
    let service = PickingService::new(state.db.clone());
    let view = query.view.unwrap_or(PicklistView::All);
    ok(service.list_picklists(view).await?)
}

/// Accepts orders from the order feed as well as manual entry
pub async fn create_picklist(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<CreatePicklistRequest>,
) -> ApiResult<PicklistOrder> {
    input.validate()?;
    let service = PickingService::new(state.db.clone());
    ok(service.create_picklist(input).await?)
}

pub async fn queue_picklist(
    State(state): State<AppState>,
    PathParam(picklist_id): PathParam<Uuid>,
    JsonBody(input): JsonBody<TransitionRequest>,
) -> ApiResult<PicklistOrder> {
    input.validate()?;
    let service = PickingService::new(state.db.clone());
    ok(service.queue_picklist(picklist_id, input.expected_version).await?)
}

pub async fn assign_picker(
    State(state): State<AppState>,
    PathParam(picklist_id): PathParam<Uuid>,
    JsonBody(input): JsonBody<AssignPickerRequest>,
) -> ApiResult<PicklistOrder> {
    input.validate()?;
    let service = PickingService::new(state.db.clone());
    ok(service
        .assign_picker(picklist_id, &input.picker_name, input.expected_version)
        .await?)
}

pub async fn start_picking(
    State(state): State<AppState>,
    PathParam(picklist_id): PathParam<Uuid>,
    JsonBody(input): JsonBody<TransitionRequest>,
) -> ApiResult<PicklistOrder> {
    input.validate()?;
    let service = PickingService::new(state.db.clone());
    ok(service.start_picking(picklist_id, input.expected_version).await?)
}

pub async fn complete_picklist(
    State(state): State<AppState>,
    PathParam(picklist_id): PathParam<Uuid>,
    JsonBody(input): JsonBody<TransitionRequest>,
) -> ApiResult<PicklistOrder> {
    input.validate()?;
    let service = PickingService::new(state.db.clone());
    ok(service.complete_picklist(picklist_id, input.expected_version).await?)
}

// ============================================================================
// Pickers
// ============================================================================

pub async fn list_pickers(State(state): State<AppState>) -> ApiResult<Vec<PickerAssignment>> {
    let service = PickingService::new(state.db.clone());
    ok(service.list_pickers().await?)
}

pub async fn create_picker(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<CreatePickerRequest>,
) -> ApiResult<PickerAssignment> {
    input.validate()?;
    let service = PickingService::new(state.db.clone());
    ok(service.create_picker(input).await?)
}

pub async fn set_picker_break(
    State(state): State<AppState>,
    PathParam(picker_id): PathParam<Uuid>,
    JsonBody(input): JsonBody<PickerBreakRequest>,
) -> ApiResult<PickerAssignment> {
    input.validate()?;
    let service = PickingService::new(state.db.clone());
    ok(service
        .set_picker_break(picker_id, input.on_break, input.expected_version)
        .await?)
}

// ============================================================================
// Batches
// ============================================================================

pub async fn list_batches(State(state): State<AppState>) -> ApiResult<Vec<BatchOrder>> {
    let service = PickingService::new(state.db.clone());
    ok(service.list_batches().await?)
}

pub async fn create_batch(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<CreateBatchRequest>,
) -> ApiResult<BatchOrder> {
    input.validate()?;
    let service = PickingService::new(state.db.clone());
    ok(service.create_batch(&input.zone, input.picker.as_deref()).await?)
}

pub async fn update_batch_progress(
    State(state): State<AppState>,
    PathParam(batch_id): PathParam<Uuid>,
    JsonBody(input): JsonBody<BatchProgressRequest>,
) -> ApiResult<BatchOrder> {
    input.validate()?;
    let service = PickingService::new(state.db.clone());
    ok(service
        .update_batch_progress(batch_id, input.progress, input.expected_version)
        .await?)
}

// ============================================================================
// Multi-order picks
// ============================================================================

pub async fn list_multi_order_picks(State(state): State<AppState>) -> ApiResult<Vec<MultiOrderPick>> {
    let service = PickingService::new(state.db.clone());
    ok(service.list_multi_order_picks().await?)
}

pub async fn create_multi_order_pick(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<CreateMultiOrderPickRequest>,
) -> ApiResult<MultiOrderPick> {
    input.validate()?;
    let service = PickingService::new(state.db.clone());
    ok(service.create_multi_order_pick(input).await?)
}

pub async fn update_picked_qty(
    State(state): State<AppState>,
    PathParam(pick_id): PathParam<Uuid>,
    JsonBody(input): JsonBody<UpdatePickedQtyRequest>,
) -> ApiResult<MultiOrderPick> {
    input.validate()?;
    let service = PickingService::new(state.db.clone());
    ok(service
        .update_picked_qty(pick_id, input.picked_qty, input.expected_version)
        .await?)
}

// ============================================================================
// Routes
// ============================================================================

pub async fn list_routes(State(state): State<AppState>) -> ApiResult<Vec<RouteOptimization>> {
    let service = PickingService::new(state.db.clone());
    ok(service.list_routes().await?)
}

pub async fn create_route(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<CreateRouteRequest>,
) -> ApiResult<RouteOptimization> {
    input.validate()?;
    let service = PickingService::new(state.db.clone());
    ok(service.create_route(input).await?)
}

pub async fn optimize_route(
    State(state): State<AppState>,
    PathParam(route_id): PathParam<Uuid>,
    JsonBody(input): JsonBody<TransitionRequest>,
) -> ApiResult<RouteOptimization> {
    input.validate()?;
    let service = PickingService::new(state.db.clone());
    ok(service
        .optimize_route(route_id, input.expected_version, &state.route_optimizer)
        .await?)
}

pub async fn complete_route(
    State(state): State<AppState>,
    PathParam(route_id): PathParam<Uuid>,
    JsonBody(input): JsonBody<TransitionRequest>,
) -> ApiResult<RouteOptimization> {
    input.validate()?;
    let service = PickingService::new(state.db.clone());
    ok(service.complete_route(route_id, input.expected_version).await?)
}
