//! Equipment register HTTP handlers

use axum::extract::State;
use shared::{
    CreateEquipmentRequest, Equipment, LogMaintenanceRequest, MaintenanceRecord,
    UpdateEquipmentStatusRequest,
};
use uuid::Uuid;
use validator::Validate;

use super::{ok, ApiResult, JsonBody, PathParam};
use crate::services::EquipmentService;
use crate::AppState;

pub async fn list_equipment(State(state): State<AppState>) -> ApiResult<Vec<Equipment>> {
    let service = EquipmentService::new(state.db.clone());
    ok(service.list_equipment().await?)
}

pub async fn create_equipment(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<CreateEquipmentRequest>,
) -> ApiResult<Equipment> {
    input.validate()?;
    let service = EquipmentService::new(state.db.clone());
    ok(service.create_equipment(input).await?)
}

pub async fn update_equipment_status(
    State(state): State<AppState>,
    PathParam(equipment_id): PathParam<Uuid>,
    JsonBody(input): JsonBody<UpdateEquipmentStatusRequest>,
) -> ApiResult<Equipment> {
    input.validate()?;
    let service = EquipmentService::new(state.db.clone());
    ok(service
        .update_status(equipment_id, input.status, input.assigned_to, input.expected_version)
        .await?)
}

pub async fn list_maintenance(
    State(state): State<AppState>,
    PathParam(equipment_id): PathParam<Uuid>,
) -> ApiResult<Vec<MaintenanceRecord>> {
    let service = EquipmentService::new(state.db.clone());
    ok(service.list_maintenance(equipment_id).await?)
}

pub async fn log_maintenance(
    State(state): State<AppState>,
    PathParam(equipment_id): PathParam<Uuid>,
    JsonBody(input): JsonBody<LogMaintenanceRequest>,
) -> ApiResult<MaintenanceRecord> {
    input.validate()?;
    let service = EquipmentService::new(state.db.clone());
    ok(service.log_maintenance(equipment_id, input).await?)
}
