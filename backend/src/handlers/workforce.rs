//! Workforce HTTP handlers

use axum::extract::State;
use shared::{
    AssignStaffRequest, Attendance, CreateLeaveRequest, CreateScheduleRequest, CreateStaffRequest,
    CreateTrainingRequest, LeaveDecisionRequest, LeaveRequest, LogAttendanceRequest, ShiftSchedule,
    Staff, Training, UpdateStaffStatusRequest,
};
use uuid::Uuid;
use validator::Validate;

use super::{ok, ApiResult, JsonBody, PathParam};
use crate::services::WorkforceService;
use crate::AppState;

pub async fn list_staff(State(state): State<AppState>) -> ApiResult<Vec<Staff>> {
    let service = WorkforceService::new(state.db.clone());
    ok(service.list_staff().await?)
}

pub async fn add_staff(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<CreateStaffRequest>,
) -> ApiResult<Staff> {
    input.validate()?;
    let service = WorkforceService::new(state.db.clone());
    ok(service.add_staff(input).await?)
}

pub async fn update_staff_status(
    State(state): State<AppState>,
    PathParam(staff_id): PathParam<Uuid>,
    JsonBody(input): JsonBody<UpdateStaffStatusRequest>,
) -> ApiResult<Staff> {
    input.validate()?;
    let service = WorkforceService::new(state.db.clone());
    ok(service
        .update_staff_status(staff_id, input.status, input.expected_version)
        .await?)
}

pub async fn list_schedules(State(state): State<AppState>) -> ApiResult<Vec<ShiftSchedule>> {
    let service = WorkforceService::new(state.db.clone());
    ok(service.list_schedules().await?)
}

pub async fn create_schedule(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<CreateScheduleRequest>,
) -> ApiResult<ShiftSchedule> {
    input.validate()?;
    let service = WorkforceService::new(state.db.clone());
    ok(service.create_schedule(input).await?)
}

pub async fn assign_staff(
    State(state): State<AppState>,
    PathParam(schedule_id): PathParam<Uuid>,
    JsonBody(input): JsonBody<AssignStaffRequest>,
) -> ApiResult<ShiftSchedule> {
    input.validate()?;
    let service = WorkforceService::new(state.db.clone());
    ok(service
        .assign_staff(schedule_id, &input.staff_ids, input.expected_version)
        .await?)
}

pub async fn list_attendance(State(state): State<AppState>) -> ApiResult<Vec<Attendance>> {
    let service = WorkforceService::new(state.db.clone());
    ok(service.list_attendance().await?)
}

pub async fn log_attendance(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<LogAttendanceRequest>,
) -> ApiResult<Attendance> {
    input.validate()?;
    let service = WorkforceService::new(state.db.clone());
    ok(service.log_attendance(input).await?)
}

pub async fn list_leave_requests(State(state): State<AppState>) -> ApiResult<Vec<LeaveRequest>> {
    let service = WorkforceService::new(state.db.clone());
    ok(service.list_leave_requests().await?)
}

pub async fn create_leave_request(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<CreateLeaveRequest>,
) -> ApiResult<LeaveRequest> {
    input.validate()?;
    let service = WorkforceService::new(state.db.clone());
    ok(service.create_leave_request(input).await?)
}

pub async fn decide_leave(
    State(state): State<AppState>,
    PathParam(leave_id): PathParam<Uuid>,
    JsonBody(input): JsonBody<LeaveDecisionRequest>,
) -> ApiResult<LeaveRequest> {
    input.validate()?;
    let service = WorkforceService::new(state.db.clone());
    ok(service
        .decide_leave(leave_id, input.status, input.expected_version)
        .await?)
}

pub async fn list_trainings(State(state): State<AppState>) -> ApiResult<Vec<Training>> {
    let service = WorkforceService::new(state.db.clone());
    ok(service.list_trainings().await?)
}

pub async fn record_training(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<CreateTrainingRequest>,
) -> ApiResult<Training> {
    input.validate()?;
    let service = WorkforceService::new(state.db.clone());
    ok(service.record_training(input).await?)
}
