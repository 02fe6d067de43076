//! Quality control HTTP handlers

use axum::extract::State;
use shared::{
    ComplianceCheck, CreateComplianceCheckRequest, CreateInspectionRequest, CreateRejectionRequest,
    CreateSampleRequest, CreateTemperatureLogRequest, QcInspection, Rejection, SampleResultRequest,
    SampleTest, TemperatureLog, ToggleCheckRequest,
};
use uuid::Uuid;
use validator::Validate;

use super::{ok, ApiResult, JsonBody, PathParam};
use crate::services::QualityService;
use crate::AppState;

pub async fn list_inspections(State(state): State<AppState>) -> ApiResult<Vec<QcInspection>> {
    let service = QualityService::new(state.db.clone());
    ok(service.list_inspections().await?)
}

pub async fn create_inspection(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<CreateInspectionRequest>,
) -> ApiResult<QcInspection> {
    input.validate()?;
    let service = QualityService::new(state.db.clone());
    ok(service.create_inspection(input).await?)
}

pub async fn list_temperature_logs(State(state): State<AppState>) -> ApiResult<Vec<TemperatureLog>> {
    let service = QualityService::new(state.db.clone());
    ok(service.list_temperature_logs().await?)
}

pub async fn log_temperature(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<CreateTemperatureLogRequest>,
) -> ApiResult<TemperatureLog> {
    input.validate()?;
    let service = QualityService::new(state.db.clone());
    let bands = state.config.quality.bands();
    ok(service.log_temperature(input, &bands).await?)
}

pub async fn list_samples(State(state): State<AppState>) -> ApiResult<Vec<SampleTest>> {
    let service = QualityService::new(state.db.clone());
    ok(service.list_samples().await?)
}

pub async fn create_sample(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<CreateSampleRequest>,
) -> ApiResult<SampleTest> {
    input.validate()?;
    let service = QualityService::new(state.db.clone());
    ok(service.create_sample(input).await?)
}

pub async fn record_sample_result(
    State(state): State<AppState>,
    PathParam(sample_id): PathParam<Uuid>,
    JsonBody(input): JsonBody<SampleResultRequest>,
) -> ApiResult<SampleTest> {
    input.validate()?;
    let service = QualityService::new(state.db.clone());
    ok(service
        .record_sample_result(sample_id, input.result, input.notes, input.expected_version)
        .await?)
}

pub async fn list_rejections(State(state): State<AppState>) -> ApiResult<Vec<Rejection>> {
    let service = QualityService::new(state.db.clone());
    ok(service.list_rejections().await?)
}

pub async fn create_rejection(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<CreateRejectionRequest>,
) -> ApiResult<Rejection> {
    input.validate()?;
    let service = QualityService::new(state.db.clone());
    ok(service.create_rejection(input).await?)
}

pub async fn list_compliance_checks(State(state): State<AppState>) -> ApiResult<Vec<ComplianceCheck>> {
    let service = QualityService::new(state.db.clone());
    ok(service.list_compliance_checks().await?)
}

pub async fn create_compliance_check(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<CreateComplianceCheckRequest>,
) -> ApiResult<ComplianceCheck> {
    input.validate()?;
    let service = QualityService::new(state.db.clone());
    ok(service.create_compliance_check(input).await?)
}

pub async fn toggle_compliance_check(
    State(state): State<AppState>,
    PathParam(check_id): PathParam<Uuid>,
    JsonBody(input): JsonBody<ToggleCheckRequest>,
) -> ApiResult<ComplianceCheck> {
    input.validate()?;
    let service = QualityService::new(state.db.clone());
    ok(service
        .toggle_compliance_check(check_id, input.completed, input.expected_version)
        .await?)
}
