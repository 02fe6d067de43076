//! Exception desk HTTP handlers

use axum::extract::State;
use shared::{CreateExceptionRequest, Exception, ResolveInboundRequest, UpdateExceptionStatusRequest};
use uuid::Uuid;
use validator::Validate;

use super::{ok, ApiResult, JsonBody, PathParam};
use crate::services::ExceptionService;
use crate::AppState;

pub async fn list_exceptions(State(state): State<AppState>) -> ApiResult<Vec<Exception>> {
    let service = ExceptionService::new(state.db.clone());
    ok(service.list_exceptions().await?)
}

pub async fn create_exception(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<CreateExceptionRequest>,
) -> ApiResult<Exception> {
    input.validate()?;
    let service = ExceptionService::new(state.db.clone());
    ok(service.create_exception(input).await?)
}

pub async fn update_exception_status(
    State(state): State<AppState>,
    PathParam(exception_id): PathParam<Uuid>,
    JsonBody(input): JsonBody<UpdateExceptionStatusRequest>,
) -> ApiResult<Exception> {
    input.validate()?;
    let service = ExceptionService::new(state.db.clone());
    ok(service
        .update_status(exception_id, input.status, input.expected_version)
        .await?)
}

/// Reject or partially accept the shipment behind an inbound exception
pub async fn resolve_inbound(
    State(state): State<AppState>,
    PathParam(exception_id): PathParam<Uuid>,
    JsonBody(input): JsonBody<ResolveInboundRequest>,
) -> ApiResult<Exception> {
    input.validate()?;
    let service = ExceptionService::new(state.db.clone());
    ok(service
        .resolve_inbound(exception_id, input.action, input.expected_version)
        .await?)
}
