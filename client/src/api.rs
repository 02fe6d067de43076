//! Typed REST client for the `/warehouse` API
//!
//! One method per operation. Request bodies are validated before they are
//! sent, and responses are accepted both enveloped and bare.

use std::time::Duration;

use reqwest::{multipart, Client, Method, RequestBuilder};
use serde::{de::DeserializeOwned, Serialize};
use shared::*;
use uuid::Uuid;
use validator::Validate;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone().filter(|t| !t.trim().is_empty()),
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/warehouse{}", self.base_url, path);
        let builder = self.client.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn execute<T: DeserializeOwned>(&self, builder: RequestBuilder) -> ClientResult<T> {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ClientError::from_response(status.as_u16(), &body));
        }

        serde_json::from_str::<ApiPayload<T>>(&body)
            .map(ApiPayload::into_data)
            .map_err(|e| ClientError::Unexpected {
                status: status.as_u16(),
                message: format!("Malformed response body: {}", e),
            })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.execute(self.request(Method::GET, path)).await
    }

    async fn send<B, T>(&self, method: Method, path: &str, body: &B) -> ClientResult<T>
    where
        B: Serialize + Validate,
        T: DeserializeOwned,
    {
        body.validate()?;
        self.execute(self.request(method, path).json(body)).await
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> ClientResult<T>
    where
        B: Serialize + Validate,
        T: DeserializeOwned,
    {
        self.send(Method::POST, path, body).await
    }

    async fn put<B, T>(&self, path: &str, body: &B) -> ClientResult<T>
    where
        B: Serialize + Validate,
        T: DeserializeOwned,
    {
        self.send(Method::PUT, path, body).await
    }

    // ========================================================================
    // Receiving
    // ========================================================================

    pub async fn list_grns(&self) -> ClientResult<Vec<Grn>> {
        self.get("/inbound/grns").await
    }

    pub async fn create_grn(&self, input: &CreateGrnRequest) -> ClientResult<Grn> {
        self.post("/inbound/grns", input).await
    }

    pub async fn start_grn(&self, id: Uuid, version: Option<i64>) -> ClientResult<Grn> {
        self.post(&format!("/inbound/grns/{}/start", id), &transition(version))
            .await
    }

    pub async fn complete_grn(&self, id: Uuid, version: Option<i64>) -> ClientResult<Grn> {
        self.post(&format!("/inbound/grns/{}/complete", id), &transition(version))
            .await
    }

    pub async fn log_discrepancy(&self, id: Uuid, input: &LogDiscrepancyRequest) -> ClientResult<Grn> {
        self.post(&format!("/inbound/grns/{}/discrepancy", id), input)
            .await
    }

    pub async fn list_docks(&self) -> ClientResult<Vec<DockSlot>> {
        self.get("/inbound/docks").await
    }

    pub async fn update_dock(&self, id: Uuid, input: &UpdateDockRequest) -> ClientResult<DockSlot> {
        self.put(&format!("/inbound/docks/{}", id), input).await
    }

    // ========================================================================
    // Inventory
    // ========================================================================

    pub async fn list_items(&self) -> ClientResult<Vec<InventoryItem>> {
        self.get("/inventory/items").await
    }

    pub async fn get_item(&self, sku: &str) -> ClientResult<InventoryItem> {
        if sku.trim().is_empty() {
            return Err(DomainError::validation("sku", "SKU is required").into());
        }
        self.get(&format!("/inventory/items/{}", sku.trim())).await
    }

    pub async fn create_item(&self, input: &CreateItemRequest) -> ClientResult<InventoryItem> {
        self.post("/inventory/items", input).await
    }

    /// Upload a CSV of new SKUs; existing SKUs are skipped by the server
    pub async fn import_items(&self, filename: &str, csv: Vec<u8>) -> ClientResult<ImportSummary> {
        if csv.is_empty() {
            return Err(DomainError::validation("file", "Import file is empty").into());
        }
        let part = multipart::Part::bytes(csv)
            .file_name(filename.to_string())
            .mime_str("text/csv")?;
        let form = multipart::Form::new().part("file", part);
        self.execute(self.request(Method::POST, "/inventory/items/import").multipart(form))
            .await
    }

    pub async fn list_locations(&self) -> ClientResult<Vec<Location>> {
        self.get("/inventory/locations").await
    }

    pub async fn create_location(&self, input: &CreateLocationRequest) -> ClientResult<Location> {
        self.post("/inventory/locations", input).await
    }

    pub async fn list_adjustments(&self) -> ClientResult<Vec<Adjustment>> {
        self.get("/inventory/adjustments").await
    }

    pub async fn create_adjustment(&self, input: &CreateAdjustmentRequest) -> ClientResult<Adjustment> {
        validate_adjustment(&input.sku, input.change, &input.reason)?;
        self.post("/inventory/adjustments", input).await
    }

    pub async fn list_stock_alerts(&self) -> ClientResult<Vec<StockAlert>> {
        self.get("/inventory/alerts").await
    }

    pub async fn list_cycle_counts(&self) -> ClientResult<Vec<CycleCount>> {
        self.get("/inventory/cycle-counts").await
    }

    pub async fn create_cycle_count(&self, input: &CreateCycleCountRequest) -> ClientResult<CycleCount> {
        self.post("/inventory/cycle-counts", input).await
    }

    pub async fn start_cycle_count(&self, id: Uuid, version: Option<i64>) -> ClientResult<CycleCount> {
        self.post(&format!("/inventory/cycle-counts/{}/start", id), &transition(version))
            .await
    }

    pub async fn record_cycle_count_progress(
        &self,
        id: Uuid,
        input: &CycleCountProgressRequest,
    ) -> ClientResult<CycleCount> {
        self.post(&format!("/inventory/cycle-counts/{}/progress", id), input)
            .await
    }

    pub async fn complete_cycle_count(&self, id: Uuid, version: Option<i64>) -> ClientResult<CycleCount> {
        self.post(&format!("/inventory/cycle-counts/{}/complete", id), &transition(version))
            .await
    }

    pub async fn list_internal_transfers(&self) -> ClientResult<Vec<InternalTransfer>> {
        self.get("/inventory/transfers").await
    }

    pub async fn create_internal_transfer(
        &self,
        input: &CreateInternalTransferRequest,
    ) -> ClientResult<InternalTransfer> {
        validate_internal_transfer(&input.from_location, &input.to_location, &input.sku, input.quantity)?;
        self.post("/inventory/transfers", input).await
    }

    pub async fn update_internal_transfer_status(
        &self,
        id: Uuid,
        input: &UpdateInternalTransferStatusRequest,
    ) -> ClientResult<InternalTransfer> {
        self.put(&format!("/inventory/transfers/{}/status", id), input)
            .await
    }

    // ========================================================================
    // Picking
    // ========================================================================

    pub async fn list_picklists(&self, view: PicklistView) -> ClientResult<Vec<PicklistOrder>> {
        self.execute(
            self.request(Method::GET, "/outbound/picklists")
                .query(&[("view", view.as_str())]),
        )
        .await
    }

    pub async fn create_picklist(&self, input: &CreatePicklistRequest) -> ClientResult<PicklistOrder> {
        self.post("/outbound/picklists", input).await
    }

    pub async fn queue_picklist(&self, id: Uuid, version: Option<i64>) -> ClientResult<PicklistOrder> {
        self.post(&format!("/outbound/picklists/{}/queue", id), &transition(version))
            .await
    }

    pub async fn assign_picker(&self, id: Uuid, input: &AssignPickerRequest) -> ClientResult<PicklistOrder> {
        self.post(&format!("/outbound/picklists/{}/assign", id), input)
            .await
    }

    pub async fn start_picking(&self, id: Uuid, version: Option<i64>) -> ClientResult<PicklistOrder> {
        self.post(&format!("/outbound/picklists/{}/start", id), &transition(version))
            .await
    }

    pub async fn complete_picklist(&self, id: Uuid, version: Option<i64>) -> ClientResult<PicklistOrder> {
        self.post(&format!("/outbound/picklists/{}/complete", id), &transition(version))
            .await
    }

    pub async fn list_pickers(&self) -> ClientResult<Vec<PickerAssignment>> {
        self.get("/outbound/pickers").await
    }

    pub async fn create_picker(&self, input: &CreatePickerRequest) -> ClientResult<PickerAssignment> {
        self.post("/outbound/pickers", input).await
    }

    pub async fn set_picker_break(&self, id: Uuid, input: &PickerBreakRequest) -> ClientResult<PickerAssignment> {
        self.put(&format!("/outbound/pickers/{}/break", id), input)
            .await
    }

    pub async fn list_batches(&self) -> ClientResult<Vec<BatchOrder>> {
        self.get("/outbound/batches").await
    }

    pub async fn create_batch(&self, input: &CreateBatchRequest) -> ClientResult<BatchOrder> {
        self.post("/outbound/batches", input).await
    }

    pub async fn update_batch_progress(&self, id: Uuid, input: &BatchProgressRequest) -> ClientResult<BatchOrder> {
        self.put(&format!("/outbound/batches/{}/progress", id), input)
            .await
    }

    pub async fn list_multi_order_picks(&self) -> ClientResult<Vec<MultiOrderPick>> {
        self.get("/outbound/multi-order-picks").await
    }

    pub async fn create_multi_order_pick(
        &self,
        input: &CreateMultiOrderPickRequest,
    ) -> ClientResult<MultiOrderPick> {
        self.post("/outbound/multi-order-picks", input).await
    }

    pub async fn update_picked_qty(&self, id: Uuid, input: &UpdatePickedQtyRequest) -> ClientResult<MultiOrderPick> {
        self.put(&format!("/outbound/multi-order-picks/{}/picked", id), input)
            .await
    }

    pub async fn list_routes(&self) -> ClientResult<Vec<RouteOptimization>> {
        self.get("/outbound/routes").await
    }

    pub async fn create_route(&self, input: &CreateRouteRequest) -> ClientResult<RouteOptimization> {
        self.post("/outbound/routes", input).await
    }

    pub async fn optimize_route(&self, id: Uuid, version: Option<i64>) -> ClientResult<RouteOptimization> {
        self.post(&format!("/outbound/routes/{}/optimize", id), &transition(version))
            .await
    }

    pub async fn complete_route(&self, id: Uuid, version: Option<i64>) -> ClientResult<RouteOptimization> {
        self.post(&format!("/outbound/routes/{}/complete", id), &transition(version))
            .await
    }

    // ========================================================================
    // Inter-warehouse transfers
    // ========================================================================

    pub async fn list_transfers(&self) -> ClientResult<Vec<WarehouseTransfer>> {
        self.get("/transfers").await
    }

    pub async fn create_transfer(&self, input: &CreateTransferRequest) -> ClientResult<WarehouseTransfer> {
        validate_warehouse_transfer(&input.destination, input.items, input.sku.as_deref())?;
        self.post("/transfers", input).await
    }

    pub async fn update_transfer_status(
        &self,
        id: Uuid,
        input: &UpdateTransferStatusRequest,
    ) -> ClientResult<WarehouseTransfer> {
        self.put(&format!("/transfers/{}/status", id), input).await
    }

    pub async fn update_transfer_telemetry(
        &self,
        id: Uuid,
        input: &TransferTelemetryRequest,
    ) -> ClientResult<WarehouseTransfer> {
        self.put(&format!("/transfers/{}/telemetry", id), input).await
    }

    // ========================================================================
    // Quality
    // ========================================================================

    pub async fn list_inspections(&self) -> ClientResult<Vec<QcInspection>> {
        self.get("/qc/inspections").await
    }

    pub async fn create_inspection(&self, input: &CreateInspectionRequest) -> ClientResult<QcInspection> {
        validate_inspection(input.items_inspected, input.defects_found)?;
        self.post("/qc/inspections", input).await
    }

    pub async fn list_temperature_logs(&self) -> ClientResult<Vec<TemperatureLog>> {
        self.get("/qc/temperature").await
    }

    pub async fn log_temperature(&self, input: &CreateTemperatureLogRequest) -> ClientResult<TemperatureLog> {
        validate_humidity(input.humidity)?;
        self.post("/qc/temperature", input).await
    }

    pub async fn list_samples(&self) -> ClientResult<Vec<SampleTest>> {
        self.get("/qc/samples").await
    }

    pub async fn create_sample(&self, input: &CreateSampleRequest) -> ClientResult<SampleTest> {
        self.post("/qc/samples", input).await
    }

    pub async fn record_sample_result(&self, id: Uuid, input: &SampleResultRequest) -> ClientResult<SampleTest> {
        self.post(&format!("/qc/samples/{}/result", id), input).await
    }

    pub async fn list_rejections(&self) -> ClientResult<Vec<Rejection>> {
        self.get("/qc/rejections").await
    }

    pub async fn create_rejection(&self, input: &CreateRejectionRequest) -> ClientResult<Rejection> {
        self.post("/qc/rejections", input).await
    }

    pub async fn list_compliance_checks(&self) -> ClientResult<Vec<ComplianceCheck>> {
        self.get("/qc/compliance").await
    }

    pub async fn create_compliance_check(
        &self,
        input: &CreateComplianceCheckRequest,
    ) -> ClientResult<ComplianceCheck> {
        self.post("/qc/compliance", input).await
    }

    pub async fn toggle_compliance_check(&self, id: Uuid, input: &ToggleCheckRequest) -> ClientResult<ComplianceCheck> {
        self.put(&format!("/qc/compliance/{}", id), input).await
    }

    // ========================================================================
    // Workforce
    // ========================================================================

    pub async fn list_staff(&self) -> ClientResult<Vec<Staff>> {
        self.get("/workforce/staff").await
    }

    pub async fn add_staff(&self, input: &CreateStaffRequest) -> ClientResult<Staff> {
        self.post("/workforce/staff", input).await
    }

    pub async fn update_staff_status(&self, id: Uuid, input: &UpdateStaffStatusRequest) -> ClientResult<Staff> {
        self.put(&format!("/workforce/staff/{}/status", id), input)
            .await
    }

    pub async fn list_schedules(&self) -> ClientResult<Vec<ShiftSchedule>> {
        self.get("/workforce/schedules").await
    }

    pub async fn create_schedule(&self, input: &CreateScheduleRequest) -> ClientResult<ShiftSchedule> {
        self.post("/workforce/schedules", input).await
    }

    pub async fn assign_staff(&self, id: Uuid, input: &AssignStaffRequest) -> ClientResult<ShiftSchedule> {
        self.put(&format!("/workforce/schedules/{}/staff", id), input)
            .await
    }

    pub async fn list_attendance(&self) -> ClientResult<Vec<Attendance>> {
        self.get("/workforce/attendance").await
    }

    pub async fn log_attendance(&self, input: &LogAttendanceRequest) -> ClientResult<Attendance> {
        self.post("/workforce/attendance", input).await
    }

    pub async fn list_leave_requests(&self) -> ClientResult<Vec<LeaveRequest>> {
        self.get("/workforce/leave").await
    }

    /// The server computes `days`; the date order is checked here first
    pub async fn create_leave_request(&self, input: &CreateLeaveRequest) -> ClientResult<LeaveRequest> {
        leave_days(input.start_date, input.end_date)?;
        self.post("/workforce/leave", input).await
    }

    pub async fn decide_leave(&self, id: Uuid, input: &LeaveDecisionRequest) -> ClientResult<LeaveRequest> {
        self.put(&format!("/workforce/leave/{}/decision", id), input)
            .await
    }

    pub async fn list_trainings(&self) -> ClientResult<Vec<Training>> {
        self.get("/workforce/trainings").await
    }

    pub async fn record_training(&self, input: &CreateTrainingRequest) -> ClientResult<Training> {
        self.post("/workforce/trainings", input).await
    }

    // ========================================================================
    // Equipment
    // ========================================================================

    pub async fn list_equipment(&self) -> ClientResult<Vec<Equipment>> {
        self.get("/equipment").await
    }

    pub async fn create_equipment(&self, input: &CreateEquipmentRequest) -> ClientResult<Equipment> {
        self.post("/equipment", input).await
    }

    pub async fn update_equipment_status(
        &self,
        id: Uuid,
        input: &UpdateEquipmentStatusRequest,
    ) -> ClientResult<Equipment> {
        self.put(&format!("/equipment/{}/status", id), input).await
    }

    pub async fn list_maintenance(&self, id: Uuid) -> ClientResult<Vec<MaintenanceRecord>> {
        self.get(&format!("/equipment/{}/maintenance", id)).await
    }

    pub async fn log_maintenance(&self, id: Uuid, input: &LogMaintenanceRequest) -> ClientResult<MaintenanceRecord> {
        self.post(&format!("/equipment/{}/maintenance", id), input)
            .await
    }

    // ========================================================================
    // Exceptions
    // ========================================================================

    pub async fn list_exceptions(&self) -> ClientResult<Vec<Exception>> {
        self.get("/exceptions").await
    }

    pub async fn create_exception(&self, input: &CreateExceptionRequest) -> ClientResult<Exception> {
        self.post("/exceptions", input).await
    }

    pub async fn update_exception_status(
        &self,
        id: Uuid,
        input: &UpdateExceptionStatusRequest,
    ) -> ClientResult<Exception> {
        self.put(&format!("/exceptions/{}/status", id), input).await
    }

    pub async fn resolve_inbound(&self, id: Uuid, input: &ResolveInboundRequest) -> ClientResult<Exception> {
        self.post(&format!("/exceptions/{}/resolve-inbound", id), input)
            .await
    }
}

fn transition(version: Option<i64>) -> TransitionRequest {
    TransitionRequest {
        expected_version: version,
    }
}
