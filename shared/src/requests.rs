//! Request bodies accepted by the REST API
//!
//! Field-shape rules are declared with `validator`; cross-field and domain
//! rules are applied by the services through the functions in
//! [`crate::models`].
//!
//! Mutations on existing entities carry an optional `expectedVersion`. When
//! present it must equal the stored version or the request is rejected as a
//! conflict.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::*;

/// Body for transitions that need nothing but the version token
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TransitionRequest {
    #[validate(range(min = 1))]
    pub expected_version: Option<i64>,
}

impl TransitionRequest {
    pub fn at(version: i64) -> Self {
        Self {
            expected_version: Some(version),
        }
    }
}

// ============================================================================
// Inventory
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateItemRequest {
    #[validate(length(min = 1, max = 64), custom = "crate::validation::not_blank")]
    pub sku: String,
    #[validate(custom = "crate::validation::not_blank")]
    pub product_name: String,
    #[validate(custom = "crate::validation::not_blank")]
    pub category: String,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub current_stock: i64,
    #[validate(range(min = 0))]
    pub min_stock: i64,
    #[validate(range(min = 0))]
    pub max_stock: i64,
    #[validate(custom = "crate::validation::not_blank")]
    pub location: String,
    pub unit_cost: Decimal,
    pub expiry_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateLocationRequest {
    #[validate(length(min = 1, max = 32), custom = "crate::validation::not_blank")]
    pub code: String,
    #[validate(custom = "crate::validation::not_blank")]
    pub zone: String,
    #[validate(range(min = 0))]
    pub capacity: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateAdjustmentRequest {
    #[validate(custom = "crate::validation::not_blank")]
    pub sku: String,
    /// Signed stock delta; non-integers are rejected when decoding
    pub change: i64,
    #[validate(custom = "crate::validation::not_blank")]
    pub reason: String,
    #[serde(rename = "type")]
    pub adjustment_type: AdjustmentType,
    /// Defaults to the item's primary location
    pub location: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCycleCountRequest {
    #[validate(custom = "crate::validation::not_blank")]
    pub zone: String,
    #[validate(custom = "crate::validation::not_blank")]
    pub assigned_to: String,
    pub scheduled_date: NaiveDate,
    #[validate(range(min = 0))]
    pub items_total: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CycleCountProgressRequest {
    #[validate(range(min = 0))]
    pub items_counted: i32,
    #[validate(range(min = 0))]
    pub discrepancies: i32,
    pub expected_version: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateInternalTransferRequest {
    #[validate(custom = "crate::validation::not_blank")]
    pub from_location: String,
    #[validate(custom = "crate::validation::not_blank")]
    pub to_location: String,
    #[validate(custom = "crate::validation::not_blank")]
    pub sku: String,
    #[validate(range(min = 1))]
    pub quantity: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInternalTransferStatusRequest {
    pub status: InternalTransferStatus,
    pub expected_version: Option<i64>,
}

// ============================================================================
// Receiving
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateGrnRequest {
    #[validate(length(max = 50), custom = "crate::validation::not_blank")]
    pub po_number: String,
    #[validate(custom = "crate::validation::not_blank")]
    pub vendor: String,
    #[validate(range(min = 1))]
    pub items: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LogDiscrepancyRequest {
    #[serde(rename = "type")]
    pub discrepancy_type: DiscrepancyType,
    #[validate(custom = "crate::validation::not_blank")]
    pub notes: String,
    pub expected_version: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDockRequest {
    pub status: DockStatus,
    pub truck: Option<String>,
    pub vendor: Option<String>,
    pub eta: Option<DateTime<Utc>>,
    pub expected_version: Option<i64>,
}

// ============================================================================
// Picking
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePicklistRequest {
    #[validate(custom = "crate::validation::not_blank")]
    pub order_id: String,
    #[validate(custom = "crate::validation::not_blank")]
    pub customer: String,
    #[validate(range(min = 1))]
    pub items: i32,
    pub priority: PickPriority,
    #[validate(custom = "crate::validation::not_blank")]
    pub zone: String,
    /// The order feed sends `auto`; anything created by hand is `manual`
    pub origin: Option<PicklistOrigin>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PicklistQuery {
    pub view: Option<PicklistView>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AssignPickerRequest {
    #[validate(custom = "crate::validation::not_blank")]
    pub picker_name: String,
    pub expected_version: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePickerRequest {
    #[validate(custom = "crate::validation::not_blank")]
    pub picker_id: String,
    #[validate(custom = "crate::validation::not_blank")]
    pub name: String,
    #[validate(custom = "crate::validation::not_blank")]
    pub zone: String,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub pick_rate: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PickerBreakRequest {
    pub on_break: bool,
    pub expected_version: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateBatchRequest {
    #[validate(custom = "crate::validation::not_blank")]
    pub zone: String,
    pub picker: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BatchProgressRequest {
    #[validate(range(min = 0, max = 100))]
    pub progress: i32,
    pub expected_version: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateMultiOrderPickRequest {
    #[validate(length(min = 2))]
    pub orders: Vec<String>,
    #[validate(custom = "crate::validation::not_blank")]
    pub sku: String,
    #[validate(custom = "crate::validation::not_blank")]
    pub location: String,
    #[validate(range(min = 1))]
    pub total_qty: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePickedQtyRequest {
    #[validate(range(min = 0))]
    pub picked_qty: i32,
    pub expected_version: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateRouteRequest {
    #[validate(custom = "crate::validation::not_blank")]
    pub picker: String,
    #[validate(range(min = 1))]
    pub stops: i32,
    pub distance: Decimal,
    #[validate(range(min = 0))]
    pub estimated_time: i32,
    #[serde(default)]
    #[validate(range(min = 0, max = 100))]
    pub efficiency: i32,
}

// ============================================================================
// Inter-warehouse transfers
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransferRequest {
    #[validate(custom = "crate::validation::not_blank")]
    pub destination: String,
    #[validate(range(min = 1))]
    pub items: i32,
    pub sku: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTransferStatusRequest {
    pub status: WarehouseTransferStatus,
    pub expected_version: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TransferTelemetryRequest {
    pub distance: Decimal,
    pub eta: Option<DateTime<Utc>>,
    #[validate(range(min = 0, max = 100))]
    pub progress: i32,
}

// ============================================================================
// Quality
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateInspectionRequest {
    #[validate(custom = "crate::validation::not_blank")]
    pub batch_id: String,
    #[validate(custom = "crate::validation::not_blank")]
    pub product_name: String,
    #[validate(range(min = 0))]
    pub items_inspected: i32,
    #[validate(range(min = 0))]
    pub defects_found: i32,
    pub inspector: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTemperatureLogRequest {
    #[validate(custom = "crate::validation::not_blank")]
    pub zone: String,
    pub temperature: Decimal,
    pub humidity: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateSampleRequest {
    #[validate(custom = "crate::validation::not_blank")]
    pub batch_id: String,
    #[validate(custom = "crate::validation::not_blank")]
    pub product_name: String,
    #[validate(custom = "crate::validation::not_blank")]
    pub test_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SampleResultRequest {
    pub result: SampleResult,
    pub notes: Option<String>,
    pub expected_version: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateRejectionRequest {
    #[validate(custom = "crate::validation::not_blank")]
    pub batch_id: String,
    #[validate(custom = "crate::validation::not_blank")]
    pub product_name: String,
    #[validate(range(min = 1))]
    pub quantity: i32,
    #[validate(custom = "crate::validation::not_blank")]
    pub reason: String,
    pub disposition: RejectionDisposition,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateComplianceCheckRequest {
    #[validate(custom = "crate::validation::not_blank")]
    pub title: String,
    #[validate(custom = "crate::validation::not_blank")]
    pub category: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ToggleCheckRequest {
    pub completed: bool,
    pub expected_version: Option<i64>,
}

// ============================================================================
// Workforce
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateStaffRequest {
    #[validate(custom = "crate::validation::not_blank")]
    pub name: String,
    #[validate(custom = "crate::validation::not_blank")]
    pub role: String,
    pub shift: Shift,
    #[serde(default = "default_productivity")]
    #[validate(range(min = 0, max = 100))]
    pub productivity: i32,
    pub hourly_rate: Decimal,
}

fn default_productivity() -> i32 {
    100
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStaffStatusRequest {
    pub status: StaffStatus,
    pub expected_version: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateScheduleRequest {
    pub date: NaiveDate,
    pub shift: Shift,
    #[validate(range(min = 1))]
    pub required_staff: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AssignStaffRequest {
    pub staff_ids: Vec<Uuid>,
    pub expected_version: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LogAttendanceRequest {
    pub staff_id: Uuid,
    pub date: NaiveDate,
    pub clock_in: Option<NaiveTime>,
    pub clock_out: Option<NaiveTime>,
    pub status: AttendanceStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateLeaveRequest {
    pub staff_id: Uuid,
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LeaveDecisionRequest {
    pub status: LeaveDecision,
    pub expected_version: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTrainingRequest {
    pub staff_id: Uuid,
    #[validate(custom = "crate::validation::not_blank")]
    pub course: String,
    pub completed_on: Option<NaiveDate>,
    pub expires_on: Option<NaiveDate>,
}

// ============================================================================
// Exceptions
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateExceptionRequest {
    pub priority: ExceptionPriority,
    pub category: ExceptionCategory,
    #[validate(custom = "crate::validation::not_blank")]
    pub title: String,
    #[validate(custom = "crate::validation::not_blank")]
    pub description: String,
    pub reference: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateExceptionStatusRequest {
    pub status: ExceptionStatus,
    pub expected_version: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ResolveInboundRequest {
    pub action: InboundAction,
    pub expected_version: Option<i64>,
}

// ============================================================================
// Equipment
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateEquipmentRequest {
    #[validate(custom = "crate::validation::not_blank")]
    pub equipment_id: String,
    #[validate(custom = "crate::validation::not_blank")]
    pub name: String,
    #[validate(custom = "crate::validation::not_blank")]
    pub kind: String,
    #[validate(custom = "crate::validation::not_blank")]
    pub zone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEquipmentStatusRequest {
    pub status: EquipmentStatus,
    pub assigned_to: Option<String>,
    pub expected_version: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LogMaintenanceRequest {
    pub performed_on: NaiveDate,
    #[validate(custom = "crate::validation::not_blank")]
    pub description: String,
    #[validate(custom = "crate::validation::not_blank")]
    pub technician: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adjustment_rejects_fractional_change() {
        let body = r#"{"sku":"SKU-7","change":2.5,"reason":"found","type":"found"}"#;
        assert!(serde_json::from_str::<CreateAdjustmentRequest>(body).is_err());
    }

    #[test]
    fn test_adjustment_blank_reason_fails_validation() {
        let body = r#"{"sku":"SKU-7","change":5,"reason":"  ","type":"correction"}"#;
        let request: CreateAdjustmentRequest = serde_json::from_str(body).unwrap();
        let errors = request.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("reason"));
    }

    #[test]
    fn test_grn_request_uses_camel_case() {
        let body = r#"{"poNumber":"PO-9001","vendor":"Acme","items":40}"#;
        let request: CreateGrnRequest = serde_json::from_str(body).unwrap();
        assert_eq!(request.po_number, "PO-9001");
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_grn_request_rejects_zero_items() {
        let request = CreateGrnRequest {
            po_number: "PO-1".to_string(),
            vendor: "Acme".to_string(),
            items: 0,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_expected_version_is_optional() {
        let request: UpdateTransferStatusRequest =
            serde_json::from_str(r#"{"status":"en-route"}"#).unwrap();
        assert_eq!(request.status, WarehouseTransferStatus::EnRoute);
        assert_eq!(request.expected_version, None);
    }

    #[test]
    fn test_staff_productivity_defaults() {
        let request: CreateStaffRequest = serde_json::from_str(
            r#"{"name":"Kim","role":"picker","shift":"night","hourlyRate":"18.50"}"#,
        )
        .unwrap();
        assert_eq!(request.productivity, 100);
        assert_eq!(request.hourly_rate, Decimal::new(1850, 2));
    }
}
