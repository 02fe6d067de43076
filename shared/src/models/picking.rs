//! Picking and fulfillment: picklists, pickers, batches, multi-order picks
//! and routes

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{DomainError, DomainResult};
use crate::lifecycle::StatusMachine;
use crate::validation::validate_percent;

// ============================================================================
// Picklists
// ============================================================================

/// Ordered from most to least urgent
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type), sqlx(type_name = "pick_priority", rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum PickPriority {
    Urgent,
    High,
    Standard,
}

string_enum!(PickPriority {
    Urgent => "urgent",
    High => "high",
    Standard => "standard",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type), sqlx(type_name = "picklist_status", rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum PicklistStatus {
    Pending,
    Queued,
    Assigned,
    Picking,
    Completed,
}

string_enum!(PicklistStatus {
    Pending => "pending",
    Queued => "queued",
    Assigned => "assigned",
    Picking => "picking",
    Completed => "completed",
});

impl StatusMachine for PicklistStatus {
    const ENTITY: &'static str = "picklist";

    fn can_transition_to(self, next: Self) -> bool {
        use PicklistStatus::*;
        matches!(
            (self, next),
            (Pending, Queued)
                | (Pending, Assigned)
                | (Queued, Assigned)
                | (Assigned, Picking)
                | (Picking, Completed)
        )
    }

    fn is_terminal(self) -> bool {
        self == PicklistStatus::Completed
    }
}

/// How a picklist came into existence, fixed at creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type), sqlx(type_name = "picklist_origin", rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum PicklistOrigin {
    /// Generated by the order feed
    Auto,
    /// Created by a supervisor
    Manual,
}

string_enum!(PicklistOrigin {
    Auto => "auto",
    Manual => "manual",
});

/// Partition requested by `listPicklists`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PicklistView {
    #[default]
    All,
    Auto,
    Manual,
}

string_enum!(PicklistView {
    All => "all",
    Auto => "auto",
    Manual => "manual",
});

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PicklistOrder {
    pub id: Uuid,
    pub order_id: String,
    pub customer: String,
    pub items: i32,
    pub priority: PickPriority,
    pub status: PicklistStatus,
    pub picker: Option<String>,
    pub zone: String,
    pub origin: PicklistOrigin,
    pub batch_id: Option<String>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PicklistOrder {
    pub fn matches_view(&self, view: PicklistView) -> bool {
        match view {
            PicklistView::All => true,
            PicklistView::Auto => self.origin == PicklistOrigin::Auto,
            PicklistView::Manual => self.origin == PicklistOrigin::Manual,
        }
    }

    pub fn queue(&mut self) -> DomainResult<()> {
        self.status = self.status.transition_to(PicklistStatus::Queued)?;
        Ok(())
    }

    /// Assign (or reassign) a picker. Returns the picker that lost the order,
    /// if any. Orders grouped into a batch are picked with the batch.
    pub fn assign(&mut self, picker: &str) -> DomainResult<Option<String>> {
        if self.batch_id.is_some() {
            return Err(DomainError::invalid_transition(
                PicklistStatus::ENTITY,
                self.status,
                PicklistStatus::Assigned,
            ));
        }
        match self.status {
            PicklistStatus::Assigned => {}
            status => {
                self.status = status.transition_to(PicklistStatus::Assigned)?;
            }
        }
        let previous = self.picker.replace(picker.to_string());
        Ok(previous.filter(|p| p != picker))
    }

    pub fn start_picking(&mut self) -> DomainResult<()> {
        self.status = self.status.transition_to(PicklistStatus::Picking)?;
        Ok(())
    }

    pub fn complete(&mut self) -> DomainResult<()> {
        self.status = self.status.transition_to(PicklistStatus::Completed)?;
        Ok(())
    }
}

/// View predicate used before origins were stored.
///
/// `None` for rows that fall in neither partition, e.g. a completed order
/// with no picker.
pub fn legacy_origin(picker: Option<&str>, status: PicklistStatus) -> Option<PicklistOrigin> {
    let has_picker = picker.map(|p| !p.trim().is_empty()).unwrap_or(false);
    if !has_picker && matches!(status, PicklistStatus::Pending | PicklistStatus::Queued) {
        Some(PicklistOrigin::Auto)
    } else if has_picker || matches!(status, PicklistStatus::Assigned | PicklistStatus::Picking) {
        Some(PicklistOrigin::Manual)
    } else {
        None
    }
}

/// Stored origin, falling back to the legacy predicate, then to manual
pub fn resolve_origin(
    stored: Option<PicklistOrigin>,
    picker: Option<&str>,
    status: PicklistStatus,
) -> PicklistOrigin {
    stored
        .or_else(|| legacy_origin(picker, status))
        .unwrap_or(PicklistOrigin::Manual)
}

// ============================================================================
// Pickers
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PickerStatus {
    Available,
    Busy,
    Break,
}

string_enum!(PickerStatus {
    Available => "available",
    Busy => "busy",
    Break => "break",
});

pub fn derive_picker_status(on_break: bool, active_orders: i32) -> PickerStatus {
    if on_break {
        PickerStatus::Break
    } else if active_orders > 0 {
        PickerStatus::Busy
    } else {
        PickerStatus::Available
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PickerAssignment {
    pub id: Uuid,
    pub picker_id: String,
    pub name: String,
    /// Always [`derive_picker_status`] of `on_break` and `active_orders`
    pub status: PickerStatus,
    pub on_break: bool,
    pub active_orders: i32,
    pub completed_today: i32,
    /// Units per hour
    pub pick_rate: i32,
    pub zone: String,
    pub version: i64,
    pub updated_at: DateTime<Utc>,
}

impl PickerAssignment {
    fn refresh_status(&mut self) {
        self.status = derive_picker_status(self.on_break, self.active_orders);
    }

    pub fn take_order(&mut self) -> DomainResult<()> {
        if self.on_break {
            return Err(DomainError::invalid_transition(
                "picker",
                PickerStatus::Break,
                PickerStatus::Busy,
            ));
        }
        self.active_orders += 1;
        self.refresh_status();
        Ok(())
    }

    /// Drop one active order; `completed` counts it toward today's total
    pub fn release_order(&mut self, completed: bool) {
        self.active_orders = (self.active_orders - 1).max(0);
        if completed {
            self.completed_today += 1;
        }
        self.refresh_status();
    }

    pub fn set_break(&mut self, on_break: bool) -> DomainResult<()> {
        if on_break && self.active_orders > 0 {
            return Err(DomainError::invalid_transition(
                "picker",
                PickerStatus::Busy,
                PickerStatus::Break,
            ));
        }
        self.on_break = on_break;
        self.refresh_status();
        Ok(())
    }
}

// ============================================================================
// Batches
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type), sqlx(type_name = "batch_status", rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    Preparing,
    Picking,
    Completed,
}

string_enum!(BatchStatus {
    Preparing => "preparing",
    Picking => "picking",
    Completed => "completed",
});

impl StatusMachine for BatchStatus {
    const ENTITY: &'static str = "batch";

    fn can_transition_to(self, next: Self) -> bool {
        use BatchStatus::*;
        matches!(
            (self, next),
            (Preparing, Picking) | (Preparing, Completed) | (Picking, Completed)
        )
    }

    fn is_terminal(self) -> bool {
        self == BatchStatus::Completed
    }
}

/// Status implied by a progress percentage
pub fn status_for_progress(progress: i32) -> BatchStatus {
    match progress {
        p if p >= 100 => BatchStatus::Completed,
        p if p > 0 => BatchStatus::Picking,
        _ => BatchStatus::Preparing,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct BatchOrder {
    pub id: Uuid,
    pub batch_id: String,
    pub zone: String,
    pub order_count: i32,
    pub total_items: i32,
    pub picker: Option<String>,
    pub status: BatchStatus,
    pub progress: i32,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BatchOrder {
    /// Progress only grows; reaching 100 completes the batch
    pub fn update_progress(&mut self, progress: i32) -> DomainResult<()> {
        validate_percent("progress", progress)?;
        if self.status.is_terminal() {
            return Err(DomainError::invalid_transition(
                BatchStatus::ENTITY,
                self.status,
                status_for_progress(progress),
            ));
        }
        if progress < self.progress {
            return Err(DomainError::validation("progress", "Progress cannot decrease"));
        }
        let next = status_for_progress(progress);
        if next != self.status {
            self.status = self.status.transition_to(next)?;
        }
        self.progress = progress;
        Ok(())
    }
}

/// Orders selected for a new batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchPlan {
    pub zone: String,
    pub order_ids: Vec<Uuid>,
    pub total_items: i32,
}

impl BatchPlan {
    pub fn order_count(&self) -> i32 {
        self.order_ids.len() as i32
    }
}

/// Group the zone's unassigned pending or queued picklists into one batch
pub fn plan_batch(zone: &str, orders: &[PicklistOrder]) -> DomainResult<BatchPlan> {
    let selected: Vec<&PicklistOrder> = orders
        .iter()
        .filter(|o| o.zone == zone)
        .filter(|o| o.picker.is_none() && o.batch_id.is_none())
        .filter(|o| matches!(o.status, PicklistStatus::Pending | PicklistStatus::Queued))
        .collect();

    if selected.is_empty() {
        return Err(DomainError::validation(
            "zone",
            format!("No unassigned orders waiting in zone {}", zone),
        ));
    }

    Ok(BatchPlan {
        zone: zone.to_string(),
        order_ids: selected.iter().map(|o| o.id).collect(),
        total_items: selected.iter().map(|o| o.items).sum(),
    })
}

/// Generate batch identifier: BATCH-NNNN
pub fn generate_batch_id(sequence: i64) -> String {
    format!("BATCH-{:04}", sequence)
}

// ============================================================================
// Multi-order picks
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MultiPickStatus {
    Pending,
    InProgress,
    Completed,
}

string_enum!(MultiPickStatus {
    Pending => "pending",
    InProgress => "in-progress",
    Completed => "completed",
});

/// Status of a multi-order pick, a pure function of its quantities
pub fn derive_multi_pick_status(picked_qty: i32, total_qty: i32) -> MultiPickStatus {
    if picked_qty <= 0 {
        MultiPickStatus::Pending
    } else if picked_qty < total_qty {
        MultiPickStatus::InProgress
    } else {
        MultiPickStatus::Completed
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MultiOrderPick {
    pub id: Uuid,
    pub pick_id: String,
    pub orders: Vec<String>,
    pub sku: String,
    pub location: String,
    pub total_qty: i32,
    pub picked_qty: i32,
    /// Always [`derive_multi_pick_status`] of the quantities
    pub status: MultiPickStatus,
    pub version: i64,
    pub updated_at: DateTime<Utc>,
}

impl MultiOrderPick {
    pub fn update_picked(&mut self, picked_qty: i32) -> DomainResult<()> {
        if picked_qty < 0 {
            return Err(DomainError::validation("picked_qty", "Picked quantity cannot be negative"));
        }
        if picked_qty > self.total_qty {
            return Err(DomainError::validation(
                "picked_qty",
                "Picked quantity cannot exceed the total quantity",
            ));
        }
        self.picked_qty = picked_qty;
        self.status = derive_multi_pick_status(self.picked_qty, self.total_qty);
        Ok(())
    }
}

/// Generate multi-order pick identifier: MOP-NNNN
pub fn generate_pick_id(sequence: i64) -> String {
    format!("MOP-{:04}", sequence)
}

// ============================================================================
// Routes
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type), sqlx(type_name = "route_status", rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum RouteStatus {
    Planned,
    Active,
    Completed,
}

string_enum!(RouteStatus {
    Planned => "planned",
    Active => "active",
    Completed => "completed",
});

impl StatusMachine for RouteStatus {
    const ENTITY: &'static str = "route";

    fn can_transition_to(self, next: Self) -> bool {
        crate::lifecycle::is_adjacent_forward(Self::ALL, &self, &next)
    }

    fn is_terminal(self) -> bool {
        self == RouteStatus::Completed
    }
}

/// Metrics produced by the external optimizer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OptimizedRoute {
    pub distance: Decimal,
    pub estimated_time: i32,
    pub efficiency: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct RouteOptimization {
    pub id: Uuid,
    pub route_id: String,
    pub picker: String,
    pub stops: i32,
    /// Metres
    pub distance: Decimal,
    /// Minutes
    pub estimated_time: i32,
    pub efficiency: i32,
    pub status: RouteStatus,
    pub version: i64,
    pub updated_at: DateTime<Utc>,
}

impl RouteOptimization {
    /// Activate the route, taking the optimizer's metrics when there are any
    pub fn apply_optimization(&mut self, optimized: Option<OptimizedRoute>) -> DomainResult<()> {
        let next = self.status.transition_to(RouteStatus::Active)?;
        if let Some(route) = optimized {
            validate_percent("efficiency", route.efficiency)?;
            if route.distance < Decimal::ZERO || route.estimated_time < 0 {
                return Err(DomainError::validation(
                    "distance",
                    "Optimizer returned negative metrics",
                ));
            }
            self.distance = route.distance;
            self.estimated_time = route.estimated_time;
            self.efficiency = route.efficiency;
        }
        self.status = next;
        Ok(())
    }

    pub fn complete(&mut self) -> DomainResult<()> {
        self.status = self.status.transition_to(RouteStatus::Completed)?;
        Ok(())
    }
}

/// Generate route identifier: RT-NNNN
pub fn generate_route_id(sequence: i64) -> String {
    format!("RT-{:04}", sequence)
}

versioned_by_id!(PicklistOrder, PickerAssignment, BatchOrder, MultiOrderPick, RouteOptimization);


#[cfg(test)]
mod derivation_properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Status depends on the quantities alone and falls in the band they name
        #[test]
        fn prop_multi_pick_status_is_pure(picked in -5i32..300, total in 1i32..250) {
            let status = derive_multi_pick_status(picked, total);
            prop_assert_eq!(status, derive_multi_pick_status(picked, total));

            let expected = if picked <= 0 {
                MultiPickStatus::Pending
            } else if picked < total {
                MultiPickStatus::InProgress
            } else {
                MultiPickStatus::Completed
            };
            prop_assert_eq!(status, expected);
        }
    }
}
