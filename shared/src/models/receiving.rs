//! Receiving pipeline: goods receipt notes and dock slots

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{DomainError, DomainResult};
use crate::lifecycle::StatusMachine;
use crate::validation::require_text;

/// GRN status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type), sqlx(type_name = "grn_status", rename_all = "kebab-case"))]
#[serde(rename_all = "kebab-case")]
pub enum GrnStatus {
    Pending,
    InProgress,
    Completed,
    Discrepancy,
}

string_enum!(GrnStatus {
    Pending => "pending",
    InProgress => "in-progress",
    Completed => "completed",
    Discrepancy => "discrepancy",
});

impl StatusMachine for GrnStatus {
    const ENTITY: &'static str = "GRN";

    fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (GrnStatus::Pending, GrnStatus::InProgress)
                | (GrnStatus::InProgress, GrnStatus::Completed)
                | (GrnStatus::InProgress, GrnStatus::Discrepancy)
        )
    }

    /// `discrepancy` is resolved outside the system
    fn is_terminal(self) -> bool {
        matches!(self, GrnStatus::Completed | GrnStatus::Discrepancy)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type), sqlx(type_name = "discrepancy_type", rename_all = "kebab-case"))]
#[serde(rename_all = "kebab-case")]
pub enum DiscrepancyType {
    Shortage,
    Overage,
    Damaged,
    WrongItem,
}

string_enum!(DiscrepancyType {
    Shortage => "shortage",
    Overage => "overage",
    Damaged => "damaged",
    WrongItem => "wrong-item",
});

/// Goods receipt note
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Grn {
    pub id: Uuid,
    pub po_number: String,
    pub vendor: String,
    pub items: i32,
    pub status: GrnStatus,
    pub discrepancy_type: Option<DiscrepancyType>,
    pub discrepancy_notes: Option<String>,
    /// Display-only estimate, present once completed
    pub putaway_pallets: Option<i32>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Grn {
    /// Count started
    pub fn start(&mut self) -> DomainResult<()> {
        self.status = self.status.transition_to(GrnStatus::InProgress)?;
        Ok(())
    }

    pub fn complete(&mut self) -> DomainResult<()> {
        self.status = self.status.transition_to(GrnStatus::Completed)?;
        self.putaway_pallets = Some(putaway_pallets(self.items));
        Ok(())
    }

    pub fn log_discrepancy(&mut self, kind: DiscrepancyType, notes: &str) -> DomainResult<()> {
        require_text("notes", notes)?;
        self.status = self.status.transition_to(GrnStatus::Discrepancy)?;
        self.discrepancy_type = Some(kind);
        self.discrepancy_notes = Some(notes.trim().to_string());
        Ok(())
    }
}

/// Validate the fields of a new GRN
pub fn validate_grn(po_number: &str, vendor: &str, items: i32) -> DomainResult<()> {
    require_text("po_number", po_number)?;
    require_text("vendor", vendor)?;
    if items <= 0 {
        return Err(DomainError::validation("items", "Items must be positive"));
    }
    Ok(())
}

/// Putaway pallets estimated for a received shipment, four items per pallet
pub fn putaway_pallets(items: i32) -> i32 {
    if items <= 0 {
        return 0;
    }
    (items + 3) / 4
}

// ============================================================================
// Dock slots
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type), sqlx(type_name = "dock_status", rename_all = "kebab-case"))]
#[serde(rename_all = "kebab-case")]
pub enum DockStatus {
    Empty,
    Active,
    Offline,
}

string_enum!(DockStatus {
    Empty => "empty",
    Active => "active",
    Offline => "offline",
});

impl StatusMachine for DockStatus {
    const ENTITY: &'static str = "dock slot";

    fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (DockStatus::Empty, DockStatus::Active)
                | (DockStatus::Active, DockStatus::Empty)
                | (DockStatus::Active, DockStatus::Offline)
                | (DockStatus::Offline, DockStatus::Active)
        )
    }

    fn is_terminal(self) -> bool {
        false
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct DockSlot {
    pub id: Uuid,
    pub dock_number: String,
    pub status: DockStatus,
    pub truck: Option<String>,
    pub vendor: Option<String>,
    pub eta: Option<DateTime<Utc>>,
    pub version: i64,
    pub updated_at: DateTime<Utc>,
}

impl DockSlot {
    /// Change occupancy; an emptied dock forgets its truck details
    pub fn update(
        &mut self,
        status: DockStatus,
        truck: Option<String>,
        vendor: Option<String>,
        eta: Option<DateTime<Utc>>,
    ) -> DomainResult<()> {
        if status != self.status {
            self.status = self.status.transition_to(status)?;
        }
        if self.status == DockStatus::Active {
            if truck.is_some() {
                self.truck = truck;
            }
            if vendor.is_some() {
                self.vendor = vendor;
            }
            if eta.is_some() {
                self.eta = eta;
            }
        } else {
            self.truck = None;
            self.vendor = None;
            self.eta = None;
        }
        Ok(())
    }
}

versioned_by_id!(Grn, DockSlot);

#[cfg(test)]
mod tests {
    use super::*;

    fn grn() -> Grn {
        Grn {
            id: Uuid::new_v4(),
            po_number: "PO-9001".to_string(),
            vendor: "Acme".to_string(),
            items: 40,
            status: GrnStatus::Pending,
            discrepancy_type: None,
            discrepancy_notes: None,
            putaway_pallets: None,
            version: 1,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_grn_happy_path() {
        let mut g = grn();
        g.start().unwrap();
        assert_eq!(g.status, GrnStatus::InProgress);
        g.complete().unwrap();
        assert_eq!(g.status, GrnStatus::Completed);
        assert_eq!(g.putaway_pallets, Some(10));
    }

    #[test]
    fn test_grn_cannot_complete_from_pending() {
        let mut g = grn();
        let err = g.complete().unwrap_err();
        assert!(matches!(err, DomainError::InvalidTransition { .. }));
        assert_eq!(g.status, GrnStatus::Pending);
    }

    #[test]
    fn test_discrepancy_requires_notes() {
        let mut g = grn();
        g.start().unwrap();
        let err = g.log_discrepancy(DiscrepancyType::Shortage, "  ").unwrap_err();
        assert!(matches!(err, DomainError::Validation { .. }));
        assert_eq!(g.status, GrnStatus::InProgress);

        g.log_discrepancy(DiscrepancyType::Shortage, "3 cartons short").unwrap();
        assert_eq!(g.status, GrnStatus::Discrepancy);
        assert!(g.complete().is_err());
    }

    #[test]
    fn test_putaway_pallets_rounds_up() {
        assert_eq!(putaway_pallets(40), 10);
        assert_eq!(putaway_pallets(41), 11);
        assert_eq!(putaway_pallets(1), 1);
        assert_eq!(putaway_pallets(0), 0);
    }

    #[test]
    fn test_validate_grn() {
        assert!(validate_grn("PO-1", "Acme", 5).is_ok());
        assert!(validate_grn("", "Acme", 5).is_err());
        assert!(validate_grn("PO-1", " ", 5).is_err());
        assert!(validate_grn("PO-1", "Acme", 0).is_err());
    }

    #[test]
    fn test_dock_transitions() {
        assert!(DockStatus::Empty.can_transition_to(DockStatus::Active));
        assert!(DockStatus::Active.can_transition_to(DockStatus::Offline));
        assert!(DockStatus::Offline.can_transition_to(DockStatus::Active));
        assert!(!DockStatus::Empty.can_transition_to(DockStatus::Offline));
        assert!(!DockStatus::Offline.can_transition_to(DockStatus::Empty));
    }

    #[test]
    fn test_emptied_dock_clears_truck() {
        let mut dock = DockSlot {
            id: Uuid::new_v4(),
            dock_number: "D1".to_string(),
            status: DockStatus::Empty,
            truck: None,
            vendor: None,
            eta: None,
            version: 1,
            updated_at: Utc::now(),
        };
        dock.update(DockStatus::Active, Some("TRK-12".to_string()), Some("Acme".to_string()), None)
            .unwrap();
        assert_eq!(dock.truck.as_deref(), Some("TRK-12"));
        dock.update(DockStatus::Empty, None, None, None).unwrap();
        assert_eq!(dock.truck, None);
        assert_eq!(dock.vendor, None);
    }
}
