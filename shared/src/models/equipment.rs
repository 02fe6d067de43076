//! Equipment register: material-handling units and their maintenance log

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainResult;
use crate::lifecycle::StatusMachine;
use crate::validation::require_text;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type), sqlx(type_name = "equipment_status", rename_all = "kebab-case"))]
#[serde(rename_all = "kebab-case")]
pub enum EquipmentStatus {
    Available,
    InUse,
    Maintenance,
    Offline,
}

string_enum!(EquipmentStatus {
    Available => "available",
    InUse => "in-use",
    Maintenance => "maintenance",
    Offline => "offline",
});

impl StatusMachine for EquipmentStatus {
    const ENTITY: &'static str = "equipment";

    fn can_transition_to(self, next: Self) -> bool {
        use EquipmentStatus::*;
        match (self, next) {
            (a, b) if a == b => false,
            (Maintenance, next) => matches!(next, Available | Offline),
            (Offline, next) => matches!(next, Available | Maintenance),
            _ => true,
        }
    }

    fn is_terminal(self) -> bool {
        false
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Equipment {
    pub id: Uuid,
    pub equipment_id: String,
    pub name: String,
    /// Forklift, reach truck, pallet jack, scanner...
    pub kind: String,
    pub zone: String,
    pub status: EquipmentStatus,
    pub assigned_to: Option<String>,
    pub last_maintenance: Option<NaiveDate>,
    pub version: i64,
    pub updated_at: DateTime<Utc>,
}

impl Equipment {
    pub fn set_status(&mut self, next: EquipmentStatus, assigned_to: Option<String>) -> DomainResult<()> {
        self.status = self.status.transition_to(next)?;
        self.assigned_to = match self.status {
            EquipmentStatus::InUse => assigned_to,
            _ => None,
        };
        Ok(())
    }

    /// Record completed maintenance; the unit becomes available again
    pub fn record_maintenance(&mut self, performed_on: NaiveDate) {
        self.status = EquipmentStatus::Available;
        self.assigned_to = None;
        self.last_maintenance = Some(match self.last_maintenance {
            Some(previous) if previous > performed_on => previous,
            _ => performed_on,
        });
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceRecord {
    pub id: Uuid,
    pub equipment_id: Uuid,
    pub performed_on: NaiveDate,
    pub description: String,
    pub technician: String,
    pub created_at: DateTime<Utc>,
}

pub fn validate_maintenance(description: &str, technician: &str) -> DomainResult<()> {
    require_text("description", description)?;
    require_text("technician", technician)
}

versioned_by_id!(Equipment);
append_only_by_id!(MaintenanceRecord);

#[cfg(test)]
mod tests {
    use super::*;

    fn forklift() -> Equipment {
        Equipment {
            id: Uuid::new_v4(),
            equipment_id: "FL-03".to_string(),
            name: "Forklift 3".to_string(),
            kind: "forklift".to_string(),
            zone: "A".to_string(),
            status: EquipmentStatus::Available,
            assigned_to: None,
            last_maintenance: None,
            version: 1,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_maintenance_can_only_exit_to_available_or_offline() {
        let mut unit = forklift();
        unit.set_status(EquipmentStatus::Maintenance, None).unwrap();
        assert!(unit.set_status(EquipmentStatus::InUse, Some("Sam".to_string())).is_err());
        unit.set_status(EquipmentStatus::Offline, None).unwrap();
    }

    #[test]
    fn test_in_use_keeps_operator() {
        let mut unit = forklift();
        unit.set_status(EquipmentStatus::InUse, Some("Sam".to_string())).unwrap();
        assert_eq!(unit.assigned_to.as_deref(), Some("Sam"));
        unit.set_status(EquipmentStatus::Available, Some("Sam".to_string())).unwrap();
        assert_eq!(unit.assigned_to, None);
    }

    #[test]
    fn test_record_maintenance_returns_unit() {
        let mut unit = forklift();
        unit.set_status(EquipmentStatus::Maintenance, None).unwrap();
        let day = NaiveDate::from_ymd_opt(2024, 4, 2).unwrap();
        unit.record_maintenance(day);
        assert_eq!(unit.status, EquipmentStatus::Available);
        assert_eq!(unit.last_maintenance, Some(day));

        // A back-dated record does not move the date backwards
        unit.record_maintenance(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(unit.last_maintenance, Some(day));
    }
}
