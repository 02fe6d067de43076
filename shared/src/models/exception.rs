//! Operational exceptions raised across every area of the warehouse

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{DomainError, DomainResult};
use crate::lifecycle::{is_adjacent_forward, StatusMachine};
use crate::validation::require_text;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type), sqlx(type_name = "exception_priority", rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum ExceptionPriority {
    Critical,
    Medium,
    Low,
}

string_enum!(ExceptionPriority {
    Critical => "critical",
    Medium => "medium",
    Low => "low",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type), sqlx(type_name = "exception_category", rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum ExceptionCategory {
    Inbound,
    Inventory,
    Outbound,
    Qc,
}

string_enum!(ExceptionCategory {
    Inbound => "inbound",
    Inventory => "inventory",
    Outbound => "outbound",
    Qc => "qc",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type), sqlx(type_name = "exception_status", rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum ExceptionStatus {
    Open,
    Investigating,
    Resolved,
}

string_enum!(ExceptionStatus {
    Open => "open",
    Investigating => "investigating",
    Resolved => "resolved",
});

impl StatusMachine for ExceptionStatus {
    const ENTITY: &'static str = "exception";

    fn can_transition_to(self, next: Self) -> bool {
        is_adjacent_forward(Self::ALL, &self, &next)
    }

    fn is_terminal(self) -> bool {
        self == ExceptionStatus::Resolved
    }
}

/// How a resolved exception was closed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type), sqlx(type_name = "exception_resolution", rename_all = "kebab-case"))]
#[serde(rename_all = "kebab-case")]
pub enum ExceptionResolution {
    Investigated,
    ShipmentRejected,
    PartialAccepted,
}

string_enum!(ExceptionResolution {
    Investigated => "investigated",
    ShipmentRejected => "shipment-rejected",
    PartialAccepted => "partial-accepted",
});

/// Shortcut resolutions available to inbound exceptions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InboundAction {
    RejectShipment,
    AcceptPartial,
}

string_enum!(InboundAction {
    RejectShipment => "reject-shipment",
    AcceptPartial => "accept-partial",
});

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Exception {
    pub id: Uuid,
    pub priority: ExceptionPriority,
    pub category: ExceptionCategory,
    pub title: String,
    pub description: String,
    pub status: ExceptionStatus,
    pub resolution: Option<ExceptionResolution>,
    /// Related document, e.g. a PO number or SKU
    pub reference: Option<String>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Exception {
    pub fn advance(&mut self, next: ExceptionStatus) -> DomainResult<()> {
        self.status = self.status.transition_to(next)?;
        if self.status == ExceptionStatus::Resolved {
            self.resolution = Some(ExceptionResolution::Investigated);
        }
        Ok(())
    }

    /// Close an inbound exception directly, with or without investigation
    pub fn resolve_inbound(&mut self, action: InboundAction) -> DomainResult<()> {
        if self.category != ExceptionCategory::Inbound {
            return Err(DomainError::validation(
                "category",
                format!("'{}' is only available for inbound exceptions", action),
            ));
        }
        if self.status.is_terminal() {
            return Err(DomainError::invalid_transition(
                ExceptionStatus::ENTITY,
                self.status,
                ExceptionStatus::Resolved,
            ));
        }
        self.status = ExceptionStatus::Resolved;
        self.resolution = Some(match action {
            InboundAction::RejectShipment => ExceptionResolution::ShipmentRejected,
            InboundAction::AcceptPartial => ExceptionResolution::PartialAccepted,
        });
        Ok(())
    }
}

pub fn validate_exception(title: &str, description: &str) -> DomainResult<()> {
    require_text("title", title)?;
    require_text("description", description)
}

versioned_by_id!(Exception);

#[cfg(test)]
mod tests {
    use super::*;

    fn exception(category: ExceptionCategory) -> Exception {
        Exception {
            id: Uuid::new_v4(),
            priority: ExceptionPriority::Medium,
            category,
            title: "Short shipment".to_string(),
            description: "PO-9001 arrived 4 cartons short".to_string(),
            status: ExceptionStatus::Open,
            resolution: None,
            reference: Some("PO-9001".to_string()),
            version: 1,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_lifecycle_is_adjacent_forward() {
        let mut e = exception(ExceptionCategory::Inventory);
        assert!(e.advance(ExceptionStatus::Resolved).is_err());
        e.advance(ExceptionStatus::Investigating).unwrap();
        assert!(e.advance(ExceptionStatus::Open).is_err());
        e.advance(ExceptionStatus::Resolved).unwrap();
        assert_eq!(e.resolution, Some(ExceptionResolution::Investigated));
        assert!(e.advance(ExceptionStatus::Resolved).is_err());
    }

    #[test]
    fn test_inbound_shortcut_from_open() {
        let mut e = exception(ExceptionCategory::Inbound);
        e.resolve_inbound(InboundAction::RejectShipment).unwrap();
        assert_eq!(e.status, ExceptionStatus::Resolved);
        assert_eq!(e.resolution, Some(ExceptionResolution::ShipmentRejected));
        assert!(matches!(
            e.resolve_inbound(InboundAction::AcceptPartial),
            Err(DomainError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_inbound_shortcut_from_investigating() {
        let mut e = exception(ExceptionCategory::Inbound);
        e.advance(ExceptionStatus::Investigating).unwrap();
        e.resolve_inbound(InboundAction::AcceptPartial).unwrap();
        assert_eq!(e.resolution, Some(ExceptionResolution::PartialAccepted));
    }

    #[test]
    fn test_shortcut_rejected_for_other_categories() {
        let mut e = exception(ExceptionCategory::Qc);
        assert!(matches!(
            e.resolve_inbound(InboundAction::RejectShipment),
            Err(DomainError::Validation { .. })
        ));
        assert_eq!(e.status, ExceptionStatus::Open);
    }
}
