//! Inter-warehouse transfers

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{DomainError, DomainResult};
use crate::lifecycle::{is_adjacent_forward, StatusMachine};
use crate::validation::{require_text, validate_percent, validate_sku};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type), sqlx(type_name = "warehouse_transfer_status", rename_all = "kebab-case"))]
#[serde(rename_all = "kebab-case")]
pub enum WarehouseTransferStatus {
    Pending,
    Loading,
    EnRoute,
    Completed,
}

string_enum!(WarehouseTransferStatus {
    Pending => "pending",
    Loading => "loading",
    EnRoute => "en-route",
    Completed => "completed",
});

impl StatusMachine for WarehouseTransferStatus {
    const ENTITY: &'static str = "transfer";

    /// Strictly one step forward
    fn can_transition_to(self, next: Self) -> bool {
        is_adjacent_forward(Self::ALL, &self, &next)
    }

    fn is_terminal(self) -> bool {
        self == WarehouseTransferStatus::Completed
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct WarehouseTransfer {
    pub id: Uuid,
    pub transfer_id: String,
    pub destination: String,
    pub items: i32,
    /// When set, completion deducts `items` units of this SKU
    pub sku: Option<String>,
    pub status: WarehouseTransferStatus,
    /// Kilometres remaining, from the tracking feed
    pub distance: Option<Decimal>,
    pub eta: Option<DateTime<Utc>>,
    pub progress: i32,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Stock leaving the site when a transfer completes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockDeduction {
    pub sku: String,
    pub quantity: i64,
}

impl WarehouseTransfer {
    /// Advance one step. Returns the stock deduction to apply when the
    /// transfer completes.
    pub fn advance(&mut self, next: WarehouseTransferStatus) -> DomainResult<Option<StockDeduction>> {
        self.status = self.status.transition_to(next)?;
        match self.status {
            WarehouseTransferStatus::Completed => {
                self.progress = 100;
                Ok(self.stock_deduction())
            }
            _ => Ok(None),
        }
    }

    pub fn stock_deduction(&self) -> Option<StockDeduction> {
        self.sku.as_ref().map(|sku| StockDeduction {
            sku: sku.clone(),
            quantity: i64::from(self.items),
        })
    }

    /// Accept a tracking-feed update; only en-route transfers report telemetry
    pub fn update_telemetry(
        &mut self,
        distance: Decimal,
        eta: Option<DateTime<Utc>>,
        progress: i32,
    ) -> DomainResult<()> {
        if self.status != WarehouseTransferStatus::EnRoute {
            return Err(DomainError::validation(
                "status",
                format!("Telemetry is only accepted en route, current status: {}", self.status),
            ));
        }
        validate_percent("progress", progress)?;
        if distance < Decimal::ZERO {
            return Err(DomainError::validation("distance", "Distance cannot be negative"));
        }
        self.distance = Some(distance);
        self.eta = eta;
        self.progress = progress;
        Ok(())
    }
}

pub fn validate_warehouse_transfer(destination: &str, items: i32, sku: Option<&str>) -> DomainResult<()> {
    require_text("destination", destination)?;
    if items <= 0 {
        return Err(DomainError::validation("items", "Items must be positive"));
    }
    if let Some(sku) = sku {
        validate_sku(sku)?;
    }
    Ok(())
}

/// Generate transfer identifier: TRF-NNNNN
pub fn generate_transfer_id(sequence: i64) -> String {
    format!("TRF-{:05}", sequence)
}

versioned_by_id!(WarehouseTransfer);

#[cfg(test)]
mod tests {
    use super::*;

    fn transfer(sku: Option<&str>) -> WarehouseTransfer {
        WarehouseTransfer {
            id: Uuid::new_v4(),
            transfer_id: generate_transfer_id(42),
            destination: "North DC".to_string(),
            items: 12,
            sku: sku.map(str::to_string),
            status: WarehouseTransferStatus::Pending,
            distance: None,
            eta: None,
            progress: 0,
            version: 1,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_generate_transfer_id() {
        assert_eq!(generate_transfer_id(42), "TRF-00042");
    }

    #[test]
    fn test_skipping_en_route_is_rejected() {
        let mut t = transfer(None);
        t.advance(WarehouseTransferStatus::Loading).unwrap();
        let err = t.advance(WarehouseTransferStatus::Completed).unwrap_err();
        assert_eq!(
            err,
            DomainError::invalid_transition("transfer", "loading", "completed")
        );
        assert_eq!(t.status, WarehouseTransferStatus::Loading);
    }

    #[test]
    fn test_backward_and_repeat_moves_rejected() {
        let mut t = transfer(None);
        t.advance(WarehouseTransferStatus::Loading).unwrap();
        assert!(t.advance(WarehouseTransferStatus::Pending).is_err());
        assert!(t.advance(WarehouseTransferStatus::Loading).is_err());
    }

    #[test]
    fn test_completion_yields_single_deduction() {
        let mut t = transfer(Some("SKU-1"));
        assert_eq!(t.advance(WarehouseTransferStatus::Loading).unwrap(), None);
        assert_eq!(t.advance(WarehouseTransferStatus::EnRoute).unwrap(), None);
        let deduction = t.advance(WarehouseTransferStatus::Completed).unwrap();
        assert_eq!(
            deduction,
            Some(StockDeduction {
                sku: "SKU-1".to_string(),
                quantity: 12
            })
        );
        assert_eq!(t.progress, 100);
        assert!(t.advance(WarehouseTransferStatus::Completed).is_err());
    }

    #[test]
    fn test_telemetry_only_en_route() {
        let mut t = transfer(None);
        assert!(t.update_telemetry(Decimal::from(80), None, 10).is_err());
        t.advance(WarehouseTransferStatus::Loading).unwrap();
        t.advance(WarehouseTransferStatus::EnRoute).unwrap();
        t.update_telemetry(Decimal::from(80), None, 10).unwrap();
        assert_eq!(t.progress, 10);
        assert!(t.update_telemetry(Decimal::from(80), None, 120).is_err());
    }
}
