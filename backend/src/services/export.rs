//! CSV export of list endpoints

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use shared::{
    Adjustment, AdjustmentType, Grn, GrnStatus, InventoryItem, WarehouseTransfer,
    WarehouseTransferStatus,
};

use crate::error::{AppError, AppResult};

/// Serialize records as CSV with a header row taken from the field names
pub fn export_to_csv<T: Serialize>(data: &[T]) -> AppResult<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for record in data {
        wtr.serialize(record)
            .map_err(|e| AppError::Internal(format!("CSV serialization error: {}", e)))?;
    }
    let bytes = wtr
        .into_inner()
        .map_err(|e| AppError::Internal(format!("CSV writer error: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| AppError::Internal(format!("UTF-8 conversion error: {}", e)))
}

/// Inbound export row: `po_number,vendor,status,items,updated_at`
#[derive(Debug, Serialize)]
pub struct GrnCsvRow<'a> {
    pub po_number: &'a str,
    pub vendor: &'a str,
    pub status: GrnStatus,
    pub items: i32,
    pub updated_at: DateTime<Utc>,
}

impl<'a> From<&'a Grn> for GrnCsvRow<'a> {
    fn from(grn: &'a Grn) -> Self {
        Self {
            po_number: &grn.po_number,
            vendor: &grn.vendor,
            status: grn.status,
            items: grn.items,
            updated_at: grn.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ItemCsvRow<'a> {
    pub sku: &'a str,
    pub product_name: &'a str,
    pub category: &'a str,
    pub current_stock: i64,
    pub min_stock: i64,
    pub max_stock: i64,
    pub location: &'a str,
    pub unit_cost: Decimal,
    pub value: Decimal,
    pub expiry_date: Option<NaiveDate>,
}

impl<'a> From<&'a InventoryItem> for ItemCsvRow<'a> {
    fn from(item: &'a InventoryItem) -> Self {
        Self {
            sku: &item.sku,
            product_name: &item.product_name,
            category: &item.category,
            current_stock: item.current_stock,
            min_stock: item.min_stock,
            max_stock: item.max_stock,
            location: &item.location,
            unit_cost: item.unit_cost,
            value: item.value,
            expiry_date: item.expiry_date,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AdjustmentCsvRow<'a> {
    pub timestamp: DateTime<Utc>,
    pub adjustment_type: AdjustmentType,
    pub sku: &'a str,
    pub location: &'a str,
    pub change: i64,
    pub reason: &'a str,
    pub user: &'a str,
}

impl<'a> From<&'a Adjustment> for AdjustmentCsvRow<'a> {
    fn from(adjustment: &'a Adjustment) -> Self {
        Self {
            timestamp: adjustment.timestamp,
            adjustment_type: adjustment.adjustment_type,
            sku: &adjustment.sku,
            location: &adjustment.location,
            change: adjustment.change,
            reason: &adjustment.reason,
            user: &adjustment.user,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TransferCsvRow<'a> {
    pub transfer_id: &'a str,
    pub destination: &'a str,
    pub items: i32,
    pub sku: Option<&'a str>,
    pub status: WarehouseTransferStatus,
    pub progress: i32,
    pub eta: Option<DateTime<Utc>>,
}

impl<'a> From<&'a WarehouseTransfer> for TransferCsvRow<'a> {
    fn from(transfer: &'a WarehouseTransfer) -> Self {
        Self {
            transfer_id: &transfer.transfer_id,
            destination: &transfer.destination,
            items: transfer.items,
            sku: transfer.sku.as_deref(),
            status: transfer.status,
            progress: transfer.progress,
            eta: transfer.eta,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use uuid::Uuid;

    #[test]
    fn test_grn_row_layout() {
        let updated_at = Utc.with_ymd_and_hms(2024, 5, 2, 9, 30, 0).unwrap();
        let grn = Grn {
            id: Uuid::new_v4(),
            po_number: "PO-9001".to_string(),
            vendor: "Acme".to_string(),
            items: 40,
            status: GrnStatus::Completed,
            discrepancy_type: None,
            discrepancy_notes: None,
            putaway_pallets: Some(10),
            version: 3,
            created_at: updated_at,
            updated_at,
        };
        let csv = export_to_csv(&[GrnCsvRow::from(&grn)]).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("po_number,vendor,status,items,updated_at"));
        assert_eq!(lines.next(), Some("PO-9001,Acme,completed,40,2024-05-02T09:30:00Z"));
    }

    #[test]
    fn test_empty_export_has_no_rows() {
        let rows: Vec<GrnCsvRow> = Vec::new();
        assert_eq!(export_to_csv(&rows).unwrap(), "");
    }
}
