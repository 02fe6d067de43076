//! Inter-warehouse transfer service

use shared::{
    check_version, generate_transfer_id, validate_warehouse_transfer, CreateTransferRequest,
    StatusMachine, TransferTelemetryRequest, WarehouseTransfer, WarehouseTransferStatus,
};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::{inventory, next_sequence};
use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct TransferService {
    db: PgPool,
}

const TRANSFER_COLUMNS: &str = "id, transfer_id, destination, items, sku, status, distance, eta, progress, \
     version, created_at, updated_at";

impl TransferService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn list_transfers(&self) -> AppResult<Vec<WarehouseTransfer>> {
        let transfers = sqlx::query_as::<_, WarehouseTransfer>(&format!(
            "SELECT {} FROM warehouse_transfers ORDER BY created_at DESC",
            TRANSFER_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(transfers)
    }

    pub async fn create_transfer(&self, input: CreateTransferRequest) -> AppResult<WarehouseTransfer> {
        let sku = input
            .sku
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());
        validate_warehouse_transfer(&input.destination, input.items, sku)?;

        let mut tx = self.db.begin().await?;

        if let Some(sku) = sku {
            let exists = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM inventory_items WHERE sku = $1)",
            )
            .bind(sku)
            .fetch_one(&mut *tx)
            .await?;
            if !exists {
                return Err(AppError::NotFound("Inventory item".to_string()));
            }
        }

        let sequence = next_sequence(&mut *tx, "transfer_seq").await?;

        let transfer = sqlx::query_as::<_, WarehouseTransfer>(&format!(
            r#"
            INSERT INTO warehouse_transfers (transfer_id, destination, items, sku)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            TRANSFER_COLUMNS
        ))
        .bind(generate_transfer_id(sequence))
        .bind(input.destination.trim())
        .bind(input.items)
        .bind(sku)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            transfer_id = %transfer.transfer_id,
            destination = %transfer.destination,
            items = transfer.items,
            "Transfer created"
        );
        Ok(transfer)
    }

    /// Advance a transfer one step. Completing a transfer that carries a SKU
    /// deducts its items from the primary location in the same transaction.
    pub async fn update_status(
        &self,
        id: Uuid,
        next: WarehouseTransferStatus,
        expected_version: Option<i64>,
    ) -> AppResult<WarehouseTransfer> {
        let mut tx = self.db.begin().await?;

        let mut transfer = lock_transfer(&mut *tx, id).await?;
        check_version(WarehouseTransferStatus::ENTITY, expected_version, transfer.version)?;

        let from = transfer.status;
        let deduction = transfer.advance(next).map_err(|e| {
            tracing::warn!(transfer_id = %transfer.transfer_id, from = %from, to = %next, "Transfer transition rejected");
            e
        })?;

        if let Some(deduction) = &deduction {
            let remaining = inventory::deduct_from_primary(&mut *tx, &deduction.sku, deduction.quantity).await?;
            tracing::info!(
                sku = %deduction.sku,
                quantity = deduction.quantity,
                remaining,
                "Stock shipped out"
            );
        }

        let transfer = save_transfer(&mut *tx, &transfer).await?;
        tx.commit().await?;

        tracing::info!(transfer_id = %transfer.transfer_id, from = %from, to = %transfer.status, "Transfer updated");
        Ok(transfer)
    }

    /// Apply a tracking-feed update to an en-route transfer
    pub async fn update_telemetry(&self, id: Uuid, input: TransferTelemetryRequest) -> AppResult<WarehouseTransfer> {
        let mut tx = self.db.begin().await?;

        let mut transfer = lock_transfer(&mut *tx, id).await?;
        transfer.update_telemetry(input.distance, input.eta, input.progress)?;

        let transfer = save_transfer(&mut *tx, &transfer).await?;
        tx.commit().await?;

        tracing::debug!(transfer_id = %transfer.transfer_id, progress = transfer.progress, "Transfer telemetry");
        Ok(transfer)
    }
}

async fn lock_transfer(conn: &mut PgConnection, id: Uuid) -> AppResult<WarehouseTransfer> {
    let transfer = sqlx::query_as::<_, WarehouseTransfer>(&format!(
        "SELECT {} FROM warehouse_transfers WHERE id = $1 FOR UPDATE",
        TRANSFER_COLUMNS
    ))
    .bind(id)
    .fetch_optional(conn)
    .await?
    .ok_or_else(|| AppError::NotFound("Transfer".to_string()))?;

    Ok(transfer)
}

async fn save_transfer(conn: &mut PgConnection, transfer: &WarehouseTransfer) -> AppResult<WarehouseTransfer> {
    let transfer = sqlx::query_as::<_, WarehouseTransfer>(&format!(
        r#"
        UPDATE warehouse_transfers
        SET status = $2, distance = $3, eta = $4, progress = $5,
            version = version + 1, updated_at = NOW()
        WHERE id = $1
        RETURNING {}
        "#,
        TRANSFER_COLUMNS
    ))
    .bind(transfer.id)
    .bind(transfer.status)
    .bind(transfer.distance)
    .bind(transfer.eta)
    .bind(transfer.progress)
    .fetch_one(conn)
    .await?;

    Ok(transfer)
}
