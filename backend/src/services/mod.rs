//! Business logic services for the Warehouse Operations Platform
//!
//! Every mutation follows the same shape: open a transaction, lock the row
//! with `FOR UPDATE`, check the caller's version token, apply the transition
//! from `shared`, write back with `version = version + 1`, commit.

use sqlx::PgConnection;

use crate::error::AppResult;

pub mod equipment;
pub mod exception;
pub mod export;
pub mod inventory;
pub mod picking;
pub mod quality;
pub mod receiving;
pub mod transfer;
pub mod workforce;

pub use equipment::EquipmentService;
pub use exception::ExceptionService;
pub use inventory::InventoryService;
pub use picking::PickingService;
pub use quality::QualityService;
pub use receiving::ReceivingService;
pub use transfer::TransferService;
pub use workforce::WorkforceService;

/// Next value of a named Postgres sequence, used for display identifiers
pub(crate) async fn next_sequence(conn: &mut PgConnection, sequence: &str) -> AppResult<i64> {
    let value = sqlx::query_scalar::<_, i64>("SELECT nextval($1::regclass)")
        .bind(sequence)
        .fetch_one(conn)
        .await?;
    Ok(value)
}
