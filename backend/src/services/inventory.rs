//! Inventory ledger service: items, stock levels per location, adjustments,
//! cycle counts, internal transfers, derived alerts and bulk import

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use shared::{
    check_version, derive_all_alerts, generate_count_id, validate_adjustment,
    validate_internal_transfer, validate_sku, validate_stock_thresholds, Adjustment, AlertPolicy,
    CreateAdjustmentRequest, CreateCycleCountRequest, CreateInternalTransferRequest,
    CreateItemRequest, CreateLocationRequest, CycleCount, CycleCountPolicy,
    CycleCountProgressRequest, CycleCountStatus, DomainError, ImportSummary, InternalTransfer,
    InternalTransferStatus, InventoryItem, ItemImportRow, Location, StatusMachine, StockAlert,
    StockPosition,
};
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use super::next_sequence;
use crate::error::{map_unique_violation, AppError, AppResult};

/// Inventory service for stock levels and everything that moves them
#[derive(Clone)]
pub struct InventoryService {
    db: PgPool,
}

/// Item row with its stock summed over locations
#[derive(Debug, FromRow)]
struct ItemRow {
    id: Uuid,
    sku: String,
    product_name: String,
    category: String,
    current_stock: i64,
    min_stock: i64,
    max_stock: i64,
    primary_location: String,
    unit_cost: Decimal,
    expiry_date: Option<NaiveDate>,
    version: i64,
    updated_at: DateTime<Utc>,
}

impl From<ItemRow> for InventoryItem {
    fn from(row: ItemRow) -> Self {
        InventoryItem {
            value: InventoryItem::stock_value(row.current_stock, row.unit_cost),
            id: row.id,
            sku: row.sku,
            product_name: row.product_name,
            category: row.category,
            current_stock: row.current_stock,
            min_stock: row.min_stock,
            max_stock: row.max_stock,
            location: row.primary_location,
            unit_cost: row.unit_cost,
            expiry_date: row.expiry_date,
            version: row.version,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct LocationRow {
    id: Uuid,
    code: String,
    zone: String,
    capacity: i64,
    occupied: i64,
}

impl From<LocationRow> for Location {
    fn from(row: LocationRow) -> Self {
        Location {
            utilization: Location::utilization_percent(row.occupied, row.capacity),
            id: row.id,
            code: row.code,
            zone: row.zone,
            capacity: row.capacity,
            occupied: row.occupied,
        }
    }
}

#[derive(Debug, FromRow)]
struct LevelRow {
    location: String,
    quantity: i64,
}

const ITEM_SELECT: &str = r#"
    SELECT i.id, i.sku, i.product_name, i.category,
           COALESCE(SUM(s.quantity), 0)::BIGINT AS current_stock,
           i.min_stock, i.max_stock, i.primary_location, i.unit_cost, i.expiry_date,
           i.version, i.updated_at
    FROM inventory_items i
    LEFT JOIN stock_levels s ON s.sku = i.sku
"#;

const ADJUSTMENT_COLUMNS: &str =
    r#"id, adjustment_type, sku, location, change, reason, user_name AS "user", created_at AS timestamp"#;

const CYCLE_COUNT_COLUMNS: &str = "id, count_id, zone, assigned_to, scheduled_date, items_total, \
     items_counted, discrepancies, status, version, updated_at";

const INTERNAL_TRANSFER_COLUMNS: &str =
    "id, from_location, to_location, sku, quantity, status, version, created_at, updated_at";

impl InventoryService {
    /// Create a new InventoryService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    // ========================================================================
    // Items and locations
    // ========================================================================

    /// List every item with its current stock
    pub async fn list_items(&self) -> AppResult<Vec<InventoryItem>> {
        let rows = sqlx::query_as::<_, ItemRow>(&format!("{} GROUP BY i.id ORDER BY i.sku", ITEM_SELECT))
            .fetch_all(&self.db)
            .await?;

        Ok(rows.into_iter().map(InventoryItem::from).collect())
    }

    /// Get one item by SKU
    pub async fn get_item(&self, sku: &str) -> AppResult<InventoryItem> {
        let row = sqlx::query_as::<_, ItemRow>(&format!("{} WHERE i.sku = $1 GROUP BY i.id", ITEM_SELECT))
            .bind(sku)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Inventory item".to_string()))?;

        Ok(row.into())
    }

    /// Register a new SKU, with its opening stock at the primary location
    pub async fn create_item(&self, input: CreateItemRequest) -> AppResult<InventoryItem> {
        validate_sku(&input.sku)?;
        validate_stock_thresholds(input.min_stock, input.max_stock)?;
        if input.unit_cost < Decimal::ZERO {
            return Err(AppError::validation("unit_cost", "Unit cost cannot be negative"));
        }

        let sku = input.sku.trim().to_string();
        let location = input.location.trim().to_string();

        let mut tx = self.db.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO inventory_items (
                sku, product_name, category, min_stock, max_stock, primary_location,
                unit_cost, expiry_date
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(&sku)
        .bind(input.product_name.trim())
        .bind(input.category.trim())
        .bind(input.min_stock)
        .bind(input.max_stock)
        .bind(&location)
        .bind(input.unit_cost)
        .bind(input.expiry_date)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_unique_violation(e, "sku"))?;

        if input.current_stock > 0 {
            write_level(&mut *tx, &sku, &location, input.current_stock).await?;
        }

        tx.commit().await?;

        tracing::info!(sku = %sku, stock = input.current_stock, "Inventory item created");
        self.get_item(&sku).await
    }

    /// List locations with their occupancy
    pub async fn list_locations(&self) -> AppResult<Vec<Location>> {
        let rows = sqlx::query_as::<_, LocationRow>(
            r#"
            SELECT l.id, l.code, l.zone, l.capacity,
                   COALESCE(SUM(s.quantity), 0)::BIGINT AS occupied
            FROM locations l
            LEFT JOIN stock_levels s ON s.location = l.code
            GROUP BY l.id
            ORDER BY l.zone, l.code
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Location::from).collect())
    }

    /// Register a storage location
    pub async fn create_location(&self, input: CreateLocationRequest) -> AppResult<Location> {
        let row = sqlx::query_as::<_, LocationRow>(
            r#"
            INSERT INTO locations (code, zone, capacity)
            VALUES ($1, $2, $3)
            RETURNING id, code, zone, capacity,
                      (SELECT COALESCE(SUM(quantity), 0)::BIGINT FROM stock_levels WHERE location = $1) AS occupied
            "#,
        )
        .bind(input.code.trim())
        .bind(input.zone.trim())
        .bind(input.capacity)
        .fetch_one(&self.db)
        .await
        .map_err(|e| map_unique_violation(e, "code"))?;

        Ok(row.into())
    }

    // ========================================================================
    // Adjustments
    // ========================================================================

    /// List adjustments, newest first
    pub async fn list_adjustments(&self) -> AppResult<Vec<Adjustment>> {
        let adjustments = sqlx::query_as::<_, Adjustment>(&format!(
            "SELECT {} FROM stock_adjustments ORDER BY created_at DESC",
            ADJUSTMENT_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(adjustments)
    }

    /// Apply one signed stock delta and record it in the ledger
    pub async fn create_adjustment(&self, user: &str, input: CreateAdjustmentRequest) -> AppResult<Adjustment> {
        let sku = input.sku.trim();
        validate_adjustment(sku, input.change, &input.reason)?;

        let mut tx = self.db.begin().await?;

        let mut position = lock_position(&mut *tx, sku).await?;
        let location = match input.location.as_deref().map(str::trim) {
            Some(location) if !location.is_empty() => location.to_string(),
            _ => position.primary_location.clone(),
        };

        let level = position.apply_delta(&location, input.change).map_err(|e| {
            tracing::warn!(sku, location = %location, change = input.change, "Adjustment rejected: {}", e);
            e
        })?;
        write_level(&mut *tx, sku, &location, level).await?;
        touch_item(&mut *tx, sku).await?;

        let adjustment = sqlx::query_as::<_, Adjustment>(&format!(
            r#"
            INSERT INTO stock_adjustments (adjustment_type, sku, location, change, reason, user_name)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            ADJUSTMENT_COLUMNS
        ))
        .bind(input.adjustment_type)
        .bind(sku)
        .bind(&location)
        .bind(input.change)
        .bind(input.reason.trim())
        .bind(user)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            sku,
            location = %location,
            change = input.change,
            level,
            kind = %input.adjustment_type,
            "Stock adjusted"
        );
        Ok(adjustment)
    }

    // ========================================================================
    // Alerts
    // ========================================================================

    /// Alerts derived from the current item state, most urgent first
    pub async fn list_stock_alerts(&self, policy: &AlertPolicy, today: NaiveDate) -> AppResult<Vec<StockAlert>> {
        let items = self.list_items().await?;
        Ok(derive_all_alerts(&items, today, policy))
    }

    // ========================================================================
    // Cycle counts
    // ========================================================================

    pub async fn list_cycle_counts(&self) -> AppResult<Vec<CycleCount>> {
        let counts = sqlx::query_as::<_, CycleCount>(&format!(
            "SELECT {} FROM cycle_counts ORDER BY scheduled_date DESC, count_id DESC",
            CYCLE_COUNT_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(counts)
    }

    pub async fn create_cycle_count(&self, input: CreateCycleCountRequest) -> AppResult<CycleCount> {
        let mut tx = self.db.begin().await?;

        let sequence = next_sequence(&mut *tx, "cycle_count_seq").await?;
        let count_id = generate_count_id(input.scheduled_date.year(), sequence);

        let count = sqlx::query_as::<_, CycleCount>(&format!(
            r#"
            INSERT INTO cycle_counts (count_id, zone, assigned_to, scheduled_date, items_total)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            CYCLE_COUNT_COLUMNS
        ))
        .bind(&count_id)
        .bind(input.zone.trim())
        .bind(input.assigned_to.trim())
        .bind(input.scheduled_date)
        .bind(input.items_total)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(count_id = %count.count_id, zone = %count.zone, "Cycle count scheduled");
        Ok(count)
    }

    pub async fn start_cycle_count(&self, id: Uuid, expected_version: Option<i64>) -> AppResult<CycleCount> {
        self.mutate_cycle_count(id, expected_version, |count| count.start()).await
    }

    pub async fn record_cycle_count_progress(
        &self,
        id: Uuid,
        input: CycleCountProgressRequest,
    ) -> AppResult<CycleCount> {
        self.mutate_cycle_count(id, input.expected_version, |count| {
            count.record_progress(input.items_counted, input.discrepancies)
        })
        .await
    }

    pub async fn complete_cycle_count(
        &self,
        id: Uuid,
        expected_version: Option<i64>,
        policy: &CycleCountPolicy,
    ) -> AppResult<CycleCount> {
        self.mutate_cycle_count(id, expected_version, |count| count.complete(policy))
            .await
    }

    async fn mutate_cycle_count<F>(&self, id: Uuid, expected_version: Option<i64>, apply: F) -> AppResult<CycleCount>
    where
        F: FnOnce(&mut CycleCount) -> Result<(), DomainError>,
    {
        let mut tx = self.db.begin().await?;

        let mut count = sqlx::query_as::<_, CycleCount>(&format!(
            "SELECT {} FROM cycle_counts WHERE id = $1 FOR UPDATE",
            CYCLE_COUNT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Cycle count".to_string()))?;

        check_version(CycleCountStatus::ENTITY, expected_version, count.version)?;
        let from = count.status;
        apply(&mut count)?;

        let count = sqlx::query_as::<_, CycleCount>(&format!(
            r#"
            UPDATE cycle_counts
            SET status = $2, items_counted = $3, discrepancies = $4,
                version = version + 1, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            CYCLE_COUNT_COLUMNS
        ))
        .bind(id)
        .bind(count.status)
        .bind(count.items_counted)
        .bind(count.discrepancies)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            count_id = %count.count_id,
            from = %from,
            to = %count.status,
            counted = count.items_counted,
            "Cycle count updated"
        );
        Ok(count)
    }

    // ========================================================================
    // Internal transfers
    // ========================================================================

    pub async fn list_internal_transfers(&self) -> AppResult<Vec<InternalTransfer>> {
        let transfers = sqlx::query_as::<_, InternalTransfer>(&format!(
            "SELECT {} FROM internal_transfers ORDER BY created_at DESC",
            INTERNAL_TRANSFER_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(transfers)
    }

    pub async fn create_internal_transfer(&self, input: CreateInternalTransferRequest) -> AppResult<InternalTransfer> {
        let from = input.from_location.trim();
        let to = input.to_location.trim();
        let sku = input.sku.trim();
        validate_internal_transfer(from, to, sku, input.quantity)?;

        let sku_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM inventory_items WHERE sku = $1)",
        )
        .bind(sku)
        .fetch_one(&self.db)
        .await?;

        if !sku_exists {
            return Err(AppError::NotFound("Inventory item".to_string()));
        }

        let transfer = sqlx::query_as::<_, InternalTransfer>(&format!(
            r#"
            INSERT INTO internal_transfers (from_location, to_location, sku, quantity)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            INTERNAL_TRANSFER_COLUMNS
        ))
        .bind(from)
        .bind(to)
        .bind(sku)
        .bind(input.quantity)
        .fetch_one(&self.db)
        .await?;

        tracing::info!(sku, from, to, quantity = input.quantity, "Internal transfer created");
        Ok(transfer)
    }

    /// Advance an internal transfer; completion moves the stock in the same
    /// transaction
    pub async fn update_internal_transfer_status(
        &self,
        id: Uuid,
        next: InternalTransferStatus,
        expected_version: Option<i64>,
    ) -> AppResult<InternalTransfer> {
        let mut tx = self.db.begin().await?;

        let mut transfer = sqlx::query_as::<_, InternalTransfer>(&format!(
            "SELECT {} FROM internal_transfers WHERE id = $1 FOR UPDATE",
            INTERNAL_TRANSFER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Internal transfer".to_string()))?;

        check_version(InternalTransferStatus::ENTITY, expected_version, transfer.version)?;

        let mut position = lock_position(&mut *tx, &transfer.sku).await?;
        let primary_before = position.primary_location.clone();
        let from = transfer.status;

        transfer.advance(next, &mut position).map_err(|e| {
            tracing::warn!(transfer_id = %id, from = %from, to = %next, "Internal transfer rejected: {}", e);
            e
        })?;

        if transfer.status == InternalTransferStatus::Completed {
            for location in [&transfer.from_location, &transfer.to_location] {
                write_level(&mut *tx, &transfer.sku, location, position.level(location)).await?;
            }
            if position.primary_location != primary_before {
                sqlx::query("UPDATE inventory_items SET primary_location = $2 WHERE sku = $1")
                    .bind(&transfer.sku)
                    .bind(&position.primary_location)
                    .execute(&mut *tx)
                    .await?;
            }
            touch_item(&mut *tx, &transfer.sku).await?;
        }

        let transfer = sqlx::query_as::<_, InternalTransfer>(&format!(
            r#"
            UPDATE internal_transfers
            SET status = $2, version = version + 1, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            INTERNAL_TRANSFER_COLUMNS
        ))
        .bind(id)
        .bind(transfer.status)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            transfer_id = %id,
            sku = %transfer.sku,
            from = %from,
            to = %transfer.status,
            "Internal transfer updated"
        );
        Ok(transfer)
    }

    // ========================================================================
    // Bulk import
    // ========================================================================

    /// Import SKUs from parsed rows; rows whose SKU already exists are skipped
    pub async fn import_items(&self, rows: Vec<ItemImportRow>) -> AppResult<ImportSummary> {
        for (index, row) in rows.iter().enumerate() {
            row.validate().map_err(|e| match e {
                DomainError::Validation { field, message } => {
                    AppError::validation(field, format!("Row {}: {}", index + 1, message))
                }
                other => other.into(),
            })?;
        }

        let mut summary = ImportSummary::default();
        let mut tx = self.db.begin().await?;

        for row in &rows {
            let inserted = sqlx::query_scalar::<_, Uuid>(
                r#"
                INSERT INTO inventory_items (
                    sku, product_name, category, min_stock, max_stock, primary_location, unit_cost
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                ON CONFLICT (sku) DO NOTHING
                RETURNING id
                "#,
            )
            .bind(row.sku.trim())
            .bind(row.product_name.trim())
            .bind(row.category.trim())
            .bind(row.min_stock)
            .bind(row.max_stock)
            .bind(row.location.trim())
            .bind(row.unit_cost)
            .fetch_optional(&mut *tx)
            .await?;

            match inserted {
                Some(_) => {
                    if row.current_stock > 0 {
                        write_level(&mut *tx, row.sku.trim(), row.location.trim(), row.current_stock).await?;
                    }
                    summary.imported += 1;
                }
                None => summary.skipped += 1,
            }
        }

        tx.commit().await?;

        tracing::info!(imported = summary.imported, skipped = summary.skipped, "Bulk SKU import finished");
        Ok(summary)
    }
}

/// Parse an uploaded import file. Columns: `sku,product_name,category,
/// current_stock,min_stock,max_stock,location,unit_cost`.
pub fn parse_import(bytes: &[u8]) -> AppResult<Vec<ItemImportRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(bytes);

    reader
        .deserialize::<ItemImportRow>()
        .enumerate()
        .map(|(index, record)| {
            record.map_err(|e| AppError::validation("file", format!("Row {}: {}", index + 1, e)))
        })
        .collect()
}

/// Lock an item and its stock levels for the rest of the transaction
async fn lock_position(conn: &mut PgConnection, sku: &str) -> AppResult<StockPosition> {
    let primary = sqlx::query_scalar::<_, String>(
        "SELECT primary_location FROM inventory_items WHERE sku = $1 FOR UPDATE",
    )
    .bind(sku)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| AppError::NotFound("Inventory item".to_string()))?;

    let levels = sqlx::query_as::<_, LevelRow>(
        "SELECT location, quantity FROM stock_levels WHERE sku = $1 FOR UPDATE",
    )
    .bind(sku)
    .fetch_all(&mut *conn)
    .await?;

    Ok(levels
        .into_iter()
        .fold(StockPosition::new(sku, primary), |position, level| {
            position.with_level(level.location, level.quantity)
        }))
}

async fn write_level(conn: &mut PgConnection, sku: &str, location: &str, quantity: i64) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO stock_levels (sku, location, quantity)
        VALUES ($1, $2, $3)
        ON CONFLICT (sku, location) DO UPDATE SET quantity = EXCLUDED.quantity
        "#,
    )
    .bind(sku)
    .bind(location)
    .bind(quantity)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Bump the item version after any change to its stock
async fn touch_item(conn: &mut PgConnection, sku: &str) -> AppResult<()> {
    sqlx::query("UPDATE inventory_items SET version = version + 1, updated_at = NOW() WHERE sku = $1")
        .bind(sku)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Deduct stock from a SKU's primary location. Used when an inter-warehouse
/// transfer completes.
pub(crate) async fn deduct_from_primary(conn: &mut PgConnection, sku: &str, quantity: i64) -> AppResult<i64> {
    let mut position = lock_position(&mut *conn, sku).await?;
    let location = position.primary_location.clone();
    let level = position.apply_delta(&location, -quantity)?;
    write_level(&mut *conn, sku, &location, level).await?;
    touch_item(&mut *conn, sku).await?;
    Ok(level)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_import_reads_header_columns() {
        let file = "sku,product_name,category,current_stock,min_stock,max_stock,location,unit_cost\n\
                    SKU-1, Widget ,General,12,5,50,A-01,2.50\n\
                    SKU-2,Gadget,General,0,0,10,B-02,1\n";
        let rows = parse_import(file.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].product_name, "Widget");
        assert_eq!(rows[0].unit_cost, Decimal::new(250, 2));
        assert_eq!(rows[1].location, "B-02");
    }

    #[test]
    fn test_parse_import_reports_bad_row() {
        let file = "sku,product_name,category,current_stock,min_stock,max_stock,location,unit_cost\n\
                    SKU-1,Widget,General,twelve,5,50,A-01,2.50\n";
        let err = parse_import(file.as_bytes()).unwrap_err();
        assert!(matches!(err, AppError::Validation { ref field, .. } if field == "file"));
    }

    #[test]
    fn test_item_row_derives_value() {
        let item: InventoryItem = ItemRow {
            id: Uuid::new_v4(),
            sku: "SKU-7".to_string(),
            product_name: "Widget".to_string(),
            category: "General".to_string(),
            current_stock: 5,
            min_stock: 20,
            max_stock: 100,
            primary_location: "A-01".to_string(),
            unit_cost: Decimal::new(150, 2),
            expiry_date: None,
            version: 2,
            updated_at: Utc::now(),
        }
        .into();
        assert_eq!(item.value, Decimal::new(750, 2));
        assert_eq!(item.location, "A-01");
    }
}
