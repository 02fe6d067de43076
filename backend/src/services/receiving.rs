//! Receiving service: goods receipt notes and dock slots

use chrono::{DateTime, Utc};
use shared::{
    check_version, putaway_pallets, validate_grn, CreateGrnRequest, DiscrepancyType, DockSlot,
    DockStatus, DomainError, Grn, GrnStatus, StatusMachine, UpdateDockRequest,
};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct ReceivingService {
    db: PgPool,
}

#[derive(Debug, FromRow)]
struct GrnRow {
    id: Uuid,
    po_number: String,
    vendor: String,
    items: i32,
    status: GrnStatus,
    discrepancy_type: Option<DiscrepancyType>,
    discrepancy_notes: Option<String>,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<GrnRow> for Grn {
    fn from(row: GrnRow) -> Self {
        Grn {
            putaway_pallets: (row.status == GrnStatus::Completed).then(|| putaway_pallets(row.items)),
            id: row.id,
            po_number: row.po_number,
            vendor: row.vendor,
            items: row.items,
            status: row.status,
            discrepancy_type: row.discrepancy_type,
            discrepancy_notes: row.discrepancy_notes,
            version: row.version,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const GRN_COLUMNS: &str = "id, po_number, vendor, items, status, discrepancy_type, discrepancy_notes, \
     version, created_at, updated_at";

const DOCK_COLUMNS: &str = "id, dock_number, status, truck, vendor, eta, version, updated_at";

impl ReceivingService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// List GRNs, newest first
    pub async fn list_grns(&self) -> AppResult<Vec<Grn>> {
        let rows = sqlx::query_as::<_, GrnRow>(&format!(
            "SELECT {} FROM grns ORDER BY created_at DESC",
            GRN_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Grn::from).collect())
    }

    pub async fn create_grn(&self, input: CreateGrnRequest) -> AppResult<Grn> {
        validate_grn(&input.po_number, &input.vendor, input.items)?;

        let row = sqlx::query_as::<_, GrnRow>(&format!(
            r#"
            INSERT INTO grns (po_number, vendor, items)
            VALUES ($1, $2, $3)
            RETURNING {}
            "#,
            GRN_COLUMNS
        ))
        .bind(input.po_number.trim())
        .bind(input.vendor.trim())
        .bind(input.items)
        .fetch_one(&self.db)
        .await?;

        tracing::info!(grn_id = %row.id, po_number = %row.po_number, items = row.items, "GRN created");
        Ok(row.into())
    }

    pub async fn start_grn(&self, id: Uuid, expected_version: Option<i64>) -> AppResult<Grn> {
        self.mutate_grn(id, expected_version, Grn::start).await
    }

    pub async fn complete_grn(&self, id: Uuid, expected_version: Option<i64>) -> AppResult<Grn> {
        self.mutate_grn(id, expected_version, Grn::complete).await
    }

    pub async fn log_discrepancy(
        &self,
        id: Uuid,
        kind: DiscrepancyType,
        notes: &str,
        expected_version: Option<i64>,
    ) -> AppResult<Grn> {
        self.mutate_grn(id, expected_version, |grn| grn.log_discrepancy(kind, notes))
            .await
    }

    async fn mutate_grn<F>(&self, id: Uuid, expected_version: Option<i64>, apply: F) -> AppResult<Grn>
    where
        F: FnOnce(&mut Grn) -> Result<(), DomainError>,
    {
        let mut tx = self.db.begin().await?;

        let mut grn: Grn = sqlx::query_as::<_, GrnRow>(&format!(
            "SELECT {} FROM grns WHERE id = $1 FOR UPDATE",
            GRN_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("GRN".to_string()))?
        .into();

        check_version(GrnStatus::ENTITY, expected_version, grn.version)?;
        let from = grn.status;
        apply(&mut grn).map_err(|e| {
            tracing::warn!(grn_id = %id, from = %from, "GRN update rejected: {}", e);
            e
        })?;

        let row = sqlx::query_as::<_, GrnRow>(&format!(
            r#"
            UPDATE grns
            SET status = $2, discrepancy_type = $3, discrepancy_notes = $4,
                version = version + 1, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            GRN_COLUMNS
        ))
        .bind(id)
        .bind(grn.status)
        .bind(grn.discrepancy_type)
        .bind(&grn.discrepancy_notes)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(grn_id = %id, po_number = %row.po_number, from = %from, to = %row.status, "GRN updated");
        Ok(row.into())
    }

    // ========================================================================
    // Docks
    // ========================================================================

    pub async fn list_docks(&self) -> AppResult<Vec<DockSlot>> {
        let docks = sqlx::query_as::<_, DockSlot>(&format!(
            "SELECT {} FROM dock_slots ORDER BY dock_number",
            DOCK_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(docks)
    }

    pub async fn update_dock(&self, id: Uuid, input: UpdateDockRequest) -> AppResult<DockSlot> {
        let mut tx = self.db.begin().await?;

        let mut dock = sqlx::query_as::<_, DockSlot>(&format!(
            "SELECT {} FROM dock_slots WHERE id = $1 FOR UPDATE",
            DOCK_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Dock slot".to_string()))?;

        check_version(DockStatus::ENTITY, input.expected_version, dock.version)?;
        let from = dock.status;
        let blank_to_none = |value: Option<String>| {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        dock.update(
            input.status,
            blank_to_none(input.truck),
            blank_to_none(input.vendor),
            input.eta,
        )?;

        let dock = sqlx::query_as::<_, DockSlot>(&format!(
            r#"
            UPDATE dock_slots
            SET status = $2, truck = $3, vendor = $4, eta = $5,
                version = version + 1, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            DOCK_COLUMNS
        ))
        .bind(id)
        .bind(dock.status)
        .bind(&dock.truck)
        .bind(&dock.vendor)
        .bind(dock.eta)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(dock = %dock.dock_number, from = %from, to = %dock.status, "Dock slot updated");
        Ok(dock)
    }
}
