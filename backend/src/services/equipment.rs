//! Equipment fleet and maintenance log service

use shared::{
    check_version, validate_maintenance, CreateEquipmentRequest, Equipment, EquipmentStatus,
    LogMaintenanceRequest, MaintenanceRecord, StatusMachine,
};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::error::{map_unique_violation, AppError, AppResult};

#[derive(Clone)]
pub struct EquipmentService {
    db: PgPool,
}

const EQUIPMENT_COLUMNS: &str =
    "id, equipment_id, name, kind, zone, status, assigned_to, last_maintenance, version, updated_at";

const MAINTENANCE_COLUMNS: &str = "id, equipment_id, performed_on, description, technician, created_at";

impl EquipmentService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn list_equipment(&self) -> AppResult<Vec<Equipment>> {
        let equipment = sqlx::query_as::<_, Equipment>(&format!(
            "SELECT {} FROM equipment ORDER BY zone, equipment_id",
            EQUIPMENT_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(equipment)
    }

    pub async fn create_equipment(&self, input: CreateEquipmentRequest) -> AppResult<Equipment> {
        let unit = sqlx::query_as::<_, Equipment>(&format!(
            r#"
            INSERT INTO equipment (equipment_id, name, kind, zone)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            EQUIPMENT_COLUMNS
        ))
        .bind(input.equipment_id.trim())
        .bind(input.name.trim())
        .bind(input.kind.trim())
        .bind(input.zone.trim())
        .fetch_one(&self.db)
        .await
        .map_err(|e| map_unique_violation(e, "equipment_id"))?;

        tracing::info!(equipment_id = %unit.equipment_id, kind = %unit.kind, "Equipment registered");
        Ok(unit)
    }

    pub async fn update_status(
        &self,
        id: Uuid,
        next: EquipmentStatus,
        assigned_to: Option<String>,
        expected_version: Option<i64>,
    ) -> AppResult<Equipment> {
        let assigned_to = assigned_to
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty());
        if next == EquipmentStatus::InUse && assigned_to.is_none() {
            return Err(AppError::validation("assigned_to", "In-use equipment needs an operator"));
        }

        let mut tx = self.db.begin().await?;

        let mut unit = lock_equipment(&mut *tx, id).await?;
        check_version(EquipmentStatus::ENTITY, expected_version, unit.version)?;

        let from = unit.status;
        unit.set_status(next, assigned_to).map_err(|e| {
            tracing::warn!(equipment_id = %unit.equipment_id, from = %from, to = %next, "Equipment transition rejected");
            e
        })?;

        let unit = save_equipment(&mut *tx, &unit).await?;
        tx.commit().await?;

        tracing::info!(equipment_id = %unit.equipment_id, from = %from, to = %unit.status, "Equipment status updated");
        Ok(unit)
    }

    pub async fn list_maintenance(&self, equipment_id: Uuid) -> AppResult<Vec<MaintenanceRecord>> {
        let records = sqlx::query_as::<_, MaintenanceRecord>(&format!(
            "SELECT {} FROM maintenance_records WHERE equipment_id = $1 ORDER BY performed_on DESC",
            MAINTENANCE_COLUMNS
        ))
        .bind(equipment_id)
        .fetch_all(&self.db)
        .await?;

        Ok(records)
    }

    /// Append a maintenance record and return the unit to service
    pub async fn log_maintenance(&self, id: Uuid, input: LogMaintenanceRequest) -> AppResult<MaintenanceRecord> {
        validate_maintenance(&input.description, &input.technician)?;

        let mut tx = self.db.begin().await?;

        let mut unit = lock_equipment(&mut *tx, id).await?;

        let record = sqlx::query_as::<_, MaintenanceRecord>(&format!(
            r#"
            INSERT INTO maintenance_records (equipment_id, performed_on, description, technician)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            MAINTENANCE_COLUMNS
        ))
        .bind(id)
        .bind(input.performed_on)
        .bind(input.description.trim())
        .bind(input.technician.trim())
        .fetch_one(&mut *tx)
        .await?;

        unit.record_maintenance(input.performed_on);
        let unit = save_equipment(&mut *tx, &unit).await?;

        tx.commit().await?;

        tracing::info!(
            equipment_id = %unit.equipment_id,
            performed_on = %record.performed_on,
            technician = %record.technician,
            "Maintenance logged"
        );
        Ok(record)
    }
}

async fn lock_equipment(conn: &mut PgConnection, id: Uuid) -> AppResult<Equipment> {
    let unit = sqlx::query_as::<_, Equipment>(&format!(
        "SELECT {} FROM equipment WHERE id = $1 FOR UPDATE",
        EQUIPMENT_COLUMNS
    ))
    .bind(id)
    .fetch_optional(conn)
    .await?
    .ok_or_else(|| AppError::NotFound("Equipment".to_string()))?;

    Ok(unit)
}

async fn save_equipment(conn: &mut PgConnection, unit: &Equipment) -> AppResult<Equipment> {
    let unit = sqlx::query_as::<_, Equipment>(&format!(
        r#"
        UPDATE equipment
        SET status = $2, assigned_to = $3, last_maintenance = $4,
            version = version + 1, updated_at = NOW()
        WHERE id = $1
        RETURNING {}
        "#,
        EQUIPMENT_COLUMNS
    ))
    .bind(unit.id)
    .bind(unit.status)
    .bind(&unit.assigned_to)
    .bind(unit.last_maintenance)
    .fetch_one(conn)
    .await?;

    Ok(unit)
}
