//! Quality control service: inspections, temperature monitoring, samples,
//! rejections and the compliance checklist

use chrono::{DateTime, Utc};
use shared::{
    check_version, classify_temperature, generate_sample_id, validate_humidity, validate_inspection,
    validate_rejection, ComplianceCheck, CreateComplianceCheckRequest, CreateInspectionRequest,
    CreateRejectionRequest, CreateSampleRequest, CreateTemperatureLogRequest, QcInspection, Rejection,
    SampleResult, SampleStatus, SampleTest, StatusMachine, TemperatureBands, TemperatureLog,
    TemperatureStatus,
};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::next_sequence;
use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct QualityService {
    db: PgPool,
}

/// Stored inspection; score and status are derived on read
#[derive(Debug, FromRow)]
struct InspectionRow {
    id: Uuid,
    batch_id: String,
    product_name: String,
    items_inspected: i32,
    defects_found: i32,
    inspector: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<InspectionRow> for QcInspection {
    fn from(row: InspectionRow) -> Self {
        QcInspection::derive(
            row.id,
            row.batch_id,
            row.product_name,
            row.items_inspected,
            row.defects_found,
            row.inspector,
            row.created_at,
        )
    }
}

const INSPECTION_COLUMNS: &str =
    "id, batch_id, product_name, items_inspected, defects_found, inspector, created_at";

const TEMPERATURE_COLUMNS: &str = "id, zone, temperature, humidity, status, recorded_at";

const SAMPLE_COLUMNS: &str =
    "id, sample_id, batch_id, product_name, test_type, status, notes, tested_at, version, created_at";

const REJECTION_COLUMNS: &str = "id, batch_id, product_name, quantity, reason, disposition, created_at";

const CHECK_COLUMNS: &str = "id, title, category, completed, completed_at, version, updated_at";

impl QualityService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    // ========================================================================
    // Inspections
    // ========================================================================

    pub async fn list_inspections(&self) -> AppResult<Vec<QcInspection>> {
        let rows = sqlx::query_as::<_, InspectionRow>(&format!(
            "SELECT {} FROM qc_inspections ORDER BY created_at DESC",
            INSPECTION_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(QcInspection::from).collect())
    }

    pub async fn create_inspection(&self, input: CreateInspectionRequest) -> AppResult<QcInspection> {
        validate_inspection(input.items_inspected, input.defects_found)?;
        let inspector = input
            .inspector
            .map(|i| i.trim().to_string())
            .filter(|i| !i.is_empty());

        let inspection: QcInspection = sqlx::query_as::<_, InspectionRow>(&format!(
            r#"
            INSERT INTO qc_inspections (batch_id, product_name, items_inspected, defects_found, inspector)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            INSPECTION_COLUMNS
        ))
        .bind(input.batch_id.trim())
        .bind(input.product_name.trim())
        .bind(input.items_inspected)
        .bind(input.defects_found)
        .bind(&inspector)
        .fetch_one(&self.db)
        .await?
        .into();

        tracing::info!(
            batch_id = %inspection.batch_id,
            score = inspection.score,
            status = %inspection.status,
            "Inspection recorded"
        );
        Ok(inspection)
    }

    // ========================================================================
    // Temperature
    // ========================================================================

    pub async fn list_temperature_logs(&self) -> AppResult<Vec<TemperatureLog>> {
        let logs = sqlx::query_as::<_, TemperatureLog>(&format!(
            "SELECT {} FROM temperature_logs ORDER BY recorded_at DESC",
            TEMPERATURE_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(logs)
    }

    /// Record a reading; the status is classified against the configured bands
    pub async fn log_temperature(
        &self,
        input: CreateTemperatureLogRequest,
        bands: &TemperatureBands,
    ) -> AppResult<TemperatureLog> {
        validate_humidity(input.humidity)?;
        let status = classify_temperature(input.temperature, input.humidity, bands);

        let log = sqlx::query_as::<_, TemperatureLog>(&format!(
            r#"
            INSERT INTO temperature_logs (zone, temperature, humidity, status)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            TEMPERATURE_COLUMNS
        ))
        .bind(input.zone.trim())
        .bind(input.temperature)
        .bind(input.humidity)
        .bind(status)
        .fetch_one(&self.db)
        .await?;

        if status == TemperatureStatus::Normal {
            tracing::info!(zone = %log.zone, temperature = %log.temperature, "Temperature logged");
        } else {
            tracing::warn!(
                zone = %log.zone,
                temperature = %log.temperature,
                humidity = %log.humidity,
                status = %status,
                "Temperature out of range"
            );
        }
        Ok(log)
    }

    // ========================================================================
    // Samples
    // ========================================================================

    pub async fn list_samples(&self) -> AppResult<Vec<SampleTest>> {
        let samples = sqlx::query_as::<_, SampleTest>(&format!(
            "SELECT {} FROM sample_tests ORDER BY created_at DESC",
            SAMPLE_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(samples)
    }

    pub async fn create_sample(&self, input: CreateSampleRequest) -> AppResult<SampleTest> {
        let mut tx = self.db.begin().await?;
        let sequence = next_sequence(&mut *tx, "sample_seq").await?;

        let sample = sqlx::query_as::<_, SampleTest>(&format!(
            r#"
            INSERT INTO sample_tests (sample_id, batch_id, product_name, test_type)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            SAMPLE_COLUMNS
        ))
        .bind(generate_sample_id(sequence))
        .bind(input.batch_id.trim())
        .bind(input.product_name.trim())
        .bind(input.test_type.trim())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(sample_id = %sample.sample_id, batch_id = %sample.batch_id, "Sample registered");
        Ok(sample)
    }

    /// Record a pass/fail result; a sample is decided only once
    pub async fn record_sample_result(
        &self,
        id: Uuid,
        result: SampleResult,
        notes: Option<String>,
        expected_version: Option<i64>,
    ) -> AppResult<SampleTest> {
        let mut tx = self.db.begin().await?;

        let mut sample = sqlx::query_as::<_, SampleTest>(&format!(
            "SELECT {} FROM sample_tests WHERE id = $1 FOR UPDATE",
            SAMPLE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Sample".to_string()))?;

        check_version(SampleStatus::ENTITY, expected_version, sample.version)?;
        let notes = notes.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
        sample.record_result(result, notes, Utc::now()).map_err(|e| {
            tracing::warn!(sample_id = %sample.sample_id, status = %sample.status, "Sample result rejected");
            e
        })?;

        let sample = sqlx::query_as::<_, SampleTest>(&format!(
            r#"
            UPDATE sample_tests
            SET status = $2, notes = $3, tested_at = $4, version = version + 1
            WHERE id = $1
            RETURNING {}
            "#,
            SAMPLE_COLUMNS
        ))
        .bind(id)
        .bind(sample.status)
        .bind(&sample.notes)
        .bind(sample.tested_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(sample_id = %sample.sample_id, result = %result, "Sample result recorded");
        Ok(sample)
    }

    // ========================================================================
    // Rejections
    // ========================================================================

    pub async fn list_rejections(&self) -> AppResult<Vec<Rejection>> {
        let rejections = sqlx::query_as::<_, Rejection>(&format!(
            "SELECT {} FROM rejections ORDER BY created_at DESC",
            REJECTION_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(rejections)
    }

    pub async fn create_rejection(&self, input: CreateRejectionRequest) -> AppResult<Rejection> {
        validate_rejection(&input.batch_id, input.quantity, &input.reason)?;

        let rejection = sqlx::query_as::<_, Rejection>(&format!(
            r#"
            INSERT INTO rejections (batch_id, product_name, quantity, reason, disposition)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            REJECTION_COLUMNS
        ))
        .bind(input.batch_id.trim())
        .bind(input.product_name.trim())
        .bind(input.quantity)
        .bind(input.reason.trim())
        .bind(input.disposition)
        .fetch_one(&self.db)
        .await?;

        tracing::info!(
            batch_id = %rejection.batch_id,
            quantity = rejection.quantity,
            disposition = %rejection.disposition,
            "Batch rejected"
        );
        Ok(rejection)
    }

    // ========================================================================
    // Compliance
    // ========================================================================

    pub async fn list_compliance_checks(&self) -> AppResult<Vec<ComplianceCheck>> {
        let checks = sqlx::query_as::<_, ComplianceCheck>(&format!(
            "SELECT {} FROM compliance_checks ORDER BY category, title",
            CHECK_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(checks)
    }

    pub async fn create_compliance_check(&self, input: CreateComplianceCheckRequest) -> AppResult<ComplianceCheck> {
        let check = sqlx::query_as::<_, ComplianceCheck>(&format!(
            r#"
            INSERT INTO compliance_checks (title, category)
            VALUES ($1, $2)
            RETURNING {}
            "#,
            CHECK_COLUMNS
        ))
        .bind(input.title.trim())
        .bind(input.category.trim())
        .fetch_one(&self.db)
        .await?;

        tracing::info!(check_id = %check.id, title = %check.title, "Compliance check added");
        Ok(check)
    }

    pub async fn toggle_compliance_check(
        &self,
        id: Uuid,
        completed: bool,
        expected_version: Option<i64>,
    ) -> AppResult<ComplianceCheck> {
        let mut tx = self.db.begin().await?;

        let mut check = sqlx::query_as::<_, ComplianceCheck>(&format!(
            "SELECT {} FROM compliance_checks WHERE id = $1 FOR UPDATE",
            CHECK_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Compliance check".to_string()))?;

        check_version("compliance check", expected_version, check.version)?;
        check.set_completed(completed, Utc::now());

        let check = sqlx::query_as::<_, ComplianceCheck>(&format!(
            r#"
            UPDATE compliance_checks
            SET completed = $2, completed_at = $3, version = version + 1, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            CHECK_COLUMNS
        ))
        .bind(id)
        .bind(check.completed)
        .bind(check.completed_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(check_id = %check.id, completed = check.completed, "Compliance check toggled");
        Ok(check)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::QcStatus;

    #[test]
    fn test_inspection_row_derives_score() {
        let inspection: QcInspection = InspectionRow {
            id: Uuid::new_v4(),
            batch_id: "B-77".to_string(),
            product_name: "Bolts".to_string(),
            items_inspected: 200,
            defects_found: 50,
            inspector: None,
            created_at: Utc::now(),
        }
        .into();
        assert_eq!(inspection.score, 75);
        assert_eq!(inspection.status, QcStatus::Failed);
    }
}
