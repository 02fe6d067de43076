//! Exception tracking service

use shared::{
    check_version, validate_exception, CreateExceptionRequest, DomainError, Exception,
    ExceptionStatus, InboundAction, StatusMachine,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct ExceptionService {
    db: PgPool,
}

const EXCEPTION_COLUMNS: &str = "id, priority, category, title, description, status, resolution, reference, \
     version, created_at, updated_at";

impl ExceptionService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Open exceptions first, then by priority and age
    pub async fn list_exceptions(&self) -> AppResult<Vec<Exception>> {
        let exceptions = sqlx::query_as::<_, Exception>(&format!(
            r#"
            SELECT {} FROM exceptions
            ORDER BY status = 'resolved', priority, created_at DESC
            "#,
            EXCEPTION_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(exceptions)
    }

    pub async fn create_exception(&self, input: CreateExceptionRequest) -> AppResult<Exception> {
        validate_exception(&input.title, &input.description)?;
        let reference = input
            .reference
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());

        let exception = sqlx::query_as::<_, Exception>(&format!(
            r#"
            INSERT INTO exceptions (priority, category, title, description, reference)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            EXCEPTION_COLUMNS
        ))
        .bind(input.priority)
        .bind(input.category)
        .bind(input.title.trim())
        .bind(input.description.trim())
        .bind(&reference)
        .fetch_one(&self.db)
        .await?;

        tracing::info!(
            exception_id = %exception.id,
            priority = %exception.priority,
            category = %exception.category,
            "Exception raised"
        );
        Ok(exception)
    }

    pub async fn update_status(
        &self,
        id: Uuid,
        next: ExceptionStatus,
        expected_version: Option<i64>,
    ) -> AppResult<Exception> {
        self.mutate_exception(id, expected_version, |e| e.advance(next))
            .await
    }

    /// Close an inbound exception by rejecting or partially accepting the shipment
    pub async fn resolve_inbound(
        &self,
        id: Uuid,
        action: InboundAction,
        expected_version: Option<i64>,
    ) -> AppResult<Exception> {
        self.mutate_exception(id, expected_version, |e| e.resolve_inbound(action))
            .await
    }

    async fn mutate_exception<F>(&self, id: Uuid, expected_version: Option<i64>, apply: F) -> AppResult<Exception>
    where
        F: FnOnce(&mut Exception) -> Result<(), DomainError>,
    {
        let mut tx = self.db.begin().await?;

        let mut exception = sqlx::query_as::<_, Exception>(&format!(
            "SELECT {} FROM exceptions WHERE id = $1 FOR UPDATE",
            EXCEPTION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Exception".to_string()))?;

        check_version(ExceptionStatus::ENTITY, expected_version, exception.version)?;
        let from = exception.status;
        apply(&mut exception).map_err(|e| {
            tracing::warn!(exception_id = %id, from = %from, "Exception update rejected: {}", e);
            e
        })?;

        let exception = sqlx::query_as::<_, Exception>(&format!(
            r#"
            UPDATE exceptions
            SET status = $2, resolution = $3, version = version + 1, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            EXCEPTION_COLUMNS
        ))
        .bind(id)
        .bind(exception.status)
        .bind(exception.resolution)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            exception_id = %id,
            from = %from,
            to = %exception.status,
            resolution = ?exception.resolution,
            "Exception updated"
        );
        Ok(exception)
    }
}
