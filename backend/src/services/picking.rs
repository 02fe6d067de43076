//! Picking and fulfillment service: picklists, pickers, batches, multi-order
//! picks and routes

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use shared::{
    check_version, derive_multi_pick_status, derive_picker_status, generate_batch_id,
    generate_pick_id, generate_route_id, plan_batch, resolve_origin, BatchOrder, BatchStatus,
    CreateMultiOrderPickRequest, CreatePickerRequest, CreatePicklistRequest, CreateRouteRequest,
    DomainError, MultiOrderPick, PickPriority, PickerAssignment, PicklistOrder, PicklistOrigin,
    PicklistStatus, PicklistView, RouteOptimization, RouteStatus, StatusMachine,
};
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use super::next_sequence;
use crate::error::{map_unique_violation, AppError, AppResult};
use crate::external::RouteOptimizerClient;

#[derive(Clone)]
pub struct PickingService {
    db: PgPool,
}

#[derive(Debug, FromRow)]
struct PicklistRow {
    id: Uuid,
    order_id: String,
    customer: String,
    items: i32,
    priority: PickPriority,
    status: PicklistStatus,
    picker: Option<String>,
    zone: String,
    origin: Option<PicklistOrigin>,
    batch_id: Option<String>,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PicklistRow> for PicklistOrder {
    fn from(row: PicklistRow) -> Self {
        PicklistOrder {
            origin: resolve_origin(row.origin, row.picker.as_deref(), row.status),
            id: row.id,
            order_id: row.order_id,
            customer: row.customer,
            items: row.items,
            priority: row.priority,
            status: row.status,
            picker: row.picker,
            zone: row.zone,
            batch_id: row.batch_id,
            version: row.version,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct PickerRow {
    id: Uuid,
    picker_id: String,
    name: String,
    on_break: bool,
    active_orders: i32,
    completed_today: i32,
    pick_rate: i32,
    zone: String,
    version: i64,
    updated_at: DateTime<Utc>,
}

impl From<PickerRow> for PickerAssignment {
    fn from(row: PickerRow) -> Self {
        PickerAssignment {
            status: derive_picker_status(row.on_break, row.active_orders),
            id: row.id,
            picker_id: row.picker_id,
            name: row.name,
            on_break: row.on_break,
            active_orders: row.active_orders,
            completed_today: row.completed_today,
            pick_rate: row.pick_rate,
            zone: row.zone,
            version: row.version,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct MultiPickRow {
    id: Uuid,
    pick_id: String,
    orders: Vec<String>,
    sku: String,
    location: String,
    total_qty: i32,
    picked_qty: i32,
    version: i64,
    updated_at: DateTime<Utc>,
}

impl From<MultiPickRow> for MultiOrderPick {
    fn from(row: MultiPickRow) -> Self {
        MultiOrderPick {
            status: derive_multi_pick_status(row.picked_qty, row.total_qty),
            id: row.id,
            pick_id: row.pick_id,
            orders: row.orders,
            sku: row.sku,
            location: row.location,
            total_qty: row.total_qty,
            picked_qty: row.picked_qty,
            version: row.version,
            updated_at: row.updated_at,
        }
    }
}

const PICKLIST_COLUMNS: &str = "id, order_id, customer, items, priority, status, picker, zone, origin, \
     batch_id, version, created_at, updated_at";

const PICKER_COLUMNS: &str =
    "id, picker_id, name, on_break, active_orders, completed_today, pick_rate, zone, version, updated_at";

const BATCH_COLUMNS: &str =
    "id, batch_id, zone, order_count, total_items, picker, status, progress, version, created_at, updated_at";

const MULTI_PICK_COLUMNS: &str =
    "id, pick_id, orders, sku, location, total_qty, picked_qty, version, updated_at";

const ROUTE_COLUMNS: &str =
    "id, route_id, picker, stops, distance, estimated_time, efficiency, status, version, updated_at";

impl PickingService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    // ========================================================================
    // Picklists
    // ========================================================================

    /// List picklists in the requested partition, most urgent first
    pub async fn list_picklists(&self, view: PicklistView) -> AppResult<Vec<PicklistOrder>> {
        let rows = sqlx::query_as::<_, PicklistRow>(&format!(
            "SELECT {} FROM picklists ORDER BY priority, created_at",
            PICKLIST_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(PicklistOrder::from)
            .filter(|order| order.matches_view(view))
            .collect())
    }

    pub async fn create_picklist(&self, input: CreatePicklistRequest) -> AppResult<PicklistOrder> {
        let origin = input.origin.unwrap_or(PicklistOrigin::Manual);

        let row = sqlx::query_as::<_, PicklistRow>(&format!(
            r#"
            INSERT INTO picklists (order_id, customer, items, priority, zone, origin)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            PICKLIST_COLUMNS
        ))
        .bind(input.order_id.trim())
        .bind(input.customer.trim())
        .bind(input.items)
        .bind(input.priority)
        .bind(input.zone.trim())
        .bind(origin)
        .fetch_one(&self.db)
        .await?;

        tracing::info!(order_id = %row.order_id, origin = %origin, "Picklist created");
        Ok(row.into())
    }

    /// Move a pending picklist into the pick queue
    pub async fn queue_picklist(&self, id: Uuid, expected_version: Option<i64>) -> AppResult<PicklistOrder> {
        let mut tx = self.db.begin().await?;

        let mut order = lock_picklist(&mut *tx, id).await?;
        check_version(PicklistStatus::ENTITY, expected_version, order.version)?;
        order.queue()?;

        let order = save_picklist(&mut *tx, &order).await?;
        tx.commit().await?;

        tracing::info!(order_id = %order.order_id, "Picklist queued");
        Ok(order)
    }

    /// Assign or reassign a picker. The previous picker, if any, gets its
    /// active order back.
    pub async fn assign_picker(
        &self,
        id: Uuid,
        picker_name: &str,
        expected_version: Option<i64>,
    ) -> AppResult<PicklistOrder> {
        let picker_name = picker_name.trim();
        let mut tx = self.db.begin().await?;

        let mut order = lock_picklist(&mut *tx, id).await?;
        check_version(PicklistStatus::ENTITY, expected_version, order.version)?;

        let holder = order.picker.clone().filter(|name| name != picker_name);
        let mut locked = lock_pickers(&mut *tx, picker_lock_order(picker_name, holder.as_deref())).await?;
        let mut picker = locked
            .remove(picker_name)
            .ok_or_else(|| AppError::NotFound("Picker".to_string()))?;
        let already_holding =
            order.status == PicklistStatus::Assigned && order.picker.as_deref() == Some(picker_name);

        let previous = order.assign(picker_name).map_err(|e| {
            tracing::warn!(order_id = %order.order_id, picker = picker_name, "Assignment rejected: {}", e);
            e
        })?;

        if !already_holding {
            picker.take_order()?;
            save_picker(&mut *tx, &picker).await?;
        }

        if let Some(previous) = &previous {
            let mut released = locked
                .remove(previous.as_str())
                .ok_or_else(|| AppError::NotFound("Picker".to_string()))?;
            released.release_order(false);
            save_picker(&mut *tx, &released).await?;
        }

        let order = save_picklist(&mut *tx, &order).await?;
        tx.commit().await?;

        tracing::info!(
            order_id = %order.order_id,
            picker = picker_name,
            previous = ?previous,
            "Picker assigned"
        );
        Ok(order)
    }

    pub async fn start_picking(&self, id: Uuid, expected_version: Option<i64>) -> AppResult<PicklistOrder> {
        let mut tx = self.db.begin().await?;

        let mut order = lock_picklist(&mut *tx, id).await?;
        check_version(PicklistStatus::ENTITY, expected_version, order.version)?;
        order.start_picking()?;

        let order = save_picklist(&mut *tx, &order).await?;
        tx.commit().await?;

        tracing::info!(order_id = %order.order_id, "Picking started");
        Ok(order)
    }

    /// Complete a picklist and credit its picker
    pub async fn complete_picklist(&self, id: Uuid, expected_version: Option<i64>) -> AppResult<PicklistOrder> {
        let mut tx = self.db.begin().await?;

        let mut order = lock_picklist(&mut *tx, id).await?;
        check_version(PicklistStatus::ENTITY, expected_version, order.version)?;
        order.complete()?;

        if let Some(name) = &order.picker {
            let mut picker = lock_picker_by_name(&mut *tx, name).await?;
            picker.release_order(true);
            save_picker(&mut *tx, &picker).await?;
        }

        let order = save_picklist(&mut *tx, &order).await?;
        tx.commit().await?;

        tracing::info!(order_id = %order.order_id, picker = ?order.picker, "Picklist completed");
        Ok(order)
    }

    // ========================================================================
    // Pickers
    // ========================================================================

    pub async fn list_pickers(&self) -> AppResult<Vec<PickerAssignment>> {
        let rows = sqlx::query_as::<_, PickerRow>(&format!(
            "SELECT {} FROM pickers ORDER BY zone, name",
            PICKER_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(PickerAssignment::from).collect())
    }

    pub async fn create_picker(&self, input: CreatePickerRequest) -> AppResult<PickerAssignment> {
        let row = sqlx::query_as::<_, PickerRow>(&format!(
            r#"
            INSERT INTO pickers (picker_id, name, zone, pick_rate)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            PICKER_COLUMNS
        ))
        .bind(input.picker_id.trim())
        .bind(input.name.trim())
        .bind(input.zone.trim())
        .bind(input.pick_rate)
        .fetch_one(&self.db)
        .await
        .map_err(|e| map_unique_violation(e, "name"))?;

        tracing::info!(picker = %row.name, zone = %row.zone, "Picker registered");
        Ok(row.into())
    }

    pub async fn set_picker_break(
        &self,
        id: Uuid,
        on_break: bool,
        expected_version: Option<i64>,
    ) -> AppResult<PickerAssignment> {
        let mut tx = self.db.begin().await?;

        let mut picker: PickerAssignment = sqlx::query_as::<_, PickerRow>(&format!(
            "SELECT {} FROM pickers WHERE id = $1 FOR UPDATE",
            PICKER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Picker".to_string()))?
        .into();

        check_version("picker", expected_version, picker.version)?;
        picker.set_break(on_break)?;

        let picker = save_picker(&mut *tx, &picker).await?;
        tx.commit().await?;

        tracing::info!(picker = %picker.name, on_break, "Picker break updated");
        Ok(picker)
    }

    // ========================================================================
    // Batches
    // ========================================================================

    pub async fn list_batches(&self) -> AppResult<Vec<BatchOrder>> {
        let batches = sqlx::query_as::<_, BatchOrder>(&format!(
            "SELECT {} FROM batch_orders ORDER BY created_at DESC",
            BATCH_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(batches)
    }

    /// Group the zone's waiting, unassigned picklists into a new batch
    pub async fn create_batch(&self, zone: &str, picker: Option<&str>) -> AppResult<BatchOrder> {
        let zone = zone.trim();
        let picker = picker.map(str::trim).filter(|p| !p.is_empty());
        let mut tx = self.db.begin().await?;

        let candidates: Vec<PicklistOrder> = sqlx::query_as::<_, PicklistRow>(&format!(
            r#"
            SELECT {} FROM picklists
            WHERE zone = $1 AND status IN ('pending', 'queued') AND picker IS NULL AND batch_id IS NULL
            FOR UPDATE
            "#,
            PICKLIST_COLUMNS
        ))
        .bind(zone)
        .fetch_all(&mut *tx)
        .await?
        .into_iter()
        .map(PicklistOrder::from)
        .collect();

        let plan = plan_batch(zone, &candidates)?;

        let picker = match picker {
            Some(name) => {
                let mut picker = lock_picker_by_name(&mut *tx, name).await?;
                picker.take_order().map_err(|e| {
                    tracing::warn!(picker = name, zone, "Batch assignment rejected: {}", e);
                    e
                })?;
                Some(save_picker(&mut *tx, &picker).await?.name)
            }
            None => None,
        };

        let sequence = next_sequence(&mut *tx, "batch_seq").await?;
        let batch_id = generate_batch_id(sequence);

        let batch = sqlx::query_as::<_, BatchOrder>(&format!(
            r#"
            INSERT INTO batch_orders (batch_id, zone, order_count, total_items, picker)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            BATCH_COLUMNS
        ))
        .bind(&batch_id)
        .bind(&plan.zone)
        .bind(plan.order_count())
        .bind(plan.total_items)
        .bind(&picker)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE picklists
            SET batch_id = $1, version = version + 1, updated_at = NOW()
            WHERE id = ANY($2)
            "#,
        )
        .bind(&batch_id)
        .bind(&plan.order_ids)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            batch_id = %batch.batch_id,
            zone,
            orders = batch.order_count,
            items = batch.total_items,
            picker = ?batch.picker,
            "Batch created"
        );
        Ok(batch)
    }

    pub async fn update_batch_progress(
        &self,
        id: Uuid,
        progress: i32,
        expected_version: Option<i64>,
    ) -> AppResult<BatchOrder> {
        let mut tx = self.db.begin().await?;

        let mut batch = sqlx::query_as::<_, BatchOrder>(&format!(
            "SELECT {} FROM batch_orders WHERE id = $1 FOR UPDATE",
            BATCH_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Batch".to_string()))?;

        check_version(BatchStatus::ENTITY, expected_version, batch.version)?;
        batch.update_progress(progress)?;

        if batch.status == BatchStatus::Completed {
            if let Some(name) = &batch.picker {
                let mut picker = lock_picker_by_name(&mut *tx, name).await?;
                picker.release_order(true);
                save_picker(&mut *tx, &picker).await?;
            }
        }

        let batch = sqlx::query_as::<_, BatchOrder>(&format!(
            r#"
            UPDATE batch_orders
            SET progress = $2, status = $3, version = version + 1, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            BATCH_COLUMNS
        ))
        .bind(id)
        .bind(batch.progress)
        .bind(batch.status)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(batch_id = %batch.batch_id, progress = batch.progress, status = %batch.status, "Batch progress");
        Ok(batch)
    }

    // ========================================================================
    // Multi-order picks
    // ========================================================================

    pub async fn list_multi_order_picks(&self) -> AppResult<Vec<MultiOrderPick>> {
        let rows = sqlx::query_as::<_, MultiPickRow>(&format!(
            "SELECT {} FROM multi_order_picks ORDER BY pick_id DESC",
            MULTI_PICK_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(MultiOrderPick::from).collect())
    }

    pub async fn create_multi_order_pick(&self, input: CreateMultiOrderPickRequest) -> AppResult<MultiOrderPick> {
        let orders: Vec<String> = input
            .orders
            .iter()
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect();
        if orders.len() < 2 {
            return Err(AppError::validation("orders", "A multi-order pick needs at least two orders"));
        }

        let mut tx = self.db.begin().await?;
        let sequence = next_sequence(&mut *tx, "multi_pick_seq").await?;

        let row = sqlx::query_as::<_, MultiPickRow>(&format!(
            r#"
            INSERT INTO multi_order_picks (pick_id, orders, sku, location, total_qty)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            MULTI_PICK_COLUMNS
        ))
        .bind(generate_pick_id(sequence))
        .bind(&orders)
        .bind(input.sku.trim())
        .bind(input.location.trim())
        .bind(input.total_qty)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(pick_id = %row.pick_id, orders = row.orders.len(), "Multi-order pick created");
        Ok(row.into())
    }

    pub async fn update_picked_qty(
        &self,
        id: Uuid,
        picked_qty: i32,
        expected_version: Option<i64>,
    ) -> AppResult<MultiOrderPick> {
        let mut tx = self.db.begin().await?;

        let mut pick: MultiOrderPick = sqlx::query_as::<_, MultiPickRow>(&format!(
            "SELECT {} FROM multi_order_picks WHERE id = $1 FOR UPDATE",
            MULTI_PICK_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Multi-order pick".to_string()))?
        .into();

        check_version("multi-order pick", expected_version, pick.version)?;
        pick.update_picked(picked_qty)?;

        let pick: MultiOrderPick = sqlx::query_as::<_, MultiPickRow>(&format!(
            r#"
            UPDATE multi_order_picks
            SET picked_qty = $2, version = version + 1, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            MULTI_PICK_COLUMNS
        ))
        .bind(id)
        .bind(pick.picked_qty)
        .fetch_one(&mut *tx)
        .await?
        .into();

        tx.commit().await?;

        tracing::info!(pick_id = %pick.pick_id, picked = pick.picked_qty, status = %pick.status, "Picked quantity updated");
        Ok(pick)
    }

    // ========================================================================
    // Routes
    // ========================================================================

    pub async fn list_routes(&self) -> AppResult<Vec<RouteOptimization>> {
        let routes = sqlx::query_as::<_, RouteOptimization>(&format!(
            "SELECT {} FROM pick_routes ORDER BY route_id DESC",
            ROUTE_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(routes)
    }

    pub async fn create_route(&self, input: CreateRouteRequest) -> AppResult<RouteOptimization> {
        if input.distance < Decimal::ZERO {
            return Err(AppError::validation("distance", "Distance cannot be negative"));
        }

        let mut tx = self.db.begin().await?;
        let sequence = next_sequence(&mut *tx, "route_seq").await?;

        let route = sqlx::query_as::<_, RouteOptimization>(&format!(
            r#"
            INSERT INTO pick_routes (route_id, picker, stops, distance, estimated_time, efficiency)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            ROUTE_COLUMNS
        ))
        .bind(generate_route_id(sequence))
        .bind(input.picker.trim())
        .bind(input.stops)
        .bind(input.distance)
        .bind(input.estimated_time)
        .bind(input.efficiency)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(route_id = %route.route_id, picker = %route.picker, "Route planned");
        Ok(route)
    }

    /// Activate a planned route, taking metrics from the optimizer when one
    /// is configured
    pub async fn optimize_route(
        &self,
        id: Uuid,
        expected_version: Option<i64>,
        optimizer: &RouteOptimizerClient,
    ) -> AppResult<RouteOptimization> {
        let planned = self.find_route(&self.db, id, false).await?;
        if planned.status != RouteStatus::Planned {
            return Err(DomainError::invalid_transition(RouteStatus::ENTITY, planned.status, RouteStatus::Active).into());
        }

        let optimized = optimizer
            .optimize(&planned.route_id, &planned.picker, planned.stops)
            .await?;

        let mut tx = self.db.begin().await?;

        let mut route = self.find_route(&mut *tx, id, true).await?;
        check_version(RouteStatus::ENTITY, expected_version, route.version)?;
        route.apply_optimization(optimized)?;

        let route = save_route(&mut *tx, &route).await?;
        tx.commit().await?;

        tracing::info!(route_id = %route.route_id, efficiency = route.efficiency, "Route activated");
        Ok(route)
    }

    pub async fn complete_route(&self, id: Uuid, expected_version: Option<i64>) -> AppResult<RouteOptimization> {
        let mut tx = self.db.begin().await?;

        let mut route = self.find_route(&mut *tx, id, true).await?;
        check_version(RouteStatus::ENTITY, expected_version, route.version)?;
        route.complete()?;

        let route = save_route(&mut *tx, &route).await?;
        tx.commit().await?;

        tracing::info!(route_id = %route.route_id, "Route completed");
        Ok(route)
    }

    async fn find_route<'e, E>(&self, executor: E, id: Uuid, for_update: bool) -> AppResult<RouteOptimization>
    where
        E: sqlx::PgExecutor<'e>,
    {
        let lock = if for_update { " FOR UPDATE" } else { "" };
        let route = sqlx::query_as::<_, RouteOptimization>(&format!(
            "SELECT {} FROM pick_routes WHERE id = $1{}",
            ROUTE_COLUMNS, lock
        ))
        .bind(id)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| AppError::NotFound("Route".to_string()))?;

        Ok(route)
    }
}

async fn lock_picklist(conn: &mut PgConnection, id: Uuid) -> AppResult<PicklistOrder> {
    let row = sqlx::query_as::<_, PicklistRow>(&format!(
        "SELECT {} FROM picklists WHERE id = $1 FOR UPDATE",
        PICKLIST_COLUMNS
    ))
    .bind(id)
    .fetch_optional(conn)
    .await?
    .ok_or_else(|| AppError::NotFound("Picklist".to_string()))?;

    Ok(row.into())
}

async fn save_picklist(conn: &mut PgConnection, order: &PicklistOrder) -> AppResult<PicklistOrder> {
    let row = sqlx::query_as::<_, PicklistRow>(&format!(
        r#"
        UPDATE picklists
        SET status = $2, picker = $3, origin = $4, version = version + 1, updated_at = NOW()
        WHERE id = $1
        RETURNING {}
        "#,
        PICKLIST_COLUMNS
    ))
    .bind(order.id)
    .bind(order.status)
    .bind(&order.picker)
    .bind(order.origin)
    .fetch_one(conn)
    .await?;

    Ok(row.into())
}

/// Names of the pickers an assignment touches, in the order their rows are
/// locked. Every transaction locks pickers by ascending name.
fn picker_lock_order<'a>(picker: &'a str, holder: Option<&'a str>) -> Vec<&'a str> {
    let mut names: Vec<&str> = std::iter::once(picker).chain(holder).collect();
    names.sort_unstable();
    names.dedup();
    names
}

async fn lock_pickers(
    conn: &mut PgConnection,
    names: Vec<&str>,
) -> AppResult<BTreeMap<String, PickerAssignment>> {
    let mut locked = BTreeMap::new();
    for name in names {
        let picker = lock_picker_by_name(&mut *conn, name).await?;
        locked.insert(name.to_string(), picker);
    }
    Ok(locked)
}

async fn lock_picker_by_name(conn: &mut PgConnection, name: &str) -> AppResult<PickerAssignment> {
    let row = sqlx::query_as::<_, PickerRow>(&format!(
        "SELECT {} FROM pickers WHERE name = $1 FOR UPDATE",
        PICKER_COLUMNS
    ))
    .bind(name)
    .fetch_optional(conn)
    .await?
    .ok_or_else(|| AppError::NotFound("Picker".to_string()))?;

    Ok(row.into())
}

async fn save_picker(conn: &mut PgConnection, picker: &PickerAssignment) -> AppResult<PickerAssignment> {
    let row = sqlx::query_as::<_, PickerRow>(&format!(
        r#"
        UPDATE pickers
        SET on_break = $2, active_orders = $3, completed_today = $4,
            version = version + 1, updated_at = NOW()
        WHERE id = $1
        RETURNING {}
        "#,
        PICKER_COLUMNS
    ))
    .bind(picker.id)
    .bind(picker.on_break)
    .bind(picker.active_orders)
    .bind(picker.completed_today)
    .fetch_one(conn)
    .await?;

    Ok(row.into())
}

async fn save_route(conn: &mut PgConnection, route: &RouteOptimization) -> AppResult<RouteOptimization> {
    let route = sqlx::query_as::<_, RouteOptimization>(&format!(
        r#"
        UPDATE pick_routes
        SET status = $2, distance = $3, estimated_time = $4, efficiency = $5,
            version = version + 1, updated_at = NOW()
        WHERE id = $1
        RETURNING {}
        "#,
        ROUTE_COLUMNS
    ))
    .bind(route.id)
    .bind(route.status)
    .bind(route.distance)
    .bind(route.estimated_time)
    .bind(route.efficiency)
    .fetch_one(conn)
    .await?;

    Ok(route)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(origin: Option<PicklistOrigin>, picker: Option<&str>, status: PicklistStatus) -> PicklistRow {
        PicklistRow {
            id: Uuid::new_v4(),
            order_id: "ORD-100".to_string(),
            customer: "Globex".to_string(),
            items: 4,
            priority: PickPriority::High,
            status,
            picker: picker.map(str::to_string),
            zone: "A".to_string(),
            origin,
            batch_id: None,
            version: 1,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_stored_origin_wins() {
        let order: PicklistOrder = row(Some(PicklistOrigin::Auto), Some("Sam"), PicklistStatus::Picking).into();
        assert_eq!(order.origin, PicklistOrigin::Auto);
        assert!(order.matches_view(PicklistView::Auto));
        assert!(!order.matches_view(PicklistView::Manual));
    }

    #[test]
    fn test_legacy_rows_fall_back_to_predicate() {
        let waiting: PicklistOrder = row(None, None, PicklistStatus::Queued).into();
        assert_eq!(waiting.origin, PicklistOrigin::Auto);
        let finished: PicklistOrder = row(None, None, PicklistStatus::Completed).into();
        assert_eq!(finished.origin, PicklistOrigin::Manual);
    }

    #[test]
    fn test_picker_row_status_is_derived() {
        let picker: PickerAssignment = PickerRow {
            id: Uuid::new_v4(),
            picker_id: "P-02".to_string(),
            name: "Kim".to_string(),
            on_break: false,
            active_orders: 2,
            completed_today: 9,
            pick_rate: 110,
            zone: "B".to_string(),
            version: 4,
            updated_at: Utc::now(),
        }
        .into();
        assert_eq!(picker.status, shared::PickerStatus::Busy);
    }

    #[test]
    fn test_crossed_reassignments_lock_pickers_in_the_same_order() {
        // Sam -> Kim and Kim -> Sam must not wait on each other
        assert_eq!(picker_lock_order("Kim", Some("Sam")), vec!["Kim", "Sam"]);
        assert_eq!(picker_lock_order("Sam", Some("Kim")), vec!["Kim", "Sam"]);
    }

    #[test]
    fn test_first_assignment_locks_one_picker() {
        assert_eq!(picker_lock_order("Sam", None), vec!["Sam"]);
        assert_eq!(picker_lock_order("Sam", Some("Sam")), vec!["Sam"]);
    }
}
