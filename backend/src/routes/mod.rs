//! Route definitions for the Warehouse Operations Platform

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes. Every group runs behind [`auth_middleware`].
pub fn api_routes(state: AppState) -> Router<AppState> {
    let warehouse = Router::new()
        .nest("/inbound", inbound_routes())
        .nest("/inventory", inventory_routes())
        .nest("/outbound", outbound_routes())
        .nest("/transfers", transfer_routes())
        .nest("/qc", quality_routes())
        .nest("/workforce", workforce_routes())
        .nest("/equipment", equipment_routes())
        .nest("/exceptions", exception_routes())
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new().nest("/warehouse", warehouse)
}

/// Receiving routes
fn inbound_routes() -> Router<AppState> {
    Router::new()
        .route("/grns", get(handlers::list_grns).post(handlers::create_grn))
        .route("/grns/:grn_id/start", post(handlers::start_grn))
        .route("/grns/:grn_id/complete", post(handlers::complete_grn))
        .route("/grns/:grn_id/discrepancy", post(handlers::log_discrepancy))
        .route("/docks", get(handlers::list_docks))
        .route("/docks/:dock_id", put(handlers::update_dock))
}

/// Inventory ledger routes
fn inventory_routes() -> Router<AppState> {
    Router::new()
        // Items
        .route("/items", get(handlers::list_items).post(handlers::create_item))
        .route("/items/import", post(handlers::import_items))
        .route("/items/:sku", get(handlers::get_item))
        .route("/locations", get(handlers::list_locations).post(handlers::create_location))
        // Ledger
        .route(
            "/adjustments",
            get(handlers::list_adjustments).post(handlers::create_adjustment),
        )
        .route("/alerts", get(handlers::list_stock_alerts))
        // Cycle counts
        .route(
            "/cycle-counts",
            get(handlers::list_cycle_counts).post(handlers::create_cycle_count),
        )
        .route("/cycle-counts/:count_id/start", post(handlers::start_cycle_count))
        .route("/cycle-counts/:count_id/progress", post(handlers::record_cycle_count_progress))
        .route("/cycle-counts/:count_id/complete", post(handlers::complete_cycle_count))
        // Internal transfers
        .route(
            "/transfers",
            get(handlers::list_internal_transfers).post(handlers::create_internal_transfer),
        )
        .route("/transfers/:transfer_id/status", put(handlers::update_internal_transfer_status))
}

/// Picking and fulfillment routes
fn outbound_routes() -> Router<AppState> {
    Router::new()
        .route("/picklists", get(handlers::list_picklists).post(handlers::create_picklist))
        .route("/picklists/:picklist_id/queue", post(handlers::queue_picklist))
        .route("/picklists/:picklist_id/assign", post(handlers::assign_picker))
        .route("/picklists/:picklist_id/start", post(handlers::start_picking))
        .route("/picklists/:picklist_id/complete", post(handlers::complete_picklist))
        .route("/pickers", get(handlers::list_pickers).post(handlers::create_picker))
        .route("/pickers/:picker_id/break", put(handlers::set_picker_break))
        .route("/batches", get(handlers::list_batches).post(handlers::create_batch))
        .route("/batches/:batch_id/progress", put(handlers::update_batch_progress))
        .route(
            "/multi-order-picks",
            get(handlers::list_multi_order_picks).post(handlers::create_multi_order_pick),
        )
        .route("/multi-order-picks/:pick_id/picked", put(handlers::update_picked_qty))
        .route("/routes", get(handlers::list_routes).post(handlers::create_route))
        .route("/routes/:route_id/optimize", post(handlers::optimize_route))
        .route("/routes/:route_id/complete", post(handlers::complete_route))
}

/// Inter-warehouse transfer routes
fn transfer_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_transfers).post(handlers::create_transfer))
        .route("/:transfer_id/status", put(handlers::update_transfer_status))
        .route("/:transfer_id/telemetry", put(handlers::update_transfer_telemetry))
}

/// Quality control routes
fn quality_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/inspections",
            get(handlers::list_inspections).post(handlers::create_inspection),
        )
        .route(
            "/temperature",
            get(handlers::list_temperature_logs).post(handlers::log_temperature),
        )
        .route("/samples", get(handlers::list_samples).post(handlers::create_sample))
        .route("/samples/:sample_id/result", post(handlers::record_sample_result))
        .route("/rejections", get(handlers::list_rejections).post(handlers::create_rejection))
        .route(
            "/compliance",
            get(handlers::list_compliance_checks).post(handlers::create_compliance_check),
        )
        .route("/compliance/:check_id", put(handlers::toggle_compliance_check))
}

/// Workforce routes
fn workforce_routes() -> Router<AppState> {
    Router::new()
        .route("/staff", get(handlers::list_staff).post(handlers::add_staff))
        .route("/staff/:staff_id/status", put(handlers::update_staff_status))
        .route("/schedules", get(handlers::list_schedules).post(handlers::create_schedule))
        .route("/schedules/:schedule_id/staff", put(handlers::assign_staff))
        .route("/attendance", get(handlers::list_attendance).post(handlers::log_attendance))
        .route(
            "/leave",
            get(handlers::list_leave_requests).post(handlers::create_leave_request),
        )
        .route("/leave/:leave_id/decision", put(handlers::decide_leave))
        .route("/trainings", get(handlers::list_trainings).post(handlers::record_training))
}

/// Equipment routes
fn equipment_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_equipment).post(handlers::create_equipment))
        .route("/:equipment_id/status", put(handlers::update_equipment_status))
        .route(
            "/:equipment_id/maintenance",
            get(handlers::list_maintenance).post(handlers::log_maintenance),
        )
}

/// Exception desk routes
fn exception_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_exceptions).post(handlers::create_exception))
        .route("/:exception_id/status", put(handlers::update_exception_status))
        .route("/:exception_id/resolve-inbound", post(handlers::resolve_inbound))
}
