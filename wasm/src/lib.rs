//! WebAssembly module for the Warehouse Operations Platform
//!
//! Exposes the derived-field rules to the dashboard so screens compute
//! exactly what the server computes:
//! - QC inspection score and status
//! - Multi-order pick, shift schedule, picker and batch status
//! - Stock alerts and storage-condition banding
//! - Leave days, hours worked and putaway pallets

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use shared::{
    classify_temperature, derive_all_alerts, derive_multi_pick_status, derive_picker_status,
    derive_shift_status, hours_worked, inspection_status, leave_days, putaway_pallets,
    status_for_progress, AlertPolicy, InventoryItem, TemperatureBands,
};
use wasm_bindgen::prelude::*;

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    web_sys::console::log_1(&JsValue::from_str("warehouse-ops-wasm loaded"));
}

fn js_error(message: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&message.to_string())
}

fn parse_date(value: &str) -> Result<NaiveDate, JsValue> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|e| js_error(format!("Invalid date '{}': {}", value, e)))
}

fn parse_time(value: &str) -> Result<Option<NaiveTime>, JsValue> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    NaiveTime::parse_from_str(value, "%H:%M")
        .map(Some)
        .map_err(|e| js_error(format!("Invalid time '{}': {}", value, e)))
}

/// Percentage of good items; zero when nothing was inspected
#[wasm_bindgen]
pub fn qc_score(items_inspected: i32, defects_found: i32) -> i32 {
    shared::inspection_score(items_inspected, defects_found)
}

/// `passed` when the score reaches the passing mark, else `failed`
#[wasm_bindgen]
pub fn qc_status(items_inspected: i32, defects_found: i32) -> String {
    inspection_status(qc_score(items_inspected, defects_found)).to_string()
}

#[wasm_bindgen]
pub fn multi_pick_status(picked_qty: i32, total_qty: i32) -> String {
    derive_multi_pick_status(picked_qty, total_qty).to_string()
}

#[wasm_bindgen]
pub fn shift_status(assigned: u32, required_staff: i32) -> String {
    derive_shift_status(assigned as usize, required_staff).to_string()
}

#[wasm_bindgen]
pub fn picker_status(on_break: bool, active_orders: i32) -> String {
    derive_picker_status(on_break, active_orders).to_string()
}

#[wasm_bindgen]
pub fn batch_status(progress: i32) -> String {
    status_for_progress(progress).to_string()
}

#[wasm_bindgen]
pub fn pallets_for_items(items: i32) -> i32 {
    putaway_pallets(items)
}

/// Inclusive day count between two `YYYY-MM-DD` dates
#[wasm_bindgen]
pub fn leave_day_count(start_date: &str, end_date: &str) -> Result<i32, JsValue> {
    leave_days(parse_date(start_date)?, parse_date(end_date)?).map_err(js_error)
}

/// Hours between two `HH:MM` times as a decimal string; empty means not clocked
#[wasm_bindgen]
pub fn hours_between(clock_in: &str, clock_out: &str) -> Result<String, JsValue> {
    Ok(hours_worked(parse_time(clock_in)?, parse_time(clock_out)?).to_string())
}

/// Storage-condition status. `bands_json` overrides the default bands.
#[wasm_bindgen]
pub fn temperature_status(temperature: f64, humidity: f64, bands_json: Option<String>) -> Result<String, JsValue> {
    let bands = match bands_json {
        Some(json) => serde_json::from_str::<TemperatureBands>(&json)
            .map_err(|e| js_error(format!("Invalid bands JSON: {}", e)))?,
        None => TemperatureBands::default(),
    };
    let temperature = Decimal::try_from(temperature).map_err(js_error)?;
    let humidity = Decimal::try_from(humidity).map_err(js_error)?;
    Ok(classify_temperature(temperature, humidity, &bands).to_string())
}

/// Alerts for a JSON array of inventory items, as a JSON array
#[wasm_bindgen]
pub fn stock_alerts(items_json: &str, today: Option<String>, expiring_within_days: Option<i32>) -> Result<String, JsValue> {
    let items: Vec<InventoryItem> =
        serde_json::from_str(items_json).map_err(|e| js_error(format!("Invalid items JSON: {}", e)))?;
    let today = match today {
        Some(date) => parse_date(&date)?,
        None => {
            let iso = String::from(js_sys::Date::new_0().to_iso_string());
            parse_date(iso.get(..10).unwrap_or_default())?
        }
    };
    let policy = expiring_within_days
        .map(|days| AlertPolicy {
            expiring_within_days: i64::from(days),
        })
        .unwrap_or_default();

    serde_json::to_string(&derive_all_alerts(&items, today, &policy)).map_err(js_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qc_status() {
        assert_eq!(qc_score(200, 10), 95);
        assert_eq!(qc_status(200, 10), "passed");
        assert_eq!(qc_status(200, 50), "failed");
        assert_eq!(qc_status(0, 0), "failed");
    }

    #[test]
    fn test_derived_statuses() {
        assert_eq!(multi_pick_status(0, 10), "pending");
        assert_eq!(multi_pick_status(4, 10), "in-progress");
        assert_eq!(multi_pick_status(10, 10), "completed");
        assert_eq!(shift_status(2, 3), "understaffed");
        assert_eq!(shift_status(3, 3), "full");
        assert_eq!(batch_status(100), "completed");
        assert_eq!(picker_status(false, 2), "busy");
    }

    #[test]
    fn test_pallets_and_hours() {
        assert_eq!(pallets_for_items(40), 10);
        assert_eq!(pallets_for_items(41), 11);
        let hours: Decimal = hours_between("22:00", "06:30").unwrap().parse().unwrap();
        assert_eq!(hours, Decimal::new(850, 2));
        assert_eq!(leave_day_count("2024-06-01", "2024-06-03").unwrap(), 3);
    }

    #[test]
    fn test_low_stock_alert_for_sku_7() {
        let items = r#"[{
            "id": "7f1c2a8e-0000-4000-8000-000000000007",
            "sku": "SKU-7",
            "productName": "Widget",
            "category": "General",
            "currentStock": 5,
            "minStock": 20,
            "maxStock": 100,
            "location": "A-01",
            "unitCost": "2.00",
            "value": "10.00",
            "expiryDate": null,
            "version": 1,
            "updatedAt": "2024-06-01T00:00:00Z"
        }]"#;
        let alerts = stock_alerts(items, Some("2024-06-01".to_string()), None).unwrap();
        let alerts: serde_json::Value = serde_json::from_str(&alerts).unwrap();
        assert_eq!(alerts[0]["id"], "SKU-7:low-stock");
        assert_eq!(alerts[0]["priority"], "high");
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod browser_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    const OUT_OF_STOCK: &str = r#"[{
        "id": "7f1c2a8e-0000-4000-8000-000000000009",
        "sku": "SKU-9",
        "productName": "Bracket",
        "category": "General",
        "currentStock": 0,
        "minStock": 10,
        "maxStock": 50,
        "location": "B-02",
        "unitCost": "1.00",
        "value": "0.00",
        "expiryDate": null,
        "version": 1,
        "updatedAt": "2024-06-01T00:00:00Z"
    }]"#;

    #[wasm_bindgen_test]
    fn stock_alerts_uses_browser_clock() {
        let alerts = stock_alerts(OUT_OF_STOCK, None, None).unwrap();
        assert!(alerts.contains("SKU-9:out-of-stock"));
    }

    #[wasm_bindgen_test]
    fn stock_alerts_rejects_bad_json() {
        assert!(stock_alerts("not json", Some("2024-06-01".to_string()), None).is_err());
    }

    #[wasm_bindgen_test]
    fn temperature_status_reads_custom_bands() {
        assert_eq!(temperature_status(4.0, 50.0, None).unwrap(), "critical");

        let cold_room = r#"{
            "normal_min": "2",
            "normal_max": "8",
            "warning_margin": "2",
            "humidity_normal_max": "60",
            "humidity_warning_max": "70"
        }"#;
        assert_eq!(temperature_status(4.0, 50.0, Some(cold_room.to_string())).unwrap(), "normal");
        assert!(temperature_status(4.0, 50.0, Some("{".to_string())).is_err());
    }
}
