//! Stock alert display state
//!
//! Alerts come from the server's derivation and are never authored here.
//! "Create reorder" only hides an alert on this screen: it stays hidden while
//! the server keeps reporting it at the same level, and shows again if the
//! level moves. It leaves the list entirely only once stock is raised.

use std::collections::BTreeMap;

use shared::StockAlert;

#[derive(Debug, Default)]
pub struct ReorderList {
    /// Alert id → level at the time the reorder was raised
    hidden: BTreeMap<String, i64>,
}

impl ReorderList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_reordered(&mut self, alert: &StockAlert) {
        tracing::info!(alert = %alert.id, sku = %alert.sku, "Reorder raised");
        self.hidden.insert(alert.id.clone(), alert.current_level);
    }

    pub fn is_hidden(&self, alert: &StockAlert) -> bool {
        self.hidden.get(&alert.id) == Some(&alert.current_level)
    }

    /// Alerts to render, most urgent first
    pub fn visible<'a, I>(&self, alerts: I) -> Vec<&'a StockAlert>
    where
        I: IntoIterator<Item = &'a StockAlert>,
    {
        let mut shown: Vec<_> = alerts.into_iter().filter(|a| !self.is_hidden(a)).collect();
        shown.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.id.cmp(&b.id)));
        shown
    }

    /// Forget reorders for alerts the server no longer reports
    pub fn prune<'a, I>(&mut self, current: I)
    where
        I: IntoIterator<Item = &'a StockAlert>,
    {
        let live: BTreeMap<&str, i64> = current
            .into_iter()
            .map(|a| (a.id.as_str(), a.current_level))
            .collect();
        self.hidden
            .retain(|id, level| live.get(id.as_str()) == Some(level));
    }

    pub fn len(&self) -> usize {
        self.hidden.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hidden.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{AlertPriority, StockAlertType};

    fn alert(sku: &str, alert_type: StockAlertType, level: i64, priority: AlertPriority) -> StockAlert {
        StockAlert {
            id: format!("{}:{}", sku, alert_type),
            alert_type,
            sku: sku.to_string(),
            product_name: "Widget".to_string(),
            current_level: level,
            threshold: 20,
            priority,
            expiry_date: None,
        }
    }

    #[test]
    fn test_reorder_hides_until_level_changes() {
        let mut reorders = ReorderList::new();
        let low = alert("SKU-7", StockAlertType::LowStock, 5, AlertPriority::High);
        reorders.mark_reordered(&low);
        assert!(reorders.visible([&low]).is_empty());

        let after_sale = alert("SKU-7", StockAlertType::LowStock, 3, AlertPriority::High);
        assert_eq!(reorders.visible([&after_sale]).len(), 1);
    }

    #[test]
    fn test_prune_drops_cleared_alerts() {
        let mut reorders = ReorderList::new();
        let low = alert("SKU-7", StockAlertType::LowStock, 5, AlertPriority::High);
        reorders.mark_reordered(&low);

        reorders.prune(std::iter::empty::<&StockAlert>());
        assert!(reorders.is_empty());
    }

    #[test]
    fn test_visible_orders_by_priority() {
        let reorders = ReorderList::new();
        let over = alert("SKU-1", StockAlertType::Overstock, 500, AlertPriority::Low);
        let out = alert("SKU-2", StockAlertType::OutOfStock, 0, AlertPriority::High);
        let shown = reorders.visible([&over, &out]);
        assert_eq!(shown[0].sku, "SKU-2");
    }
}
