use serde::{Deserialize, Serialize};

/// Dashboard counters.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct InventorySummary {
    pub medicine_count: usize,
    pub order_count: usize,
    /// Medicines whose stock is below the configured threshold.
    pub low_stock_count: usize,
    pub pending_orders: usize,
}
