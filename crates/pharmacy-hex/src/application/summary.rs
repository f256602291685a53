use pharmacy_types::domain::medicine::MedicineFilter;
use pharmacy_types::domain::order::{OrderFilter, OrderStatus};
use pharmacy_types::ports::store::PharmacyStore;

use super::Pharmacy;
use crate::errors::AppError;

pub use pharmacy_types::domain::summary::InventorySummary;

impl<S: PharmacyStore> Pharmacy<S> {
    pub async fn summary(&self, low_stock_threshold: i64) -> Result<InventorySummary, AppError> {
        let medicines = self.catalog.list(MedicineFilter::default()).await?;
        let orders = self.ledger.list(OrderFilter::default()).await?;
        Ok(InventorySummary {
            medicine_count: medicines.len(),
            order_count: orders.len(),
            low_stock_count: medicines
                .iter()
                .filter(|m| m.stock < low_stock_threshold)
                .count(),
            pending_orders: orders
                .iter()
                .filter(|o| o.status == OrderStatus::Pending)
                .count(),
        })
    }
}
