pub mod catalog_service;
pub mod ledger_service;
pub mod summary;

use std::collections::HashMap;
use std::sync::Arc;

use pharmacy_types::domain::medicine::MedicineFilter;
use pharmacy_types::domain::order::{Order, OrderView};
use pharmacy_types::ports::events::EventSink;
use pharmacy_types::ports::store::PharmacyStore;

use crate::errors::AppError;
use catalog_service::CatalogService;
use ledger_service::LedgerService;

/// Catalog and ledger wired to one store and one event sink.
pub struct Pharmacy<S: PharmacyStore> {
    pub catalog: CatalogService<S>,
    pub ledger: LedgerService<S>,
}

impl<S: PharmacyStore> Pharmacy<S> {
    pub fn new(store: S, events: Arc<dyn EventSink>) -> Self {
        let store = Arc::new(store);
        let catalog = CatalogService::new(store.clone(), events.clone());
        let ledger = LedgerService::new(store, catalog.clone(), events);
        Self { catalog, ledger }
    }

    pub async fn order_view(&self, order: Order) -> Result<OrderView, AppError> {
        let medicine = self.catalog.get(order.medicine_id).await?;
        Ok(OrderView::new(order, &medicine))
    }

    /// Resolves every order's medicine from one catalog listing.
    pub async fn order_views(&self, orders: Vec<Order>) -> Result<Vec<OrderView>, AppError> {
        let medicines: HashMap<_, _> = self
            .catalog
            .list(MedicineFilter::default())
            .await?
            .into_iter()
            .map(|m| (m.id, m))
            .collect();
        orders
            .into_iter()
            .map(|order| -> Result<OrderView, AppError> {
                let medicine = medicines.get(&order.medicine_id).ok_or_else(|| {
                    anyhow::anyhow!("order {} references a missing medicine", order.id)
                })?;
                Ok(OrderView::new(order, medicine))
            })
            .collect()
    }
}
