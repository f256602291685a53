use std::sync::Arc;

use chrono::Utc;
use pharmacy_types::domain::order::{Order, OrderFilter, OrderPatch};
use pharmacy_types::domain::validation::{
    validate_quantity, validate_required, validate_status, FieldError,
};
use pharmacy_types::ports::events::{DomainEvent, EventSink};
use pharmacy_types::ports::store::{PharmacyStore, StoreTx};
use uuid::Uuid;

use super::catalog_service::CatalogService;
use crate::errors::AppError;

/// Orders, and the stock reservations they hold against the catalog.
///
/// Stock is reserved when an order is placed. A Pending order is a live
/// reservation: deleting it hands the units back, deleting an order in any
/// other state does not.
pub struct LedgerService<S: PharmacyStore> {
    store: Arc<S>,
    catalog: CatalogService<S>,
    events: Arc<dyn EventSink>,
}

impl<S: PharmacyStore> Clone for LedgerService<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            catalog: self.catalog.clone(),
            events: self.events.clone(),
        }
    }
}

async fn require_medicine(tx: &mut dyn StoreTx, medicine_id: Uuid) -> Result<(), AppError> {
    if tx.medicine(medicine_id).await?.is_none() {
        let msg = format!("medicine {medicine_id} does not exist");
        return Err(FieldError::new("medicine", msg).into());
    }
    Ok(())
}

/// A Pending order hands its quantity back on delete; refuse quantities
/// that could not be added to the medicine's stock.
async fn ensure_restorable(tx: &mut dyn StoreTx, order: &Order) -> Result<(), AppError> {
    let stock = tx
        .medicine(order.medicine_id)
        .await?
        .map(|m| m.stock)
        .unwrap_or_default();
    if stock.checked_add(order.quantity).is_none() {
        return Err(FieldError::new("quantity", "quantity is too large").into());
    }
    Ok(())
}

impl<S: PharmacyStore> LedgerService<S> {
    pub fn new(store: Arc<S>, catalog: CatalogService<S>, events: Arc<dyn EventSink>) -> Self {
        Self {
            store,
            catalog,
            events,
        }
    }

    /// Places a Pending order and reserves its stock in one unit of work.
    pub async fn create(
        &self,
        customer_name: String,
        medicine_id: Uuid,
        quantity: i64,
    ) -> Result<Order, AppError> {
        validate_required("customer_name", &customer_name)?;
        validate_quantity(quantity)?;

        let mut tx = self.store.begin().await?;
        let medicine = tx.medicine(medicine_id).await?.ok_or_else(|| {
            FieldError::new("medicine", format!("medicine {medicine_id} does not exist"))
        })?;

        if quantity > medicine.stock {
            drop(tx);
            self.events.record(&DomainEvent::OrderRejected {
                medicine_id,
                requested: quantity,
                available: medicine.stock,
            });
            return Err(AppError::InsufficientStock {
                requested: quantity,
                available: medicine.stock,
            });
        }

        let order = Order::place(customer_name, &medicine, quantity, Utc::now())?;
        tx.insert_order(&order).await?;
        self.catalog
            .adjust_stock(tx.as_mut(), medicine_id, -quantity)
            .await?;
        tx.commit().await?;

        self.events.record(&DomainEvent::OrderPlaced {
            order_id: order.id,
            medicine_id,
            quantity,
            total_price_cents: order.total_price_cents,
            stock_left: medicine.stock - quantity,
        });
        Ok(order)
    }

    pub async fn get(&self, id: Uuid) -> Result<Order, AppError> {
        self.store
            .get_order(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("order {id}")))
    }

    pub async fn list(&self, filter: OrderFilter) -> Result<Vec<Order>, AppError> {
        Ok(self.store.list_orders(filter).await?)
    }

    /// Any of the five statuses is accepted from any other; stock is not
    /// touched.
    pub async fn update_status(&self, id: Uuid, status: &str) -> Result<Order, AppError> {
        let status = validate_status(status)?;

        let mut tx = self.store.begin().await?;
        let mut order = tx
            .order(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("order {id}")))?;
        let from = order.status;
        order.status = status;
        if order.is_pending() {
            ensure_restorable(tx.as_mut(), &order).await?;
        }
        tx.update_order(&order).await?;
        tx.commit().await?;

        self.events.record(&DomainEvent::OrderStatusChanged {
            order_id: id,
            from,
            to: status,
        });
        Ok(order)
    }

    /// Field update without stock reconciliation: moving an order to another
    /// medicine or changing its quantity leaves both stocks and the frozen
    /// total as they were.
    pub async fn update(&self, id: Uuid, patch: OrderPatch) -> Result<Order, AppError> {
        let customer_name = patch.customer_name.map(|n| n.trim().to_string());
        if let Some(name) = &customer_name {
            validate_required("customer_name", name)?;
        }
        if let Some(quantity) = patch.quantity {
            validate_quantity(quantity)?;
        }
        let status = patch.status.as_deref().map(validate_status).transpose()?;

        let mut tx = self.store.begin().await?;
        let mut order = tx
            .order(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("order {id}")))?;
        if let Some(medicine_id) = patch.medicine_id {
            require_medicine(tx.as_mut(), medicine_id).await?;
            order.medicine_id = medicine_id;
        }
        if let Some(name) = customer_name {
            order.customer_name = name;
        }
        if let Some(quantity) = patch.quantity {
            order.quantity = quantity;
        }
        if let Some(status) = status {
            order.status = status;
        }
        if order.is_pending() {
            ensure_restorable(tx.as_mut(), &order).await?;
        }
        tx.update_order(&order).await?;
        tx.commit().await?;

        self.events
            .record(&DomainEvent::OrderUpdated { order_id: id });
        Ok(order)
    }

    /// Removes the order, handing reserved units back when it was still
    /// Pending.
    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let mut tx = self.store.begin().await?;
        let order = tx
            .order(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("order {id}")))?;

        let stock_restored = if order.is_pending() {
            self.catalog
                .adjust_stock(tx.as_mut(), order.medicine_id, order.quantity)
                .await?;
            order.quantity
        } else {
            0
        };
        tx.delete_order(id).await?;
        tx.commit().await?;

        self.events.record(&DomainEvent::OrderDeleted {
            order_id: id,
            stock_restored,
        });
        Ok(())
    }
}
