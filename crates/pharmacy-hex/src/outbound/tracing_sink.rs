use pharmacy_types::ports::events::{DomainEvent, EventSink};

/// Forwards domain events to `tracing`. Refusals are logged at warn level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn record(&self, event: &DomainEvent) {
        match event {
            DomainEvent::MedicineCreated { medicine_id, name } => {
                tracing::info!(%medicine_id, %name, "medicine created");
            }
            DomainEvent::MedicineUpdated { medicine_id } => {
                tracing::info!(%medicine_id, "medicine updated");
            }
            DomainEvent::MedicineDeleted { medicine_id } => {
                tracing::info!(%medicine_id, "medicine deleted");
            }
            DomainEvent::MedicineDeleteBlocked {
                medicine_id,
                pending_orders,
                referencing_orders,
            } => tracing::warn!(
                %medicine_id,
                pending_orders,
                referencing_orders,
                "medicine delete blocked"
            ),
            DomainEvent::OrderPlaced {
                order_id,
                medicine_id,
                quantity,
                total_price_cents,
                stock_left,
            } => tracing::info!(
                %order_id,
                %medicine_id,
                quantity,
                total_price_cents,
                stock_left,
                "order placed"
            ),
            DomainEvent::OrderRejected {
                medicine_id,
                requested,
                available,
            } => tracing::warn!(
                %medicine_id,
                requested,
                available,
                "insufficient stock"
            ),
            DomainEvent::OrderUpdated { order_id } => {
                tracing::info!(%order_id, "order updated");
            }
            DomainEvent::OrderStatusChanged { order_id, from, to } => {
                tracing::info!(%order_id, %from, %to, "order status changed");
            }
            DomainEvent::OrderDeleted {
                order_id,
                stock_restored,
            } => tracing::info!(%order_id, stock_restored, "order deleted"),
        }
    }
}
