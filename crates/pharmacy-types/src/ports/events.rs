use serde::Serialize;
use std::sync::Mutex;
use uuid::Uuid;

use crate::domain::order::OrderStatus;

/// Things the catalog and the ledger report after they happen (or after
/// they were refused).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DomainEvent {
    MedicineCreated {
        medicine_id: Uuid,
        name: String,
    },
    MedicineUpdated {
        medicine_id: Uuid,
    },
    MedicineDeleted {
        medicine_id: Uuid,
    },
    MedicineDeleteBlocked {
        medicine_id: Uuid,
        pending_orders: u64,
        referencing_orders: u64,
    },
    OrderPlaced {
        order_id: Uuid,
        medicine_id: Uuid,
        quantity: i64,
        total_price_cents: i64,
        stock_left: i64,
    },
    OrderRejected {
        medicine_id: Uuid,
        requested: i64,
        available: i64,
    },
    OrderUpdated {
        order_id: Uuid,
    },
    OrderStatusChanged {
        order_id: Uuid,
        from: OrderStatus,
        to: OrderStatus,
    },
    OrderDeleted {
        order_id: Uuid,
        stock_restored: i64,
    },
}

/// Observability collaborator injected into the services.
pub trait EventSink: Send + Sync + 'static {
    fn record(&self, event: &DomainEvent);
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn record(&self, _event: &DomainEvent) {}
}

/// Keeps events in memory; handy for assertions in tests.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<DomainEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<DomainEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl EventSink for RecordingSink {
    fn record(&self, event: &DomainEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_sink_keeps_order() {
        let sink = RecordingSink::new();
        let id = Uuid::new_v4();
        sink.record(&DomainEvent::MedicineUpdated { medicine_id: id });
        sink.record(&DomainEvent::MedicineDeleted { medicine_id: id });
        assert_eq!(
            sink.events(),
            vec![
                DomainEvent::MedicineUpdated { medicine_id: id },
                DomainEvent::MedicineDeleted { medicine_id: id },
            ]
        );
    }

    #[test]
    fn events_serialize_with_tag() {
        let id = Uuid::nil();
        let json = serde_json::to_value(DomainEvent::OrderDeleted {
            order_id: id,
            stock_restored: 10,
        })
        .unwrap();
        assert_eq!(json["event"], "order_deleted");
        assert_eq!(json["stock_restored"], 10);
    }
}
