use async_trait::async_trait;
use chrono::Utc;
use pharmacy_types::domain::medicine::{Medicine, MedicineFilter};
use pharmacy_types::domain::order::{Order, OrderFilter, OrderStatus};
use pharmacy_types::ports::store::{PharmacyStore, RepoError, StoreTx};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

#[derive(Clone, Default)]
struct Tables {
    medicines: HashMap<Uuid, Medicine>,
    orders: HashMap<Uuid, Order>,
}

impl Tables {
    fn name_taken(&self, medicine: &Medicine) -> bool {
        self.medicines
            .values()
            .any(|m| m.name == medicine.name && m.id != medicine.id)
    }
}

/// Both tables behind one async mutex. A transaction holds the lock for its
/// whole lifetime, so units of work are serialised.
#[derive(Clone)]
pub struct InMemoryRepo {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryRepo {
    pub fn new() -> Self {
        Self {
            tables: Arc::new(Mutex::new(Tables::default())),
        }
    }
}

impl Default for InMemoryRepo {
    fn default() -> Self {
        Self::new()
    }
}

/// Writes land in `working`; commit swaps it into the guarded tables.
pub struct InMemoryTx {
    guard: OwnedMutexGuard<Tables>,
    working: Tables,
}

#[async_trait]
impl PharmacyStore for InMemoryRepo {
    // Each unit of work copies both tables, so a write costs O(rows).
    async fn begin(&self) -> Result<Box<dyn StoreTx>, RepoError> {
        let guard = self.tables.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(InMemoryTx { guard, working }))
    }

    async fn get_medicine(&self, id: Uuid) -> Result<Option<Medicine>, RepoError> {
        Ok(self.tables.lock().await.medicines.get(&id).cloned())
    }

    async fn list_medicines(&self, filter: MedicineFilter) -> Result<Vec<Medicine>, RepoError> {
        let tables = self.tables.lock().await;
        let mut out: Vec<Medicine> = tables
            .medicines
            .values()
            .filter(|m| filter.matches(m))
            .cloned()
            .collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(out)
    }

    async fn get_order(&self, id: Uuid) -> Result<Option<Order>, RepoError> {
        Ok(self.tables.lock().await.orders.get(&id).cloned())
    }

    async fn list_orders(&self, filter: OrderFilter) -> Result<Vec<Order>, RepoError> {
        let tables = self.tables.lock().await;
        let mut out: Vec<Order> = tables
            .orders
            .values()
            .filter(|o| filter.matches(o))
            .cloned()
            .collect();
        out.sort_by(|a, b| b.order_date.cmp(&a.order_date));
        Ok(out)
    }
}

#[async_trait]
impl StoreTx for InMemoryTx {
    async fn medicine(&mut self, id: Uuid) -> Result<Option<Medicine>, RepoError> {
        Ok(self.working.medicines.get(&id).cloned())
    }

    async fn medicine_by_name(&mut self, name: &str) -> Result<Option<Medicine>, RepoError> {
        Ok(self
            .working
            .medicines
            .values()
            .find(|m| m.name == name)
            .cloned())
    }

    async fn insert_medicine(&mut self, medicine: &Medicine) -> Result<(), RepoError> {
        if self.working.medicines.contains_key(&medicine.id) {
            return Err(RepoError::DbError(format!(
                "medicine {} already exists",
                medicine.id
            )));
        }
        if self.working.name_taken(medicine) {
            return Err(RepoError::DbError(format!(
                "medicine name `{}` is not unique",
                medicine.name
            )));
        }
        self.working
            .medicines
            .insert(medicine.id, medicine.clone());
        Ok(())
    }

    async fn update_medicine(&mut self, medicine: &Medicine) -> Result<(), RepoError> {
        if self.working.name_taken(medicine) {
            return Err(RepoError::DbError(format!(
                "medicine name `{}` is not unique",
                medicine.name
            )));
        }
        match self.working.medicines.get_mut(&medicine.id) {
            Some(slot) => {
                *slot = medicine.clone();
                Ok(())
            }
            None => Err(RepoError::DbError(format!(
                "medicine {} does not exist",
                medicine.id
            ))),
        }
    }

    async fn delete_medicine(&mut self, id: Uuid) -> Result<bool, RepoError> {
        if self.working.orders.values().any(|o| o.medicine_id == id) {
            return Err(RepoError::DbError(format!(
                "medicine {id} is still referenced by orders"
            )));
        }
        Ok(self.working.medicines.remove(&id).is_some())
    }

    async fn adjust_stock(&mut self, id: Uuid, delta: i64) -> Result<bool, RepoError> {
        let Some(medicine) = self.working.medicines.get_mut(&id) else {
            return Ok(false);
        };
        let Some(stock) = medicine.stock.checked_add(delta) else {
            return Err(RepoError::DbError(format!(
                "stock of medicine {id} would overflow"
            )));
        };
        if stock < 0 {
            return Err(RepoError::DbError(format!(
                "stock of medicine {id} would drop to {stock}"
            )));
        }
        medicine.stock = stock;
        medicine.updated_at = Utc::now();
        Ok(true)
    }

    async fn count_orders(
        &mut self,
        medicine_id: Uuid,
        status: Option<OrderStatus>,
    ) -> Result<u64, RepoError> {
        let filter = OrderFilter {
            status,
            medicine_id: Some(medicine_id),
        };
        Ok(self
            .working
            .orders
            .values()
            .filter(|o| filter.matches(o))
            .count() as u64)
    }

    async fn order(&mut self, id: Uuid) -> Result<Option<Order>, RepoError> {
        Ok(self.working.orders.get(&id).cloned())
    }

    async fn insert_order(&mut self, order: &Order) -> Result<(), RepoError> {
        if !self.working.medicines.contains_key(&order.medicine_id) {
            return Err(RepoError::DbError(format!(
                "medicine {} does not exist",
                order.medicine_id
            )));
        }
        self.working.orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn update_order(&mut self, order: &Order) -> Result<(), RepoError> {
        if !self.working.medicines.contains_key(&order.medicine_id) {
            return Err(RepoError::DbError(format!(
                "medicine {} does not exist",
                order.medicine_id
            )));
        }
        match self.working.orders.get_mut(&order.id) {
            Some(slot) => {
                *slot = order.clone();
                Ok(())
            }
            None => Err(RepoError::DbError(format!(
                "order {} does not exist",
                order.id
            ))),
        }
    }

    async fn delete_order(&mut self, id: Uuid) -> Result<bool, RepoError> {
        Ok(self.working.orders.remove(&id).is_some())
    }

    async fn commit(self: Box<Self>) -> Result<(), RepoError> {
        let InMemoryTx { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }
}
