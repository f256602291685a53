use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::medicine::{Medicine, MedicineFilter};
use crate::domain::order::{Order, OrderFilter, OrderStatus};

#[derive(thiserror::Error, Debug)]
pub enum RepoError {
    #[error("db error: {0}")]
    DbError(String),
}

/// Backing store for the catalog and the ledger.
///
/// Reads may go straight to the store; every mutation happens inside a
/// [`StoreTx`] obtained from [`PharmacyStore::begin`].
#[async_trait]
pub trait PharmacyStore: Send + Sync + 'static {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, RepoError>;

    async fn get_medicine(&self, id: Uuid) -> Result<Option<Medicine>, RepoError>;
    /// Sorted by name.
    async fn list_medicines(&self, filter: MedicineFilter) -> Result<Vec<Medicine>, RepoError>;

    async fn get_order(&self, id: Uuid) -> Result<Option<Order>, RepoError>;
    /// Newest first.
    async fn list_orders(&self, filter: OrderFilter) -> Result<Vec<Order>, RepoError>;
}

/// One isolated unit of work. Dropping it without calling
/// [`StoreTx::commit`] discards every write made through it.
#[async_trait]
pub trait StoreTx: Send {
    async fn medicine(&mut self, id: Uuid) -> Result<Option<Medicine>, RepoError>;
    async fn medicine_by_name(&mut self, name: &str) -> Result<Option<Medicine>, RepoError>;
    async fn insert_medicine(&mut self, medicine: &Medicine) -> Result<(), RepoError>;
    async fn update_medicine(&mut self, medicine: &Medicine) -> Result<(), RepoError>;
    async fn delete_medicine(&mut self, id: Uuid) -> Result<bool, RepoError>;
    /// Adds `delta` to the medicine's stock. Returns `false` when the
    /// medicine does not exist.
    async fn adjust_stock(&mut self, id: Uuid, delta: i64) -> Result<bool, RepoError>;

    /// Orders referencing `medicine_id`, optionally restricted to one status.
    async fn count_orders(
        &mut self,
        medicine_id: Uuid,
        status: Option<OrderStatus>,
    ) -> Result<u64, RepoError>;
    async fn order(&mut self, id: Uuid) -> Result<Option<Order>, RepoError>;
    async fn insert_order(&mut self, order: &Order) -> Result<(), RepoError>;
    async fn update_order(&mut self, order: &Order) -> Result<(), RepoError>;
    async fn delete_order(&mut self, id: Uuid) -> Result<bool, RepoError>;

    async fn commit(self: Box<Self>) -> Result<(), RepoError>;
}
