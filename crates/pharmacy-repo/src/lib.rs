#[cfg(not(any(feature = "memory", feature = "sqlite")))]
compile_error!("Enable a repo feature: `memory` or `sqlite`.");

use pharmacy_types::domain::medicine::{Medicine, MedicineFilter};
use pharmacy_types::domain::order::{Order, OrderFilter};
use pharmacy_types::ports::store::{PharmacyStore, RepoError, StoreTx};
use uuid::Uuid;

#[cfg(feature = "memory")]
pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://pharmacy.db";

/// Whichever store the enabled features and the configured url select.
pub enum Repo {
    #[cfg(feature = "memory")]
    Memory(memory::InMemoryRepo),
    #[cfg(feature = "sqlite")]
    Sqlite(sqlite::SqliteRepo),
}

pub async fn build_repo(url: Option<&str>) -> anyhow::Result<Repo> {
    Repo::build_repo(url).await
}

impl Repo {
    #[cfg(all(feature = "memory", not(feature = "sqlite")))]
    pub async fn build_repo(_: Option<&str>) -> anyhow::Result<Self> {
        Ok(Repo::Memory(memory::InMemoryRepo::new()))
    }

    #[cfg(all(feature = "sqlite", not(feature = "memory")))]
    pub async fn build_repo(database_url: Option<&str>) -> anyhow::Result<Self> {
        let url = database_url.unwrap_or(DEFAULT_DATABASE_URL);
        Ok(Repo::Sqlite(sqlite::SqliteRepo::new(url).await?))
    }

    // With both features an explicit url picks sqlite, otherwise memory.
    #[cfg(all(feature = "sqlite", feature = "memory"))]
    pub async fn build_repo(database_url: Option<&str>) -> anyhow::Result<Self> {
        match database_url {
            Some(url) => Ok(Repo::Sqlite(sqlite::SqliteRepo::new(url).await?)),
            None => Ok(Repo::Memory(memory::InMemoryRepo::new())),
        }
    }

    pub fn backend(&self) -> &'static str {
        match self {
            #[cfg(feature = "memory")]
            Repo::Memory(_) => "memory",
            #[cfg(feature = "sqlite")]
            Repo::Sqlite(_) => "sqlite",
        }
    }

    fn store(&self) -> &dyn PharmacyStore {
        match self {
            #[cfg(feature = "memory")]
            Repo::Memory(repo) => repo,
            #[cfg(feature = "sqlite")]
            Repo::Sqlite(repo) => repo,
        }
    }
}

#[async_trait::async_trait]
impl PharmacyStore for Repo {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, RepoError> {
        self.store().begin().await
    }

    async fn get_medicine(&self, id: Uuid) -> Result<Option<Medicine>, RepoError> {
        self.store().get_medicine(id).await
    }

    async fn list_medicines(&self, filter: MedicineFilter) -> Result<Vec<Medicine>, RepoError> {
        self.store().list_medicines(filter).await
    }

    async fn get_order(&self, id: Uuid) -> Result<Option<Order>, RepoError> {
        self.store().get_order(id).await
    }

    async fn list_orders(&self, filter: OrderFilter) -> Result<Vec<Order>, RepoError> {
        self.store().list_orders(filter).await
    }
}
