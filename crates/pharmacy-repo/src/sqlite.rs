use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use pharmacy_types::domain::medicine::{Medicine, MedicineFilter};
use pharmacy_types::domain::order::{Order, OrderFilter, OrderStatus};
use pharmacy_types::ports::store::{PharmacyStore, RepoError, StoreTx};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool, Transaction};
use std::str::FromStr;
use uuid::Uuid;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// SQLite-backed store. The pool holds a single connection, so an open
/// transaction is the only writer until it commits or rolls back.
pub struct SqliteRepo {
    pool: SqlitePool,
}

pub struct SqliteTx {
    tx: Transaction<'static, Sqlite>,
}

fn db_err(e: impl std::fmt::Display) -> RepoError {
    RepoError::DbError(e.to_string())
}

fn timestamp(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, RepoError> {
    Ok(DateTime::parse_from_rfc3339(s)
        .map_err(db_err)?
        .with_timezone(&Utc))
}

fn parse_uuid(s: &str) -> Result<Uuid, RepoError> {
    Uuid::parse_str(s).map_err(db_err)
}

#[derive(FromRow)]
struct DbMedicine {
    id: String,
    name: String,
    description: String,
    price_cents: i64,
    stock: i64,
    expiry_date: String,
    created_at: String,
    updated_at: String,
}

impl DbMedicine {
    fn into_medicine(self) -> Result<Medicine, RepoError> {
        Ok(Medicine {
            id: parse_uuid(&self.id)?,
            name: self.name,
            description: self.description,
            price_cents: self.price_cents,
            stock: self.stock,
            expiry_date: NaiveDate::parse_from_str(&self.expiry_date, DATE_FORMAT)
                .map_err(db_err)?,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
        })
    }
}

#[derive(FromRow)]
struct DbOrder {
    id: String,
    customer_name: String,
    medicine_id: String,
    quantity: i64,
    status: String,
    order_date: String,
    total_price_cents: i64,
}

impl DbOrder {
    fn into_order(self) -> Result<Order, RepoError> {
        Ok(Order {
            id: parse_uuid(&self.id)?,
            customer_name: self.customer_name,
            medicine_id: parse_uuid(&self.medicine_id)?,
            quantity: self.quantity,
            status: OrderStatus::from_str(&self.status).map_err(db_err)?,
            order_date: parse_timestamp(&self.order_date)?,
            total_price_cents: self.total_price_cents,
        })
    }
}

async fn fetch_medicine<'e, E>(exec: E, id: Uuid) -> Result<Option<Medicine>, RepoError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row: Option<DbMedicine> = sqlx::query_as(
        "SELECT id, name, description, price_cents, stock, expiry_date, created_at, updated_at
         FROM medicines WHERE id = ?",
    )
    .bind(id.to_string())
    .fetch_optional(exec)
    .await
    .map_err(db_err)?;
    row.map(|r| r.into_medicine()).transpose()
}

async fn fetch_order<'e, E>(exec: E, id: Uuid) -> Result<Option<Order>, RepoError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row: Option<DbOrder> = sqlx::query_as(
        "SELECT id, customer_name, medicine_id, quantity, status, order_date, total_price_cents
         FROM orders WHERE id = ?",
    )
    .bind(id.to_string())
    .fetch_optional(exec)
    .await
    .map_err(db_err)?;
    row.map(|r| r.into_order()).transpose()
}

impl SqliteRepo {
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        // Ensure on-disk SQLite target directory exists (no-op for in-memory).
        if let Some(path) = database_url.strip_prefix("sqlite://") {
            if path != ":memory:" {
                let p = std::path::Path::new(path);
                if let Some(parent) = p.parent() {
                    if !parent.as_os_str().is_empty() {
                        tokio::fs::create_dir_all(parent).await?;
                    }
                }
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        let ddl = include_str!("../migrations/0001_create_pharmacy.sql");
        for statement in ddl.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            sqlx::query(statement).execute(&pool).await?;
        }

        Ok(Self { pool })
    }
}

#[async_trait]
impl PharmacyStore for SqliteRepo {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, RepoError> {
        let tx = self.pool.begin().await.map_err(db_err)?;
        Ok(Box::new(SqliteTx { tx }))
    }

    async fn get_medicine(&self, id: Uuid) -> Result<Option<Medicine>, RepoError> {
        fetch_medicine(&self.pool, id).await
    }

    async fn list_medicines(&self, filter: MedicineFilter) -> Result<Vec<Medicine>, RepoError> {
        let rows: Vec<DbMedicine> = sqlx::query_as(
            "SELECT id, name, description, price_cents, stock, expiry_date, created_at, updated_at
             FROM medicines
             WHERE (?1 = 0 OR stock > 0) AND (?2 IS NULL OR stock < ?2)
             ORDER BY name",
        )
        .bind(filter.in_stock)
        .bind(filter.stock_below)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.into_iter()
            .map(|r| r.into_medicine())
            .collect::<Result<Vec<_>, _>>()
    }

    async fn get_order(&self, id: Uuid) -> Result<Option<Order>, RepoError> {
        fetch_order(&self.pool, id).await
    }

    async fn list_orders(&self, filter: OrderFilter) -> Result<Vec<Order>, RepoError> {
        let rows: Vec<DbOrder> = sqlx::query_as(
            "SELECT id, customer_name, medicine_id, quantity, status, order_date, total_price_cents
             FROM orders
             WHERE (?1 IS NULL OR status = ?1) AND (?2 IS NULL OR medicine_id = ?2)
             ORDER BY order_date DESC",
        )
        .bind(filter.status.map(|s| s.to_string()))
        .bind(filter.medicine_id.map(|id| id.to_string()))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.into_iter()
            .map(|r| r.into_order())
            .collect::<Result<Vec<_>, _>>()
    }
}

#[async_trait]
impl StoreTx for SqliteTx {
    async fn medicine(&mut self, id: Uuid) -> Result<Option<Medicine>, RepoError> {
        fetch_medicine(&mut *self.tx, id).await
    }

    async fn medicine_by_name(&mut self, name: &str) -> Result<Option<Medicine>, RepoError> {
        let row: Option<DbMedicine> = sqlx::query_as(
            "SELECT id, name, description, price_cents, stock, expiry_date, created_at, updated_at
             FROM medicines WHERE name = ?",
        )
        .bind(name)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_err)?;
        row.map(|r| r.into_medicine()).transpose()
    }

    async fn insert_medicine(&mut self, medicine: &Medicine) -> Result<(), RepoError> {
        sqlx::query(
            "INSERT INTO medicines (id, name, description, price_cents, stock, expiry_date, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(medicine.id.to_string())
        .bind(&medicine.name)
        .bind(&medicine.description)
        .bind(medicine.price_cents)
        .bind(medicine.stock)
        .bind(medicine.expiry_date.format(DATE_FORMAT).to_string())
        .bind(timestamp(&medicine.created_at))
        .bind(timestamp(&medicine.updated_at))
        .execute(&mut *self.tx)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn update_medicine(&mut self, medicine: &Medicine) -> Result<(), RepoError> {
        let res = sqlx::query(
            "UPDATE medicines
             SET name = ?, description = ?, price_cents = ?, stock = ?, expiry_date = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(&medicine.name)
        .bind(&medicine.description)
        .bind(medicine.price_cents)
        .bind(medicine.stock)
        .bind(medicine.expiry_date.format(DATE_FORMAT).to_string())
        .bind(timestamp(&medicine.updated_at))
        .bind(medicine.id.to_string())
        .execute(&mut *self.tx)
        .await
        .map_err(db_err)?;
        if res.rows_affected() == 0 {
            return Err(RepoError::DbError(format!(
                "medicine {} does not exist",
                medicine.id
            )));
        }
        Ok(())
    }

    async fn delete_medicine(&mut self, id: Uuid) -> Result<bool, RepoError> {
        let res = sqlx::query("DELETE FROM medicines WHERE id = ?")
            .bind(id.to_string())
            .execute(&mut *self.tx)
            .await
            .map_err(db_err)?;
        Ok(res.rows_affected() > 0)
    }

    /// The new value is computed here rather than in SQL, where an
    /// overflowing `stock + ?` would silently turn into a REAL.
    async fn adjust_stock(&mut self, id: Uuid, delta: i64) -> Result<bool, RepoError> {
        let current: Option<i64> = sqlx::query_scalar("SELECT stock FROM medicines WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(db_err)?;
        let Some(current) = current else {
            return Ok(false);
        };
        let stock = current.checked_add(delta).ok_or_else(|| {
            RepoError::DbError(format!("stock of medicine {id} would overflow"))
        })?;

        sqlx::query("UPDATE medicines SET stock = ?, updated_at = ? WHERE id = ?")
            .bind(stock)
            .bind(timestamp(&Utc::now()))
            .bind(id.to_string())
            .execute(&mut *self.tx)
            .await
            .map_err(db_err)?;
        Ok(true)
    }

    async fn count_orders(
        &mut self,
        medicine_id: Uuid,
        status: Option<OrderStatus>,
    ) -> Result<u64, RepoError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM orders WHERE medicine_id = ?1 AND (?2 IS NULL OR status = ?2)",
        )
        .bind(medicine_id.to_string())
        .bind(status.map(|s| s.to_string()))
        .fetch_one(&mut *self.tx)
        .await
        .map_err(db_err)?;
        Ok(count as u64)
    }

    async fn order(&mut self, id: Uuid) -> Result<Option<Order>, RepoError> {
        fetch_order(&mut *self.tx, id).await
    }

    async fn insert_order(&mut self, order: &Order) -> Result<(), RepoError> {
        sqlx::query(
            "INSERT INTO orders (id, customer_name, medicine_id, quantity, status, order_date, total_price_cents)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(order.id.to_string())
        .bind(&order.customer_name)
        .bind(order.medicine_id.to_string())
        .bind(order.quantity)
        .bind(order.status.to_string())
        .bind(timestamp(&order.order_date))
        .bind(order.total_price_cents)
        .execute(&mut *self.tx)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn update_order(&mut self, order: &Order) -> Result<(), RepoError> {
        let res = sqlx::query(
            "UPDATE orders SET customer_name = ?, medicine_id = ?, quantity = ?, status = ? WHERE id = ?",
        )
        .bind(&order.customer_name)
        .bind(order.medicine_id.to_string())
        .bind(order.quantity)
        .bind(order.status.to_string())
        .bind(order.id.to_string())
        .execute(&mut *self.tx)
        .await
        .map_err(db_err)?;
        if res.rows_affected() == 0 {
            return Err(RepoError::DbError(format!(
                "order {} does not exist",
                order.id
            )));
        }
        Ok(())
    }

    async fn delete_order(&mut self, id: Uuid) -> Result<bool, RepoError> {
        let res = sqlx::query("DELETE FROM orders WHERE id = ?")
            .bind(id.to_string())
            .execute(&mut *self.tx)
            .await
            .map_err(db_err)?;
        Ok(res.rows_affected() > 0)
    }

    async fn commit(self: Box<Self>) -> Result<(), RepoError> {
        self.tx.commit().await.map_err(db_err)
    }
}
