use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::medicine::Medicine;
use super::validation::{validate_quantity, validate_required, FieldError};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Processing => "Processing",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(thiserror::Error, Debug)]
#[error("unknown order status `{0}`")]
pub struct UnknownStatus(pub String);

impl FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Order {
    pub id: Uuid,
    pub customer_name: String,
    pub medicine_id: Uuid,
    pub quantity: i64,
    pub status: OrderStatus,
    pub order_date: DateTime<Utc>,
    /// Frozen at placement: later price changes never touch it.
    pub total_price_cents: i64,
}

/// API representation: the order plus the medicine it references, at the
/// medicine's current price.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderView {
    #[serde(flatten)]
    pub order: Order,
    pub medicine_name: String,
    pub medicine_price_cents: i64,
}

impl OrderView {
    pub fn new(order: Order, medicine: &Medicine) -> Self {
        Self {
            order,
            medicine_name: medicine.name.clone(),
            medicine_price_cents: medicine.price_cents,
        }
    }
}

/// Partial update. Changing `medicine_id` or `quantity` does not move stock
/// and does not recompute the total.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medicine_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderFilter {
    #[serde(default)]
    pub status: Option<OrderStatus>,
    #[serde(default)]
    pub medicine_id: Option<Uuid>,
}

impl OrderFilter {
    pub fn matches(&self, o: &Order) -> bool {
        self.status.map_or(true, |s| o.status == s)
            && self.medicine_id.map_or(true, |m| o.medicine_id == m)
    }
}

impl Order {
    /// Builds a Pending order priced from the medicine as it is right now.
    /// Stock sufficiency is the ledger's concern, not checked here.
    pub fn place(
        customer_name: String,
        medicine: &Medicine,
        quantity: i64,
        now: DateTime<Utc>,
    ) -> Result<Self, FieldError> {
        let customer_name = customer_name.trim().to_string();
        validate_required("customer_name", &customer_name)?;
        validate_quantity(quantity)?;
        let total_price_cents = medicine
            .price_cents
            .checked_mul(quantity)
            .ok_or_else(|| FieldError::new("quantity", "order total is too large"))?;
        Ok(Self {
            id: Uuid::new_v4(),
            customer_name,
            medicine_id: medicine.id,
            quantity,
            status: OrderStatus::Pending,
            order_date: now,
            total_price_cents,
        })
    }

    pub fn is_pending(&self) -> bool {
        self.status == OrderStatus::Pending
    }
}
