//! Field rules shared by the catalog and the ledger. Every check is a pure
//! function returning the offending field on failure.

use chrono::NaiveDate;
use serde::Serialize;

use super::order::OrderStatus;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("{field}: {message}")]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

pub fn validate_price(price_cents: i64) -> Result<(), FieldError> {
    if price_cents <= 0 {
        return Err(FieldError::new("price", "price must be greater than 0"));
    }
    Ok(())
}

pub fn validate_stock(stock: i64) -> Result<(), FieldError> {
    if stock < 0 {
        return Err(FieldError::new("stock", "stock cannot be negative"));
    }
    Ok(())
}

pub fn validate_expiry(expiry_date: NaiveDate, today: NaiveDate) -> Result<(), FieldError> {
    if expiry_date < today {
        return Err(FieldError::new(
            "expiry_date",
            "expiry date cannot be in the past",
        ));
    }
    Ok(())
}

pub fn validate_quantity(quantity: i64) -> Result<(), FieldError> {
    if quantity < 1 {
        return Err(FieldError::new("quantity", "quantity must be at least 1"));
    }
    Ok(())
}

pub fn validate_status(status: &str) -> Result<OrderStatus, FieldError> {
    status.parse().map_err(|_| {
        let choices: Vec<&str> = OrderStatus::ALL.iter().map(|s| s.as_str()).collect();
        FieldError::new(
            "status",
            format!("invalid status, choose from: {}", choices.join(", ")),
        )
    })
}

pub fn validate_required(field: &'static str, value: &str) -> Result<(), FieldError> {
    if value.trim().is_empty() {
        return Err(FieldError::new(field, format!("{field} cannot be empty")));
    }
    Ok(())
}
