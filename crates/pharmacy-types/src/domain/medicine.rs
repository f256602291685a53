use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::validation::{
    validate_expiry, validate_price, validate_required, validate_stock, FieldError,
};

/// A medicine in the catalog. Prices are held in cents.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Medicine {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price_cents: i64,
    pub stock: i64,
    pub expiry_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// API representation: the record plus its derived stock flag.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MedicineView {
    #[serde(flatten)]
    pub medicine: Medicine,
    pub is_in_stock: bool,
}

impl From<Medicine> for MedicineView {
    fn from(medicine: Medicine) -> Self {
        Self {
            is_in_stock: medicine.is_in_stock(),
            medicine,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMedicine {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price_cents: i64,
    pub stock: i64,
    pub expiry_date: NaiveDate,
}

/// Partial update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MedicinePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_cents: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<NaiveDate>,
}

impl From<NewMedicine> for MedicinePatch {
    fn from(m: NewMedicine) -> Self {
        Self {
            name: Some(m.name),
            description: Some(m.description),
            price_cents: Some(m.price_cents),
            stock: Some(m.stock),
            expiry_date: Some(m.expiry_date),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MedicineFilter {
    /// Only medicines with stock > 0.
    #[serde(default)]
    pub in_stock: bool,
    /// Only medicines whose stock is strictly below this value.
    #[serde(default)]
    pub stock_below: Option<i64>,
}

impl MedicineFilter {
    pub fn matches(&self, m: &Medicine) -> bool {
        if self.in_stock && !m.is_in_stock() {
            return false;
        }
        match self.stock_below {
            Some(limit) => m.stock < limit,
            None => true,
        }
    }
}

impl Medicine {
    pub fn new(draft: NewMedicine, now: DateTime<Utc>) -> Result<Self, FieldError> {
        let name = draft.name.trim().to_string();
        validate_required("name", &name)?;
        validate_price(draft.price_cents)?;
        validate_stock(draft.stock)?;
        validate_expiry(draft.expiry_date, now.date_naive())?;
        Ok(Self {
            id: Uuid::new_v4(),
            name,
            description: draft.description,
            price_cents: draft.price_cents,
            stock: draft.stock,
            expiry_date: draft.expiry_date,
            created_at: now,
            updated_at: now,
        })
    }

    /// Validates every supplied field before touching `self`, so a rejected
    /// patch leaves the record as it was.
    pub fn apply(&mut self, patch: MedicinePatch, now: DateTime<Utc>) -> Result<(), FieldError> {
        let name = patch.name.map(|n| n.trim().to_string());
        if let Some(name) = &name {
            validate_required("name", name)?;
        }
        if let Some(price) = patch.price_cents {
            validate_price(price)?;
        }
        if let Some(stock) = patch.stock {
            validate_stock(stock)?;
        }
        if let Some(expiry) = patch.expiry_date {
            validate_expiry(expiry, now.date_naive())?;
        }

        if let Some(name) = name {
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(price) = patch.price_cents {
            self.price_cents = price;
        }
        if let Some(stock) = patch.stock {
            self.stock = stock;
        }
        if let Some(expiry) = patch.expiry_date {
            self.expiry_date = expiry;
        }
        self.updated_at = now;
        Ok(())
    }

    pub fn is_in_stock(&self) -> bool {
        self.stock > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn draft(now: DateTime<Utc>) -> NewMedicine {
        NewMedicine {
            name: "Aspirin".into(),
            description: "Pain reliever".into(),
            price_cents: 999,
            stock: 100,
            expiry_date: now.date_naive() + Duration::days(365),
        }
    }

    #[test]
    fn new_medicine_keeps_fields() {
        let now = Utc::now();
        let m = Medicine::new(draft(now), now).unwrap();
        assert_eq!(m.name, "Aspirin");
        assert_eq!(m.price_cents, 999);
        assert_eq!(m.stock, 100);
        assert_eq!(m.created_at, m.updated_at);
        assert!(m.is_in_stock());
    }

    #[test]
    fn new_medicine_rejects_bad_fields() {
        let now = Utc::now();

        let mut d = draft(now);
        d.expiry_date = now.date_naive() - Duration::days(1);
        assert_eq!(Medicine::new(d, now).unwrap_err().field, "expiry_date");

        let mut d = draft(now);
        d.stock = -5;
        assert_eq!(Medicine::new(d, now).unwrap_err().field, "stock");

        let mut d = draft(now);
        d.price_cents = 0;
        assert_eq!(Medicine::new(d, now).unwrap_err().field, "price");

        let mut d = draft(now);
        d.name = "  ".into();
        assert_eq!(Medicine::new(d, now).unwrap_err().field, "name");
    }

    #[test]
    fn zero_stock_is_out_of_stock() {
        let now = Utc::now();
        let mut m = Medicine::new(draft(now), now).unwrap();
        m.stock = 0;
        assert!(!m.is_in_stock());
    }

    #[test]
    fn apply_changes_only_supplied_fields() {
        let now = Utc::now();
        let mut m = Medicine::new(draft(now), now).unwrap();
        m.apply(
            MedicinePatch {
                price_cents: Some(1250),
                ..Default::default()
            },
            now,
        )
        .unwrap();
        assert_eq!(m.price_cents, 1250);
        assert_eq!(m.name, "Aspirin");
        assert_eq!(m.stock, 100);
    }

    #[test]
    fn rejected_patch_leaves_record_untouched() {
        let now = Utc::now();
        let mut m = Medicine::new(draft(now), now).unwrap();
        let before = m.clone();
        let err = m
            .apply(
                MedicinePatch {
                    description: Some("changed".into()),
                    stock: Some(-1),
                    ..Default::default()
                },
                now,
            )
            .unwrap_err();
        assert_eq!(err.field, "stock");
        assert_eq!(m, before);
    }

    #[test]
    fn filter_by_stock() {
        let now = Utc::now();
        let mut m = Medicine::new(draft(now), now).unwrap();
        m.stock = 4;
        let low = MedicineFilter {
            stock_below: Some(10),
            ..Default::default()
        };
        assert!(low.matches(&m));
        m.stock = 0;
        let in_stock = MedicineFilter {
            in_stock: true,
            ..Default::default()
        };
        assert!(!in_stock.matches(&m));
        assert!(MedicineFilter::default().matches(&m));
    }
}
