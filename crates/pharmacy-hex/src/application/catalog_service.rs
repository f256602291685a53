use std::sync::Arc;

use chrono::Utc;
use pharmacy_types::domain::medicine::{Medicine, MedicineFilter, MedicinePatch, NewMedicine};
use pharmacy_types::domain::order::OrderStatus;
use pharmacy_types::domain::validation::FieldError;
use pharmacy_types::ports::events::{DomainEvent, EventSink};
use pharmacy_types::ports::store::{PharmacyStore, StoreTx};
use uuid::Uuid;

use crate::errors::AppError;

/// Medicines and their stock counters.
pub struct CatalogService<S: PharmacyStore> {
    store: Arc<S>,
    events: Arc<dyn EventSink>,
}

impl<S: PharmacyStore> Clone for CatalogService<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            events: self.events.clone(),
        }
    }
}

fn duplicate_name(name: &str) -> AppError {
    FieldError::new("name", format!("medicine with name `{name}` already exists")).into()
}

impl<S: PharmacyStore> CatalogService<S> {
    pub fn new(store: Arc<S>, events: Arc<dyn EventSink>) -> Self {
        Self { store, events }
    }

    pub async fn create(&self, draft: NewMedicine) -> Result<Medicine, AppError> {
        let medicine = Medicine::new(draft, Utc::now())?;

        let mut tx = self.store.begin().await?;
        if tx.medicine_by_name(&medicine.name).await?.is_some() {
            return Err(duplicate_name(&medicine.name));
        }
        tx.insert_medicine(&medicine).await?;
        tx.commit().await?;

        self.events.record(&DomainEvent::MedicineCreated {
            medicine_id: medicine.id,
            name: medicine.name.clone(),
        });
        Ok(medicine)
    }

    pub async fn get(&self, id: Uuid) -> Result<Medicine, AppError> {
        self.store
            .get_medicine(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("medicine {id}")))
    }

    pub async fn list(&self, filter: MedicineFilter) -> Result<Vec<Medicine>, AppError> {
        Ok(self.store.list_medicines(filter).await?)
    }

    /// Partial update. Direct stock edits go through the same transactional
    /// path as order-driven adjustments.
    pub async fn update(&self, id: Uuid, patch: MedicinePatch) -> Result<Medicine, AppError> {
        let mut tx = self.store.begin().await?;
        let mut medicine = tx
            .medicine(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("medicine {id}")))?;
        medicine.apply(patch, Utc::now())?;
        if let Some(other) = tx.medicine_by_name(&medicine.name).await? {
            if other.id != id {
                return Err(duplicate_name(&medicine.name));
            }
        }
        tx.update_medicine(&medicine).await?;
        tx.commit().await?;

        self.events
            .record(&DomainEvent::MedicineUpdated { medicine_id: id });
        Ok(medicine)
    }

    /// Refused while any Pending order reserves this medicine's stock. Orders
    /// in other states still hold a restricting reference, so they block the
    /// delete as well.
    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let mut tx = self.store.begin().await?;
        if tx.medicine(id).await?.is_none() {
            return Err(AppError::NotFound(format!("medicine {id}")));
        }

        let pending = tx.count_orders(id, Some(OrderStatus::Pending)).await?;
        let referencing = tx.count_orders(id, None).await?;
        if referencing > 0 {
            drop(tx);
            self.events.record(&DomainEvent::MedicineDeleteBlocked {
                medicine_id: id,
                pending_orders: pending,
                referencing_orders: referencing,
            });
            let msg = if pending > 0 {
                format!("cannot delete medicine with {pending} pending orders")
            } else {
                format!("medicine is still referenced by {referencing} orders")
            };
            return Err(AppError::Conflict(msg));
        }

        tx.delete_medicine(id).await?;
        tx.commit().await?;

        self.events
            .record(&DomainEvent::MedicineDeleted { medicine_id: id });
        Ok(())
    }

    /// Applies `delta` inside the caller's unit of work. Sufficiency is the
    /// caller's check; this only persists the change.
    pub async fn adjust_stock(
        &self,
        tx: &mut dyn StoreTx,
        id: Uuid,
        delta: i64,
    ) -> Result<(), AppError> {
        if !tx.adjust_stock(id, delta).await? {
            return Err(AppError::NotFound(format!("medicine {id}")));
        }
        Ok(())
    }

    pub fn is_in_stock(&self, medicine: &Medicine) -> bool {
        medicine.is_in_stock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use pharmacy_repo::memory::InMemoryRepo;
    use pharmacy_types::ports::events::RecordingSink;

    fn service() -> (CatalogService<InMemoryRepo>, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::new());
        let svc = CatalogService::new(Arc::new(InMemoryRepo::new()), sink.clone());
        (svc, sink)
    }

    fn draft(name: &str) -> NewMedicine {
        NewMedicine {
            name: name.into(),
            description: "Pain reliever".into(),
            price_cents: 999,
            stock: 100,
            expiry_date: Utc::now().date_naive() + Duration::days(365),
        }
    }

    #[tokio::test]
    async fn create_get_and_list() {
        let (svc, sink) = service();
        let created = svc.create(draft("Aspirin")).await.unwrap();
        let fetched = svc.get(created.id).await.unwrap();
        assert_eq!(fetched, created);
        assert!(svc.is_in_stock(&fetched));
        assert_eq!(svc.list(MedicineFilter::default()).await.unwrap().len(), 1);
        assert!(matches!(
            sink.events().as_slice(),
            [DomainEvent::MedicineCreated { .. }]
        ));
    }

    #[tokio::test]
    async fn names_must_be_unique() {
        let (svc, _) = service();
        let aspirin = svc.create(draft("Aspirin")).await.unwrap();
        let dup = svc.create(draft("Aspirin")).await;
        assert!(matches!(dup, Err(AppError::Validation(ref e)) if e.field == "name"));

        let ibuprofen = svc.create(draft("Ibuprofen")).await.unwrap();
        let rename = svc
            .update(
                ibuprofen.id,
                MedicinePatch {
                    name: Some("Aspirin".into()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(rename, Err(AppError::Validation(_))));

        // keeping its own name is fine
        let same = svc
            .update(
                aspirin.id,
                MedicinePatch {
                    name: Some("Aspirin".into()),
                    stock: Some(7),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(same.stock, 7);
    }

    #[tokio::test]
    async fn rejected_update_changes_nothing() {
        let (svc, _) = service();
        let m = svc.create(draft("Aspirin")).await.unwrap();
        let res = svc
            .update(
                m.id,
                MedicinePatch {
                    price_cents: Some(0),
                    stock: Some(3),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(res, Err(AppError::Validation(ref e)) if e.field == "price"));
        assert_eq!(svc.get(m.id).await.unwrap().stock, 100);
    }

    #[tokio::test]
    async fn past_expiry_is_rejected() {
        let (svc, _) = service();
        let mut d = draft("Expired");
        d.expiry_date = Utc::now().date_naive() - Duration::days(1);
        let res = svc.create(d).await;
        assert!(matches!(res, Err(AppError::Validation(ref e)) if e.field == "expiry_date"));
        assert!(svc.list(MedicineFilter::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_and_not_found_paths() {
        let (svc, sink) = service();
        let m = svc.create(draft("Aspirin")).await.unwrap();
        svc.delete(m.id).await.unwrap();
        assert!(matches!(svc.get(m.id).await, Err(AppError::NotFound(_))));
        assert!(matches!(svc.delete(m.id).await, Err(AppError::NotFound(_))));
        assert!(matches!(
            svc.update(m.id, MedicinePatch::default()).await,
            Err(AppError::NotFound(_))
        ));
        assert!(sink
            .events()
            .contains(&DomainEvent::MedicineDeleted { medicine_id: m.id }));
    }

    #[tokio::test]
    async fn adjust_stock_on_missing_medicine_is_not_found() {
        let (svc, _) = service();
        let store = svc.store.clone();
        let mut tx = store.begin().await.unwrap();
        let res = svc.adjust_stock(tx.as_mut(), Uuid::new_v4(), 5).await;
        assert!(matches!(res, Err(AppError::NotFound(_))));
    }
}
