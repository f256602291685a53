#![cfg(feature = "memory")]

use chrono::{Duration, Utc};
use pharmacy_repo::memory::InMemoryRepo;
use pharmacy_types::domain::medicine::{Medicine, MedicineFilter, NewMedicine};
use pharmacy_types::domain::order::{Order, OrderFilter, OrderStatus};
use pharmacy_types::ports::store::PharmacyStore;

fn medicine(name: &str, stock: i64) -> Medicine {
    let now = Utc::now();
    Medicine::new(
        NewMedicine {
            name: name.into(),
            description: "test".into(),
            price_cents: 999,
            stock,
            expiry_date: now.date_naive() + Duration::days(90),
        },
        now,
    )
    .unwrap()
}

#[tokio::test]
async fn memory_repo_commit_makes_writes_visible() {
    let repo = InMemoryRepo::new();
    let aspirin = medicine("Aspirin", 100);

    let mut tx = repo.begin().await.unwrap();
    tx.insert_medicine(&aspirin).await.unwrap();
    let order = Order::place("Test".into(), &aspirin, 5, Utc::now()).unwrap();
    tx.insert_order(&order).await.unwrap();
    assert!(tx.adjust_stock(aspirin.id, -5).await.unwrap());
    tx.commit().await.unwrap();

    let fetched = repo.get_medicine(aspirin.id).await.unwrap().unwrap();
    assert_eq!(fetched.stock, 95);
    let listed = repo.list_orders(OrderFilter::default()).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, order.id);
}

#[tokio::test]
async fn memory_repo_dropped_tx_rolls_back() {
    let repo = InMemoryRepo::new();
    let aspirin = medicine("Aspirin", 10);
    let mut tx = repo.begin().await.unwrap();
    tx.insert_medicine(&aspirin).await.unwrap();
    tx.commit().await.unwrap();

    {
        let mut tx = repo.begin().await.unwrap();
        tx.adjust_stock(aspirin.id, -4).await.unwrap();
        let order = Order::place("Gone".into(), &aspirin, 4, Utc::now()).unwrap();
        tx.insert_order(&order).await.unwrap();
    }

    assert_eq!(repo.get_medicine(aspirin.id).await.unwrap().unwrap().stock, 10);
    assert!(repo
        .list_orders(OrderFilter::default())
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn memory_repo_guards_stock_and_references() {
    let repo = InMemoryRepo::new();
    let aspirin = medicine("Aspirin", 3);
    let mut tx = repo.begin().await.unwrap();
    tx.insert_medicine(&aspirin).await.unwrap();
    assert!(tx.adjust_stock(aspirin.id, -4).await.is_err());
    assert!(!tx.adjust_stock(uuid::Uuid::new_v4(), 1).await.unwrap());

    let order = Order::place("Ref".into(), &aspirin, 1, Utc::now()).unwrap();
    tx.insert_order(&order).await.unwrap();
    assert_eq!(
        tx.count_orders(aspirin.id, Some(OrderStatus::Pending))
            .await
            .unwrap(),
        1
    );
    assert_eq!(
        tx.count_orders(aspirin.id, Some(OrderStatus::Shipped))
            .await
            .unwrap(),
        0
    );
    assert!(tx.delete_medicine(aspirin.id).await.is_err());

    let duplicate = medicine("Aspirin", 1);
    assert!(tx.insert_medicine(&duplicate).await.is_err());
}

#[tokio::test]
async fn memory_repo_lists_sorted_and_filtered() {
    let repo = InMemoryRepo::new();
    let mut tx = repo.begin().await.unwrap();
    for (name, stock) in [("Zinc", 0), ("Aspirin", 5), ("Ibuprofen", 40)] {
        tx.insert_medicine(&medicine(name, stock)).await.unwrap();
    }
    tx.commit().await.unwrap();

    let all = repo.list_medicines(MedicineFilter::default()).await.unwrap();
    let names: Vec<&str> = all.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, ["Aspirin", "Ibuprofen", "Zinc"]);

    let in_stock = repo
        .list_medicines(MedicineFilter {
            in_stock: true,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(in_stock.len(), 2);

    let low = repo
        .list_medicines(MedicineFilter {
            stock_below: Some(10),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(low.len(), 2);
}

#[tokio::test]
async fn memory_repo_handles_missing_rows() {
    let repo = InMemoryRepo::new();
    let missing = uuid::Uuid::new_v4();
    assert!(repo.get_medicine(missing).await.unwrap().is_none());
    assert!(repo.get_order(missing).await.unwrap().is_none());

    let mut tx = repo.begin().await.unwrap();
    assert!(tx.order(missing).await.unwrap().is_none());
    assert!(!tx.delete_order(missing).await.unwrap());
    assert!(!tx.delete_medicine(missing).await.unwrap());
}

#[tokio::test]
async fn memory_repo_refuses_stock_overflow() {
    let repo = InMemoryRepo::new();
    let zinc = medicine("Zinc", 10);

    let mut tx = repo.begin().await.unwrap();
    tx.insert_medicine(&zinc).await.unwrap();
    tx.commit().await.unwrap();

    let mut tx = repo.begin().await.unwrap();
    assert!(tx.adjust_stock(zinc.id, i64::MAX).await.is_err());
    drop(tx);

    assert_eq!(repo.get_medicine(zinc.id).await.unwrap().unwrap().stock, 10);
    assert_eq!(
        repo.list_medicines(MedicineFilter::default())
            .await
            .unwrap()
            .len(),
        1
    );
}
