///  Populates the configured store with sample data:
///  cargo r --bin seed [-- --reset]
use std::sync::Arc;

use anyhow::Context;
use chrono::{Duration, Utc};
use pharmacy_hex::application::Pharmacy;
use pharmacy_hex::config::Config;
use pharmacy_hex::outbound::tracing_sink::TracingEventSink;
use pharmacy_repo::build_repo;
use pharmacy_types::domain::medicine::{MedicineFilter, NewMedicine};
use pharmacy_types::domain::order::{OrderFilter, OrderStatus};
use pharmacy_types::ports::store::PharmacyStore;

struct SeedMedicine {
    name: &'static str,
    description: &'static str,
    price_cents: i64,
    stock: i64,
    shelf_days: i64,
}

struct SeedOrder {
    customer_name: &'static str,
    medicine: &'static str,
    quantity: i64,
    status: OrderStatus,
}

const MEDICINES: &[SeedMedicine] = &[
    SeedMedicine {
        name: "Aspirin",
        description: "Pain reliever and anti-inflammatory medication",
        price_cents: 999,
        stock: 100,
        shelf_days: 365,
    },
    SeedMedicine {
        name: "Paracetamol",
        description: "Fever reducer and mild pain reliever",
        price_cents: 1299,
        stock: 150,
        shelf_days: 400,
    },
    SeedMedicine {
        name: "Ibuprofen",
        description: "Non-steroidal anti-inflammatory drug",
        price_cents: 1550,
        stock: 200,
        shelf_days: 500,
    },
    SeedMedicine {
        name: "Vitamin C",
        description: "Immune system booster and antioxidant",
        price_cents: 1899,
        stock: 180,
        shelf_days: 600,
    },
    SeedMedicine {
        name: "Vitamin D",
        description: "Essential for bone health and immune function",
        price_cents: 2250,
        stock: 120,
        shelf_days: 550,
    },
    SeedMedicine {
        name: "Omeprazole",
        description: "Reduces stomach acid production",
        price_cents: 2599,
        stock: 80,
        shelf_days: 450,
    },
    SeedMedicine {
        name: "Amoxicillin",
        description: "Antibiotic for bacterial infections",
        price_cents: 3000,
        stock: 60,
        shelf_days: 300,
    },
    SeedMedicine {
        name: "Cetirizine",
        description: "Antihistamine for allergy relief",
        price_cents: 1475,
        stock: 140,
        shelf_days: 420,
    },
    SeedMedicine {
        name: "Metformin",
        description: "Medication for type 2 diabetes",
        price_cents: 2850,
        stock: 90,
        shelf_days: 380,
    },
    SeedMedicine {
        name: "Losartan",
        description: "Blood pressure medication",
        price_cents: 3299,
        stock: 75,
        shelf_days: 400,
    },
];

const ORDERS: &[SeedOrder] = &[
    SeedOrder {
        customer_name: "John Doe",
        medicine: "Aspirin",
        quantity: 5,
        status: OrderStatus::Pending,
    },
    SeedOrder {
        customer_name: "Jane Smith",
        medicine: "Paracetamol",
        quantity: 3,
        status: OrderStatus::Pending,
    },
    SeedOrder {
        customer_name: "Robert Johnson",
        medicine: "Ibuprofen",
        quantity: 10,
        status: OrderStatus::Processing,
    },
    SeedOrder {
        customer_name: "Emily Davis",
        medicine: "Vitamin C",
        quantity: 2,
        status: OrderStatus::Pending,
    },
    SeedOrder {
        customer_name: "Michael Brown",
        medicine: "Vitamin D",
        quantity: 4,
        status: OrderStatus::Shipped,
    },
    SeedOrder {
        customer_name: "Sarah Wilson",
        medicine: "Omeprazole",
        quantity: 1,
        status: OrderStatus::Pending,
    },
    SeedOrder {
        customer_name: "David Martinez",
        medicine: "Cetirizine",
        quantity: 6,
        status: OrderStatus::Delivered,
    },
    SeedOrder {
        customer_name: "Lisa Anderson",
        medicine: "Aspirin",
        quantity: 8,
        status: OrderStatus::Pending,
    },
];

/// Removes every order, then every medicine.
async fn reset<S: PharmacyStore>(pharmacy: &Pharmacy<S>) -> anyhow::Result<()> {
    for order in pharmacy.ledger.list(OrderFilter::default()).await? {
        pharmacy.ledger.delete(order.id).await?;
    }
    for medicine in pharmacy.catalog.list(MedicineFilter::default()).await? {
        pharmacy.catalog.delete(medicine.id).await?;
    }
    tracing::info!("cleared existing data");
    Ok(())
}

/// Creates the sample catalog and places the sample orders through the
/// ledger, so stock is reserved the same way live orders reserve it.
async fn seed<S: PharmacyStore>(pharmacy: &Pharmacy<S>) -> anyhow::Result<()> {
    let today = Utc::now().date_naive();
    let mut ids = Vec::with_capacity(MEDICINES.len());
    for m in MEDICINES {
        let created = pharmacy
            .catalog
            .create(NewMedicine {
                name: m.name.into(),
                description: m.description.into(),
                price_cents: m.price_cents,
                stock: m.stock,
                expiry_date: today + Duration::days(m.shelf_days),
            })
            .await
            .with_context(|| format!("creating medicine {}", m.name))?;
        tracing::info!(name = %created.name, id = %created.id, "created medicine");
        ids.push((m.name, created.id));
    }

    for o in ORDERS {
        let medicine_id = ids
            .iter()
            .find(|(name, _)| *name == o.medicine)
            .map(|(_, id)| *id)
            .with_context(|| format!("unknown seed medicine {}", o.medicine))?;
        let order = pharmacy
            .ledger
            .create(o.customer_name.into(), medicine_id, o.quantity)
            .await
            .with_context(|| format!("placing order for {}", o.customer_name))?;
        if o.status != OrderStatus::Pending {
            pharmacy
                .ledger
                .update_status(order.id, o.status.as_str())
                .await?;
        }
        tracing::info!(
            id = %order.id,
            customer = %order.customer_name,
            status = %o.status,
            "created order"
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()))
        .init();

    let reset_first = std::env::args().any(|a| a == "--reset");
    let config = Config::from_env()?;
    let repo = build_repo(config.database_url.as_deref()).await?;
    tracing::info!(backend = repo.backend(), "seeding store");
    let pharmacy = Pharmacy::new(repo, Arc::new(TracingEventSink));

    if reset_first {
        reset(&pharmacy).await?;
    } else if !pharmacy
        .catalog
        .list(MedicineFilter::default())
        .await?
        .is_empty()
    {
        tracing::warn!("store already holds medicines; rerun with --reset to replace them");
        return Ok(());
    }

    seed(&pharmacy).await?;

    let summary = pharmacy.summary(config.low_stock_threshold).await?;
    tracing::info!(
        medicines = summary.medicine_count,
        orders = summary.order_count,
        pending = summary.pending_orders,
        "seeding complete"
    );
    Ok(())
}
