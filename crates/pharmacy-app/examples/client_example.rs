///  To run :
///  cargo r --example client_example
use std::sync::Arc;

use chrono::{Duration, Utc};
use pharmacy_client::{ApiError, CreateOrderRequest, PharmacyClient};
use pharmacy_hex::application::Pharmacy;
use pharmacy_hex::inbound::http::{HttpServer, HttpServerConfig};
use pharmacy_repo::build_repo;
use pharmacy_types::domain::medicine::NewMedicine;
use pharmacy_types::domain::order::OrderStatus;
use pharmacy_types::ports::events::NullSink;
use tempfile::tempdir;

fn find_free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let port = find_free_port();
    let addr = format!("http://127.0.0.1:{port}/");

    // Temp file-backed SQLite DB, removed when `tmp` drops.
    let tmp = tempdir()?;
    let db_path = tmp.path().join("pharmacy.db");
    let db_url = format!("sqlite://{}", db_path.display());

    let repo = build_repo(Some(&db_url)).await?;
    let pharmacy = Pharmacy::new(repo, Arc::new(NullSink));
    let server = HttpServer::new(
        pharmacy,
        HttpServerConfig {
            port: port.to_string(),
            low_stock_threshold: 10,
        },
    )
    .await?;

    let handle = tokio::spawn(async move {
        server.run().await.expect("server run");
    });
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    let client = PharmacyClient::new(&addr)?;
    let medicine = client
        .create_medicine(&NewMedicine {
            name: "Aspirin".into(),
            description: "Pain reliever".into(),
            price_cents: 999,
            stock: 12,
            expiry_date: Utc::now().date_naive() + Duration::days(365),
        })
        .await?
        .medicine;
    println!("Created medicine {} (stock {})", medicine.name, medicine.stock);

    let order = client
        .create_order(&CreateOrderRequest {
            customer_name: "Example".into(),
            medicine_id: medicine.id,
            quantity: 5,
        })
        .await?;
    println!(
        "Placed order id={} for {} total={} cents",
        order.order.id, order.medicine_name, order.order.total_price_cents
    );
    let order = order.order;

    match client
        .create_order(&CreateOrderRequest {
            customer_name: "Greedy".into(),
            medicine_id: medicine.id,
            quantity: 50,
        })
        .await
    {
        Ok(_) => anyhow::bail!("over-order should have been refused"),
        Err(err) => match err.downcast_ref::<ApiError>() {
            Some(api) => println!("Refused: {} (available {:?})", api.error, api.available),
            None => return Err(err),
        },
    }

    let change = client.update_status(order.id, OrderStatus::Shipped).await?;
    println!("Order {} is now {}", change.id, change.status);

    let summary = client.summary().await?;
    println!(
        "Summary: {} medicines, {} orders, {} low on stock",
        summary.medicine_count, summary.order_count, summary.low_stock_count
    );

    client.delete_order(order.id).await?;
    let after = client.get_medicine(medicine.id).await?;
    println!("Deleted shipped order; stock stays at {}", after.medicine.stock);

    handle.abort();
    Ok(())
}
