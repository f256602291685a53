use std::sync::Arc;

use pharmacy_hex::application::Pharmacy;
use pharmacy_hex::config::Config;
use pharmacy_hex::inbound::http::{HttpServer, HttpServerConfig};
use pharmacy_hex::outbound::tracing_sink::TracingEventSink;
use pharmacy_repo::{build_repo, Repo};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env for DATABASE_URL / SERVER_PORT when present.
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "debug".to_string()))
        .init();

    let config = Config::from_env()?;
    let repo: Repo = build_repo(config.database_url.as_deref()).await?;
    tracing::info!(backend = repo.backend(), "store ready");
    let pharmacy = Pharmacy::new(repo, Arc::new(TracingEventSink));

    let server_cfg = HttpServerConfig {
        port: config.server_port.clone(),
        low_stock_threshold: config.low_stock_threshold,
    };

    let http = HttpServer::new(pharmacy, server_cfg).await?;
    http.run().await
}
