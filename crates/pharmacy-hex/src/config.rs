use anyhow::Context;
use serde::Deserialize;
use std::env;

pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 10;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server_port: String,
    pub database_url: Option<String>,
    /// Medicines with stock below this count as low on the dashboard.
    pub low_stock_threshold: i64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let server_port = env::var("SERVER_PORT").unwrap_or_else(|_| "3000".into());
        let database_url = env::var("DATABASE_URL").ok();
        let low_stock_threshold = match env::var("LOW_STOCK_THRESHOLD") {
            Ok(v) => v
                .parse()
                .with_context(|| format!("LOW_STOCK_THRESHOLD is not an integer: {v}"))?,
            Err(_) => DEFAULT_LOW_STOCK_THRESHOLD,
        };
        Ok(Self {
            server_port,
            database_url,
            low_stock_threshold,
        })
    }
}
