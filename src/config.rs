use std::env;
use std::net::SocketAddr;

use anyhow::{Context, Result};

const DEFAULT_DB_URL: &str = "sqlite:restock.db";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";

#[derive(Clone, Debug)]
pub struct Config {
    pub db_url: String,
    pub max_connections: u32,
    pub bind_addr: SocketAddr,
    /// Requests per second across all API clients. `None` disables limiting.
    pub rate_limit_per_second: Option<u64>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        let db_url = env::var("DB_URL").unwrap_or_else(|_| DEFAULT_DB_URL.to_string());
        let max_connections = env::var("DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|value| value.trim().parse::<u32>().ok())
            .filter(|value| *value > 0)
            .unwrap_or(DEFAULT_MAX_CONNECTIONS);
        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
        let bind_addr: SocketAddr = bind_addr
            .trim()
            .parse()
            .with_context(|| format!("invalid BIND_ADDR {bind_addr:?}"))?;
        let rate_limit_per_second = parse_rate_limit(env::var("API_RATE_LIMIT").ok().as_deref());

        Ok(Self {
            db_url,
            max_connections,
            bind_addr,
            rate_limit_per_second,
        })
    }
}

fn parse_rate_limit(value: Option<&str>) -> Option<u64> {
    let value = value?;
    match value.trim().parse::<u64>() {
        Ok(0) => None,
        Ok(limit) => Some(limit),
        Err(_) => {
            tracing::warn!(value, "Ignoring invalid API_RATE_LIMIT");
            None
        }
    }
}
