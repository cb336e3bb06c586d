//! Process configuration, read from the environment once at startup.
//!
//! Gateway credentials are injected here rather than hard-coded so the same
//! binary can point at the sandbox or a live merchant account.

use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    /// Base URL of the frontend; redirect/callback URLs for the gateway are
    /// built as `{app_base_url}/status/{merchantTransactionId}`.
    pub app_base_url: String,
    pub gateway: GatewayConfig,
    /// How often the pending-transaction sweeper runs, in seconds.
    pub sweep_interval_secs: u64,
    /// Age in minutes after which a Pending transaction is considered stale.
    pub pending_cutoff_mins: i64,
}

/// Credential set for the payment gateway, shared by the pay and status calls.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub base_url: String,
    pub merchant_id: String,
    pub salt_key: String,
    pub key_index: u8,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let port = env_or("PORT", "8000").parse().context("PORT must be a port number")?;
        let app_base_url = env_or("APP_BASE_URL", "http://localhost:3000");

        let gateway = GatewayConfig {
            base_url: env_or("GATEWAY_BASE_URL", "https://api-preprod.phonepe.com/apis/pg-sandbox"),
            merchant_id: std::env::var("GATEWAY_MERCHANT_ID").context("GATEWAY_MERCHANT_ID must be set")?,
            salt_key: std::env::var("GATEWAY_SALT_KEY").context("GATEWAY_SALT_KEY must be set")?,
            key_index: env_or("GATEWAY_KEY_INDEX", "1").parse().context("GATEWAY_KEY_INDEX must be a small integer")?,
        };

        Ok(Self {
            database_url,
            port,
            app_base_url,
            gateway,
            sweep_interval_secs: env_or("SWEEP_INTERVAL_SECS", "300").parse().context("SWEEP_INTERVAL_SECS must be an integer")?,
            pending_cutoff_mins: env_or("PENDING_CUTOFF_MINS", "30").parse().context("PENDING_CUTOFF_MINS must be an integer")?,
        })
    }
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}
