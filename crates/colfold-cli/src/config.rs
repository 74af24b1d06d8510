//! CLI configuration from environment variables.

use anyhow::{Context, Result};
use colfold_core::DEFAULT_MAX_BATCH_SIZE;

#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Overridable with `--database-url`.
    pub database_url: Option<String>,
    pub max_batch_size: usize,
    pub max_connections: u32,
    /// None = no per-statement timeout.
    pub query_timeout_secs: Option<u64>,
}

impl CliConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database_url: std::env::var("DATABASE_URL").ok(),
            max_batch_size: std::env::var("COLFOLD_MAX_BATCH_SIZE")
                .unwrap_or_else(|_| DEFAULT_MAX_BATCH_SIZE.to_string())
                .parse()
                .context("Invalid COLFOLD_MAX_BATCH_SIZE")?,
            max_connections: std::env::var("COLFOLD_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .context("Invalid COLFOLD_MAX_CONNECTIONS")?,
            query_timeout_secs: std::env::var("COLFOLD_QUERY_TIMEOUT_SECS")
                .ok()
                .map(|v| v.parse::<u64>())
                .transpose()
                .context("Invalid COLFOLD_QUERY_TIMEOUT_SECS")?,
        })
    }
}
