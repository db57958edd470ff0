use crate::{env_or_default, env_parse_or, ConfigError, FromEnv};
use std::time::Duration;

/// Azure Retail Prices API endpoint
pub const DEFAULT_PRICING_API_URL: &str = "https://prices.azure.com/api/retail/prices";

/// Per-request timeout applied to every catalog page fetch
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Remote price catalog configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CatalogConfig {
    pub base_url: String,
    pub request_timeout_secs: u64,
}

impl CatalogConfig {
    pub fn new(base_url: impl Into<String>, request_timeout_secs: u64) -> Self {
        Self {
            base_url: base_url.into(),
            request_timeout_secs,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl FromEnv for CatalogConfig {
    /// Reads from environment variables with defaults:
    /// - PRICING_API_URL: defaults to the public Azure Retail Prices endpoint
    /// - PRICING_REQUEST_TIMEOUT_SECS: defaults to 10
    fn from_env() -> Result<Self, ConfigError> {
        let base_url = env_or_default("PRICING_API_URL", DEFAULT_PRICING_API_URL);
        let request_timeout_secs =
            env_parse_or("PRICING_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS)?;

        Ok(Self {
            base_url,
            request_timeout_secs,
        })
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self::new(DEFAULT_PRICING_API_URL, DEFAULT_REQUEST_TIMEOUT_SECS)
    }
}
