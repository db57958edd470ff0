//! Configuration for the cost estimator

use core_config::catalog::CatalogConfig;
use core_config::{env_parse_or, Environment, FromEnv};
use domain_cost_estimation::resolver::DEFAULT_MAX_REFERENCE_DEPTH;
use eyre::Result;

#[derive(Debug, Clone)]
pub struct Config {
    pub environment: Environment,
    pub catalog: CatalogConfig,
    /// Longest attribute reference chain followed before it counts as cyclic
    pub max_reference_depth: usize,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let config = Config {
            environment: Environment::from_env(),
            catalog: <CatalogConfig as FromEnv>::from_env()?,
            max_reference_depth: env_parse_or(
                "ESTIMATOR_MAX_REFERENCE_DEPTH",
                DEFAULT_MAX_REFERENCE_DEPTH,
            )?,
        };

        Ok(config)
    }
}
