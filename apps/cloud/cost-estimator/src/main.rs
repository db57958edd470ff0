//! Cost Estimator
//!
//! Estimates the monthly cost of a Terraform plan (`terraform show -json`)
//! by pricing each planned resource against the Azure Retail Prices API.

use clap::{Parser, Subcommand};
use core_config::tracing::{init_tracing, install_color_eyre};
use domain_cost_estimation::{
    CostEstimator, EstimatorOptions, Plan, PricingEngine, RetailPricesClient, known_definitions,
};
use eyre::{Result, WrapErr};
use std::path::PathBuf;
use tracing::info;

mod config;
mod render;

use config::Config;
use render::{OutputFormat, render_mappings, render_report};

#[derive(Parser)]
#[command(name = "cost-estimator")]
#[command(about = "Estimate the monthly cost of a Terraform plan from Azure retail prices")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate the monthly cost of a plan
    Estimate {
        /// Path to the plan JSON (`terraform show -json plan.out > plan.json`)
        #[arg(short, long)]
        plan: PathBuf,

        /// Only estimate resources whose type starts with this prefix (e.g. azurerm)
        #[arg(long)]
        provider: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// List the resource type to catalog service mappings
    Mappings {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    install_color_eyre();

    let cli = Cli::parse();

    let config = Config::from_env()?;
    init_tracing(&config.environment);

    match cli.command {
        Commands::Estimate {
            plan,
            provider,
            format,
        } => {
            let parsed = Plan::load(&plan)
                .wrap_err_with(|| format!("Failed to load plan {}", plan.display()))?;
            info!(
                plan = %plan.display(),
                resources = parsed.graph.len(),
                variables = parsed.variables.len(),
                "Plan loaded"
            );

            let client = RetailPricesClient::new(
                config.catalog.base_url.clone(),
                config.catalog.request_timeout(),
            )
            .wrap_err("Failed to build pricing client")?;

            let estimator = CostEstimator::new(
                PricingEngine::new(client),
                EstimatorOptions {
                    provider_prefix: provider,
                    max_reference_depth: config.max_reference_depth,
                },
            );

            let report = estimator.estimate(&parsed).await;
            println!("{}", render_report(&report, format)?);
        }

        Commands::Mappings { format } => {
            println!("{}", render_mappings(known_definitions(), format)?);
        }
    }

    Ok(())
}
