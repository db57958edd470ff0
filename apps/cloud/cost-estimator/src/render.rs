//! Report rendering for stdout

use clap::ValueEnum;
use domain_cost_estimation::{CostReport, PricedResource, PricingDefinition};
use eyre::Result;
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Tabled)]
struct ReportRow {
    #[tabled(rename = "Type")]
    resource_type: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Region")]
    region: String,
    #[tabled(rename = "SKU / Detail")]
    sku: String,
    #[tabled(rename = "Unit")]
    unit: String,
    #[tabled(rename = "Usage")]
    usage: String,
    #[tabled(rename = "Unit Cost")]
    unit_cost: String,
    #[tabled(rename = "Monthly Cost")]
    monthly_cost: String,
}

impl From<&PricedResource> for ReportRow {
    fn from(item: &PricedResource) -> Self {
        Self {
            resource_type: item.resource_type.clone(),
            name: item.name.clone(),
            region: item.region.clone(),
            sku: item.sku.clone(),
            unit: item.unit_of_measure.clone(),
            usage: item.usage_description.clone(),
            unit_cost: format!("{:.6}", item.unit_cost),
            monthly_cost: format!("{:.2}", item.monthly_cost),
        }
    }
}

#[derive(Tabled)]
struct MappingRow {
    #[tabled(rename = "Resource Type")]
    resource_type: &'static str,
    #[tabled(rename = "Service")]
    service: &'static str,
    #[tabled(rename = "SKU Keys")]
    sku_keys: String,
    #[tabled(rename = "Usage")]
    usage: String,
}

pub fn render_report(report: &CostReport, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
        OutputFormat::Table => {
            let mut table = Table::new(report.items.iter().map(ReportRow::from));
            table.with(Style::modern());
            Ok(format!(
                "{table}\n\nTotal Estimated Monthly Cost: ${:.2}",
                report.total_monthly_cost
            ))
        }
    }
}

pub fn render_mappings<I>(definitions: I, format: OutputFormat) -> Result<String>
where
    I: IntoIterator<Item = (&'static str, PricingDefinition)>,
{
    let definitions: Vec<_> = definitions.into_iter().collect();

    match format {
        OutputFormat::Json => {
            let map: serde_json::Map<String, serde_json::Value> = definitions
                .iter()
                .map(|(kind, definition)| -> Result<(String, serde_json::Value)> {
                    Ok(((*kind).to_string(), serde_json::to_value(definition)?))
                })
                .collect::<Result<_>>()?;
            Ok(serde_json::to_string_pretty(&map)?)
        }
        OutputFormat::Table => {
            let rows = definitions.into_iter().map(|(kind, definition)| MappingRow {
                resource_type: kind,
                service: definition.service_name,
                sku_keys: definition.sku_keys.join(", "),
                usage: definition
                    .usage
                    .map(|u| format!("{u:?}"))
                    .unwrap_or_else(|| "-".to_string()),
            });
            let mut table = Table::new(rows);
            table.with(Style::modern());
            Ok(table.to_string())
        }
    }
}
