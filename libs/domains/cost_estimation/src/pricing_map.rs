//! Resource type -> catalog service mapping.
//!
//! Tells the estimator which catalog service prices a resource type, which
//! attributes carry its SKU and region, and how to derive a usage quantity.

use serde::Serialize;

use crate::models::Resource;
use crate::resolver::ReferenceResolver;

pub const PRIVATE_ENDPOINT_TYPE: &str = "azurerm_private_endpoint";
pub const KUBERNETES_CLUSTER_TYPE: &str = "azurerm_kubernetes_cluster";
pub const NODE_POOL_TYPE: &str = "azurerm_kubernetes_cluster_node_pool";

/// Catalog service name of private endpoints
pub const PRIVATE_LINK_SERVICE: &str = "Private Link";

const DEFAULT_REGION_KEY: &str = "location";
const DEFAULT_SKU_KEYS: &[&str] = &["sku", "sku_name", "size"];

/// Operations assumed for per-operation billed vaults
const SIMULATED_VAULT_OPERATIONS: f64 = 20_000.0;

/// Derives a usage quantity from a resource
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageExtractor {
    /// `disk_size_gb` attribute, in GB
    DiskSizeGb,
    /// Fixed number of operations per month
    SimulatedOperations(f64),
}

/// Quantity fed to the cost calculator and its human-readable form
#[derive(Debug, Clone, PartialEq)]
pub struct Usage {
    pub quantity: f64,
    pub description: String,
}

impl Default for Usage {
    fn default() -> Self {
        Self {
            quantity: 1.0,
            description: "-".to_string(),
        }
    }
}

impl UsageExtractor {
    pub fn extract(&self, resource: &Resource, resolver: &ReferenceResolver<'_>) -> Usage {
        let (quantity, description) = match self {
            UsageExtractor::DiskSizeGb => {
                let size_gb = resolver
                    .resolve_or_empty(resource, "disk_size_gb")
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|size| size.is_finite())
                    .unwrap_or(0.0);
                (size_gb, format!("{size_gb:.0} GB"))
            }
            UsageExtractor::SimulatedOperations(operations) => {
                (*operations, format!("{operations:.0} operations"))
            }
        };

        Usage {
            // Zero usage still prices one unit
            quantity: if quantity == 0.0 { 1.0 } else { quantity },
            description,
        }
    }
}

/// How a resource type is priced
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PricingDefinition {
    pub service_name: &'static str,
    pub sku_keys: &'static [&'static str],
    pub region_key: &'static str,
    pub usage: Option<UsageExtractor>,
}

impl PricingDefinition {
    const fn new(service_name: &'static str, sku_keys: &'static [&'static str]) -> Self {
        Self {
            service_name,
            sku_keys,
            region_key: DEFAULT_REGION_KEY,
            usage: None,
        }
    }

    const fn with_usage(self, usage: UsageExtractor) -> Self {
        Self {
            usage: Some(usage),
            ..self
        }
    }

    /// Usage for a resource, or one unit with no description
    pub fn usage_for(&self, resource: &Resource, resolver: &ReferenceResolver<'_>) -> Usage {
        self.usage
            .map(|extractor| extractor.extract(resource, resolver))
            .unwrap_or_default()
    }

    /// First non-empty SKU among `sku_keys`
    pub fn resolve_sku(&self, resource: &Resource, resolver: &ReferenceResolver<'_>) -> String {
        self.sku_keys
            .iter()
            .map(|key| resolver.resolve_or_empty(resource, key))
            .find(|sku| !sku.is_empty())
            .unwrap_or_default()
    }
}

/// Types with hand-tuned SKU keys and usage
const PRIMARY_DEFINITIONS: &[(&str, PricingDefinition)] = &[
    (
        NODE_POOL_TYPE,
        PricingDefinition::new("Virtual Machines", &["vm_size", "sku"]),
    ),
    (
        KUBERNETES_CLUSTER_TYPE,
        PricingDefinition::new("Kubernetes Service", &["sku_tier"]),
    ),
    (
        "azurerm_linux_virtual_machine",
        PricingDefinition::new("Virtual Machines", &["size", "vm_size", "sku"]),
    ),
    (
        "azurerm_windows_virtual_machine",
        PricingDefinition::new("Virtual Machines", &["size", "vm_size", "sku"]),
    ),
    (
        "azurerm_managed_disk",
        PricingDefinition::new("Storage", &["sku_name"]).with_usage(UsageExtractor::DiskSizeGb),
    ),
    (
        "azurerm_storage_account",
        PricingDefinition::new("Storage", &["account_tier", "sku_name"]),
    ),
    (
        PRIVATE_ENDPOINT_TYPE,
        PricingDefinition::new(PRIVATE_LINK_SERVICE, &[]),
    ),
    (
        "azurerm_public_ip",
        PricingDefinition::new("IP Addresses", &["sku"]),
    ),
    (
        "azurerm_virtual_network",
        PricingDefinition::new("Virtual Network", &[]),
    ),
    ("azurerm_subnet", PricingDefinition::new("Virtual Network", &[])),
    (
        "azurerm_key_vault",
        PricingDefinition::new("Key Vault", &["sku_name"])
            .with_usage(UsageExtractor::SimulatedOperations(SIMULATED_VAULT_OPERATIONS)),
    ),
];

/// Broader coverage, one SKU attribute per type
const EXTENDED_DEFINITIONS: &[(&str, PricingDefinition)] = &[
    // Container Registry & Databricks
    ("azurerm_container_registry", PricingDefinition::new("Container Registry", &["sku"])),
    ("azurerm_databricks_workspace", PricingDefinition::new("Databricks", &["sku_name"])),
    // Storage
    ("azurerm_disk_encryption_set", PricingDefinition::new("Storage", &["sku_name"])),
    ("azurerm_storage_container", PricingDefinition::new("Storage", &[])),
    ("azurerm_storage_blob", PricingDefinition::new("Storage", &[])),
    ("azurerm_blob_data", PricingDefinition::new("Storage", &[])),
    // Backup
    ("azurerm_recovery_services_vault", PricingDefinition::new("Backup", &["sku_name"])),
    ("azurerm_backup_policy_vm", PricingDefinition::new("Backup", &["policy_type"])),
    // Networking & CDN
    ("azurerm_network_interface", PricingDefinition::new("Network Interface", &[])),
    ("azurerm_network_security_group", PricingDefinition::new("Network Security Groups", &[])),
    ("azurerm_nat_gateway", PricingDefinition::new("Virtual Network", &["sku_name"])),
    ("azurerm_lb", PricingDefinition::new("Load Balancer", &["sku"])),
    ("azurerm_application_gateway", PricingDefinition::new("Application Gateway", &["sku_name"])),
    (
        "azurerm_application_gateway_waf_policy",
        PricingDefinition::new("Application Gateway", &["sku_name"]),
    ),
    ("azurerm_firewall", PricingDefinition::new("Azure Firewall", &["sku_name"])),
    ("azurerm_cdn_profile", PricingDefinition::new("CDN", &["sku"])),
    ("azurerm_data_transfer", PricingDefinition::new("Bandwidth", &[])),
    ("azurerm_virtual_network_peering", PricingDefinition::new("Virtual Network", &[])),
    // DNS
    ("azurerm_dns_zone", PricingDefinition::new("DNS", &[])),
    ("azurerm_private_dns_zone", PricingDefinition::new("DNS", &[])),
    ("azurerm_private_dns_zone_virtual_network_link", PricingDefinition::new("DNS", &[])),
    // Identity & Access
    ("azurerm_user_assigned_identity", PricingDefinition::new("Managed Identities", &[])),
    ("azurerm_role_assignment", PricingDefinition::new("Role Based Access Control", &[])),
    // App Services
    ("azurerm_app_service_plan", PricingDefinition::new("App Service", &["sku_name"])),
    ("azurerm_app_service", PricingDefinition::new("App Service", &["sku_name"])),
    // Databases
    ("azurerm_sql_server", PricingDefinition::new("SQL Database", &["sku_name"])),
    ("azurerm_sql_database", PricingDefinition::new("SQL Database", &["sku_name"])),
    (
        "azurerm_postgresql_server",
        PricingDefinition::new("Azure Database for PostgreSQL", &["sku_name"]),
    ),
    (
        "azurerm_postgresql_flexible_server",
        PricingDefinition::new("Azure Database for PostgreSQL", &["sku_name"]),
    ),
    ("azurerm_mysql_server", PricingDefinition::new("Azure Database for MySQL", &["sku_name"])),
    (
        "azurerm_mysql_flexible_server",
        PricingDefinition::new("Azure Database for MySQL", &["sku_name"]),
    ),
    ("azurerm_cosmosdb_account", PricingDefinition::new("Azure Cosmos DB", &["offer_type"])),
    // Caching & Messaging
    ("azurerm_cache_redis", PricingDefinition::new("Azure Cache for Redis", &["sku_name"])),
    ("azurerm_servicebus_namespace", PricingDefinition::new("Service Bus", &["sku"])),
    ("azurerm_eventhub_namespace", PricingDefinition::new("Event Hubs", &["sku"])),
    ("azurerm_signalr_service", PricingDefinition::new("SignalR", &["sku"])),
    ("azurerm_api_management", PricingDefinition::new("API Management", &["sku_name"])),
    // Monitoring & Analytics
    ("azurerm_log_analytics_workspace", PricingDefinition::new("Log Analytics", &["sku"])),
    (
        "azurerm_application_insights",
        PricingDefinition::new("Application Insights", &["pricingTier"]),
    ),
    ("azurerm_monitor_diagnostic_setting", PricingDefinition::new("Monitoring", &[])),
    // Automation, IoT, Data
    ("azurerm_automation_account", PricingDefinition::new("Automation", &["sku_name"])),
    ("azurerm_lab", PricingDefinition::new("Lab Services", &["sku"])),
    ("azurerm_iothub", PricingDefinition::new("IoT Hub", &["sku_name"])),
    ("azurerm_data_factory", PricingDefinition::new("Data Factory", &[])),
    ("azurerm_synapse_workspace", PricingDefinition::new("Synapse", &[])),
    (
        "azurerm_virtual_desktop_host_pool",
        PricingDefinition::new("Virtual Desktop", &["host_pool_type"]),
    ),
];

/// Pricing definition for a resource type, guessing for unmapped types
pub fn definition_for(resource_type: &str) -> PricingDefinition {
    lookup(PRIMARY_DEFINITIONS, resource_type)
        .or_else(|| lookup(EXTENDED_DEFINITIONS, resource_type))
        .unwrap_or_else(|| {
            PricingDefinition::new(guess_service_name(resource_type), DEFAULT_SKU_KEYS)
        })
}

/// Every explicitly mapped type, primary entries first
pub fn known_definitions() -> impl Iterator<Item = (&'static str, PricingDefinition)> {
    PRIMARY_DEFINITIONS.iter().copied().chain(
        EXTENDED_DEFINITIONS
            .iter()
            .copied()
            .filter(|(kind, _)| lookup(PRIMARY_DEFINITIONS, kind).is_none()),
    )
}

fn lookup(table: &[(&str, PricingDefinition)], resource_type: &str) -> Option<PricingDefinition> {
    table
        .iter()
        .find(|(kind, _)| *kind == resource_type)
        .map(|(_, definition)| *definition)
}

/// Catalog service guessed from the type name; empty when unknown
pub fn guess_service_name(resource_type: &str) -> &'static str {
    if resource_type.contains("linux_virtual_machine")
        || resource_type.contains("windows_virtual_machine")
        || resource_type.contains("node_pool")
    {
        "Virtual Machines"
    } else if resource_type.contains("kubernetes_cluster") {
        "Kubernetes Service"
    } else if resource_type.contains("storage") || resource_type.contains("disk") {
        "Storage"
    } else {
        ""
    }
}
