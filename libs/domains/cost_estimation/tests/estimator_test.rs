//! End-to-end estimation over plan fixtures with an in-memory catalog

use std::collections::HashMap;
use std::io::Write;
use std::sync::Mutex;

use async_trait::async_trait;
use domain_cost_estimation::{
    CatalogPage, CostEstimator, EstimationResult, EstimatorOptions, PageRequest, Plan,
    PriceCatalog, PriceCatalogEntry, PriceStatus, PricedResource, PricingEngine,
};
use serde_json::json;

/// Catalog answering known filters with a single page, anything else with nothing
#[derive(Default)]
struct FakeCatalog {
    pages: HashMap<String, CatalogPage>,
    requests: Mutex<Vec<PageRequest>>,
}

impl FakeCatalog {
    fn with_page(mut self, filter: String, items: Vec<PriceCatalogEntry>) -> Self {
        self.pages.insert(filter, CatalogPage::new(items, None));
        self
    }

    fn requests(&self) -> Vec<PageRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PriceCatalog for FakeCatalog {
    async fn fetch_page(&self, request: PageRequest) -> EstimationResult<CatalogPage> {
        self.requests.lock().unwrap().push(request.clone());
        let page = match &request {
            PageRequest::Filter(filter) => self.pages.get(filter).cloned(),
            PageRequest::NextPage(_) => None,
        };
        Ok(page.unwrap_or_default())
    }
}

fn sku_filter(service: &str, region: &str, sku: &str) -> String {
    format!(
        "serviceName eq '{service}' and armRegionName eq '{region}' and (skuName eq '{sku}' or armSkuName eq '{sku}')"
    )
}

fn entry(
    price: f64,
    unit: &str,
    meter: &str,
    sku: &str,
    arm_sku: Option<&str>,
) -> PriceCatalogEntry {
    PriceCatalogEntry {
        retail_price: price,
        unit_of_measure: unit.to_string(),
        meter_name: meter.to_string(),
        sku_name: sku.to_string(),
        arm_sku_name: arm_sku.map(str::to_string),
        arm_region_name: "westeurope".to_string(),
    }
}

fn estimator(catalog: FakeCatalog, options: EstimatorOptions) -> CostEstimator<FakeCatalog> {
    CostEstimator::new(PricingEngine::new(catalog), options)
}

fn find<'a>(items: &'a [PricedResource], address: &str) -> &'a PricedResource {
    items
        .iter()
        .find(|item| item.address == address)
        .unwrap_or_else(|| panic!("no record for {address}"))
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

fn platform_plan() -> serde_json::Value {
    json!({
        "format_version": "1.2",
        "variables": {
            "location": { "value": "westeurope" }
        },
        "planned_values": {
            "root_module": {
                "resources": [
                    {
                        "address": "azurerm_resource_group.main",
                        "type": "azurerm_resource_group",
                        "name": "main",
                        "values": {
                            "name": "rg-platform",
                            "location": { "references": ["var.location"] }
                        }
                    },
                    {
                        "address": "azurerm_linux_virtual_machine.app",
                        "type": "azurerm_linux_virtual_machine",
                        "name": "app",
                        "values": {
                            "size": "Standard_D2s_v3",
                            "location": {
                                "references": [
                                    "azurerm_resource_group.main.location",
                                    "azurerm_resource_group.main"
                                ]
                            }
                        }
                    },
                    {
                        "address": "azurerm_managed_disk.data",
                        "type": "azurerm_managed_disk",
                        "name": "data",
                        "values": {
                            "location": "westeurope",
                            "storage_account_type": "Premium_LRS",
                            "sku_name": "Premium_LRS",
                            "disk_size_gb": 128
                        }
                    },
                    {
                        "address": "azurerm_private_endpoint.vault",
                        "type": "azurerm_private_endpoint",
                        "name": "vault",
                        "values": { "location": "westeurope", "tags": null }
                    }
                ],
                "child_modules": [
                    {
                        "address": "module.aks",
                        "resources": [
                            {
                                "address": "module.aks.azurerm_kubernetes_cluster.this",
                                "type": "azurerm_kubernetes_cluster",
                                "name": "this",
                                "values": {
                                    "name": "aks-prod",
                                    "location": "westeurope",
                                    "sku_tier": "Free"
                                }
                            },
                            {
                                "address": "module.aks.azurerm_kubernetes_cluster_node_pool.user",
                                "type": "azurerm_kubernetes_cluster_node_pool",
                                "name": "user",
                                "values": {
                                    "cluster_name": "aks-prod",
                                    "vm_size": "Standard_D4s_v3",
                                    "node_count": 3
                                }
                            }
                        ]
                    }
                ]
            }
        }
    })
}

fn platform_catalog() -> FakeCatalog {
    FakeCatalog::default()
        .with_page(
            sku_filter("Virtual Machines", "westeurope", "Standard_D2s_v3"),
            vec![entry(0.096, "1 Hour", "D2s v3", "D2s v3", Some("Standard_D2s_v3"))],
        )
        .with_page(
            sku_filter("Virtual Machines", "westeurope", "Standard_D4s_v3"),
            vec![entry(0.192, "1 Hour", "D4s v3", "D4s v3", Some("Standard_D4s_v3"))],
        )
        .with_page(
            sku_filter("Storage", "westeurope", "Premium_LRS"),
            vec![entry(0.05, "1 GB/Month", "P10 LRS Disk", "Premium_LRS", None)],
        )
}

#[tokio::test]
async fn test_platform_plan_estimate() {
    let plan = Plan::parse(&platform_plan().to_string()).unwrap();
    let estimator = estimator(platform_catalog(), EstimatorOptions::default());

    let report = estimator.estimate(&plan).await;

    let addresses: Vec<&str> = report.items.iter().map(|i| i.address.as_str()).collect();
    assert_eq!(
        addresses,
        vec![
            "azurerm_resource_group.main",
            "azurerm_linux_virtual_machine.app",
            "azurerm_managed_disk.data",
            "azurerm_private_endpoint.vault",
            "module.aks.azurerm_kubernetes_cluster.this",
            "module.aks.azurerm_kubernetes_cluster_node_pool.user",
        ]
    );

    let vm = find(&report.items, "azurerm_linux_virtual_machine.app");
    assert_eq!(vm.region, "westeurope");
    assert_eq!(vm.sku, "Standard_D2s_v3");
    assert_eq!(vm.status, PriceStatus::Matched);
    assert!(approx(vm.monthly_cost, 70.08));
    assert_eq!(vm.usage_description, "1 x 730 hours");

    let disk = find(&report.items, "azurerm_managed_disk.data");
    assert_eq!(disk.quantity, 128.0);
    assert_eq!(disk.usage_description, "128 GB");
    assert!(approx(disk.monthly_cost, 6.4));

    let endpoint = find(&report.items, "azurerm_private_endpoint.vault");
    assert_eq!(endpoint.status, PriceStatus::Fallback);
    assert_eq!(endpoint.unit_cost, 0.01);
    assert_eq!(endpoint.unit_of_measure, "1 Hour");
    assert!(approx(endpoint.monthly_cost, 7.30));

    let cluster = find(&report.items, "module.aks.azurerm_kubernetes_cluster.this");
    assert_eq!(cluster.status, PriceStatus::NotFound);
    assert_eq!(cluster.monthly_cost, 0.0);

    let resource_group = find(&report.items, "azurerm_resource_group.main");
    assert_eq!(resource_group.status, PriceStatus::NotFound);

    assert!(approx(report.total_monthly_cost, 70.08 + 6.4 + 7.30 + 140.16));
}

#[tokio::test]
async fn test_node_pool_inherits_cluster_region() {
    let plan = Plan::parse(&platform_plan().to_string()).unwrap();
    let estimator = estimator(platform_catalog(), EstimatorOptions::default());

    let report = estimator.estimate(&plan).await;

    let pool = find(&report.items, "module.aks.azurerm_kubernetes_cluster_node_pool.user");
    assert_eq!(pool.region, "westeurope");
    assert_eq!(pool.sku, "Standard_D4s_v3");
    assert_eq!(pool.status, PriceStatus::Matched);
    assert!(approx(pool.monthly_cost, 140.16));

    let requests = estimator.engine().catalog().requests();
    assert!(requests.contains(&PageRequest::Filter(sku_filter(
        "Virtual Machines",
        "westeurope",
        "Standard_D4s_v3"
    ))));
}

#[tokio::test]
async fn test_unmapped_type_makes_no_catalog_request() {
    let plan = Plan::parse(
        &json!({
            "planned_values": { "root_module": { "resources": [{
                "address": "azurerm_resource_group.main",
                "type": "azurerm_resource_group",
                "name": "main",
                "values": { "location": "westeurope" }
            }]}}
        })
        .to_string(),
    )
    .unwrap();
    let estimator = estimator(FakeCatalog::default(), EstimatorOptions::default());

    let report = estimator.estimate(&plan).await;

    assert_eq!(report.len(), 1);
    assert_eq!(report.items[0].status, PriceStatus::NotFound);
    assert!(estimator.engine().catalog().requests().is_empty());
}

#[tokio::test]
async fn test_empty_plan_has_zero_total() {
    let plan = Plan::parse(r#"{"planned_values": {"root_module": {}}}"#).unwrap();
    let estimator = estimator(FakeCatalog::default(), EstimatorOptions::default());

    let report = estimator.estimate(&plan).await;

    assert!(report.is_empty());
    assert_eq!(report.total_monthly_cost, 0.0);
}

#[tokio::test]
async fn test_provider_prefix_filters_resources() {
    let plan = Plan::parse(
        &json!({
            "planned_values": { "root_module": { "resources": [
                {
                    "address": "random_password.admin",
                    "type": "random_password",
                    "name": "admin",
                    "values": { "length": 24 }
                },
                {
                    "address": "azurerm_managed_disk.data",
                    "type": "azurerm_managed_disk",
                    "name": "data",
                    "values": {
                        "location": "westeurope",
                        "sku_name": "Premium_LRS",
                        "disk_size_gb": 10
                    }
                }
            ]}}
        })
        .to_string(),
    )
    .unwrap();
    let options = EstimatorOptions {
        provider_prefix: Some("azurerm_".to_string()),
        ..EstimatorOptions::default()
    };
    let estimator = estimator(platform_catalog(), options);

    let report = estimator.estimate(&plan).await;

    assert_eq!(report.len(), 1);
    assert_eq!(report.items[0].address, "azurerm_managed_disk.data");
    assert!(approx(report.total_monthly_cost, 0.5));
}

#[tokio::test]
async fn test_cyclic_reference_does_not_abort_batch() {
    let plan = Plan::parse(
        &json!({
            "planned_values": { "root_module": { "resources": [
                {
                    "address": "azurerm_public_ip.one",
                    "type": "azurerm_public_ip",
                    "name": "one",
                    "values": { "location": { "references": ["azurerm_public_ip.two.location"] } }
                },
                {
                    "address": "azurerm_public_ip.two",
                    "type": "azurerm_public_ip",
                    "name": "two",
                    "values": { "location": { "references": ["azurerm_public_ip.one.location"] } }
                },
                {
                    "address": "azurerm_public_ip.three",
                    "type": "azurerm_public_ip",
                    "name": "three",
                    "values": { "location": "westeurope", "sku": "Standard" }
                }
            ]}}
        })
        .to_string(),
    )
    .unwrap();
    let catalog = FakeCatalog::default().with_page(
        sku_filter("IP Addresses", "westeurope", "Standard"),
        vec![entry(0.005, "1 Hour", "Standard IPv4 Static Public IP", "Standard", None)],
    );
    let estimator = estimator(catalog, EstimatorOptions::default());

    let report = estimator.estimate(&plan).await;

    assert_eq!(report.len(), 3);
    assert_eq!(find(&report.items, "azurerm_public_ip.one").region, "");
    assert_eq!(find(&report.items, "azurerm_public_ip.two").status, PriceStatus::NotFound);
    assert!(approx(report.total_monthly_cost, 3.65));
}

#[tokio::test]
async fn test_load_plan_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(platform_plan().to_string().as_bytes()).unwrap();

    let plan = Plan::load(file.path()).unwrap();
    assert_eq!(plan.graph.len(), 6);
    assert_eq!(plan.variables.get("location"), Some("westeurope"));

    let report = estimator(platform_catalog(), EstimatorOptions::default())
        .estimate(&plan)
        .await;
    assert_eq!(report.len(), 6);
}

#[test]
fn test_load_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Plan::load(dir.path().join("missing.json")).unwrap_err();
    assert!(matches!(err, domain_cost_estimation::EstimationError::Io(_)));
}
