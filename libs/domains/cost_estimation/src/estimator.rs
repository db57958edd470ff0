//! Plan cost estimation.
//!
//! Resources are priced one at a time in plan order. A resource that cannot
//! be resolved or priced still yields a record; only the total skips it.

use std::collections::HashMap;
use tracing::{info, warn};

use crate::calculator::{fallback_quote, monthly_cost, usage_description};
use crate::catalog::PriceCatalog;
use crate::models::{CostReport, PriceQuote, PriceStatus, PricedResource, Resource};
use crate::plan::Plan;
use crate::pricing::{PriceQuery, PricingEngine};
use crate::pricing_map::{KUBERNETES_CLUSTER_TYPE, NODE_POOL_TYPE, definition_for};
use crate::resolver::{DEFAULT_MAX_REFERENCE_DEPTH, ReferenceResolver};

/// Estimation settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EstimatorOptions {
    /// Only estimate resources whose type starts with this prefix
    pub provider_prefix: Option<String>,
    pub max_reference_depth: usize,
}

impl Default for EstimatorOptions {
    fn default() -> Self {
        Self {
            provider_prefix: None,
            max_reference_depth: DEFAULT_MAX_REFERENCE_DEPTH,
        }
    }
}

/// Prices every resource of a plan
pub struct CostEstimator<C: PriceCatalog> {
    engine: PricingEngine<C>,
    options: EstimatorOptions,
}

impl<C: PriceCatalog> CostEstimator<C> {
    pub fn new(engine: PricingEngine<C>, options: EstimatorOptions) -> Self {
        Self { engine, options }
    }

    pub fn engine(&self) -> &PricingEngine<C> {
        &self.engine
    }

    pub fn options(&self) -> &EstimatorOptions {
        &self.options
    }

    pub async fn estimate(&self, plan: &Plan) -> CostReport {
        let resolver = ReferenceResolver::new(&plan.variables, &plan.graph)
            .with_max_depth(self.options.max_reference_depth);
        let cluster_regions = cluster_regions(plan.graph.resources(), &resolver);

        let mut report = CostReport::new();
        for resource in plan.graph.resources().iter().filter(|r| self.includes(r)) {
            let item = self
                .estimate_resource(resource, &resolver, &cluster_regions)
                .await;
            report.push(item);
        }

        info!(
            resources = report.len(),
            total_monthly_cost = report.total_monthly_cost,
            "Estimation complete"
        );
        report
    }

    fn includes(&self, resource: &Resource) -> bool {
        self.options
            .provider_prefix
            .as_deref()
            .is_none_or(|prefix| resource.resource_type.starts_with(prefix))
    }

    async fn estimate_resource(
        &self,
        resource: &Resource,
        resolver: &ReferenceResolver<'_>,
        cluster_regions: &HashMap<String, String>,
    ) -> PricedResource {
        let definition = definition_for(&resource.resource_type);

        let mut region = resolver.resolve_or_empty(resource, definition.region_key);
        if region.is_empty() && resource.resource_type == NODE_POOL_TYPE {
            let cluster_name = resolver.resolve_or_empty(resource, "cluster_name");
            region = cluster_regions
                .get(&cluster_name)
                .cloned()
                .unwrap_or_default();
        }

        let sku = definition.resolve_sku(resource, resolver);
        let usage = definition.usage_for(resource, resolver);

        let query = PriceQuery::new(definition.service_name, &region, &sku);
        let (quote, status) = match self.engine.fetch_price(&query).await {
            Some(quote) => (quote, PriceStatus::Matched),
            None => match fallback_quote(&resource.resource_type) {
                Some(quote) => {
                    warn!(
                        address = %resource.address,
                        unit_price = quote.unit_price,
                        "No catalog price, using fallback"
                    );
                    (quote, PriceStatus::Fallback)
                }
                None => {
                    warn!(
                        address = %resource.address,
                        service = definition.service_name,
                        region = %region,
                        sku = %sku,
                        "No price found"
                    );
                    (PriceQuote::new(0.0, ""), PriceStatus::NotFound)
                }
            },
        };

        let (monthly, usage_text) = if status.is_priced() {
            (
                monthly_cost(quote.unit_price, &quote.unit_of_measure, usage.quantity),
                usage_description(&quote.unit_of_measure, usage.quantity, &usage.description),
            )
        } else {
            (0.0, usage.description)
        };

        PricedResource {
            resource_type: resource.resource_type.clone(),
            name: resource.name.clone(),
            address: resource.address.clone(),
            region,
            sku,
            unit_cost: quote.unit_price,
            unit_of_measure: quote.unit_of_measure,
            quantity: usage.quantity,
            usage_description: usage_text,
            monthly_cost: monthly,
            status,
        }
    }
}

/// Kubernetes cluster name -> region, used by node pools without a location
fn cluster_regions(
    resources: &[Resource],
    resolver: &ReferenceResolver<'_>,
) -> HashMap<String, String> {
    resources
        .iter()
        .filter(|r| r.resource_type == KUBERNETES_CLUSTER_TYPE)
        .filter_map(|cluster| {
            let name = resolver.resolve_or_empty(cluster, "name");
            let region = resolver.resolve_or_empty(cluster, "location");
            (!name.is_empty() && !region.is_empty()).then_some((name, region))
        })
        .collect()
}
