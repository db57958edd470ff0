//! Catalog price lookup.
//!
//! A lookup runs a cascade of filter tiers, most specific first, and walks
//! every page of each tier until an item satisfies the service's selection
//! policy. The first accepted item wins.

use tracing::{debug, info, warn};

use crate::catalog::{PageRequest, PriceCatalog};
use crate::error::EstimationResult;
use crate::models::{PriceCatalogEntry, PriceQuote};
use crate::pricing_map::PRIVATE_LINK_SERVICE;

/// Normalized lookup key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceQuery<'a> {
    pub service: &'a str,
    pub region: &'a str,
    pub sku: &'a str,
}

impl<'a> PriceQuery<'a> {
    pub fn new(service: &'a str, region: &'a str, sku: &'a str) -> Self {
        Self {
            service,
            region,
            sku,
        }
    }
}

/// One specificity level of the catalog query
#[derive(Debug, Clone, Copy)]
pub struct FilterTier {
    pub name: &'static str,
    build: fn(&PriceQuery<'_>) -> Option<String>,
}

impl FilterTier {
    /// OData filter for this tier, or `None` when the query lacks the fields it needs
    pub fn filter(&self, query: &PriceQuery<'_>) -> Option<String> {
        (self.build)(query)
    }
}

/// Tiers in the order they are tried. The service-only tier always applies.
pub const FILTER_TIERS: &[FilterTier] = &[
    FilterTier {
        name: "service_region_sku",
        build: service_region_sku_filter,
    },
    FilterTier {
        name: "service_region",
        build: service_region_filter,
    },
    FilterTier {
        name: "service",
        build: service_filter,
    },
];

fn service_region_sku_filter(query: &PriceQuery<'_>) -> Option<String> {
    if query.region.is_empty() || query.sku.is_empty() {
        return None;
    }
    let sku = odata_literal(query.sku);
    Some(format!(
        "serviceName eq '{}' and armRegionName eq '{}' and (skuName eq '{}' or armSkuName eq '{}')",
        odata_literal(query.service),
        odata_literal(query.region),
        sku,
        sku
    ))
}

fn service_region_filter(query: &PriceQuery<'_>) -> Option<String> {
    if query.region.is_empty() {
        return None;
    }
    Some(format!(
        "serviceName eq '{}' and armRegionName eq '{}'",
        odata_literal(query.service),
        odata_literal(query.region)
    ))
}

fn service_filter(query: &PriceQuery<'_>) -> Option<String> {
    Some(format!("serviceName eq '{}'", odata_literal(query.service)))
}

/// Escape a value for use inside a single-quoted OData string literal
fn odata_literal(value: &str) -> String {
    value.replace('\'', "''")
}

/// Rule deciding whether a positive-priced catalog item prices the query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionPolicy {
    /// Accept only one named meter, in the query region, billed per `unit`
    ExactMeter {
        meter_name: &'static str,
        unit: &'static str,
    },
    /// SKU match, operation-metered item, or anything when no SKU is known
    Generic,
}

/// Services whose catalog entries need a dedicated policy
const SERVICE_POLICIES: &[(&str, SelectionPolicy)] = &[(
    PRIVATE_LINK_SERVICE,
    SelectionPolicy::ExactMeter {
        meter_name: "Private Endpoint",
        unit: "hour",
    },
)];

impl SelectionPolicy {
    pub fn for_service(service: &str) -> Self {
        SERVICE_POLICIES
            .iter()
            .find(|(name, _)| *name == service)
            .map(|(_, policy)| *policy)
            .unwrap_or(SelectionPolicy::Generic)
    }

    pub fn accepts(&self, item: &PriceCatalogEntry, query: &PriceQuery<'_>) -> bool {
        if item.retail_price <= 0.0 {
            return false;
        }

        match self {
            SelectionPolicy::ExactMeter { meter_name, unit } => {
                item.meter_name.eq_ignore_ascii_case(meter_name)
                    && item.arm_region_name.eq_ignore_ascii_case(query.region)
                    && item.unit_of_measure.to_lowercase().contains(*unit)
            }
            SelectionPolicy::Generic => {
                let sku = query.sku;
                if !sku.is_empty()
                    && (item.arm_sku_name.as_deref() == Some(sku)
                        || item.sku_name == sku
                        || item.meter_name.contains(sku))
                {
                    return true;
                }
                if item.unit_of_measure.to_lowercase().contains("operation")
                    || item.meter_name.to_lowercase().contains("operation")
                {
                    return true;
                }
                sku.is_empty()
            }
        }
    }
}

/// Looks up unit prices in a paginated catalog
pub struct PricingEngine<C: PriceCatalog> {
    catalog: C,
}

impl<C: PriceCatalog> PricingEngine<C> {
    pub fn new(catalog: C) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    /// Unit price for the query, or `None` when nothing matches.
    ///
    /// A failed page request ends the whole lookup; it is logged and reported
    /// as not found.
    pub async fn fetch_price(&self, query: &PriceQuery<'_>) -> Option<PriceQuote> {
        match self.try_fetch_price(query).await {
            Ok(quote) => quote,
            Err(e) => {
                warn!(
                    service = query.service,
                    region = query.region,
                    sku = query.sku,
                    error = %e,
                    "Price lookup aborted"
                );
                None
            }
        }
    }

    /// Like [`fetch_price`](Self::fetch_price), but surfaces catalog failures
    pub async fn try_fetch_price(
        &self,
        query: &PriceQuery<'_>,
    ) -> EstimationResult<Option<PriceQuote>> {
        if query.service.is_empty() {
            return Ok(None);
        }

        let policy = SelectionPolicy::for_service(query.service);

        for tier in FILTER_TIERS {
            let Some(filter) = tier.filter(query) else {
                continue;
            };
            debug!(tier = tier.name, filter = %filter, "Querying price catalog");

            let mut request = PageRequest::Filter(filter);
            let mut page_number = 1;

            loop {
                let page = self.catalog.fetch_page(request).await?;

                if let Some(item) = page.items.iter().find(|item| policy.accepts(item, query)) {
                    info!(
                        service = query.service,
                        region = query.region,
                        sku = query.sku,
                        tier = tier.name,
                        page = page_number,
                        meter = %item.meter_name,
                        price = item.retail_price,
                        "Matched catalog price"
                    );
                    return Ok(Some(PriceQuote::from(item)));
                }

                match page.next_page() {
                    Some(link) => {
                        request = PageRequest::NextPage(link.to_string());
                        page_number += 1;
                    }
                    None => break,
                }
            }
        }

        debug!(
            service = query.service,
            region = query.region,
            sku = query.sku,
            "No catalog price matched"
        );
        Ok(None)
    }
}
