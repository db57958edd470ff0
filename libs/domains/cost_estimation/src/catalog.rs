//! Remote retail price catalog.
//!
//! The catalog is paginated: a query is sent as an OData `$filter`, and each
//! response may carry a `NextPageLink` that is followed verbatim.
//! https://learn.microsoft.com/en-us/rest/api/cost-management/retail-prices/azure-retail-prices

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::error::{EstimationError, EstimationResult};
use crate::models::PriceCatalogEntry;

/// Which page to fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageRequest {
    /// First page of an OData filter query
    Filter(String),
    /// Continuation link returned by the previous page
    NextPage(String),
}

/// One page of catalog items
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CatalogPage {
    #[serde(rename = "Items", default)]
    pub items: Vec<PriceCatalogEntry>,
    #[serde(rename = "NextPageLink", default)]
    pub next_page_link: Option<String>,
}

impl CatalogPage {
    pub fn new(items: Vec<PriceCatalogEntry>, next_page_link: Option<String>) -> Self {
        Self {
            items,
            next_page_link,
        }
    }

    /// Continuation link, if there are more pages
    pub fn next_page(&self) -> Option<&str> {
        self.next_page_link.as_deref().filter(|link| !link.is_empty())
    }
}

/// Source of catalog pages
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PriceCatalog: Send + Sync {
    /// Fetch a single page
    async fn fetch_page(&self, request: PageRequest) -> EstimationResult<CatalogPage>;
}

/// HTTP client for the Azure Retail Prices API
#[derive(Debug, Clone)]
pub struct RetailPricesClient {
    base_url: String,
    client: Client,
}

impl RetailPricesClient {
    /// Client with a per-request timeout
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> EstimationResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(base_url, client))
    }

    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        Self {
            base_url: base_url.into(),
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn page_url(&self, request: &PageRequest) -> String {
        match request {
            PageRequest::Filter(filter) => {
                format!("{}?$filter={}", self.base_url, urlencoding::encode(filter))
            }
            PageRequest::NextPage(link) => link.clone(),
        }
    }
}

#[async_trait]
impl PriceCatalog for RetailPricesClient {
    async fn fetch_page(&self, request: PageRequest) -> EstimationResult<CatalogPage> {
        let url = self.page_url(&request);
        debug!(url = %url, "Fetching catalog page");

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(EstimationError::CatalogStatus(response.status().as_u16()));
        }

        let page: CatalogPage = response
            .json()
            .await
            .map_err(|e| EstimationError::Decode(e.to_string()))?;

        debug!(
            items = page.items.len(),
            has_next = page.next_page().is_some(),
            "Catalog page received"
        );

        Ok(page)
    }
}
