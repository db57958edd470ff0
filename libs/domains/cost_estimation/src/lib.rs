//! Cost Estimation Domain
//!
//! Estimates the monthly cost of an infrastructure plan by pricing each
//! planned resource against the Azure retail price catalog.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐
//! │  Estimator   │  ← Per-resource region/SKU/usage, fallback, running total
//! └──────┬───────┘
//!        │
//! ┌──────▼───────┐   ┌──────────────┐
//! │   Resolver   │   │Pricing Engine│  ← Filter tiers + selection policies
//! └──────┬───────┘   └──────┬───────┘
//!        │                  │
//! ┌──────▼───────┐   ┌──────▼───────┐
//! │  Plan Graph  │   │   Catalog    │  ← Paginated HTTP client (trait seam)
//! └──────────────┘   └──────────────┘
//! ```

pub mod calculator;
pub mod catalog;
pub mod error;
pub mod estimator;
pub mod models;
pub mod plan;
pub mod pricing;
pub mod pricing_map;
pub mod resolver;

// Re-export commonly used types
pub use catalog::{CatalogPage, PageRequest, PriceCatalog, RetailPricesClient};
pub use error::{EstimationError, EstimationResult};
pub use estimator::{CostEstimator, EstimatorOptions};
pub use models::{
    AttributeValue, CostReport, PriceCatalogEntry, PriceQuote, PriceStatus, PricedResource,
    Reference, Resource, ResourcePath, VariableTable,
};
pub use plan::{Plan, PlanDocument, PlanGraph};
pub use pricing::{PriceQuery, PricingEngine, SelectionPolicy};
pub use pricing_map::{PricingDefinition, definition_for, known_definitions};
pub use resolver::ReferenceResolver;
