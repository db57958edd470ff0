use thiserror::Error;

/// Result type for estimation operations
pub type EstimationResult<T> = Result<T, EstimationError>;

/// Errors that can occur while estimating a plan
#[derive(Debug, Error)]
pub enum EstimationError {
    /// Plan file could not be read
    #[error("Failed to read plan: {0}")]
    Io(#[from] std::io::Error),

    /// Plan document is not valid JSON
    #[error("Failed to parse plan JSON: {0}")]
    PlanParse(#[from] serde_json::Error),

    /// Plan document lacks the required root structure
    #[error("Invalid plan: {0}")]
    InvalidPlan(String),

    /// A single resource entry does not have the expected shape
    #[error("Malformed resource at position {index}: {reason}")]
    MalformedResource { index: usize, reason: String },

    /// Attribute resolution revisited an attribute or ran too deep
    #[error("Cyclic reference while resolving '{field}' on '{address}'")]
    CyclicReference { address: String, field: String },

    /// Catalog request failed at the transport level
    #[error("Catalog request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Catalog answered with a non-success status
    #[error("Catalog returned status {0}")]
    CatalogStatus(u16),

    /// Catalog response body could not be decoded
    #[error("Failed to decode catalog response: {0}")]
    Decode(String),
}

impl EstimationError {
    /// Errors that only affect a single catalog lookup
    pub fn is_catalog_failure(&self) -> bool {
        matches!(
            self,
            EstimationError::Transport(_)
                | EstimationError::CatalogStatus(_)
                | EstimationError::Decode(_)
        )
    }
}
