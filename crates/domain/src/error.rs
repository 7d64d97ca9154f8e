//! Pricing error types.

use thiserror::Error;

use crate::service::ServiceType;

/// Errors that can occur while pricing a service or loading a pricing table.
#[derive(Debug, Error)]
pub enum PricingError {
    /// The specification carries nothing billable.
    #[error("Empty specification for {service} service")]
    EmptySpecification { service: ServiceType },

    /// The area is negative or not a finite number.
    #[error("Invalid area for {service} service: {sqm}")]
    InvalidArea { service: ServiceType, sqm: f64 },

    /// The price does not fit in a money amount.
    #[error("Price overflow for {service} service")]
    AmountOverflow { service: ServiceType },

    /// The pricing table is internally inconsistent.
    #[error("Invalid pricing table: {0}")]
    InvalidTable(String),

    /// The pricing table file could not be read.
    #[error("Failed to read pricing table: {0}")]
    TableRead(#[from] std::io::Error),

    /// The pricing table file is not valid JSON for a table.
    #[error("Failed to parse pricing table: {0}")]
    TableParse(#[from] serde_json::Error),
}

/// Convenience type alias for pricing results.
pub type Result<T> = std::result::Result<T, PricingError>;
