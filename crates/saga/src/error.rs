//! Saga error types.

use bus::BusError;
use domain::{Money, PricingError};
use quote_store::QuoteStoreError;
use thiserror::Error;

/// Errors that can occur while fulfilling a booking.
#[derive(Debug, Error)]
pub enum SagaError {
    /// The booking event could not be broadcast. Fatal for the booking.
    #[error("Failed to publish booking event: {0}")]
    Publish(#[from] BusError),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The booking's services could not be priced.
    #[error("Pricing error: {0}")]
    Pricing(#[from] PricingError),

    /// Quote store error.
    #[error("Quote store error: {0}")]
    QuoteStore(#[from] QuoteStoreError),

    /// The pricing contribution disagrees with the engine's total.
    #[error("Price mismatch: quoted {quoted}, computed {computed}")]
    PriceMismatch { quoted: Money, computed: Money },

    /// Reply collection was aborted by the caller.
    #[error("Booking fulfillment was cancelled")]
    Cancelled,

    /// Not enough cleaners are free for the requested window.
    #[error("Insufficient staff: requested {requested}, available {available}")]
    InsufficientStaff { requested: usize, available: usize },

    /// The schedule window ends before it starts.
    #[error("Invalid schedule window: {0}")]
    InvalidSchedule(String),

    /// Inventory lookup failed.
    #[error("Inventory error: {0}")]
    Inventory(String),

    /// Booking persistence failed.
    #[error("Booking repository error: {0}")]
    Repository(String),
}

/// Convenience type alias for saga results.
pub type Result<T> = std::result::Result<T, SagaError>;
