//! Shared types for the booking-fulfillment backend.

pub mod types;

pub use types::{BookingId, CleanerId, CustomerId, QuoteId};
