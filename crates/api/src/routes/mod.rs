//! HTTP route handlers and the state they share.

pub mod bookings;
pub mod health;
pub mod metrics;
pub mod quotes;

use std::sync::Arc;

use bus::InMemoryBus;
use quote_store::{QuoteService, QuoteStore};
use saga::{BookingCoordinator, InMemoryBookingRepository};
use tokio_util::sync::CancellationToken;

/// Quote store selected at start-up (PostgreSQL or in-memory).
pub type DynQuoteStore = Arc<dyn QuoteStore>;

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub quotes: QuoteService<DynQuoteStore>,
    pub coordinator: BookingCoordinator<InMemoryBus, InMemoryBookingRepository>,
    pub bus: InMemoryBus,
    /// Cancelled on shutdown; stops responders and in-flight collections.
    pub shutdown: CancellationToken,
}
