//! Finalized bookings and their repository.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{BookingId, CustomerId, QuoteId};
use domain::Money;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::{Result, SagaError};
use crate::events::{AssignedCleaner, Equipment, Resource, Schedule};

/// A booking as written once fulfillment completes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub customer_id: CustomerId,
    pub quote_id: QuoteId,
    pub schedule: Schedule,
    pub main_service: String,
    pub addons: Vec<String>,
    /// Total computed by the pricing engine.
    pub total_price: Money,
    /// True when the pricing responder vouched for `total_price`.
    pub price_verified: bool,
    pub cleaners: Vec<AssignedCleaner>,
    pub equipments: Vec<Equipment>,
    pub resources: Vec<Resource>,
    pub created_at: DateTime<Utc>,
}

/// Storage for finalized bookings.
#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn save(&self, booking: &Booking) -> Result<()>;

    async fn get(&self, id: BookingId) -> Result<Option<Booking>>;
}

/// In-memory booking repository for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBookingRepository {
    bookings: Arc<RwLock<HashMap<BookingId, Booking>>>,
    fail_on_save: Arc<AtomicBool>,
}

impl InMemoryBookingRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the repository to reject saves.
    pub fn set_fail_on_save(&self, fail: bool) {
        self.fail_on_save.store(fail, Ordering::SeqCst);
    }

    pub async fn booking_count(&self) -> usize {
        self.bookings.read().await.len()
    }
}

#[async_trait]
impl BookingRepository for InMemoryBookingRepository {
    async fn save(&self, booking: &Booking) -> Result<()> {
        if self.fail_on_save.load(Ordering::SeqCst) {
            return Err(SagaError::Repository("save rejected".to_string()));
        }
        self.bookings
            .write()
            .await
            .insert(booking.id, booking.clone());
        Ok(())
    }

    async fn get(&self, id: BookingId) -> Result<Option<Booking>> {
        Ok(self.bookings.read().await.get(&id).cloned())
    }
}
