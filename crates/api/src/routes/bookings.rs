//! Booking endpoints: run the fulfillment saga, load a finalized booking.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::BookingId;
use saga::{
    AssignedCleaner, Booking, BookingCreationEvent, BookingRepository, CapabilityFailure,
    Equipment, FulfilledBooking, Resource,
};
use serde::Serialize;

use super::AppState;
use crate::error::ApiError;

#[derive(Debug, Serialize)]
pub struct BookingResponse {
    pub booking_id: String,
    pub customer_id: String,
    pub quote_id: String,
    pub main_service: String,
    pub addons: Vec<String>,
    pub total_price_cents: i64,
    pub total_price: String,
    pub price_verified: bool,
    pub cleaners: Vec<AssignedCleaner>,
    pub equipments: Vec<Equipment>,
    pub resources: Vec<Resource>,
    pub created_at: DateTime<Utc>,
}

impl From<Booking> for BookingResponse {
    fn from(booking: Booking) -> Self {
        Self {
            booking_id: booking.id.to_string(),
            customer_id: booking.customer_id.to_string(),
            quote_id: booking.quote_id.to_string(),
            main_service: booking.main_service,
            addons: booking.addons,
            total_price_cents: booking.total_price.cents(),
            total_price: booking.total_price.to_string(),
            price_verified: booking.price_verified,
            cleaners: booking.cleaners,
            equipments: booking.equipments,
            resources: booking.resources,
            created_at: booking.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FulfillResponse {
    #[serde(flatten)]
    pub booking: BookingResponse,
    /// Failures reported by individual capabilities.
    pub errors: Vec<CapabilityFailure>,
    pub reply_count: usize,
}

impl From<FulfilledBooking> for FulfillResponse {
    fn from(fulfilled: FulfilledBooking) -> Self {
        Self {
            booking: BookingResponse::from(fulfilled.booking),
            errors: fulfilled.aggregate.errors,
            reply_count: fulfilled.aggregate.reply_count,
        }
    }
}

/// POST /bookings — broadcast the booking, gather contributions, persist it.
#[tracing::instrument(skip(state, event), fields(quote_id = %event.base.quote_id))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(event): Json<BookingCreationEvent>,
) -> Result<(StatusCode, Json<FulfillResponse>), ApiError> {
    let cancel = state.shutdown.child_token();
    let fulfilled = state.coordinator.fulfill(&event, &cancel).await?;
    Ok((StatusCode::CREATED, Json(FulfillResponse::from(fulfilled))))
}

/// GET /bookings/{id} — load a finalized booking.
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<BookingResponse>, ApiError> {
    let booking_id: BookingId = id
        .parse()
        .map_err(|e| ApiError::BadRequest(format!("Invalid booking id: {e}")))?;
    let booking = state
        .coordinator
        .bookings()
        .get(booking_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Booking not found: {booking_id}")))?;
    Ok(Json(BookingResponse::from(booking)))
}
