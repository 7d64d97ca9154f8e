//! Quote endpoints: price a request, persist it for a customer, load it back.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use quote_store::{Quote, QuoteId, QuoteRequest};
use serde::Serialize;

use super::AppState;
use crate::error::ApiError;

#[derive(Debug, Serialize)]
pub struct QuoteResponse {
    pub id: String,
    pub customer_id: Option<String>,
    pub main_service: String,
    pub subtotal_cents: i64,
    pub addon_total_cents: i64,
    pub total_price_cents: i64,
    pub total_price: String,
    pub validity: bool,
    pub preview: bool,
    pub addons: Vec<QuoteAddonResponse>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct QuoteAddonResponse {
    pub addon_name: String,
    pub addon_price_cents: i64,
}

impl From<Quote> for QuoteResponse {
    fn from(quote: Quote) -> Self {
        Self {
            id: quote.id.to_string(),
            customer_id: quote.customer_id.map(|id| id.to_string()),
            preview: quote.is_preview(),
            main_service: quote.main_service,
            subtotal_cents: quote.subtotal.cents(),
            addon_total_cents: quote.addon_total.cents(),
            total_price_cents: quote.total_price.cents(),
            total_price: quote.total_price.to_string(),
            validity: quote.validity,
            addons: quote
                .addons
                .into_iter()
                .map(|addon| QuoteAddonResponse {
                    addon_name: addon.addon_name,
                    addon_price_cents: addon.addon_price.cents(),
                })
                .collect(),
            created_at: quote.created_at,
        }
    }
}

/// POST /quotes — price a request; persisted when a customer id is given.
#[tracing::instrument(skip(state, req))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(req): Json<QuoteRequest>,
) -> Result<(StatusCode, Json<QuoteResponse>), ApiError> {
    let quote = state.quotes.create_quote(req).await?;
    let status = if quote.is_preview() {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    Ok((status, Json(QuoteResponse::from(quote))))
}

/// GET /quotes/{id} — load a persisted quote.
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<QuoteResponse>, ApiError> {
    let quote_id: QuoteId = id
        .parse()
        .map_err(|e| ApiError::BadRequest(format!("Invalid quote id: {e}")))?;
    let quote = state
        .quotes
        .get_quote(quote_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Quote not found: {quote_id}")))?;
    Ok(Json(QuoteResponse::from(quote)))
}
