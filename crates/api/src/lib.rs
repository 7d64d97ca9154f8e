//! HTTP API server for the booking-fulfillment backend.
//!
//! Provides REST endpoints for quotes and bookings, starts the capability
//! responders, and exposes structured logging (tracing) and Prometheus
//! metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use bus::InMemoryBus;
use domain::PricingEngine;
use metrics_exporter_prometheus::PrometheusHandle;
use quote_store::QuoteService;
use saga::{
    BookingCoordinator, InMemoryBookingRepository, InMemoryInventoryCatalog,
    InMemoryStaffDirectory, InventoryResponder, PricingResponder, SagaError, StaffingResponder,
    spawn_responder,
};
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use routes::{AppState, DynQuoteStore};

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/quotes", post(routes::quotes::create))
        .route("/quotes/{id}", get(routes::quotes::get))
        .route("/bookings", post(routes::bookings::create))
        .route("/bookings/{id}", get(routes::bookings::get))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the application state and starts the three capability responders.
///
/// Responders run on the in-process bus until `state.shutdown` is cancelled.
pub async fn create_default_state(
    config: &Config,
    quote_store: DynQuoteStore,
    engine: PricingEngine,
) -> Result<Arc<AppState>, SagaError> {
    let bus = InMemoryBus::new();
    let shutdown = CancellationToken::new();

    spawn_responder(
        bus.clone(),
        StaffingResponder::new(InMemoryStaffDirectory::with_pool_size(
            config.staff_pool_size,
        )),
        shutdown.clone(),
    )
    .await?;
    spawn_responder(
        bus.clone(),
        InventoryResponder::new(InMemoryInventoryCatalog::default()),
        shutdown.clone(),
    )
    .await?;
    spawn_responder(
        bus.clone(),
        PricingResponder::new(quote_store.clone()),
        shutdown.clone(),
    )
    .await?;

    let coordinator =
        BookingCoordinator::new(bus.clone(), InMemoryBookingRepository::new(), engine.clone())
            .with_options(config.collect_options());

    Ok(Arc::new(AppState {
        quotes: QuoteService::new(quote_store, engine),
        coordinator,
        bus,
        shutdown,
    }))
}
