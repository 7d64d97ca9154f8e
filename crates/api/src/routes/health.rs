//! Health check endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use super::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub bus: &'static str,
}

/// GET /health — reports whether bookings can currently be broadcast.
pub async fn check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let bus_open = !state.bus.is_closed();
    Json(HealthResponse {
        status: if bus_open { "ok" } else { "degraded" },
        bus: if bus_open { "open" } else { "closed" },
    })
}
