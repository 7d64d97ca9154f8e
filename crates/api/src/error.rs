//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use quote_store::QuoteStoreError;
use saga::SagaError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Resource not found.
    #[error("{0}")]
    NotFound(String),
    /// Bad request from the client.
    #[error("{0}")]
    BadRequest(String),
    /// Quote creation or lookup error.
    #[error(transparent)]
    QuoteStore(#[from] QuoteStoreError),
    /// Booking fulfillment error.
    #[error(transparent)]
    Saga(#[from] SagaError),
    /// Internal server error.
    #[error("{0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::QuoteStore(err) => quote_store_error_to_response(err),
            ApiError::Saga(err) => saga_error_to_response(err),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        metrics::counter!("http_errors_total", "status" => status.as_u16().to_string())
            .increment(1);
        if status.is_server_error() {
            tracing::error!(error = %message, %status, "request failed");
        }

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn quote_store_error_to_response(err: QuoteStoreError) -> (StatusCode, String) {
    match &err {
        QuoteStoreError::Pricing(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        QuoteStoreError::NotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    }
}

fn saga_error_to_response(err: SagaError) -> (StatusCode, String) {
    match &err {
        SagaError::Pricing(_) | SagaError::InvalidSchedule(_) => {
            (StatusCode::BAD_REQUEST, err.to_string())
        }
        SagaError::PriceMismatch { .. } => (StatusCode::CONFLICT, err.to_string()),
        SagaError::Publish(_) | SagaError::Cancelled => {
            (StatusCode::SERVICE_UNAVAILABLE, err.to_string())
        }
        SagaError::QuoteStore(store_err) => match store_err {
            QuoteStoreError::NotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
        },
        _ => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bus::BusError;
    use domain::{Money, PricingError, ServiceType};

    fn status_of(err: ApiError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn pricing_errors_are_client_errors() {
        let err = PricingError::EmptySpecification {
            service: ServiceType::Car,
        };
        assert_eq!(
            status_of(QuoteStoreError::Pricing(err).into()),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn saga_errors_map_to_status_codes() {
        assert_eq!(
            status_of(
                SagaError::PriceMismatch {
                    quoted: Money::from_major(1),
                    computed: Money::from_major(2),
                }
                .into()
            ),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(SagaError::Publish(BusError::Closed).into()),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_of(SagaError::Repository("down".to_string()).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
