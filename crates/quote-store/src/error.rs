use domain::PricingError;
use thiserror::Error;

use crate::QuoteId;

/// Errors that can occur when creating or loading quotes.
#[derive(Debug, Error)]
pub enum QuoteStoreError {
    /// The requested services could not be priced.
    #[error("Pricing error: {0}")]
    Pricing(#[from] PricingError),

    /// The quote was not found in the store.
    #[error("Quote not found: {0}")]
    NotFound(QuoteId),

    /// A database error occurred. Any open transaction has been rolled back.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// The backing store refused the operation.
    #[error("Quote store unavailable: {0}")]
    Unavailable(String),
}

/// Result type for quote store operations.
pub type Result<T> = std::result::Result<T, QuoteStoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migration_failures_convert() {
        let err: QuoteStoreError = sqlx::migrate::MigrateError::VersionMissing(1).into();
        assert!(matches!(err, QuoteStoreError::Migration(_)));
        assert!(err.to_string().starts_with("Migration error"));
    }
}
