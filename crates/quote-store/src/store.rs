use std::sync::Arc;

use async_trait::async_trait;

use common::CustomerId;

use crate::{NewQuote, Quote, QuoteId, Result};

/// Core trait for quote persistence.
///
/// All implementations must be thread-safe (Send + Sync). The pricing
/// responder and the quote API share one store.
#[async_trait]
pub trait QuoteStore: Send + Sync {
    /// Persists a quote and its addon lines atomically.
    ///
    /// Either the quote row and every addon row are stored, or nothing is.
    /// Returns the stored quote with its generated id and timestamps.
    async fn insert(&self, quote: NewQuote) -> Result<Quote>;

    /// Loads a quote with its addon lines.
    ///
    /// Returns None if the quote doesn't exist.
    async fn get(&self, id: QuoteId) -> Result<Option<Quote>>;

    /// Atomically marks a valid quote of `customer_id` as consumed.
    ///
    /// Returns the consumed quote (now invalid), or None if it is unknown,
    /// belongs to another customer or was already invalid. At most one
    /// caller ever gets `Some` for a given quote.
    async fn consume(&self, id: QuoteId, customer_id: CustomerId) -> Result<Option<Quote>>;

    /// Makes a consumed quote valid again.
    ///
    /// Undoes [`consume`](Self::consume) for a booking that was abandoned.
    /// Returns false if the quote is unknown or already valid.
    async fn restore(&self, id: QuoteId) -> Result<bool>;
}

#[async_trait]
impl<T: QuoteStore + ?Sized> QuoteStore for Arc<T> {
    async fn insert(&self, quote: NewQuote) -> Result<Quote> {
        (**self).insert(quote).await
    }

    async fn get(&self, id: QuoteId) -> Result<Option<Quote>> {
        (**self).get(id).await
    }

    async fn consume(&self, id: QuoteId, customer_id: CustomerId) -> Result<Option<Quote>> {
        (**self).consume(id, customer_id).await
    }

    async fn restore(&self, id: QuoteId) -> Result<bool> {
        (**self).restore(id).await
    }
}
