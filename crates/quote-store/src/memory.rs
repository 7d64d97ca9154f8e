use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use common::CustomerId;
use tokio::sync::RwLock;

use crate::{NewQuote, Quote, QuoteId, QuoteStoreError, Result, store::QuoteStore};

/// In-memory quote store for testing and single-process deployments.
///
/// Provides the same interface as the PostgreSQL implementation.
#[derive(Clone, Default)]
pub struct InMemoryQuoteStore {
    quotes: Arc<RwLock<HashMap<QuoteId, Quote>>>,
    fail_on_insert: Arc<AtomicBool>,
}

impl InMemoryQuoteStore {
    /// Creates a new empty in-memory quote store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the store to reject inserts, simulating a failed transaction.
    pub fn set_fail_on_insert(&self, fail: bool) {
        self.fail_on_insert.store(fail, Ordering::SeqCst);
    }

    /// Returns the number of stored quotes.
    pub async fn quote_count(&self) -> usize {
        self.quotes.read().await.len()
    }
}

#[async_trait]
impl QuoteStore for InMemoryQuoteStore {
    async fn insert(&self, quote: NewQuote) -> Result<Quote> {
        if self.fail_on_insert.load(Ordering::SeqCst) {
            return Err(QuoteStoreError::Unavailable(
                "insert rejected".to_string(),
            ));
        }

        let now = Utc::now();
        let stored = Quote {
            id: QuoteId::new(),
            customer_id: Some(quote.customer_id),
            main_service: quote.main_service,
            subtotal: quote.subtotal,
            addon_total: quote.addon_total,
            total_price: quote.total_price,
            validity: true,
            created_at: now,
            updated_at: now,
            addons: quote.addons,
        };

        // Quote and addons land under a single write lock
        self.quotes.write().await.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn get(&self, id: QuoteId) -> Result<Option<Quote>> {
        Ok(self.quotes.read().await.get(&id).cloned())
    }

    async fn consume(&self, id: QuoteId, customer_id: CustomerId) -> Result<Option<Quote>> {
        let mut quotes = self.quotes.write().await;
        match quotes.get_mut(&id) {
            Some(quote) if quote.validity && quote.customer_id == Some(customer_id) => {
                quote.validity = false;
                quote.updated_at = Utc::now();
                Ok(Some(quote.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn restore(&self, id: QuoteId) -> Result<bool> {
        let mut quotes = self.quotes.write().await;
        match quotes.get_mut(&id) {
            Some(quote) if !quote.validity => {
                quote.validity = true;
                quote.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
