//! Quote service: prices a request and decides between preview and persistence.

use common::{CustomerId, QuoteId};
use domain::{PricingEngine, ServiceSpecification};
use serde::{Deserialize, Serialize};

use crate::{NewQuote, Quote, Result, store::QuoteStore};

/// A request to price a main service and its addons.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    /// When absent, the quote is a preview and is not persisted.
    #[serde(default)]
    pub customer_id: Option<CustomerId>,
    pub main_service: ServiceSpecification,
    #[serde(default)]
    pub addons: Vec<ServiceSpecification>,
}

/// Service for creating and loading quotes.
pub struct QuoteService<S: QuoteStore> {
    store: S,
    engine: PricingEngine,
}

impl<S: QuoteStore> QuoteService<S> {
    /// Creates a new quote service over a store and a pricing engine.
    pub fn new(store: S, engine: PricingEngine) -> Self {
        Self { store, engine }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns the pricing engine used for new quotes.
    pub fn engine(&self) -> &PricingEngine {
        &self.engine
    }

    /// Prices a request.
    ///
    /// Without a customer id the result is a preview (`validity = false`,
    /// nothing written). With one, the quote and its addons are persisted in
    /// a single transaction and come back valid.
    #[tracing::instrument(skip(self, request), fields(customer_id = ?request.customer_id))]
    pub async fn create_quote(&self, request: QuoteRequest) -> Result<Quote> {
        let summary = self.engine.quote(&request.main_service, &request.addons)?;

        match request.customer_id {
            None => {
                metrics::counter!("quotes_created_total", "kind" => "preview").increment(1);
                Ok(Quote::preview(summary))
            }
            Some(customer_id) => {
                let quote = self
                    .store
                    .insert(NewQuote::for_customer(customer_id, summary))
                    .await?;
                metrics::counter!("quotes_created_total", "kind" => "persisted").increment(1);
                tracing::info!(quote_id = %quote.id, total = %quote.total_price, "quote persisted");
                Ok(quote)
            }
        }
    }

    /// Loads a persisted quote by ID.
    pub async fn get_quote(&self, id: QuoteId) -> Result<Option<Quote>> {
        self.store.get(id).await
    }
}
