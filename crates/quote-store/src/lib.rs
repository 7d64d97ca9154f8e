//! Quote lifecycle store.
//!
//! Quotes are owned by the payment capability: the quote API creates them,
//! the pricing responder consumes them. Everything else goes through the
//! booking saga.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod quote;
pub mod service;
pub mod store;

pub use common::{CustomerId, QuoteId};
pub use error::{QuoteStoreError, Result};
pub use memory::InMemoryQuoteStore;
pub use postgres::PostgresQuoteStore;
pub use quote::{NewQuote, Quote, QuoteAddon};
pub use service::{QuoteRequest, QuoteService};
pub use store::QuoteStore;
