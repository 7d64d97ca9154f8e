//! Pricing responder: vouches for the price of a booking's quote.

use async_trait::async_trait;
use quote_store::{Quote, QuoteStore};

use crate::booking_fulfillment::SOURCE_PAYMENT;
use crate::events::{AddonPriceLine, BookingCreationEvent, CapabilityReply, PriceBreakdown};
use crate::responders::CapabilityResponder;

impl From<&Quote> for PriceBreakdown {
    fn from(quote: &Quote) -> Self {
        Self {
            main_service_price: quote.subtotal,
            addon_prices: quote
                .addons
                .iter()
                .map(|addon| AddonPriceLine {
                    addon_name: addon.addon_name.clone(),
                    addon_price: addon.addon_price,
                })
                .collect(),
        }
    }
}

/// Consumes the booking's quote and replies with its price breakdown.
///
/// Quotes are single-use and belong to one customer: the first booking of
/// that customer to reference a valid quote gets its prices, every other
/// booking gets an error reply. A consumed quote becomes valid again if its
/// booking is aborted.
pub struct PricingResponder<S: QuoteStore> {
    store: S,
}

impl<S: QuoteStore> PricingResponder<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<S: QuoteStore + 'static> CapabilityResponder for PricingResponder<S> {
    fn source(&self) -> &'static str {
        SOURCE_PAYMENT
    }

    #[tracing::instrument(skip_all, fields(source = SOURCE_PAYMENT, quote_id = %event.base.quote_id))]
    async fn respond(&self, event: &BookingCreationEvent) -> Option<CapabilityReply> {
        let quote_id = event.base.quote_id;

        match self.store.consume(quote_id, event.base.cust_id).await {
            Ok(Some(quote)) => {
                tracing::debug!(total = %quote.total_price, "Quote consumed");
                Some(CapabilityReply::pricing(
                    SOURCE_PAYMENT,
                    PriceBreakdown::from(&quote),
                ))
            }
            Ok(None) => {
                tracing::warn!(
                    customer_id = %event.base.cust_id,
                    "Quote missing, already used or held by another customer"
                );
                Some(CapabilityReply::failure(
                    SOURCE_PAYMENT,
                    format!("quote {quote_id} is missing or no longer valid"),
                ))
            }
            Err(e) => {
                tracing::error!(error = %e, "Quote lookup failed");
                Some(CapabilityReply::failure(
                    SOURCE_PAYMENT,
                    format!("quote {quote_id} could not be loaded"),
                ))
            }
        }
    }

    #[tracing::instrument(skip_all, fields(source = SOURCE_PAYMENT, quote_id = %event.base.quote_id))]
    async fn compensate(&self, event: &BookingCreationEvent, reply: &CapabilityReply) {
        if reply.prices.is_none() {
            return;
        }

        match self.store.restore(event.base.quote_id).await {
            Ok(true) => tracing::info!("Quote restored"),
            Ok(false) => tracing::debug!("Quote was not consumed, nothing to restore"),
            Err(e) => tracing::error!(error = %e, "Failed to restore quote"),
        }
    }
}
