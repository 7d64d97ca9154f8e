//! Merging capability replies into one booking result.

use domain::Money;
use serde::{Deserialize, Serialize};

use crate::booking_fulfillment::SOURCE_PAYMENT;
use crate::events::{AssignedCleaner, CapabilityReply, Equipment, PriceBreakdown, Resource};

/// A failure reported by one responder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityFailure {
    pub source: String,
    pub error: String,
}

/// Everything the responders contributed to one booking.
///
/// Lists are concatenated in arrival order with no de-duplication, so a
/// responder that replies twice contributes twice. Prices are only taken
/// from the `payment` source, and only the first such breakdown is kept;
/// every other price-bearing reply is counted in `ignored_prices`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateBookingResult {
    pub cleaners: Vec<AssignedCleaner>,
    pub equipments: Vec<Equipment>,
    pub resources: Vec<Resource>,
    pub prices: Option<PriceBreakdown>,
    pub price_source: Option<String>,
    pub errors: Vec<CapabilityFailure>,
    pub ignored_prices: usize,
    pub reply_count: usize,
}

impl AggregateBookingResult {
    /// Merges replies in the order they were received.
    pub fn merge(replies: impl IntoIterator<Item = CapabilityReply>) -> Self {
        let mut result = Self::default();
        for reply in replies {
            result.absorb(reply);
        }
        result
    }

    /// Folds one more reply into the result.
    pub fn absorb(&mut self, reply: CapabilityReply) {
        self.reply_count += 1;

        if let Some(error) = reply.error {
            tracing::warn!(source = %reply.source, %error, "Capability reported an error");
            self.errors.push(CapabilityFailure {
                source: reply.source,
                error,
            });
            return;
        }

        if let Some(cleaners) = reply.cleaners {
            self.cleaners.extend(cleaners);
        }
        if let Some(equipments) = reply.equipments {
            self.equipments.extend(equipments);
        }
        if let Some(resources) = reply.resources {
            self.resources.extend(resources);
        }

        if let Some(prices) = reply.prices {
            if reply.source != SOURCE_PAYMENT {
                tracing::warn!(
                    source = %reply.source,
                    "Ignoring price breakdown from a non-pricing source"
                );
                self.ignored_prices += 1;
            } else if self.prices.is_some() {
                tracing::warn!(
                    source = %reply.source,
                    "Ignoring additional price breakdown"
                );
                self.ignored_prices += 1;
            } else {
                self.prices = Some(prices);
                self.price_source = Some(reply.source);
            }
        }
    }

    /// The main service price, zero when nobody priced the booking.
    pub fn main_service_price(&self) -> Money {
        self.prices
            .as_ref()
            .map(|p| p.main_service_price)
            .unwrap_or_default()
    }

    /// The contributed total, zero when nobody priced the booking.
    pub fn total_price(&self) -> Money {
        self.prices
            .as_ref()
            .map(PriceBreakdown::total)
            .unwrap_or_default()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}
