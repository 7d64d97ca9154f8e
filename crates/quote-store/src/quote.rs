//! Quote records.

use chrono::{DateTime, Utc};
use common::{CustomerId, QuoteId};
use domain::{Money, PriceSummary};
use serde::{Deserialize, Serialize};

/// A priced snapshot of a service request.
///
/// Previews (no customer) are never persisted and are never valid. Persisted
/// quotes start valid and become invalid once consumed by a booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub id: QuoteId,
    pub customer_id: Option<CustomerId>,
    pub main_service: String,
    pub subtotal: Money,
    pub addon_total: Money,
    pub total_price: Money,
    pub validity: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Addon lines in request order.
    pub addons: Vec<QuoteAddon>,
}

impl Quote {
    /// Builds an unpersisted preview from a price summary.
    pub fn preview(summary: PriceSummary) -> Self {
        let now = Utc::now();
        Self {
            id: QuoteId::new(),
            customer_id: None,
            main_service: summary.main_service,
            subtotal: summary.subtotal,
            addon_total: summary.addon_total,
            total_price: summary.total,
            validity: false,
            created_at: now,
            updated_at: now,
            addons: summary.addons.into_iter().map(QuoteAddon::from).collect(),
        }
    }

    /// Returns true if the quote may still back a booking.
    pub fn is_valid(&self) -> bool {
        self.validity
    }

    /// Returns true if this quote was never persisted.
    pub fn is_preview(&self) -> bool {
        self.customer_id.is_none()
    }
}

/// One priced addon line of a quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteAddon {
    pub addon_name: String,
    pub addon_price: Money,
}

impl From<domain::AddonPrice> for QuoteAddon {
    fn from(addon: domain::AddonPrice) -> Self {
        Self {
            addon_name: addon.name,
            addon_price: addon.price,
        }
    }
}

/// A quote about to be persisted; the store assigns id and timestamps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewQuote {
    pub customer_id: CustomerId,
    pub main_service: String,
    pub subtotal: Money,
    pub addon_total: Money,
    pub total_price: Money,
    pub addons: Vec<QuoteAddon>,
}

impl NewQuote {
    /// Builds a persistable quote for a customer from a price summary.
    pub fn for_customer(customer_id: CustomerId, summary: PriceSummary) -> Self {
        Self {
            customer_id,
            main_service: summary.main_service,
            subtotal: summary.subtotal,
            addon_total: summary.addon_total,
            total_price: summary.total,
            addons: summary.addons.into_iter().map(QuoteAddon::from).collect(),
        }
    }
}
