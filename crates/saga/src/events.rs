//! Wire envelopes exchanged on the message bus.
//!
//! Both payloads are camelCase JSON. Optional reply fields are omitted when
//! a responder has nothing of that kind to contribute.

use chrono::{DateTime, Utc};
use common::{CleanerId, CustomerId, QuoteId};
use domain::{Money, ServiceSpecification, money::major_units};
use serde::{Deserialize, Serialize};

/// A newly created booking, broadcast to every capability responder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingCreationEvent {
    pub base: BookingBase,
    pub main_service: ServiceSpecification,
    #[serde(default)]
    pub addons: Vec<AddonService>,
}

impl BookingCreationEvent {
    /// Returns the addon specifications in request order.
    pub fn addon_specs(&self) -> Vec<ServiceSpecification> {
        self.addons
            .iter()
            .map(|addon| addon.service_detail.clone())
            .collect()
    }

    /// Returns the main service followed by every addon.
    pub fn services(&self) -> impl Iterator<Item = &ServiceSpecification> {
        std::iter::once(&self.main_service).chain(self.addons.iter().map(|a| &a.service_detail))
    }
}

/// A booking the coordinator gave up on after responders contributed.
///
/// Carries every contribution the coordinator received; each responder
/// undoes the ones tagged with its own `source`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingAbortedEvent {
    pub booking: BookingCreationEvent,
    pub contributions: Vec<CapabilityReply>,
    pub reason: String,
}

/// Customer, address, schedule and quote reference of a booking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingBase {
    pub cust_id: CustomerId,
    pub customer_first_name: String,
    pub customer_last_name: String,
    pub address: Address,
    #[serde(flatten)]
    pub schedule: Schedule,
    #[serde(default)]
    pub dirty_scale: u8,
    #[serde(default)]
    pub payment_status: String,
    #[serde(default)]
    pub review_status: String,
    #[serde(default)]
    pub photos: Vec<String>,
    pub quote_id: QuoteId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub address_human: String,
    pub address_lat: f64,
    pub address_lng: f64,
}

/// The window a booking occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    #[serde(rename = "startSchedule")]
    pub start: DateTime<Utc>,
    #[serde(rename = "endSchedule")]
    pub end: DateTime<Utc>,
}

impl Schedule {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Returns true if the window has a positive length.
    pub fn is_valid(&self) -> bool {
        self.start < self.end
    }

    /// Returns true if the two windows share any instant.
    pub fn overlaps(&self, other: &Schedule) -> bool {
        self.start < other.end && other.start < self.end
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddonService {
    pub service_detail: ServiceSpecification,
}

impl From<ServiceSpecification> for AddonService {
    fn from(service_detail: ServiceSpecification) -> Self {
        Self { service_detail }
    }
}

/// One responder's contribution to a booking.
///
/// A reply with an `error` carries no usable contribution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityReply {
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cleaners: Option<Vec<AssignedCleaner>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equipments: Option<Vec<Equipment>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<Vec<Resource>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prices: Option<PriceBreakdown>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CapabilityReply {
    pub fn staffing(source: impl Into<String>, cleaners: Vec<AssignedCleaner>) -> Self {
        Self {
            source: source.into(),
            cleaners: Some(cleaners),
            ..Default::default()
        }
    }

    pub fn inventory(
        source: impl Into<String>,
        equipments: Vec<Equipment>,
        resources: Vec<Resource>,
    ) -> Self {
        Self {
            source: source.into(),
            equipments: Some(equipments),
            resources: Some(resources),
            ..Default::default()
        }
    }

    pub fn pricing(source: impl Into<String>, prices: PriceBreakdown) -> Self {
        Self {
            source: source.into(),
            prices: Some(prices),
            ..Default::default()
        }
    }

    /// A reply that reports a failure instead of a contribution.
    pub fn failure(source: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            error: Some(error.into()),
            ..Default::default()
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// A cleaner assigned to the booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignedCleaner {
    pub id: CleanerId,
    pub name: String,
}

/// A reusable piece of equipment reserved for the booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Equipment {
    pub name: String,
    pub quantity: u32,
}

/// A consumable allocated to the booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub name: String,
    pub quantity: u32,
    pub unit: String,
}

/// Prices as vouched for by the pricing responder, in major units on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceBreakdown {
    #[serde(with = "major_units")]
    pub main_service_price: Money,
    #[serde(default)]
    pub addon_prices: Vec<AddonPriceLine>,
}

impl PriceBreakdown {
    pub fn addon_total(&self) -> Money {
        self.addon_prices.iter().map(|line| line.addon_price).sum()
    }

    /// Main service price plus every addon price.
    pub fn total(&self) -> Money {
        self.main_service_price + self.addon_total()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddonPriceLine {
    pub addon_name: String,
    #[serde(with = "major_units")]
    pub addon_price: Money,
}
