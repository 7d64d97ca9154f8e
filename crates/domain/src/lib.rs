//! Domain layer for the booking-fulfillment backend.
//!
//! This crate provides:
//! - [`Money`] in integer minor units
//! - [`ServiceSpecification`], a sum type over the five cleaning categories
//! - [`PricingTable`], the unit prices as configuration data
//! - [`PricingEngine`], a pure function from specification to price

pub mod error;
pub mod money;
pub mod pricing;
pub mod service;

pub use error::{PricingError, Result};
pub use money::Money;
pub use pricing::{AddonPrice, PriceSummary, PricingEngine, PricingTable};
pub use service::{
    BedType, CarCleaningDetails, CarItem, CouchCleaningDetails, CouchItem, GeneralCleaningDetails,
    HomeType, MattressCleaningDetails, MattressItem, PostConstructionDetails, SeatType,
    ServiceSpecification, ServiceType, VehicleClass,
};
