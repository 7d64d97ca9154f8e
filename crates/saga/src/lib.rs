//! Booking fulfillment saga.
//!
//! A new booking is broadcast on `booking.created`; independent capability
//! responders answer on a single-use reply inbox:
//! 1. Staffing assigns cleaners
//! 2. Inventory reserves equipment and consumables
//! 3. Pricing (source `payment`) vouches for the quoted price
//!
//! The coordinator gathers replies under a sliding idle timeout and an
//! overall deadline, merges them, and persists the booking with the pricing
//! engine's total. Missing replies are not errors; a failed broadcast is.
//!
//! A booking that fails after replies arrived is broadcast on
//! `booking.aborted` with the contributions received, and each responder
//! releases what it reserved. A responder whose reply could not be
//! delivered releases its own contribution.

pub mod aggregate;
pub mod booking;
pub mod booking_fulfillment;
pub mod coordinator;
pub mod error;
pub mod events;
pub mod responders;

pub use aggregate::{AggregateBookingResult, CapabilityFailure};
pub use booking::{Booking, BookingRepository, InMemoryBookingRepository};
pub use coordinator::{BookingCoordinator, CollectOptions, FulfilledBooking, PendingReplies};
pub use error::{Result, SagaError};
pub use events::{
    AddonPriceLine, AddonService, Address, AssignedCleaner, BookingAbortedEvent, BookingBase,
    BookingCreationEvent, CapabilityReply, Equipment, PriceBreakdown, Resource, Schedule,
};
pub use responders::{
    CapabilityResponder, InMemoryInventoryCatalog, InMemoryStaffDirectory, InventoryCatalog,
    InventoryResponder, Kit, PricingResponder, StaffDirectory, StaffingResponder,
    spawn_responder,
};
