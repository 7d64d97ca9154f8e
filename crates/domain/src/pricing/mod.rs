//! Pricing rules and the engine that applies them.

pub mod engine;
pub mod table;

pub use engine::{AddonPrice, PriceSummary, PricingEngine};
pub use table::PricingTable;
