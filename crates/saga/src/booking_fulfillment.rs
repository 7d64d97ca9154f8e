//! Booking fulfillment saga constants.

use std::time::Duration;

/// Topic every new booking is broadcast on.
pub const TOPIC_BOOKING_CREATED: &str = "booking.created";

/// Topic a booking is broadcast on when it is abandoned after responders
/// contributed to it.
pub const TOPIC_BOOKING_ABORTED: &str = "booking.aborted";

/// Reply source tag of the staffing responder.
pub const SOURCE_STAFFING: &str = "staffing";

/// Reply source tag of the inventory responder.
pub const SOURCE_INVENTORY: &str = "inventory";

/// Reply source tag of the pricing responder.
pub const SOURCE_PAYMENT: &str = "payment";

/// Default gap allowed between two replies before collection ends.
pub const DEFAULT_REPLY_IDLE_TIMEOUT: Duration = Duration::from_millis(1000);

/// Default bound on total collection time.
pub const DEFAULT_REPLY_DEADLINE: Duration = Duration::from_millis(5000);
