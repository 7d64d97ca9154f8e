//! Message bus abstraction for the booking saga.
//!
//! The saga only needs three things from a transport: publish to a subject,
//! subscribe to a subject, and address replies to a single-use inbox. The
//! [`MessageBus`] trait captures that; [`InMemoryBus`] implements it for
//! tests and single-process deployments.

pub mod bus;
pub mod error;
pub mod memory;
pub mod message;

pub use bus::{INBOX_PREFIX, MessageBus};
pub use error::{BusError, Result};
pub use memory::InMemoryBus;
pub use message::{Message, Subscription};
