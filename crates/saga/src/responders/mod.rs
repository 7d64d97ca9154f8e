//! Capability responders.
//!
//! Each responder subscribes once to `booking.created` and contributes one
//! kind of information to every booking. The coordinator only ever sees
//! the reply envelope and its `source` tag. Responders also listen on
//! `booking.aborted` to release what they reserved for abandoned bookings.

pub mod inventory;
pub mod payment;
pub mod staffing;

use std::sync::Arc;

use async_trait::async_trait;
use bus::{Message, MessageBus};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::booking_fulfillment::{TOPIC_BOOKING_ABORTED, TOPIC_BOOKING_CREATED};
use crate::error::Result;
use crate::events::{BookingAbortedEvent, BookingCreationEvent, CapabilityReply};

pub use inventory::{InMemoryInventoryCatalog, InventoryCatalog, InventoryResponder, Kit};
pub use payment::PricingResponder;
pub use staffing::{InMemoryStaffDirectory, StaffDirectory, StaffingResponder};

/// Contributes one capability to a booking.
#[async_trait]
pub trait CapabilityResponder: Send + Sync + 'static {
    /// Tag identifying this responder in replies.
    fn source(&self) -> &'static str;

    /// Produces this responder's contribution, or None to stay silent.
    async fn respond(&self, event: &BookingCreationEvent) -> Option<CapabilityReply>;

    /// Releases whatever `reply` reserved for a booking that will not happen.
    ///
    /// Only called with replies this responder produced. Responders that
    /// reserve nothing keep the default.
    async fn compensate(&self, _event: &BookingCreationEvent, _reply: &CapabilityReply) {}
}

/// Subscribes a responder to booking events and serves it in the background.
///
/// The subscriptions are in place when this returns. Every event is handled
/// on its own task. The loop ends when `shutdown` is cancelled or the bus
/// drops the subscriptions.
pub async fn spawn_responder<B, R>(
    bus: B,
    responder: R,
    shutdown: CancellationToken,
) -> Result<JoinHandle<()>>
where
    B: MessageBus + Clone + 'static,
    R: CapabilityResponder,
{
    let mut created = bus.subscribe(TOPIC_BOOKING_CREATED).await?;
    let mut aborted = bus.subscribe(TOPIC_BOOKING_ABORTED).await?;
    let responder = Arc::new(responder);
    tracing::info!(source = responder.source(), "Responder started");

    Ok(tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                next = created.next() => {
                    let Some(message) = next else { break };
                    let bus = bus.clone();
                    let responder = Arc::clone(&responder);
                    tokio::spawn(async move {
                        handle_message(&bus, responder.as_ref(), message).await;
                    });
                }
                next = aborted.next() => {
                    let Some(message) = next else { break };
                    let responder = Arc::clone(&responder);
                    tokio::spawn(async move {
                        handle_abort(responder.as_ref(), message).await;
                    });
                }
            }
        }
        tracing::info!(source = responder.source(), "Responder stopped");
    }))
}

async fn handle_message<B, R>(bus: &B, responder: &R, message: Message)
where
    B: MessageBus,
    R: CapabilityResponder,
{
    let source = responder.source();
    metrics::counter!("responder_events_total", "source" => source).increment(1);

    let event: BookingCreationEvent = match serde_json::from_slice(&message.payload) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!(source, error = %e, "Dropping undecodable booking event");
            return;
        }
    };

    let Some(reply) = responder.respond(&event).await else {
        tracing::debug!(source, quote_id = %event.base.quote_id, "No contribution");
        return;
    };

    let Some(reply_to) = message.reply_to else {
        tracing::debug!(source, "Event has no reply address, not replying");
        return;
    };

    let delivered = match serde_json::to_vec(&reply) {
        Ok(payload) => match bus.publish(&reply_to, payload).await {
            Ok(delivered) => delivered > 0,
            Err(e) => {
                tracing::warn!(source, error = %e, "Failed to publish reply");
                false
            }
        },
        Err(e) => {
            tracing::error!(source, error = %e, "Failed to encode reply");
            false
        }
    };

    // Undelivered contributions are released here
    if !delivered && !reply.is_error() {
        tracing::warn!(
            source,
            quote_id = %event.base.quote_id,
            "Reply not delivered, releasing contribution"
        );
        metrics::counter!("responder_undelivered_replies_total", "source" => source).increment(1);
        responder.compensate(&event, &reply).await;
    }
}

async fn handle_abort<R>(responder: &R, message: Message)
where
    R: CapabilityResponder,
{
    let source = responder.source();
    let aborted: BookingAbortedEvent = match serde_json::from_slice(&message.payload) {
        Ok(aborted) => aborted,
        Err(e) => {
            tracing::warn!(source, error = %e, "Dropping undecodable abort event");
            return;
        }
    };

    let own = aborted
        .contributions
        .iter()
        .filter(|reply| reply.source == source && !reply.is_error());
    for reply in own {
        tracing::info!(
            source,
            quote_id = %aborted.booking.base.quote_id,
            reason = %aborted.reason,
            "Releasing contribution to aborted booking"
        );
        metrics::counter!("responder_compensations_total", "source" => source).increment(1);
        responder.compensate(&aborted.booking, reply).await;
    }
}
