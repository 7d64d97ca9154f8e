//! Booking coordinator: scatter the booking event, gather the replies.

use std::time::Duration;

use bus::{Message, MessageBus, Subscription};
use chrono::Utc;
use common::BookingId;
use domain::{PriceSummary, PricingEngine};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::aggregate::AggregateBookingResult;
use crate::booking::{Booking, BookingRepository};
use crate::booking_fulfillment::{
    DEFAULT_REPLY_DEADLINE, DEFAULT_REPLY_IDLE_TIMEOUT, TOPIC_BOOKING_ABORTED,
    TOPIC_BOOKING_CREATED,
};
use crate::error::{Result, SagaError};
use crate::events::{BookingAbortedEvent, BookingCreationEvent, CapabilityReply};

/// Timing bounds for reply collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectOptions {
    /// Longest gap allowed between two replies. Resets on every message.
    pub idle_timeout: Duration,
    /// Bound on total collection time, however chatty the responders are.
    pub deadline: Duration,
}

impl Default for CollectOptions {
    fn default() -> Self {
        Self {
            idle_timeout: DEFAULT_REPLY_IDLE_TIMEOUT,
            deadline: DEFAULT_REPLY_DEADLINE,
        }
    }
}

/// A published booking whose replies have not been collected yet.
///
/// Holds the inbox subscription, so replies that arrive before
/// [`BookingCoordinator::collect`] runs are buffered, not lost.
#[derive(Debug)]
pub struct PendingReplies {
    reply_subject: String,
    subscription: Subscription,
}

impl PendingReplies {
    pub fn reply_subject(&self) -> &str {
        &self.reply_subject
    }
}

/// The persisted booking together with what the responders contributed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FulfilledBooking {
    pub booking: Booking,
    pub aggregate: AggregateBookingResult,
}

/// Replies gathered from one inbox, and whether the caller gave up.
struct Gathered {
    replies: Vec<CapabilityReply>,
    cancelled: bool,
}

/// Orchestrates the booking fulfillment saga.
///
/// Publish broadcasts the booking on `booking.created` with a single-use
/// reply inbox; collect gathers replies until the responders go quiet;
/// merge folds them into one result; fulfill runs all three and persists
/// the booking with the pricing engine's total. A booking that fails after
/// replies arrived is broadcast on `booking.aborted` so responders release
/// what they reserved.
pub struct BookingCoordinator<B, R>
where
    B: MessageBus,
    R: BookingRepository,
{
    bus: B,
    bookings: R,
    engine: PricingEngine,
    options: CollectOptions,
}

impl<B, R> BookingCoordinator<B, R>
where
    B: MessageBus,
    R: BookingRepository,
{
    /// Creates a coordinator with the default collection bounds.
    pub fn new(bus: B, bookings: R, engine: PricingEngine) -> Self {
        Self {
            bus,
            bookings,
            engine,
            options: CollectOptions::default(),
        }
    }

    /// Overrides the collection bounds used by [`Self::fulfill`].
    pub fn with_options(mut self, options: CollectOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &CollectOptions {
        &self.options
    }

    pub fn bookings(&self) -> &R {
        &self.bookings
    }

    /// Broadcasts a booking event with a fresh reply inbox.
    ///
    /// Delivery is not acknowledged. A bus failure is returned as
    /// [`SagaError::Publish`] and is fatal for the booking.
    #[tracing::instrument(skip(self, event), fields(quote_id = %event.base.quote_id))]
    pub async fn publish(&self, event: &BookingCreationEvent) -> Result<PendingReplies> {
        let payload = serde_json::to_vec(event)?;
        let reply_subject = self.bus.new_inbox();

        // Subscribe first: a fast responder may answer before publish returns
        let subscription = self.bus.subscribe(&reply_subject).await?;
        self.bus
            .publish_request(TOPIC_BOOKING_CREATED, &reply_subject, payload)
            .await?;

        tracing::debug!(%reply_subject, "Booking event published");
        Ok(PendingReplies {
            reply_subject,
            subscription,
        })
    }

    /// Gathers replies until none arrives for `idle_timeout`.
    ///
    /// The idle timeout slides: it restarts after every message, malformed
    /// ones included. `deadline` caps the total wait; reaching it or going
    /// idle ends collection normally. Malformed replies are logged and
    /// dropped. Cancelling `cancel` aborts with [`SagaError::Cancelled`].
    ///
    /// When collection ends the inbox is closed and replies already
    /// buffered in it are still returned; later replies are refused, and
    /// their responders release what they reserved.
    #[tracing::instrument(skip_all, fields(reply_subject = %pending.reply_subject))]
    pub async fn collect(
        &self,
        pending: PendingReplies,
        options: &CollectOptions,
        cancel: &CancellationToken,
    ) -> Result<Vec<CapabilityReply>> {
        let gathered = Self::gather(pending, options, cancel).await;
        if gathered.cancelled {
            return Err(SagaError::Cancelled);
        }
        Ok(gathered.replies)
    }

    async fn gather(
        pending: PendingReplies,
        options: &CollectOptions,
        cancel: &CancellationToken,
    ) -> Gathered {
        let PendingReplies {
            mut subscription, ..
        } = pending;
        let started = Instant::now();
        let deadline = tokio::time::sleep(options.deadline);
        tokio::pin!(deadline);

        let mut replies = Vec::new();
        let mut cancelled = false;
        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    tracing::info!(received = replies.len(), "Reply collection cancelled");
                    cancelled = true;
                    break;
                }
                _ = &mut deadline => {
                    tracing::debug!(received = replies.len(), "Reply deadline reached");
                    break;
                }
                next = tokio::time::timeout(options.idle_timeout, subscription.next()) => {
                    match next {
                        Ok(Some(message)) => replies.extend(decode_reply(&message)),
                        Ok(None) => {
                            tracing::debug!("Reply inbox closed");
                            break;
                        }
                        Err(_) => {
                            tracing::debug!(received = replies.len(), "No reply within idle timeout");
                            break;
                        }
                    }
                }
            }
        }

        // Whatever made it into the inbox counts as delivered to its sender
        subscription.close();
        while let Some(message) = subscription.next().await {
            replies.extend(decode_reply(&message));
        }

        metrics::histogram!("booking_collect_duration_seconds")
            .record(started.elapsed().as_secs_f64());
        Gathered { replies, cancelled }
    }

    /// Folds replies, in arrival order, into one result.
    pub fn merge(replies: Vec<CapabilityReply>) -> AggregateBookingResult {
        AggregateBookingResult::merge(replies)
    }

    /// Runs the whole saga for one booking and persists the result.
    ///
    /// The booking total always comes from the pricing engine. When the
    /// pricing responder contributed a breakdown, its total must match or
    /// the booking is rejected with [`SagaError::PriceMismatch`]; without
    /// one, the booking is stored with `price_verified = false`.
    #[tracing::instrument(
        skip(self, event, cancel),
        fields(customer_id = %event.base.cust_id, quote_id = %event.base.quote_id)
    )]
    pub async fn fulfill(
        &self,
        event: &BookingCreationEvent,
        cancel: &CancellationToken,
    ) -> Result<FulfilledBooking> {
        metrics::counter!("booking_fulfillments_total").increment(1);

        let result = self.run(event, cancel).await;
        if let Err(e) = &result {
            metrics::counter!("booking_fulfillment_failed_total").increment(1);
            tracing::warn!(error = %e, "Booking fulfillment failed");
        }
        result
    }

    async fn run(
        &self,
        event: &BookingCreationEvent,
        cancel: &CancellationToken,
    ) -> Result<FulfilledBooking> {
        // Unpriceable requests are rejected before anything is broadcast
        let summary = self
            .engine
            .quote(&event.main_service, &event.addon_specs())?;

        let pending = self.publish(event).await?;
        let Gathered { replies, cancelled } = Self::gather(pending, &self.options, cancel).await;
        if cancelled {
            self.abort(event, replies, &SagaError::Cancelled).await;
            return Err(SagaError::Cancelled);
        }

        let aggregate = Self::merge(replies.clone());
        match self.finalize(event, summary, &aggregate).await {
            Ok(booking) => Ok(FulfilledBooking { booking, aggregate }),
            Err(e) => {
                self.abort(event, replies, &e).await;
                Err(e)
            }
        }
    }

    async fn finalize(
        &self,
        event: &BookingCreationEvent,
        summary: PriceSummary,
        aggregate: &AggregateBookingResult,
    ) -> Result<Booking> {
        let price_verified = match &aggregate.prices {
            Some(prices) if prices.total() != summary.total => {
                return Err(SagaError::PriceMismatch {
                    quoted: prices.total(),
                    computed: summary.total,
                });
            }
            Some(_) => true,
            None => {
                tracing::warn!("No pricing contribution, booking total is unverified");
                false
            }
        };

        let booking = Booking {
            id: BookingId::new(),
            customer_id: event.base.cust_id,
            quote_id: event.base.quote_id,
            schedule: event.base.schedule,
            main_service: summary.main_service,
            addons: summary.addons.into_iter().map(|a| a.name).collect(),
            total_price: summary.total,
            price_verified,
            cleaners: aggregate.cleaners.clone(),
            equipments: aggregate.equipments.clone(),
            resources: aggregate.resources.clone(),
            created_at: Utc::now(),
        };
        self.bookings.save(&booking).await?;

        tracing::info!(
            booking_id = %booking.id,
            total = %booking.total_price,
            price_verified,
            replies = aggregate.reply_count,
            "Booking fulfilled"
        );
        Ok(booking)
    }

    /// Broadcasts an abandoned booking with the contributions it received.
    ///
    /// Error replies reserved nothing and are left out. Nothing is sent when
    /// no responder contributed.
    async fn abort(
        &self,
        event: &BookingCreationEvent,
        replies: Vec<CapabilityReply>,
        reason: &SagaError,
    ) {
        let contributions: Vec<CapabilityReply> =
            replies.into_iter().filter(|reply| !reply.is_error()).collect();
        if contributions.is_empty() {
            return;
        }

        let aborted = BookingAbortedEvent {
            booking: event.clone(),
            contributions,
            reason: reason.to_string(),
        };
        let payload = match serde_json::to_vec(&aborted) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(error = %e, "Failed to encode aborted booking");
                return;
            }
        };

        match self.bus.publish(TOPIC_BOOKING_ABORTED, payload).await {
            Ok(_) => {
                metrics::counter!("booking_aborts_total").increment(1);
                tracing::info!(
                    contributions = aborted.contributions.len(),
                    reason = %aborted.reason,
                    "Aborted booking broadcast"
                );
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    "Failed to broadcast aborted booking, reservations remain"
                );
            }
        }
    }
}

/// Decodes one reply, or logs and drops it.
fn decode_reply(message: &Message) -> Option<CapabilityReply> {
    match serde_json::from_slice::<CapabilityReply>(&message.payload) {
        Ok(reply) => {
            metrics::counter!(
                "capability_replies_total",
                "source" => reply.source.clone()
            )
            .increment(1);
            tracing::debug!(source = %reply.source, "Reply received");
            Some(reply)
        }
        Err(e) => {
            metrics::counter!("capability_replies_malformed_total").increment(1);
            tracing::warn!(error = %e, "Discarding malformed reply");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::booking::InMemoryBookingRepository;
    use crate::events::{Address, BookingBase, Equipment, Schedule};
    use bus::{BusError, InMemoryBus};
    use common::{CustomerId, QuoteId};
    use domain::{HomeType, ServiceSpecification};

    fn event() -> BookingCreationEvent {
        let start = Utc::now();
        BookingCreationEvent {
            base: BookingBase {
                cust_id: CustomerId::new(),
                customer_first_name: "Ana".to_string(),
                customer_last_name: "Reyes".to_string(),
                address: Address {
                    address_human: "12 Mango St".to_string(),
                    address_lat: 14.55,
                    address_lng: 121.02,
                },
                schedule: Schedule::new(start, start + chrono::Duration::hours(3)),
                dirty_scale: 2,
                payment_status: "PENDING".to_string(),
                review_status: "NONE".to_string(),
                photos: Vec::new(),
                quote_id: QuoteId::new(),
            },
            main_service: ServiceSpecification::general(HomeType::House, 40.0),
            addons: Vec::new(),
        }
    }

    fn coordinator(bus: &InMemoryBus) -> BookingCoordinator<InMemoryBus, InMemoryBookingRepository> {
        BookingCoordinator::new(
            bus.clone(),
            InMemoryBookingRepository::new(),
            PricingEngine::default(),
        )
    }

    fn options(idle_ms: u64, deadline_ms: u64) -> CollectOptions {
        CollectOptions {
            idle_timeout: Duration::from_millis(idle_ms),
            deadline: Duration::from_millis(deadline_ms),
        }
    }

    fn inventory_reply(name: &str) -> Vec<u8> {
        let reply = CapabilityReply::inventory(
            "inventory",
            vec![Equipment {
                name: name.to_string(),
                quantity: 1,
            }],
            Vec::new(),
        );
        serde_json::to_vec(&reply).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn collect_without_responders_returns_empty() {
        let bus = InMemoryBus::new();
        let coordinator = coordinator(&bus);

        let started = Instant::now();
        let pending = coordinator.publish(&event()).await.unwrap();
        let replies = coordinator
            .collect(pending, &options(1000, 5000), &CancellationToken::new())
            .await
            .unwrap();

        assert!(replies.is_empty());
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(1000));
        assert!(elapsed < Duration::from_millis(1100));
    }

    #[tokio::test(start_paused = true)]
    async fn replies_before_collect_are_buffered() {
        let bus = InMemoryBus::new();
        let coordinator = coordinator(&bus);

        let pending = coordinator.publish(&event()).await.unwrap();
        bus.publish(pending.reply_subject(), inventory_reply("Mop"))
            .await
            .unwrap();

        let replies = coordinator
            .collect(pending, &options(1000, 5000), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(replies.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn idle_timeout_slides_after_each_reply() {
        let bus = InMemoryBus::new();
        let coordinator = coordinator(&bus);
        let pending = coordinator.publish(&event()).await.unwrap();
        let inbox = pending.reply_subject().to_string();

        // Three replies 800ms apart: each gap fits the 1000ms idle timeout
        let replier = bus.clone();
        tokio::spawn(async move {
            for name in ["Mop", "Vacuum", "Brush"] {
                tokio::time::sleep(Duration::from_millis(800)).await;
                replier.publish(&inbox, inventory_reply(name)).await.unwrap();
            }
        });

        let started = Instant::now();
        let replies = coordinator
            .collect(pending, &options(1000, 10_000), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(replies.len(), 3);
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(3400));
        assert!(elapsed < Duration::from_millis(3500));
    }

    #[tokio::test(start_paused = true)]
    async fn malformed_reply_is_skipped_without_ending_collection() {
        let bus = InMemoryBus::new();
        let coordinator = coordinator(&bus);
        let pending = coordinator.publish(&event()).await.unwrap();
        let inbox = pending.reply_subject().to_string();

        let replier = bus.clone();
        tokio::spawn(async move {
            replier.publish(&inbox, b"{not json".to_vec()).await.unwrap();
            tokio::time::sleep(Duration::from_millis(900)).await;
            replier.publish(&inbox, inventory_reply("Mop")).await.unwrap();
        });

        let replies = coordinator
            .collect(pending, &options(1000, 5000), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].source, "inventory");
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_bounds_chatty_responders() {
        let bus = InMemoryBus::new();
        let coordinator = coordinator(&bus);
        let pending = coordinator.publish(&event()).await.unwrap();
        let inbox = pending.reply_subject().to_string();

        let replier = bus.clone();
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(Duration::from_millis(500)).await;
                replier.publish(&inbox, inventory_reply("Mop")).await.unwrap();
            }
        });

        let started = Instant::now();
        let replies = coordinator
            .collect(pending, &options(1000, 3000), &CancellationToken::new())
            .await
            .unwrap();

        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(3000));
        assert!(elapsed < Duration::from_millis(3100));
        assert!((5..=6).contains(&replies.len()));
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_aborts_collection() {
        let bus = InMemoryBus::new();
        let coordinator = coordinator(&bus);
        let pending = coordinator.publish(&event()).await.unwrap();

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            trigger.cancel();
        });

        let result = coordinator
            .collect(pending, &options(1000, 5000), &cancel)
            .await;

        assert!(matches!(result, Err(SagaError::Cancelled)));
    }

    #[tokio::test(start_paused = true)]
    async fn replies_after_collection_are_refused() {
        let bus = InMemoryBus::new();
        let coordinator = coordinator(&bus);
        let pending = coordinator.publish(&event()).await.unwrap();
        let inbox = pending.reply_subject().to_string();

        coordinator
            .collect(pending, &options(100, 1000), &CancellationToken::new())
            .await
            .unwrap();

        let delivered = bus.publish(&inbox, inventory_reply("Mop")).await.unwrap();
        assert_eq!(delivered, 0);
    }

    /// Answers every booking event once with `reply`.
    fn spawn_replier(bus: &InMemoryBus, mut events: Subscription, reply: CapabilityReply) {
        let bus = bus.clone();
        tokio::spawn(async move {
            while let Some(message) = events.next().await {
                let reply_to = message.reply_to.unwrap();
                let payload = serde_json::to_vec(&reply).unwrap();
                bus.publish(&reply_to, payload).await.unwrap();
            }
        });
    }

    fn mop() -> CapabilityReply {
        CapabilityReply::inventory(
            "inventory",
            vec![Equipment {
                name: "Mop".to_string(),
                quantity: 1,
            }],
            Vec::new(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn failed_save_broadcasts_aborted_booking() {
        let bus = InMemoryBus::new();
        let coordinator = coordinator(&bus);
        coordinator.bookings().set_fail_on_save(true);
        let mut aborted = bus.subscribe(TOPIC_BOOKING_ABORTED).await.unwrap();
        let events = bus.subscribe(TOPIC_BOOKING_CREATED).await.unwrap();
        spawn_replier(&bus, events, mop());

        let event = event();
        let result = coordinator.fulfill(&event, &CancellationToken::new()).await;

        assert!(matches!(result, Err(SagaError::Repository(_))));
        let message = aborted.next().await.unwrap();
        let aborted: BookingAbortedEvent = serde_json::from_slice(&message.payload).unwrap();
        assert_eq!(aborted.booking, event);
        assert_eq!(aborted.contributions, vec![mop()]);
        assert!(aborted.reason.contains("repository"));
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_after_replies_broadcasts_aborted_booking() {
        let bus = InMemoryBus::new();
        let coordinator = coordinator(&bus);
        let mut aborted = bus.subscribe(TOPIC_BOOKING_ABORTED).await.unwrap();
        let events = bus.subscribe(TOPIC_BOOKING_CREATED).await.unwrap();
        spawn_replier(&bus, events, mop());

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            trigger.cancel();
        });

        let result = coordinator.fulfill(&event(), &cancel).await;

        assert!(matches!(result, Err(SagaError::Cancelled)));
        assert_eq!(coordinator.bookings().booking_count().await, 0);
        let message = aborted.next().await.unwrap();
        let aborted: BookingAbortedEvent = serde_json::from_slice(&message.payload).unwrap();
        assert_eq!(aborted.contributions.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failure_without_contributions_broadcasts_nothing() {
        let bus = InMemoryBus::new();
        let coordinator = coordinator(&bus);
        coordinator.bookings().set_fail_on_save(true);
        let mut aborted = bus.subscribe(TOPIC_BOOKING_ABORTED).await.unwrap();
        let events = bus.subscribe(TOPIC_BOOKING_CREATED).await.unwrap();
        spawn_replier(&bus, events, CapabilityReply::failure("staffing", "roster offline"));

        let result = coordinator.fulfill(&event(), &CancellationToken::new()).await;

        assert!(matches!(result, Err(SagaError::Repository(_))));
        let next = tokio::time::timeout(Duration::from_millis(100), aborted.next()).await;
        assert!(next.is_err());
    }

    #[tokio::test]
    async fn publish_on_closed_bus_is_fatal() {
        let bus = InMemoryBus::new();
        let coordinator = coordinator(&bus);
        bus.close().await;

        let result = coordinator.publish(&event()).await;

        assert!(matches!(result, Err(SagaError::Publish(BusError::Closed))));
    }
}
