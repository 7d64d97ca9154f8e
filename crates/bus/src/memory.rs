use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::{RwLock, mpsc};

use crate::{BusError, Message, MessageBus, Result, Subscription};

/// In-process message bus.
///
/// Each subscription owns an unbounded channel; publishing clones the
/// message into every live channel for the subject. Channels whose
/// subscription was dropped or closed are pruned on every publish to their
/// subject and, across all subjects, on every subscribe, so single-use
/// reply inboxes do not accumulate.
#[derive(Clone, Default)]
pub struct InMemoryBus {
    subscribers: Arc<RwLock<HashMap<String, Vec<mpsc::UnboundedSender<Message>>>>>,
    closed: Arc<AtomicBool>,
}

impl InMemoryBus {
    /// Creates a new open bus with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Shuts the bus down.
    ///
    /// Every later publish or subscribe fails with [`BusError::Closed`], and
    /// existing subscriptions end once their buffered messages are drained.
    pub async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.subscribers.write().await.clear();
        tracing::info!("Message bus closed");
    }

    /// Returns true once [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Returns the number of live subscriptions on a subject.
    pub async fn subscriber_count(&self, subject: &str) -> usize {
        self.subscribers
            .read()
            .await
            .get(subject)
            .map(|senders| senders.iter().filter(|tx| !tx.is_closed()).count())
            .unwrap_or(0)
    }

    /// Returns the number of subjects with at least one registered channel.
    pub async fn subject_count(&self) -> usize {
        self.subscribers.read().await.len()
    }
}

#[async_trait]
impl MessageBus for InMemoryBus {
    async fn send(&self, message: Message) -> Result<usize> {
        if self.is_closed() {
            return Err(BusError::Closed);
        }

        let mut subscribers = self.subscribers.write().await;
        let Some(senders) = subscribers.get_mut(&message.subject) else {
            tracing::trace!(subject = %message.subject, "No subscribers for subject");
            return Ok(0);
        };

        senders.retain(|tx| tx.send(message.clone()).is_ok());
        let delivered = senders.len();
        if senders.is_empty() {
            subscribers.remove(&message.subject);
        }

        tracing::trace!(subject = %message.subject, delivered, "Message published");
        metrics::counter!("bus_messages_published_total").increment(1);
        Ok(delivered)
    }

    async fn subscribe(&self, subject: &str) -> Result<Subscription> {
        if self.is_closed() {
            return Err(BusError::Closed);
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let mut subscribers = self.subscribers.write().await;
        subscribers.retain(|_, senders| {
            senders.retain(|tx| !tx.is_closed());
            !senders.is_empty()
        });
        subscribers.entry(subject.to_string()).or_default().push(tx);

        tracing::debug!(subject, "Subscribed");
        Ok(Subscription::new(subject, rx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::INBOX_PREFIX;

    #[tokio::test]
    async fn publish_reaches_every_subscriber() {
        let bus = InMemoryBus::new();
        let mut first = bus.subscribe("booking.created").await.unwrap();
        let mut second = bus.subscribe("booking.created").await.unwrap();

        bus.publish("booking.created", b"hello".to_vec())
            .await
            .unwrap();

        let a = first.next().await.unwrap();
        let b = second.next().await.unwrap();
        assert_eq!(a.payload, b"hello");
        assert_eq!(a, b);
        assert!(a.reply_to.is_none());
    }

    #[tokio::test]
    async fn publish_without_subscribers_succeeds() {
        let bus = InMemoryBus::new();
        let delivered = bus.publish("nobody.listens", Vec::new()).await.unwrap();
        assert_eq!(delivered, 0);
    }

    #[tokio::test]
    async fn publish_reports_delivery_count() {
        let bus = InMemoryBus::new();
        let _a = bus.subscribe("booking.created").await.unwrap();
        let _b = bus.subscribe("booking.created").await.unwrap();

        let delivered = bus.publish("booking.created", Vec::new()).await.unwrap();

        assert_eq!(delivered, 2);
    }

    #[tokio::test]
    async fn closed_subscription_drains_then_refuses() {
        let bus = InMemoryBus::new();
        let mut inbox = bus.subscribe("reply").await.unwrap();
        bus.publish("reply", b"early".to_vec()).await.unwrap();

        inbox.close();
        let late = bus.publish("reply", b"late".to_vec()).await.unwrap();

        assert_eq!(late, 0);
        assert_eq!(inbox.next().await.unwrap().payload, b"early");
        assert!(inbox.next().await.is_none());
    }

    #[tokio::test]
    async fn dropped_inboxes_do_not_accumulate() {
        let bus = InMemoryBus::new();
        let _events = bus.subscribe("booking.created").await.unwrap();

        for _ in 0..100 {
            let inbox = bus.new_inbox();
            let mut sub = bus.subscribe(&inbox).await.unwrap();
            bus.publish(&inbox, b"reply".to_vec()).await.unwrap();
            sub.next().await.unwrap();
            drop(sub);
        }

        // The last inbox is only pruned by the next subscribe
        assert!(bus.subject_count().await <= 2);
        let _more = bus.subscribe("booking.created").await.unwrap();
        assert_eq!(bus.subject_count().await, 1);
    }

    #[tokio::test]
    async fn subjects_are_isolated() {
        let bus = InMemoryBus::new();
        let mut other = bus.subscribe("other").await.unwrap();

        bus.publish("booking.created", b"x".to_vec()).await.unwrap();
        bus.publish("other", b"y".to_vec()).await.unwrap();

        assert_eq!(other.next().await.unwrap().payload, b"y");
    }

    #[tokio::test]
    async fn request_carries_reply_address() {
        let bus = InMemoryBus::new();
        let mut sub = bus.subscribe("booking.created").await.unwrap();
        let inbox = bus.new_inbox();

        bus.publish_request("booking.created", &inbox, b"{}".to_vec())
            .await
            .unwrap();

        let message = sub.next().await.unwrap();
        assert_eq!(message.reply_to.as_deref(), Some(inbox.as_str()));
    }

    #[tokio::test]
    async fn inboxes_are_unique() {
        let bus = InMemoryBus::new();
        let a = bus.new_inbox();
        let b = bus.new_inbox();
        assert_ne!(a, b);
        assert!(a.starts_with(INBOX_PREFIX));
    }

    #[tokio::test]
    async fn dropped_subscription_is_pruned() {
        let bus = InMemoryBus::new();
        let sub = bus.subscribe("reply").await.unwrap();
        let mut kept = bus.subscribe("reply").await.unwrap();
        drop(sub);

        bus.publish("reply", b"1".to_vec()).await.unwrap();

        assert_eq!(bus.subscriber_count("reply").await, 1);
        assert_eq!(kept.next().await.unwrap().payload, b"1");
    }

    #[tokio::test]
    async fn closed_bus_rejects_publish_and_subscribe() {
        let bus = InMemoryBus::new();
        let mut sub = bus.subscribe("booking.created").await.unwrap();

        bus.close().await;

        assert!(matches!(
            bus.publish("booking.created", Vec::new()).await,
            Err(BusError::Closed)
        ));
        assert!(matches!(
            bus.subscribe("booking.created").await,
            Err(BusError::Closed)
        ));
        assert!(sub.next().await.is_none());
    }

    #[tokio::test]
    async fn buffered_messages_survive_close() {
        let bus = InMemoryBus::new();
        let mut sub = bus.subscribe("reply").await.unwrap();
        bus.publish("reply", b"late".to_vec()).await.unwrap();

        bus.close().await;

        assert_eq!(sub.next().await.unwrap().payload, b"late");
        assert!(sub.next().await.is_none());
    }
}
