use async_trait::async_trait;
use uuid::Uuid;

use crate::{Message, Result, Subscription};

/// Prefix of single-use reply subjects.
pub const INBOX_PREFIX: &str = "_INBOX.";

/// Subject-based publish/subscribe transport.
///
/// Delivery is at-most-once and fire-and-forget: publishing to a subject
/// nobody listens on succeeds. The only feedback is how many live
/// subscriptions the message was handed to.
#[async_trait]
pub trait MessageBus: Send + Sync {
    /// Delivers a message to every current subscriber of its subject.
    ///
    /// Returns the number of subscriptions that accepted it.
    async fn send(&self, message: Message) -> Result<usize>;

    /// Subscribes to a subject.
    async fn subscribe(&self, subject: &str) -> Result<Subscription>;

    /// Returns a fresh, unique reply subject.
    fn new_inbox(&self) -> String {
        format!("{INBOX_PREFIX}{}", Uuid::new_v4().simple())
    }

    /// Publishes a payload with no reply address.
    async fn publish(&self, subject: &str, payload: Vec<u8>) -> Result<usize> {
        self.send(Message::new(subject, payload)).await
    }

    /// Publishes a payload asking for replies on `reply_to`.
    async fn publish_request(
        &self,
        subject: &str,
        reply_to: &str,
        payload: Vec<u8>,
    ) -> Result<usize> {
        self.send(Message::new(subject, payload).with_reply_to(reply_to))
            .await
    }
}
