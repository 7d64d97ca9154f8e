use tokio::sync::mpsc;

/// A message as delivered on a subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// The subject the message was published to.
    pub subject: String,
    /// Where a reply should be published, if the sender wants one.
    pub reply_to: Option<String>,
    /// Opaque payload bytes (JSON for booking traffic).
    pub payload: Vec<u8>,
}

impl Message {
    /// Creates a message without a reply address.
    pub fn new(subject: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            subject: subject.into(),
            reply_to: None,
            payload,
        }
    }

    /// Attaches a reply address.
    pub fn with_reply_to(mut self, reply_to: impl Into<String>) -> Self {
        self.reply_to = Some(reply_to.into());
        self
    }
}

/// A stream of messages for one subject.
///
/// Dropping the subscription unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    subject: String,
    receiver: mpsc::UnboundedReceiver<Message>,
}

impl Subscription {
    /// Wraps a receiver fed by a bus implementation.
    pub fn new(subject: impl Into<String>, receiver: mpsc::UnboundedReceiver<Message>) -> Self {
        Self {
            subject: subject.into(),
            receiver,
        }
    }

    /// Returns the subscribed subject.
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Waits for the next message.
    ///
    /// Returns None once the bus has dropped this subscription. Cancel-safe:
    /// dropping the future never loses a message.
    pub async fn next(&mut self) -> Option<Message> {
        self.receiver.recv().await
    }

    /// Stops accepting new messages.
    ///
    /// Messages already buffered are still returned by [`next`](Self::next),
    /// which yields None once they are drained. Publishers see a closed
    /// subscription as not delivered to.
    pub fn close(&mut self) {
        self.receiver.close();
    }
}
