//! Client session handles.
//!
//! A [`Session`] is the hub's view of one connected user: the username and
//! the sender half of that user's bounded delivery queue. The connection
//! task keeps the receiver half and drains it independently; the queue is
//! the only state shared between the hub and a connection.

use std::sync::Arc;

use hermod_protocol::ChatMessage;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::debug;

/// Default delivery queue capacity.
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Delivery failures.
///
/// Both variants mean the same thing to the hub: the consumer is not
/// keeping up (or is already gone) and the session must be evicted.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DeliveryError {
    /// The delivery queue is at capacity.
    #[error("Delivery queue is full")]
    QueueFull,

    /// The receiver half has been dropped.
    #[error("Delivery queue is closed")]
    QueueClosed,
}

/// A connected user's live handle.
///
/// After registration the hub's registry owns the only sender, so removing
/// the session from the registry closes the queue — that is the sole
/// termination signal the connection task receives.
#[derive(Debug)]
pub struct Session {
    username: String,
    outbox: mpsc::Sender<Arc<ChatMessage>>,
}

impl Session {
    /// Create a session and the receiver half of its delivery queue.
    ///
    /// The receiver stays with the connection task; the session goes to the
    /// hub via registration.
    #[must_use]
    pub fn channel(
        username: impl Into<String>,
        capacity: usize,
    ) -> (Self, mpsc::Receiver<Arc<ChatMessage>>) {
        let username = username.into();
        let (outbox, rx) = mpsc::channel(capacity);
        debug!(user = %username, capacity, "Created session");
        (Self { username, outbox }, rx)
    }

    /// Get the session's username.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Attempt a non-blocking enqueue onto the delivery queue.
    ///
    /// # Errors
    ///
    /// Returns an error if the queue is full or closed; the hub treats
    /// either as a dead consumer.
    pub fn try_deliver(&self, message: Arc<ChatMessage>) -> Result<(), DeliveryError> {
        self.outbox.try_send(message).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => DeliveryError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => DeliveryError::QueueClosed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_username() {
        let (session, _rx) = Session::channel("alice", 4);
        assert_eq!(session.username(), "alice");
    }

    #[test]
    fn test_try_deliver_preserves_order() {
        let (session, mut rx) = Session::channel("alice", 4);

        session
            .try_deliver(Arc::new(ChatMessage::private("bob", "alice", "first")))
            .unwrap();
        session
            .try_deliver(Arc::new(ChatMessage::private("bob", "alice", "second")))
            .unwrap();

        assert_eq!(rx.try_recv().unwrap().content.as_text().unwrap(), "first");
        assert_eq!(rx.try_recv().unwrap().content.as_text().unwrap(), "second");
    }

    #[test]
    fn test_try_deliver_full_queue() {
        let (session, _rx) = Session::channel("alice", 1);
        let message = Arc::new(ChatMessage::private("bob", "alice", "hi"));

        session.try_deliver(Arc::clone(&message)).unwrap();
        assert_eq!(
            session.try_deliver(message),
            Err(DeliveryError::QueueFull)
        );
    }

    #[test]
    fn test_try_deliver_closed_queue() {
        let (session, rx) = Session::channel("alice", 1);
        drop(rx);

        assert_eq!(
            session.try_deliver(Arc::new(ChatMessage::private("bob", "alice", "hi"))),
            Err(DeliveryError::QueueClosed)
        );
    }

    #[test]
    fn test_dropping_session_closes_queue() {
        let (session, mut rx) = Session::channel("alice", 1);
        drop(session);

        assert!(matches!(
            rx.try_recv(),
            Err(mpsc::error::TryRecvError::Disconnected)
        ));
    }
}
