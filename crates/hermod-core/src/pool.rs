//! Message pooling.
//!
//! Inbound messages are acquired from a shared pool before decoding and
//! recycled once routing is done with them, trimming allocation churn under
//! load. Recycling resets every field, so a reused message can never leak a
//! previous payload. The pool is an optimization only: dropping a message
//! instead of recycling it is always correct.

use std::sync::{Arc, Mutex, PoisonError};

use hermod_protocol::ChatMessage;

/// Maximum number of messages the pool retains.
pub const DEFAULT_POOL_CAPACITY: usize = 1024;

/// A bounded free-list of reusable messages.
#[derive(Debug)]
pub struct MessagePool {
    slots: Mutex<Vec<ChatMessage>>,
    capacity: usize,
}

impl MessagePool {
    /// Create a pool with the default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_POOL_CAPACITY)
    }

    /// Create a pool retaining at most `capacity` messages.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Mutex::new(Vec::new()),
            capacity,
        }
    }

    /// Take a reset message from the pool, or allocate a fresh one.
    #[must_use]
    pub fn acquire(&self) -> ChatMessage {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop()
            .unwrap_or_default()
    }

    /// Reset a message and return it to the pool.
    ///
    /// Messages beyond the pool's capacity are simply dropped.
    pub fn recycle(&self, mut message: ChatMessage) {
        message.reset();
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        if slots.len() < self.capacity {
            slots.push(message);
        }
    }

    /// Recycle a shared message if this is the last reference to it.
    ///
    /// Queues still holding the message keep it alive; the final holder to
    /// drop its reference is the one that returns it to the pool.
    pub fn recycle_shared(&self, message: Arc<ChatMessage>) {
        if let Some(message) = Arc::into_inner(message) {
            self.recycle(message);
        }
    }

    /// Number of messages currently pooled.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Check whether the pool is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MessagePool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recycle_resets_message() {
        let pool = MessagePool::new();
        pool.recycle(ChatMessage::private("alice", "bob", "secret"));

        let message = pool.acquire();
        assert_eq!(message, ChatMessage::default());
        assert!(message.sender.is_empty());
        assert!(message.content.as_text().unwrap().is_empty());
    }

    #[test]
    fn test_acquire_reuses_slots() {
        let pool = MessagePool::new();
        assert!(pool.is_empty());

        pool.recycle(ChatMessage::default());
        assert_eq!(pool.len(), 1);

        let _message = pool.acquire();
        assert!(pool.is_empty());
    }

    #[test]
    fn test_capacity_is_respected() {
        let pool = MessagePool::with_capacity(2);
        for _ in 0..5 {
            pool.recycle(ChatMessage::default());
        }
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_recycle_shared_last_reference() {
        let pool = MessagePool::new();
        let shared = Arc::new(ChatMessage::private("alice", "bob", "hi"));
        let held = Arc::clone(&shared);

        // Another holder is alive: nothing returns to the pool.
        pool.recycle_shared(shared);
        assert!(pool.is_empty());

        // Last reference: the message comes back reset.
        pool.recycle_shared(held);
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.acquire(), ChatMessage::default());
    }
}
