//! The routing hub.
//!
//! The hub is the single authority over the client registry and the group
//! membership table. All mutation happens inside one task that drains a
//! command inbox; the maps never escape this module, so no locking is
//! needed. The hub never awaits a per-session queue: every delivery is a
//! non-blocking attempt, and a session whose queue is full is evicted
//! rather than allowed to stall everyone else.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use hermod_protocol::{ChatMessage, MessageKind};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

use crate::pool::MessagePool;
use crate::session::Session;

/// Default capacity of the hub's command inbox.
pub const DEFAULT_INBOX_CAPACITY: usize = 1024;

/// Hub handle errors.
#[derive(Debug, Error)]
pub enum HubError {
    /// The hub task is no longer running.
    #[error("Hub is not running")]
    Closed,
}

/// Requests accepted by the hub.
///
/// Registration, unregistration, and message dispatch flow through one
/// inbox so that requests from a single session are processed in
/// submission order. Interleaving across sessions is unspecified.
#[derive(Debug)]
pub enum HubCommand {
    /// Integrate a session into the registry.
    Register(Session),
    /// Remove a session by username. Safe to send more than once.
    Unregister(String),
    /// Route an inbound message.
    Dispatch(ChatMessage),
}

/// Cloneable submission handle to the hub task.
#[derive(Debug, Clone)]
pub struct HubHandle {
    tx: mpsc::Sender<HubCommand>,
}

impl HubHandle {
    /// Submit a session for registration.
    ///
    /// # Errors
    ///
    /// Returns an error if the hub task has stopped.
    pub async fn register(&self, session: Session) -> Result<(), HubError> {
        self.send(HubCommand::Register(session)).await
    }

    /// Submit an unregistration for the named user.
    ///
    /// # Errors
    ///
    /// Returns an error if the hub task has stopped.
    pub async fn unregister(&self, username: impl Into<String>) -> Result<(), HubError> {
        self.send(HubCommand::Unregister(username.into())).await
    }

    /// Submit an inbound message for routing.
    ///
    /// # Errors
    ///
    /// Returns an error if the hub task has stopped.
    pub async fn dispatch(&self, message: ChatMessage) -> Result<(), HubError> {
        self.send(HubCommand::Dispatch(message)).await
    }

    async fn send(&self, command: HubCommand) -> Result<(), HubError> {
        self.tx.send(command).await.map_err(|_| HubError::Closed)
    }
}

/// The central message router.
///
/// Owns the registry and the group table exclusively. Spawn [`Hub::run`]
/// once at startup and submit everything through the [`HubHandle`].
pub struct Hub {
    /// Registered sessions, keyed by username. Holds the only sender for
    /// each delivery queue, so removal closes the queue.
    clients: HashMap<String, Session>,
    /// Group members by group name. Never contains an empty set.
    groups: HashMap<String, HashSet<String>>,
    /// Pool that inbound messages are recycled into after routing.
    pool: Arc<MessagePool>,
    inbox: mpsc::Receiver<HubCommand>,
}

impl Hub {
    /// Create a hub and its submission handle.
    #[must_use]
    pub fn new(pool: Arc<MessagePool>) -> (Self, HubHandle) {
        Self::with_capacity(pool, DEFAULT_INBOX_CAPACITY)
    }

    /// Create a hub with a custom inbox capacity.
    #[must_use]
    pub fn with_capacity(pool: Arc<MessagePool>, inbox_capacity: usize) -> (Self, HubHandle) {
        let (tx, inbox) = mpsc::channel(inbox_capacity);
        let hub = Self {
            clients: HashMap::new(),
            groups: HashMap::new(),
            pool,
            inbox,
        };
        (hub, HubHandle { tx })
    }

    /// Drain the inbox until every handle is dropped.
    ///
    /// Request processing never fails: malformed or unroutable messages are
    /// dropped, not surfaced, since one bad message must not take down
    /// routing for everyone else.
    pub async fn run(mut self) {
        info!("Hub started");
        while let Some(command) = self.inbox.recv().await {
            self.handle(command);
        }
        info!("Hub stopped");
    }

    /// Number of registered sessions.
    #[must_use]
    pub fn user_count(&self) -> usize {
        self.clients.len()
    }

    /// Check whether a username is currently registered.
    #[must_use]
    pub fn is_registered(&self, username: &str) -> bool {
        self.clients.contains_key(username)
    }

    /// Number of groups with at least one member.
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Get a group's member usernames, if the group exists.
    #[must_use]
    pub fn group_members(&self, group: &str) -> Option<Vec<String>> {
        self.groups
            .get(group)
            .map(|members| members.iter().cloned().collect())
    }

    fn handle(&mut self, command: HubCommand) {
        match command {
            HubCommand::Register(session) => self.register_session(session),
            HubCommand::Unregister(username) => self.unregister_session(&username),
            HubCommand::Dispatch(message) => self.dispatch_message(message),
        }
    }

    /// Insert a session, overwriting any stale entry with the same name.
    /// Duplicate-username prevention is the transport boundary's job.
    fn register_session(&mut self, session: Session) {
        info!(user = %session.username(), "Registering client");
        self.clients
            .insert(session.username().to_string(), session);
        self.broadcast_user_list();
    }

    /// Remove a session and scrub it from every group. A username that is
    /// not registered is a no-op, which makes duplicate unregister requests
    /// from racing disconnect paths harmless.
    fn unregister_session(&mut self, username: &str) {
        if self.clients.remove(username).is_none() {
            return;
        }
        info!(user = %username, "Unregistering client");
        self.groups.retain(|group, members| {
            members.remove(username);
            if members.is_empty() {
                debug!(group = %group, "Deleted empty group");
                false
            } else {
                true
            }
        });
        self.broadcast_user_list();
    }

    fn dispatch_message(&mut self, message: ChatMessage) {
        trace!(
            kind = %message.kind,
            from = %message.sender,
            to = %message.recipient,
            "Routing message"
        );
        match message.kind {
            MessageKind::PrivateMessage => self.private_message(message),
            MessageKind::JoinGroup => self.join_group(message),
            MessageKind::LeaveGroup => self.leave_group(message),
            MessageKind::GroupMessage => self.group_message(message),
            // user_list is server-generated; unknown kinds are newer
            // clients' business, not a reason to fail.
            MessageKind::UserList | MessageKind::Unknown => self.pool.recycle(message),
        }
    }

    fn private_message(&mut self, message: ChatMessage) {
        if !self.clients.contains_key(&message.recipient) {
            trace!(to = %message.recipient, "Dropped message for unknown recipient");
            self.pool.recycle(message);
            return;
        }

        let shared = Arc::new(message);
        let delivered = self
            .clients
            .get(&shared.recipient)
            .is_some_and(|session| session.try_deliver(Arc::clone(&shared)).is_ok());
        if !delivered {
            let username = shared.recipient.clone();
            self.evict(&username);
        }
        self.pool.recycle_shared(shared);
    }

    fn join_group(&mut self, message: ChatMessage) {
        match message.content.as_text() {
            // Only live sessions can hold membership.
            Ok(group) if self.clients.contains_key(&message.sender) => {
                self.groups
                    .entry(group.to_string())
                    .or_default()
                    .insert(message.sender.clone());
                debug!(user = %message.sender, group = %group, "User joined group");
            }
            Ok(group) => {
                trace!(user = %message.sender, group = %group, "Join from unknown sender dropped");
            }
            Err(e) => warn!(user = %message.sender, error = %e, "Ignored join request"),
        }
        self.pool.recycle(message);
    }

    fn leave_group(&mut self, message: ChatMessage) {
        match message.content.as_text() {
            Ok(group) if self.clients.contains_key(&message.sender) => {
                if let Some(members) = self.groups.get_mut(group) {
                    members.remove(message.sender.as_str());
                    debug!(user = %message.sender, group = %group, "User left group");
                    if members.is_empty() {
                        self.groups.remove(group);
                        debug!(group = %group, "Deleted empty group");
                    }
                }
            }
            Ok(group) => {
                trace!(user = %message.sender, group = %group, "Leave from unknown sender dropped");
            }
            Err(e) => warn!(user = %message.sender, error = %e, "Ignored leave request"),
        }
        self.pool.recycle(message);
    }

    fn group_message(&mut self, message: ChatMessage) {
        let Some(members) = self.groups.get(&message.recipient) else {
            trace!(group = %message.recipient, "Dropped message for unknown group");
            self.pool.recycle(message);
            return;
        };

        let targets: Vec<String> = members
            .iter()
            .filter(|member| **member != message.sender)
            .cloned()
            .collect();

        let group = message.recipient.clone();
        let shared = Arc::new(message);
        let mut dead = Vec::new();
        for member in targets {
            // Membership can be stale (a member evicted elsewhere still
            // appears here until its unregister lands); the registry is
            // authoritative, so such members are skipped.
            let Some(session) = self.clients.get(&member) else {
                continue;
            };
            if session.try_deliver(Arc::clone(&shared)).is_err() {
                dead.push(member);
            }
        }

        // A dead consumer found mid-fanout is evicted from the registry and
        // this group only; its other memberships wait for the unregister.
        for member in &dead {
            self.evict(member);
        }
        if !dead.is_empty() {
            if let Some(members) = self.groups.get_mut(&group) {
                for member in &dead {
                    members.remove(member.as_str());
                }
                if members.is_empty() {
                    self.groups.remove(&group);
                    debug!(group = %group, "Deleted empty group");
                }
            }
        }
        self.pool.recycle_shared(shared);
    }

    /// Push the current username roster to every registered session.
    ///
    /// The payload is shared across all queues, so the message is built
    /// fresh rather than drawn from the pool.
    fn broadcast_user_list(&mut self) {
        let users: Vec<String> = self.clients.keys().cloned().collect();
        let shared = Arc::new(ChatMessage::user_list(users));

        let mut dead = Vec::new();
        for (username, session) in &self.clients {
            if session.try_deliver(Arc::clone(&shared)).is_err() {
                dead.push(username.clone());
            }
        }
        for username in &dead {
            self.evict(username);
        }
        debug!(users = self.clients.len(), "Broadcast user list");
    }

    /// Drop a session whose queue would not accept a delivery. Removing the
    /// registry entry drops the only sender, closing the queue.
    fn evict(&mut self, username: &str) {
        if self.clients.remove(username).is_some() {
            warn!(user = %username, "Evicted unresponsive client");
        }
    }
}
