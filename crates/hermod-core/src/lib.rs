//! # hermod-core
//!
//! Routing hub, session handles, and message pooling for the hermod chat
//! router.
//!
//! This crate provides the fundamental building blocks:
//!
//! - **Hub** - the single task that owns the client registry and group
//!   table and routes every message
//! - **Session** - a connected user's handle and bounded delivery queue
//! - **MessagePool** - reuse pool for inbound messages
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐ commands ┌─────────────┐ try_deliver ┌─────────────┐
//! │  Connection │─────────▶│     Hub     │────────────▶│   Session   │
//! └─────────────┘          └─────────────┘             └─────────────┘
//!        ▲                        │                           │
//!        └────────────────────────┼───────────────────────────┘
//!                                 ▼          delivery queue
//!                          ┌─────────────┐
//!                          │ MessagePool │
//!                          └─────────────┘
//! ```
//!
//! All registry and group mutation happens inside the hub task; connections
//! interact with it only through a [`HubHandle`], and the hub reaches a
//! connection only through its session's delivery queue.

pub mod hub;
pub mod pool;
pub mod session;

pub use hub::{Hub, HubCommand, HubError, HubHandle, DEFAULT_INBOX_CAPACITY};
pub use pool::{MessagePool, DEFAULT_POOL_CAPACITY};
pub use session::{DeliveryError, Session, DEFAULT_QUEUE_CAPACITY};
