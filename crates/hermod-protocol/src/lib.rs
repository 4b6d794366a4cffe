//! # hermod-protocol
//!
//! Wire message definitions for the hermod chat router.
//!
//! This crate defines the JSON message format exchanged between chat
//! clients and the server, and the codec that enforces it at the transport
//! boundary — the routing hub itself never serializes anything.
//!
//! ## Message shape
//!
//! ```json
//! {"type": "private_message", "content": "hi", "sender": "alice", "recipient": "bob"}
//! ```
//!
//! `content` is polymorphic: chat text and group names are a string, while
//! server-generated `user_list` messages carry an array of usernames.
//!
//! ## Example
//!
//! ```rust
//! use hermod_protocol::{codec, ChatMessage};
//!
//! let message = ChatMessage::private("alice", "bob", "hello");
//! let encoded = codec::encode(&message).unwrap();
//! let decoded = codec::decode(&encoded).unwrap();
//! assert_eq!(message, decoded);
//! ```

pub mod codec;
pub mod message;

pub use codec::{decode, encode, ProtocolError, MAX_MESSAGE_SIZE};
pub use message::{ChatMessage, Content, MessageKind};
