//! Message types for the hermod wire protocol.
//!
//! Every frame exchanged with a client is a single JSON object with
//! `type`, `content`, `sender`, and `recipient` fields. The same shape is
//! routed internally by the hub; serialization happens only at the
//! transport boundary.

use serde::{Deserialize, Serialize};

use crate::codec::ProtocolError;

/// Message type tags.
///
/// Unrecognized tags decode to [`MessageKind::Unknown`] so that a newer
/// client cannot take the router down with a type it doesn't understand.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MessageKind {
    /// Direct message to a single user.
    PrivateMessage,
    /// Request to join a group; the group name travels in `content`.
    JoinGroup,
    /// Request to leave a group; the group name travels in `content`.
    LeaveGroup,
    /// Message to every member of a group except the sender.
    GroupMessage,
    /// Server-generated roster of all connected usernames.
    UserList,
    /// Any tag this version does not recognize.
    #[default]
    Unknown,
}

impl MessageKind {
    /// Get the wire tag for this kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::PrivateMessage => "private_message",
            MessageKind::JoinGroup => "join_group",
            MessageKind::LeaveGroup => "leave_group",
            MessageKind::GroupMessage => "group_message",
            MessageKind::UserList => "user_list",
            MessageKind::Unknown => "unknown",
        }
    }
}

impl From<String> for MessageKind {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "private_message" => MessageKind::PrivateMessage,
            "join_group" => MessageKind::JoinGroup,
            "leave_group" => MessageKind::LeaveGroup,
            "group_message" => MessageKind::GroupMessage,
            "user_list" => MessageKind::UserList,
            _ => MessageKind::Unknown,
        }
    }
}

impl From<MessageKind> for String {
    fn from(kind: MessageKind) -> String {
        kind.as_str().to_string()
    }
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Polymorphic message payload.
///
/// Chat text and group names travel as a plain string; user-list payloads
/// are an ordered sequence of usernames. The accessors fail with a decoding
/// error when the variant doesn't match what the message kind requires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Content {
    /// Chat text or a group name.
    Text(String),
    /// Ordered list of usernames (user-list payloads).
    Users(Vec<String>),
}

impl Content {
    /// Get the text payload.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload is a user list.
    pub fn as_text(&self) -> Result<&str, ProtocolError> {
        match self {
            Content::Text(text) => Ok(text),
            Content::Users(_) => Err(ProtocolError::UnexpectedContent {
                expected: "text",
                found: "user list",
            }),
        }
    }

    /// Get the user-list payload.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload is plain text.
    pub fn as_users(&self) -> Result<&[String], ProtocolError> {
        match self {
            Content::Users(users) => Ok(users),
            Content::Text(_) => Err(ProtocolError::UnexpectedContent {
                expected: "user list",
                found: "text",
            }),
        }
    }

    /// Reset to an empty text payload, keeping the allocation where possible.
    pub fn reset(&mut self) {
        match self {
            Content::Text(text) => text.clear(),
            Content::Users(_) => *self = Content::Text(String::new()),
        }
    }
}

impl Default for Content {
    fn default() -> Self {
        Content::Text(String::new())
    }
}

impl From<String> for Content {
    fn from(text: String) -> Self {
        Content::Text(text)
    }
}

impl From<&str> for Content {
    fn from(text: &str) -> Self {
        Content::Text(text.to_string())
    }
}

impl From<Vec<String>> for Content {
    fn from(users: Vec<String>) -> Self {
        Content::Users(users)
    }
}

/// A routed chat message.
///
/// `recipient` names a user for private messages and a group for group
/// messages; membership operations carry the group name in `content`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Message type tag.
    #[serde(rename = "type", default)]
    pub kind: MessageKind,
    /// Payload: text, group name, or username list depending on `kind`.
    #[serde(default)]
    pub content: Content,
    /// Username of the sender. Stamped by the server, never trusted from
    /// the wire.
    #[serde(default)]
    pub sender: String,
    /// Target username or group name.
    #[serde(default)]
    pub recipient: String,
}

impl ChatMessage {
    /// Create a private message.
    #[must_use]
    pub fn private(
        sender: impl Into<String>,
        recipient: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            kind: MessageKind::PrivateMessage,
            content: Content::Text(text.into()),
            sender: sender.into(),
            recipient: recipient.into(),
        }
    }

    /// Create a group message.
    #[must_use]
    pub fn group(
        sender: impl Into<String>,
        group: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            kind: MessageKind::GroupMessage,
            content: Content::Text(text.into()),
            sender: sender.into(),
            recipient: group.into(),
        }
    }

    /// Create a join-group request.
    #[must_use]
    pub fn join_group(sender: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::JoinGroup,
            content: Content::Text(group.into()),
            sender: sender.into(),
            recipient: String::new(),
        }
    }

    /// Create a leave-group request.
    #[must_use]
    pub fn leave_group(sender: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::LeaveGroup,
            content: Content::Text(group.into()),
            sender: sender.into(),
            recipient: String::new(),
        }
    }

    /// Create a server-generated user-list broadcast.
    #[must_use]
    pub fn user_list(users: Vec<String>) -> Self {
        Self {
            kind: MessageKind::UserList,
            content: Content::Users(users),
            sender: String::new(),
            recipient: String::new(),
        }
    }

    /// Clear every field so the message can be reused for a fresh payload.
    pub fn reset(&mut self) {
        self.kind = MessageKind::Unknown;
        self.content.reset();
        self.sender.clear();
        self.recipient.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_tag_conversion() {
        assert_eq!(
            MessageKind::from("private_message".to_string()),
            MessageKind::PrivateMessage
        );
        assert_eq!(
            MessageKind::from("user_list".to_string()),
            MessageKind::UserList
        );
        assert_eq!(
            MessageKind::from("something_new".to_string()),
            MessageKind::Unknown
        );
        assert_eq!(MessageKind::GroupMessage.as_str(), "group_message");
    }

    #[test]
    fn test_content_accessors() {
        let text = Content::from("hello");
        assert_eq!(text.as_text().unwrap(), "hello");
        assert!(text.as_users().is_err());

        let users = Content::from(vec!["alice".to_string(), "bob".to_string()]);
        assert_eq!(users.as_users().unwrap().len(), 2);
        assert!(users.as_text().is_err());
    }

    #[test]
    fn test_content_reset() {
        let mut content = Content::from(vec!["alice".to_string()]);
        content.reset();
        assert_eq!(content, Content::Text(String::new()));
    }

    #[test]
    fn test_message_constructors() {
        let msg = ChatMessage::private("alice", "bob", "hi");
        assert_eq!(msg.kind, MessageKind::PrivateMessage);
        assert_eq!(msg.recipient, "bob");
        assert_eq!(msg.content.as_text().unwrap(), "hi");

        let msg = ChatMessage::join_group("alice", "g1");
        assert_eq!(msg.kind, MessageKind::JoinGroup);
        assert_eq!(msg.content.as_text().unwrap(), "g1");
        assert!(msg.recipient.is_empty());

        let msg = ChatMessage::user_list(vec!["alice".to_string()]);
        assert_eq!(msg.kind, MessageKind::UserList);
        assert_eq!(msg.content.as_users().unwrap(), ["alice".to_string()]);
    }

    #[test]
    fn test_message_reset() {
        let mut msg = ChatMessage::group("alice", "g1", "hello");
        msg.reset();
        assert_eq!(msg, ChatMessage::default());
        assert_eq!(msg.kind, MessageKind::Unknown);
    }
}
