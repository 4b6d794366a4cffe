//! Codec for encoding and decoding hermod messages.
//!
//! Messages travel as single JSON text frames over the WebSocket; the
//! WebSocket layer already provides framing, so no length prefix is needed.

use thiserror::Error;

use crate::message::ChatMessage;

/// Maximum serialized message size (64 KiB).
pub const MAX_MESSAGE_SIZE: usize = 64 * 1024;

/// Protocol errors that can occur during encoding/decoding.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Message exceeds maximum size.
    #[error("Message size {0} exceeds maximum {MAX_MESSAGE_SIZE}")]
    MessageTooLarge(usize),

    /// JSON encoding/decoding error.
    #[error("Malformed message: {0}")]
    Json(#[from] serde_json::Error),

    /// Payload variant does not match the message kind.
    #[error("Expected {expected} content, found {found}")]
    UnexpectedContent {
        expected: &'static str,
        found: &'static str,
    },
}

/// Encode a message to a JSON text frame.
///
/// # Errors
///
/// Returns an error if the message is too large or serialization fails.
pub fn encode(message: &ChatMessage) -> Result<String, ProtocolError> {
    let text = serde_json::to_string(message)?;
    if text.len() > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge(text.len()));
    }
    Ok(text)
}

/// Decode a message from a JSON text frame.
///
/// # Errors
///
/// Returns an error if the frame is too large or malformed.
pub fn decode(text: &str) -> Result<ChatMessage, ProtocolError> {
    if text.len() > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge(text.len()));
    }
    Ok(serde_json::from_str(text)?)
}

/// Decode a frame into an existing message slot.
///
/// On error the slot is left reset rather than holding a half-decoded
/// payload.
///
/// # Errors
///
/// Returns an error if the frame is too large or malformed.
pub fn decode_into(text: &str, slot: &mut ChatMessage) -> Result<(), ProtocolError> {
    match decode(text) {
        Ok(message) => {
            *slot = message;
            Ok(())
        }
        Err(e) => {
            slot.reset();
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{Content, MessageKind};

    #[test]
    fn test_encode_decode_roundtrip() {
        let messages = vec![
            ChatMessage::private("alice", "bob", "hello"),
            ChatMessage::group("alice", "g1", "hi all"),
            ChatMessage::join_group("bob", "g1"),
            ChatMessage::leave_group("bob", "g1"),
            ChatMessage::user_list(vec!["alice".to_string(), "bob".to_string()]),
        ];

        for message in messages {
            let encoded = encode(&message).unwrap();
            let decoded = decode(&encoded).unwrap();
            assert_eq!(message, decoded);
        }
    }

    #[test]
    fn test_wire_field_names() {
        let encoded = encode(&ChatMessage::private("alice", "bob", "hi")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&encoded).unwrap();
        assert_eq!(value["type"], "private_message");
        assert_eq!(value["content"], "hi");
        assert_eq!(value["sender"], "alice");
        assert_eq!(value["recipient"], "bob");
    }

    #[test]
    fn test_decode_unknown_type() {
        let decoded = decode(r#"{"type":"emoji_reaction","content":"x","sender":"a","recipient":"b"}"#)
            .unwrap();
        assert_eq!(decoded.kind, MessageKind::Unknown);
    }

    #[test]
    fn test_decode_missing_fields() {
        let decoded = decode(r#"{"type":"join_group","content":"g1"}"#).unwrap();
        assert_eq!(decoded.kind, MessageKind::JoinGroup);
        assert!(decoded.sender.is_empty());
        assert!(decoded.recipient.is_empty());
    }

    #[test]
    fn test_decode_user_list_content() {
        let decoded = decode(r#"{"type":"user_list","content":["alice","bob"]}"#).unwrap();
        assert_eq!(decoded.content, Content::Users(vec!["alice".into(), "bob".into()]));
    }

    #[test]
    fn test_decode_malformed() {
        assert!(decode("not json").is_err());
        assert!(decode(r#"{"type":"private_message","content":42}"#).is_err());
    }

    #[test]
    fn test_message_too_large() {
        let message = ChatMessage::private("alice", "bob", "x".repeat(MAX_MESSAGE_SIZE + 1));
        match encode(&message) {
            Err(ProtocolError::MessageTooLarge(_)) => {}
            other => panic!("Expected MessageTooLarge error, got {:?}", other),
        }

        let oversized = format!(
            r#"{{"type":"private_message","content":"{}"}}"#,
            "x".repeat(MAX_MESSAGE_SIZE)
        );
        assert!(matches!(
            decode(&oversized),
            Err(ProtocolError::MessageTooLarge(_))
        ));
    }

    #[test]
    fn test_decode_into_resets_on_error() {
        let mut slot = ChatMessage::private("alice", "bob", "old");
        assert!(decode_into("not json", &mut slot).is_err());
        assert_eq!(slot, ChatMessage::default());

        decode_into(r#"{"type":"join_group","content":"g1","sender":"a"}"#, &mut slot).unwrap();
        assert_eq!(slot.kind, MessageKind::JoinGroup);
    }
}
