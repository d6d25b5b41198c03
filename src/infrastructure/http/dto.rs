//! Wire DTOs for the message history API.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::domain::entities::{Masquerade, Message, MessageId};

/// Masquerade payload.
#[derive(Debug, Deserialize)]
pub struct MasqueradeResponse {
    /// Override display name.
    pub name: Option<String>,
    /// Override avatar URL.
    pub avatar: Option<String>,
}

/// One message as returned by the history endpoint.
#[derive(Debug, Deserialize)]
pub struct MessageResponse {
    /// Message identifier (lexically sortable).
    #[serde(rename = "_id")]
    pub id: String,
    /// Channel identifier.
    pub channel: String,
    /// Author identifier.
    pub author: String,
    /// Message text.
    #[serde(default)]
    pub content: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Identifiers of messages this one replies to.
    #[serde(default)]
    pub replies: Vec<String>,
    /// Display override, if any.
    pub masquerade: Option<MasqueradeResponse>,
    /// Whether this is a system message.
    #[serde(default)]
    pub system: bool,
    /// Client-assigned idempotency token.
    pub nonce: Option<String>,
}

impl From<MessageResponse> for Message {
    fn from(response: MessageResponse) -> Self {
        let mut message = Self::new(
            response.id,
            response.channel,
            response.author,
            response.content,
            response.created_at,
        );
        if !response.replies.is_empty() {
            message =
                message.with_reply_ids(response.replies.into_iter().map(MessageId::from).collect());
        }
        if let Some(masquerade) = response.masquerade {
            message = message.with_masquerade(Masquerade::new(masquerade.name, masquerade.avatar));
        }
        if response.system {
            message = message.as_system();
        }
        if let Some(nonce) = response.nonce {
            message = message.with_nonce(nonce);
        }
        message
    }
}

/// Error payload returned on non-success statuses.
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable error description.
    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_response_maps_to_domain() {
        let json = r#"{
            "_id": "01HXC4",
            "channel": "01CHAN",
            "author": "01USER",
            "content": "hello",
            "created_at": "2024-06-01T12:00:00Z",
            "replies": ["01HXC0"],
            "masquerade": { "name": "Bridge", "avatar": null },
            "nonce": "abc"
        }"#;

        let response: MessageResponse = serde_json::from_str(json).unwrap();
        let message = Message::from(response);

        assert_eq!(message.id().as_str(), "01HXC4");
        assert_eq!(message.channel_id().as_str(), "01CHAN");
        assert!(message.is_reply());
        assert!(!message.is_system());
        assert_eq!(message.masquerade().unwrap().name(), Some("Bridge"));
        assert_eq!(message.nonce(), Some("abc"));
    }

    #[test]
    fn test_optional_fields_default() {
        let json = r#"{
            "_id": "01HXC4",
            "channel": "01CHAN",
            "author": "01USER",
            "created_at": "2024-06-01T12:00:00Z"
        }"#;

        let response: MessageResponse = serde_json::from_str(json).unwrap();
        let message = Message::from(response);

        assert_eq!(message.content(), "");
        assert!(!message.is_reply());
        assert!(message.masquerade().is_none());
    }
}
