use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ChannelId, UserId};

/// Unique identifier for a message.
///
/// Identifiers are lexically sortable strings (ULID-style): ascending
/// identifier order equals chronological order. All window ordering relies
/// on this property.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MessageId(String);

impl MessageId {
    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for MessageId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for MessageId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

/// Per-message display override (name and/or avatar).
///
/// A change in masquerade between neighboring messages is treated as a
/// change of author when grouping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct Masquerade {
    name: Option<String>,
    avatar: Option<String>,
}

#[allow(missing_docs)]
impl Masquerade {
    #[must_use]
    pub fn new(name: Option<String>, avatar: Option<String>) -> Self {
        Self { name, avatar }
    }

    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            avatar: None,
        }
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[must_use]
    pub fn avatar(&self) -> Option<&str> {
        self.avatar.as_deref()
    }
}

/// Chat message entity.
///
/// Read-only to the synchronization core; constructed by the transport
/// adapter (or tests) and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct Message {
    id: MessageId,
    channel_id: ChannelId,
    author_id: UserId,
    content: String,
    created_at: DateTime<Utc>,
    #[serde(default)]
    reply_ids: Vec<MessageId>,
    masquerade: Option<Masquerade>,
    #[serde(default)]
    system: bool,
    nonce: Option<String>,
}

#[allow(missing_docs)]
impl Message {
    #[must_use]
    pub fn new(
        id: impl Into<MessageId>,
        channel_id: impl Into<ChannelId>,
        author_id: impl Into<UserId>,
        content: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            channel_id: channel_id.into(),
            author_id: author_id.into(),
            content: content.into(),
            created_at,
            reply_ids: Vec::new(),
            masquerade: None,
            system: false,
            nonce: None,
        }
    }

    #[must_use]
    pub fn with_reply_ids(mut self, reply_ids: Vec<MessageId>) -> Self {
        self.reply_ids = reply_ids;
        self
    }

    #[must_use]
    pub fn with_masquerade(mut self, masquerade: Masquerade) -> Self {
        self.masquerade = Some(masquerade);
        self
    }

    #[must_use]
    pub const fn as_system(mut self) -> Self {
        self.system = true;
        self
    }

    #[must_use]
    pub fn with_nonce(mut self, nonce: impl Into<String>) -> Self {
        self.nonce = Some(nonce.into());
        self
    }

    #[must_use]
    pub const fn id(&self) -> &MessageId {
        &self.id
    }

    #[must_use]
    pub const fn channel_id(&self) -> &ChannelId {
        &self.channel_id
    }

    #[must_use]
    pub const fn author_id(&self) -> &UserId {
        &self.author_id
    }

    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn reply_ids(&self) -> &[MessageId] {
        &self.reply_ids
    }

    #[must_use]
    pub const fn masquerade(&self) -> Option<&Masquerade> {
        self.masquerade.as_ref()
    }

    #[must_use]
    pub const fn is_system(&self) -> bool {
        self.system
    }

    #[must_use]
    pub fn is_reply(&self) -> bool {
        !self.reply_ids.is_empty()
    }

    #[must_use]
    pub fn nonce(&self) -> Option<&str> {
        self.nonce.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_id_ordering_is_lexical() {
        let older = MessageId::from("01AAA");
        let newer = MessageId::from("01AAB");
        assert!(older < newer);
    }

    #[test]
    fn test_message_builder() {
        let message = Message::new("01A", "chan", "user", "hello", Utc::now())
            .with_reply_ids(vec![MessageId::from("019")])
            .with_nonce("abc123");

        assert_eq!(message.id().as_str(), "01A");
        assert!(message.is_reply());
        assert!(!message.is_system());
        assert_eq!(message.nonce(), Some("abc123"));
    }

    #[test]
    fn test_masquerade_equality() {
        let a = Masquerade::named("Bridge");
        let b = Masquerade::named("Bridge");
        let c = Masquerade::named("Webhook");

        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
