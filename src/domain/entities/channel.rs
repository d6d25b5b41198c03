use serde::{Deserialize, Serialize};

use super::MessageId;

/// Unique identifier for a channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelId(String);

impl ChannelId {
    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ChannelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ChannelId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ChannelId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

/// Channel entity, reduced to what the message window needs: its identity
/// and the identifier of the newest message the client knows about.
///
/// `last_message_id` is a best-effort hint kept current by live traffic; it
/// decides whether a nearby-centered fetch landed on the live edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    id: ChannelId,
    last_message_id: Option<MessageId>,
}

impl Channel {
    /// Creates a channel with no known newest message.
    #[must_use]
    pub fn new(id: impl Into<ChannelId>) -> Self {
        Self {
            id: id.into(),
            last_message_id: None,
        }
    }

    /// Sets the known newest message identifier.
    #[must_use]
    pub fn with_last_message_id(mut self, id: impl Into<MessageId>) -> Self {
        self.last_message_id = Some(id.into());
        self
    }

    /// Channel identifier.
    #[must_use]
    pub const fn id(&self) -> &ChannelId {
        &self.id
    }

    /// Identifier of the newest message known for this channel, if any.
    #[must_use]
    pub const fn last_message_id(&self) -> Option<&MessageId> {
        self.last_message_id.as_ref()
    }

    /// Records a newer known-latest message identifier.
    ///
    /// Keeps the hint monotonic: an identifier older than the current one
    /// is ignored.
    pub fn note_latest(&mut self, id: &MessageId) {
        match &self.last_message_id {
            Some(current) if current >= id => {}
            _ => self.last_message_id = Some(id.clone()),
        }
    }
}
