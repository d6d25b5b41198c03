//! Message history port definition.

use async_trait::async_trait;

use crate::domain::entities::{ChannelId, Message, MessageId};
use crate::domain::errors::FetchError;

/// Sort order for a history page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MessageSort {
    /// Newest messages first.
    #[default]
    Latest,
    /// Oldest messages first; used with `after` pagination.
    Oldest,
}

/// Query parameters for one history page.
#[derive(Debug, Clone, Default)]
pub struct MessageQuery {
    /// Maximum number of messages to return.
    pub limit: u8,
    /// Only messages strictly older than this identifier.
    pub before: Option<MessageId>,
    /// Only messages strictly newer than this identifier.
    pub after: Option<MessageId>,
    /// Center the page around this identifier.
    pub nearby: Option<MessageId>,
    /// Sort order, meaningful when paired with `after`.
    pub sort: Option<MessageSort>,
}

impl MessageQuery {
    /// Creates a query for the newest `limit` messages.
    #[must_use]
    pub fn latest(limit: u8) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    /// Restricts to messages older than the given identifier.
    #[must_use]
    pub fn before_message(mut self, id: MessageId) -> Self {
        self.before = Some(id);
        self
    }

    /// Restricts to messages newer than the given identifier.
    #[must_use]
    pub fn after_message(mut self, id: MessageId) -> Self {
        self.after = Some(id);
        self
    }

    /// Centers the page around the given identifier.
    #[must_use]
    pub fn nearby_message(mut self, id: MessageId) -> Self {
        self.nearby = Some(id);
        self
    }

    /// Sets the sort order.
    #[must_use]
    pub const fn sorted(mut self, sort: MessageSort) -> Self {
        self.sort = Some(sort);
        self
    }
}

/// One page of fetched messages.
#[derive(Debug, Clone, Default)]
pub struct MessagePage {
    /// Messages in the order the server returned them.
    pub messages: Vec<Message>,
}

impl MessagePage {
    /// Number of messages in the page.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns true if the page is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Port for fetching paginated channel history from the transport.
#[async_trait]
pub trait MessageHistoryPort: Send + Sync {
    /// Fetches one page of messages for a channel.
    async fn fetch_messages(
        &self,
        channel_id: &ChannelId,
        query: MessageQuery,
    ) -> Result<MessagePage, FetchError>;
}
