//! Read state entity.

use serde::{Deserialize, Serialize};

use super::{ChannelId, MessageId};

/// Read state for a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadState {
    /// Channel ID.
    pub channel_id: ChannelId,
    /// ID of the last read message; everything newer is unread.
    pub last_read_id: Option<MessageId>,
}

impl ReadState {
    /// Creates a new read state.
    #[must_use]
    pub fn new(channel_id: ChannelId, last_read_id: Option<MessageId>) -> Self {
        Self {
            channel_id,
            last_read_id,
        }
    }
}
