//! Live event feed definitions.
//!
//! The transport pushes these over an unbounded mpsc channel; the live
//! event bridge consumes them and routes the relevant ones into the active
//! message window and the channel state cache.

use crate::domain::connection::SessionStatus;
use crate::domain::entities::{ChannelId, Message, MessageId};

/// Event emitted by the transport client.
#[derive(Debug, Clone)]
pub enum ClientEvent {
    /// A message was created.
    MessageCreate {
        /// The new message.
        message: Message,
    },
    /// A message was deleted.
    MessageDelete {
        /// Identifier of the deleted message.
        message_id: MessageId,
        /// Channel the message belonged to.
        channel_id: ChannelId,
    },
    /// The transport session changed state.
    SessionStatusChanged {
        /// New session status.
        status: SessionStatus,
    },
}
