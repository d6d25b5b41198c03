//! Persistent per-channel window state cache.
//!
//! When a channel view unmounts mid-session its window is archived here so
//! revisiting the channel resumes instantly without a refetch. Entries are
//! consumed exactly once and the whole cache is dropped when a brand-new
//! transport session is established, since resumed history can no longer be
//! trusted to be gap-free.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::entities::{ChannelId, Message, MessageId};

/// Archived entries at the live edge keep receiving inserts, capped so
/// idle cached channels stay small.
const CACHED_LIVE_LIMIT: usize = 50;

/// Snapshot of one channel's message window.
#[derive(Debug, Clone)]
pub struct ChannelState {
    /// Loaded messages, newest first.
    pub messages: Vec<Message>,
    /// Whether the window had reached the start of history.
    pub at_start: bool,
    /// Whether the window was at the live edge.
    pub at_end: bool,
    /// Last scroll offset, for restoring non-live windows.
    pub scroll_offset: Option<f64>,
}

/// Map from channel identifier to its last-known window snapshot.
///
/// Cheap to clone; all clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct ChannelStateCache {
    inner: Arc<Mutex<HashMap<ChannelId, ChannelState>>>,
}

impl ChannelStateCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a snapshot, overwriting any prior entry for the channel.
    pub fn manage(&self, channel_id: ChannelId, state: ChannelState) {
        self.inner.lock().insert(channel_id, state);
    }

    /// Removes and returns the entry for a channel.
    ///
    /// Strict one-time consumption: a second call for the same channel
    /// returns `None`.
    pub fn unmanage(&self, channel_id: &ChannelId) -> Option<ChannelState> {
        self.inner.lock().remove(channel_id)
    }

    /// Drops every cached entry. Called when the transport establishes a
    /// brand-new authoritative session.
    pub fn clear_all(&self) {
        self.inner.lock().clear();
    }

    /// Number of cached channels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Returns true if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Applies a live insert to the archived entry for the message's
    /// channel, if it was cached at the live edge.
    pub fn apply_live_insert(&self, message: &Message) {
        let mut inner = self.inner.lock();
        if let Some(entry) = inner.get_mut(message.channel_id())
            && entry.at_end
        {
            entry.messages.insert(0, message.clone());
            entry.messages.truncate(CACHED_LIVE_LIMIT);
        }
    }

    /// Removes a deleted message from the archived entry, if present.
    pub fn apply_live_delete(&self, channel_id: &ChannelId, message_id: &MessageId) {
        let mut inner = self.inner.lock();
        if let Some(entry) = inner.get_mut(channel_id) {
            entry.messages.retain(|msg| msg.id() != message_id);
        }
    }
}
