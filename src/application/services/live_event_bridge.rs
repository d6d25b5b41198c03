//! Routing of live transport events into the window and the cache.
//!
//! The bridge owns the receiving end of the transport's event feed. At
//! most one message window is attached at a time (the currently mounted
//! channel view); archived channels keep receiving maintenance through
//! the channel state cache.

use tokio::sync::mpsc;
use tracing::{debug, info};

use super::channel_state_cache::ChannelStateCache;
use crate::application::window::MessageWindow;
use crate::domain::ports::ClientEvent;
use parking_lot::Mutex;
use std::sync::Arc;

/// Dispatches client events to the active window and the cache.
#[derive(Clone, Default)]
pub struct LiveEventBridge {
    cache: ChannelStateCache,
    active: Arc<Mutex<Option<MessageWindow>>>,
}

impl LiveEventBridge {
    /// Creates a bridge over the given cache.
    #[must_use]
    pub fn new(cache: ChannelStateCache) -> Self {
        Self {
            cache,
            active: Arc::new(Mutex::new(None)),
        }
    }

    /// The cache this bridge maintains.
    #[must_use]
    pub const fn cache(&self) -> &ChannelStateCache {
        &self.cache
    }

    /// Attaches the window of the currently mounted channel view,
    /// replacing any previous one.
    pub fn attach(&self, window: MessageWindow) {
        *self.active.lock() = Some(window);
    }

    /// Detaches the active window, returning it so the caller can archive
    /// it.
    pub fn detach(&self) -> Option<MessageWindow> {
        self.active.lock().take()
    }

    /// Consumes the event feed until the sender side closes.
    pub async fn run(&self, mut events: mpsc::UnboundedReceiver<ClientEvent>) {
        while let Some(event) = events.recv().await {
            self.dispatch(event).await;
        }
        debug!("event feed closed");
    }

    /// Applies a single event.
    pub async fn dispatch(&self, event: ClientEvent) {
        match event {
            ClientEvent::MessageCreate { message } => {
                if let Some(window) = self.active_window() {
                    window.apply_live_insert(message.clone());
                }
                self.cache.apply_live_insert(&message);
            }
            ClientEvent::MessageDelete {
                message_id,
                channel_id,
            } => {
                if let Some(window) = self.active_window() {
                    window.apply_live_delete(&channel_id, &message_id);
                }
                self.cache.apply_live_delete(&channel_id, &message_id);
            }
            ClientEvent::SessionStatusChanged { status } => {
                if status.is_connected() {
                    // A fresh session invalidates every cached window:
                    // history may have changed server-side.
                    info!("new session established, dropping cached channel state");
                    self.cache.clear_all();

                    let window = self.active_window();
                    if let Some(window) = window
                        && window.at_end()
                    {
                        window.initial_load(None, &self.cache).await;
                    }
                }
            }
        }
    }

    fn active_window(&self) -> Option<MessageWindow> {
        self.active.lock().clone()
    }
}
