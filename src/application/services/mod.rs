//! Stateful services: the channel cache, the entry projector, and the
//! live event bridge.

pub mod channel_state_cache;
pub mod entry_projector;
pub mod live_event_bridge;

pub use channel_state_cache::{ChannelState, ChannelStateCache};
pub use entry_projector::{EntryProjector, ListEntry, TAIL_BREAK_MS};
pub use live_event_bridge::LiveEventBridge;
