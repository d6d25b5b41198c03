//! Application layer: the synchronization core built on the domain ports.

/// Stateful services around the window.
pub mod services;
/// The message window itself.
pub mod window;

pub use services::{ChannelState, ChannelStateCache, EntryProjector, ListEntry, LiveEventBridge};
pub use window::{
    FetchDirection, InitialScroll, JumpResult, MessageWindow, PageCommit,
};
