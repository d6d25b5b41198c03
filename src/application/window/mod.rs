//! The message window and its fetch coordination.

mod fetch_guard;
mod message_window;

pub use fetch_guard::{FetchDirection, FetchGuard, PreemptToken};
pub use message_window::{
    DISPLAY_LIMIT, FETCH_LIMIT, INITIAL_FETCH_LIMIT, InitialScroll, JumpResult, MessageWindow,
    PageCommit,
};
