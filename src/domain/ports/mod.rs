//! Port definitions for external dependencies.

mod event_port;
mod history_port;

pub use event_port::ClientEvent;
pub use history_port::{MessageHistoryPort, MessagePage, MessageQuery, MessageSort};
