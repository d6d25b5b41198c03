//! Domain layer with core business entities and port definitions.

/// Session status definitions.
pub mod connection;
/// Entity definitions.
pub mod entities;
/// Error types.
pub mod errors;
/// Port definitions.
pub mod ports;

pub use connection::SessionStatus;
pub use entities::{
    Channel, ChannelId, Masquerade, Message, MessageId, ReadState, RelationshipState,
    RelationshipStatus, UserId,
};
pub use errors::FetchError;
pub use ports::{ClientEvent, MessageHistoryPort, MessagePage, MessageQuery, MessageSort};
