//! Domain entity definitions.

mod channel;
mod message;
mod read_state;
mod relationship;
mod user;

pub use channel::{Channel, ChannelId};
pub use message::{Masquerade, Message, MessageId};
pub use read_state::ReadState;
pub use relationship::{RelationshipState, RelationshipStatus};
pub use user::UserId;
