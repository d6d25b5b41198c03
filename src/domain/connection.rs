/// Transport session status.
///
/// `Connected` is only emitted when a brand-new authoritative session has
/// been established (not a transient resume), which is the signal to drop
/// all cached channel windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
}

impl SessionStatus {
    #[must_use]
    pub const fn is_connected(self) -> bool {
        matches!(self, Self::Connected)
    }
}
