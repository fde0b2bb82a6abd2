//! Notifications the client core hands to the rest of the application.
//!
//! The core never calls into UI or an event bus directly. Everything it wants
//! to announce is pushed as a [`ClientEvent`] and drained by the host after
//! each tick.

use crate::chat::ChatMessage;
use crate::lifecycle::KickReason;

/// Something happened that other systems may want to react to.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// A player entity materialized from a snapshot.
    PlayerJoined { id: i32 },
    /// The server reported a player leaving.
    PlayerLeft { id: i32 },
    /// The wave counter increased.
    WaveChanged { wave: i32 },
    /// The first world load of this process completed.
    ServerJoined,
    /// Map objectives were replaced; stale markers should be cleared.
    ObjectivesReplaced,
    /// A chat line is ready for display.
    ChatReceived(ChatMessage),
    /// Raw text to show above an entity's head.
    ChatBubble { entity: i32, text: String },
    /// A user-facing message.
    Notice(Notice),
}

/// User-facing messages and loading-screen changes.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    /// World data is downloading. The user may cancel.
    LoadingWorld,
    /// The loading screen can be dismissed.
    LoadingDone,
    /// The connection ended. A reconnect is always offered.
    Disconnected { title: DisconnectTitle },
    /// The server kicked us with a known reason.
    Kicked { reason: KickReason },
    /// The server kicked us with free text. A reconnect is always offered.
    KickedWithText { text: String },
    /// A session-fatal error.
    Error(ErrorNotice),
}

/// Session-fatal conditions shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorNotice {
    /// No device identifier is available for the handshake.
    InvalidId,
    /// World data did not arrive in time.
    DataTimeout,
    /// World data arrived but could not be loaded.
    WorldLoadFailed,
}

/// Dialog title for a transport-level disconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectTitle {
    /// Local close, no reason given.
    Generic,
    /// The peer closed the connection.
    Closed,
    /// The connection timed out.
    Timeout,
    /// Any other reason.
    Error,
}

impl DisconnectTitle {
    /// Map a transport reason string to a title.
    pub fn from_reason(reason: Option<&str>) -> Self {
        match reason {
            None => Self::Generic,
            Some("closed") => Self::Closed,
            Some("timeout") => Self::Timeout,
            Some(_) => Self::Error,
        }
    }

    /// Localization key for the title.
    pub fn key(self) -> &'static str {
        match self {
            Self::Generic => "disconnect",
            Self::Closed => "disconnect.closed",
            Self::Timeout => "disconnect.timeout",
            Self::Error => "disconnect.error",
        }
    }
}

impl ErrorNotice {
    pub fn key(self) -> &'static str {
        match self {
            Self::InvalidId => "invalidid",
            Self::DataTimeout => "disconnect.data",
            Self::WorldLoadFailed => "disconnect.worldload",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disconnect_titles_are_distinct() {
        let timeout = DisconnectTitle::from_reason(Some("timeout"));
        let closed = DisconnectTitle::from_reason(Some("closed"));
        let other = DisconnectTitle::from_reason(Some("reset by peer"));
        let none = DisconnectTitle::from_reason(None);

        assert_eq!(timeout.key(), "disconnect.timeout");
        assert_eq!(closed.key(), "disconnect.closed");
        assert_eq!(other.key(), "disconnect.error");
        assert_eq!(none.key(), "disconnect");
        assert_ne!(timeout, closed);
        assert_ne!(timeout, other);
    }
}
