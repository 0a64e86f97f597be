//! Session lifecycle states.

use std::fmt;

/// Where a session is in its read → dispatch → write cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Waiting for the WebSocket upgrade to complete.
    Handshaking,
    /// Waiting for the next inbound message.
    Reading,
    /// Decoding and applying a command.
    Dispatching,
    /// Flushing queued events.
    Writing,
    /// Terminal.
    Closed,
}

impl SessionState {
    /// Lowercase name for logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Handshaking => "handshaking",
            Self::Reading => "reading",
            Self::Dispatching => "dispatching",
            Self::Writing => "writing",
            Self::Closed => "closed",
        }
    }

    /// Whether moving from `self` to `next` is a legal transition.
    pub fn can_transition_to(self, next: Self) -> bool {
        use SessionState::{Closed, Dispatching, Handshaking, Reading, Writing};
        matches!(
            (self, next),
            (Handshaking | Dispatching | Writing, Reading)
                | (Reading, Dispatching)
                | (Dispatching, Writing)
                | (Handshaking | Reading | Dispatching | Writing, Closed)
        )
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
