//! Session and transport error types.

use std::time::Duration;

use pathway_search::SearchError;
use thiserror::Error;

use crate::session::SessionState;

/// Failures of the underlying message transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The WebSocket layer reported an error.
    #[error("websocket error: {0}")]
    WebSocket(#[from] axum::Error),
    /// The peer vanished without a closing handshake.
    #[error("connection reset by peer")]
    Reset,
}

/// Errors that end a session.
///
/// None of these escape the session task; the server logs them and drops
/// the connection.
#[derive(Debug, Error)]
pub enum SessionError {
    /// A read or write failed for a reason other than a graceful close.
    #[error("transport failed while {stage}: {source}")]
    Transport {
        /// State the session was in when the fault occurred.
        stage: SessionState,
        /// Underlying transport failure.
        #[source]
        source: TransportError,
    },
    /// The path-search engine rejected an operation the session had validated.
    #[error("path-search engine fault: {0}")]
    Engine(#[from] SearchError),
    /// Every `u32` node ID is in use.
    #[error("node id space exhausted")]
    IdsExhausted,
    /// The client sent nothing within the idle timeout.
    #[error("no message from client for {0:?}")]
    IdleTimeout(Duration),
}

impl SessionError {
    /// Metric label.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport { .. } => "transport",
            Self::Engine(_) => "engine",
            Self::IdsExhausted => "ids_exhausted",
            Self::IdleTimeout(_) => "idle_timeout",
        }
    }
}

/// Result type for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;
