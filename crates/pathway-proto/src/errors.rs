//! Codec error types.

use thiserror::Error;

/// Errors raised while decoding protocol messages.
#[derive(Debug, Error)]
pub enum ProtoError {
    /// The payload is not a valid protobuf message.
    #[error("malformed protobuf payload: {0}")]
    Decode(#[from] prost::DecodeError),
    /// A server message arrived with no variant set.
    #[error("message has no command set")]
    MissingCommand,
}

/// Result type for codec operations.
pub type Result<T> = std::result::Result<T, ProtoError>;
