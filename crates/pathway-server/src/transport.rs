//! Message transport seen by a session.
//!
//! [`Transport`] is the narrow surface the session loop needs: receive the
//! next frame, send one binary frame, close. [`WsTransport`] adapts an axum
//! [`WebSocket`]; tests drive sessions through an in-memory channel instead.

use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use bytes::Bytes;

use crate::errors::TransportError;

/// One inbound unit as the session sees it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Frame {
    /// A data message (binary or text) carrying a command.
    Data(Bytes),
    /// Ping/pong, answered by the WebSocket layer.
    Control,
    /// The peer closed the connection or the stream ended.
    Close,
}

/// Bidirectional message channel to one client.
#[async_trait]
pub trait Transport: Send {
    /// Wait for the next inbound frame.
    async fn recv(&mut self) -> Result<Frame, TransportError>;

    /// Write one binary frame.
    async fn send(&mut self, payload: Bytes) -> Result<(), TransportError>;

    /// Start the closing handshake.
    async fn close(&mut self) -> Result<(), TransportError>;
}

/// [`Transport`] over an upgraded axum WebSocket.
pub struct WsTransport {
    socket: WebSocket,
}

impl WsTransport {
    /// Wrap an upgraded socket.
    pub fn new(socket: WebSocket) -> Self {
        Self { socket }
    }
}

#[async_trait]
impl Transport for WsTransport {
    async fn recv(&mut self) -> Result<Frame, TransportError> {
        match self.socket.recv().await {
            None | Some(Ok(Message::Close(_))) => Ok(Frame::Close),
            Some(Ok(Message::Binary(data))) => Ok(Frame::Data(data)),
            Some(Ok(Message::Text(text))) => {
                Ok(Frame::Data(Bytes::copy_from_slice(text.as_str().as_bytes())))
            }
            Some(Ok(Message::Ping(_) | Message::Pong(_))) => Ok(Frame::Control),
            Some(Err(error)) => Err(TransportError::WebSocket(error)),
        }
    }

    async fn send(&mut self, payload: Bytes) -> Result<(), TransportError> {
        self.socket
            .send(Message::Binary(payload))
            .await
            .map_err(TransportError::from)
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.socket
            .send(Message::Close(None))
            .await
            .map_err(TransportError::from)
    }
}
