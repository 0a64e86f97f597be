//! Client → server commands.

use bytes::Bytes;
use prost::Message;

use crate::errors::Result;
use crate::schema::{self, to_server_command};

/// A decoded client request.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Command {
    /// Place a waypoint at `(x, y)`.
    AddNode {
        /// Horizontal coordinate.
        x: f32,
        /// Vertical coordinate.
        y: f32,
    },
    /// Delete waypoint `id`.
    RemoveNode {
        /// Node ID.
        id: u32,
    },
    /// Connect `id1` and `id2`.
    AddConnection {
        /// First endpoint.
        id1: u32,
        /// Second endpoint.
        id2: u32,
    },
    /// Disconnect `id1` and `id2`.
    RemoveConnection {
        /// First endpoint.
        id1: u32,
        /// Second endpoint.
        id2: u32,
    },
    /// Shortest path from `start` to `goal`.
    FindPath {
        /// Start node ID.
        start: u32,
        /// Goal node ID.
        goal: u32,
    },
    /// The envelope carried no command.
    Unset,
}

impl Command {
    /// Decode one frame payload.
    ///
    /// An envelope with no variant set decodes to [`Command::Unset`]; only
    /// malformed protobuf is an error.
    pub fn decode(payload: &[u8]) -> Result<Self> {
        let envelope = schema::ToServerCommand::decode(payload)?;
        Ok(envelope.command.map_or(Self::Unset, Self::from))
    }

    /// Encode into a frame payload (used by clients and tests).
    pub fn encode(self) -> Bytes {
        schema::ToServerCommand::from(self).encode_to_vec().into()
    }

    /// Stable lowercase name for logs and metric labels.
    pub fn name(&self) -> &'static str {
        match self {
            Self::AddNode { .. } => "add_node",
            Self::RemoveNode { .. } => "remove_node",
            Self::AddConnection { .. } => "add_connection",
            Self::RemoveConnection { .. } => "remove_connection",
            Self::FindPath { .. } => "find_path",
            Self::Unset => "unset",
        }
    }
}

impl From<to_server_command::Command> for Command {
    fn from(command: to_server_command::Command) -> Self {
        use to_server_command::Command as Wire;
        match command {
            Wire::AddNode(m) => Self::AddNode { x: m.x, y: m.y },
            Wire::RemoveNode(m) => Self::RemoveNode { id: m.id },
            Wire::AddConnection(m) => Self::AddConnection {
                id1: m.id1,
                id2: m.id2,
            },
            Wire::RemoveConnection(m) => Self::RemoveConnection {
                id1: m.id1,
                id2: m.id2,
            },
            Wire::FindPath(m) => Self::FindPath {
                start: m.start,
                goal: m.goal,
            },
        }
    }
}

impl From<Command> for schema::ToServerCommand {
    fn from(command: Command) -> Self {
        use to_server_command::Command as Wire;
        let command = match command {
            Command::AddNode { x, y } => Some(Wire::AddNode(schema::AddNode { x, y })),
            Command::RemoveNode { id } => Some(Wire::RemoveNode(schema::RemoveNode { id })),
            Command::AddConnection { id1, id2 } => {
                Some(Wire::AddConnection(schema::AddConnection { id1, id2 }))
            }
            Command::RemoveConnection { id1, id2 } => {
                Some(Wire::RemoveConnection(schema::RemoveConnection { id1, id2 }))
            }
            Command::FindPath { start, goal } => {
                Some(Wire::FindPath(schema::FindPath { start, goal }))
            }
            Command::Unset => None,
        };
        Self { command }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ProtoError;
    use assert_matches::assert_matches;

    #[test]
    fn decode_add_node() {
        let payload = schema::ToServerCommand {
            command: Some(to_server_command::Command::AddNode(schema::AddNode {
                x: 1.5,
                y: 2.5,
            })),
        }
        .encode_to_vec();
        assert_eq!(
            Command::decode(&payload).unwrap(),
            Command::AddNode { x: 1.5, y: 2.5 }
        );
    }

    #[test]
    fn empty_payload_is_unset() {
        assert_eq!(Command::decode(&[]).unwrap(), Command::Unset);
    }

    #[test]
    fn garbage_is_decode_error() {
        assert_matches!(
            Command::decode(&[0xFF, 0xFF, 0xFF]),
            Err(ProtoError::Decode(_))
        );
    }

    #[test]
    fn text_frame_bytes_are_rejected() {
        // A JSON text frame is not a protobuf envelope.
        assert!(Command::decode(br#"{"addNode":{"x":1}}"#).is_err());
    }

    #[test]
    fn unknown_field_is_ignored() {
        // Field 9 (varint 7) is not part of the schema.
        assert_eq!(Command::decode(&[0x48, 0x07]).unwrap(), Command::Unset);
    }

    #[test]
    fn wire_bytes_match_js_client() {
        // `new AddNode().setX(1).setY(2)` wrapped in `ToServerCommand.setAddNode`.
        let bytes = Command::AddNode { x: 1.0, y: 2.0 }.encode();
        assert_eq!(
            bytes.as_ref(),
            &[0x0A, 0x0A, 0x0D, 0x00, 0x00, 0x80, 0x3F, 0x15, 0x00, 0x00, 0x00, 0x40]
        );
    }

    #[test]
    fn encode_unset_is_empty() {
        assert!(Command::Unset.encode().is_empty());
    }

    #[test]
    fn every_command_decodes_back() {
        let commands = [
            Command::RemoveNode { id: 7 },
            Command::AddConnection { id1: 0, id2: 1 },
            Command::RemoveConnection { id1: 4, id2: 2 },
            Command::FindPath { start: 3, goal: 9 },
        ];
        for command in commands {
            assert_eq!(Command::decode(&command.encode()).unwrap(), command);
        }
    }

    #[test]
    fn names_are_snake_case() {
        assert_eq!(Command::AddNode { x: 0.0, y: 0.0 }.name(), "add_node");
        assert_eq!(Command::Unset.name(), "unset");
    }
}
