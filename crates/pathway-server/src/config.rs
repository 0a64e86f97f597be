//! Server configuration.

use std::time::Duration;

use pathway_settings::ServerSettings;
use serde::{Deserialize, Serialize};

/// Token advertised in the `Server` header of the upgrade response.
pub const DEFAULT_SERVER_TOKEN: &str = "pathfinding-websockets";

/// Runtime configuration for [`PathwayServer`](crate::server::PathwayServer).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind (default `"127.0.0.1"`).
    pub host: String,
    /// Port to bind (default `0` for auto-assign).
    pub port: u16,
    /// Largest accepted WebSocket message in bytes.
    pub max_message_size: usize,
    /// `Server` header value on upgrade responses.
    pub server_token: String,
    /// How long a session waits for the next client message.
    pub idle_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 0,
            max_message_size: 64 * 1024,
            server_token: DEFAULT_SERVER_TOKEN.into(),
            idle_timeout: crate::session::DEFAULT_IDLE_TIMEOUT,
        }
    }
}

impl From<&ServerSettings> for ServerConfig {
    fn from(settings: &ServerSettings) -> Self {
        Self {
            host: settings.host.clone(),
            port: settings.port,
            max_message_size: settings.max_message_size,
            server_token: settings.server_token.clone(),
            idle_timeout: Duration::from_secs(settings.idle_timeout_secs),
        }
    }
}

impl ServerConfig {
    /// `host:port` for binding.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
