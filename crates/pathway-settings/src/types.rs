//! Settings type definitions.
//!
//! Field names are camelCase in JSON. Every section is `#[serde(default)]`,
//! so a settings file only needs the keys it overrides.

use serde::{Deserialize, Serialize};

/// Root settings type.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PathwaySettings {
    /// Network and runtime settings.
    pub server: ServerSettings,
    /// Log output settings.
    pub logging: LoggingSettings,
}

impl PathwaySettings {
    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> crate::Result<()> {
        if self.server.threads == 0 {
            return Err(crate::SettingsError::InvalidValue(
                "server.threads must be at least 1".into(),
            ));
        }
        if self.server.max_message_size == 0 {
            return Err(crate::SettingsError::InvalidValue(
                "server.maxMessageSize must be positive".into(),
            ));
        }
        if self.server.idle_timeout_secs == 0 {
            return Err(crate::SettingsError::InvalidValue(
                "server.idleTimeoutSecs must be at least 1".into(),
            ));
        }
        if self.server.server_token.is_empty() {
            return Err(crate::SettingsError::InvalidValue(
                "server.serverToken must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// Server network and runtime settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    /// Bind address.
    pub host: String,
    /// Bind port (`0` auto-assigns).
    pub port: u16,
    /// Tokio worker threads.
    pub threads: usize,
    /// Largest accepted WebSocket message in bytes.
    pub max_message_size: usize,
    /// Value of the `Server` header on the upgrade response.
    pub server_token: String,
    /// Seconds a session may wait for the next client message before it is
    /// closed.
    pub idle_timeout_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8888,
            threads: 1,
            max_message_size: 64 * 1024,
            server_token: "pathfinding-websockets".to_string(),
            idle_timeout_secs: 300,
        }
    }
}

/// Log severity threshold.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace-level (most verbose).
    Trace,
    /// Debug-level.
    Debug,
    /// Info-level (default).
    #[default]
    Info,
    /// Warning-level.
    Warn,
    /// Error-level.
    Error,
}

impl LogLevel {
    /// Convert to a tracing filter string.
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Logging configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Default level when `RUST_LOG` is unset.
    pub level: LogLevel,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}
