//! Settings error types.

use thiserror::Error;

/// Why the file layer or a resolved value was refused.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// `settings.json` exists but could not be read.
    #[error("cannot read pathway settings file: {0}")]
    Io(#[from] std::io::Error),
    /// `settings.json` is not valid JSON or does not match the schema.
    #[error("malformed pathway settings file: {0}")]
    Json(#[from] serde_json::Error),
    /// The merged settings break a constraint checked by
    /// [`PathwaySettings::validate`](crate::PathwaySettings::validate).
    #[error("rejected pathway setting: {0}")]
    InvalidValue(String),
}

/// Result alias for settings loading.
pub type Result<T> = std::result::Result<T, SettingsError>;
