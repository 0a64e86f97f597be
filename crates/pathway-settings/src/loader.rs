//! Settings loading: compiled defaults, then the JSON file, then `PATHWAY_*`
//! environment variables.
//!
//! The file is deep-merged over the defaults: objects merge per key, arrays
//! and primitives replace, `null` leaves the default in place.

use std::fmt;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::errors::Result;
use crate::types::{LogLevel, PathwaySettings};

/// Environment variable names recognised by [`apply_env_overrides`].
pub mod env {
    /// Bind address.
    pub const HOST: &str = "PATHWAY_HOST";
    /// Bind port.
    pub const PORT: &str = "PATHWAY_PORT";
    /// Runtime worker threads.
    pub const THREADS: &str = "PATHWAY_THREADS";
    /// Maximum inbound message size in bytes.
    pub const MAX_MESSAGE_SIZE: &str = "PATHWAY_MAX_MESSAGE_SIZE";
    /// Session idle timeout in seconds.
    pub const IDLE_TIMEOUT_SECS: &str = "PATHWAY_IDLE_TIMEOUT_SECS";
    /// Default log level.
    pub const LOG_LEVEL: &str = "PATHWAY_LOG_LEVEL";
    /// JSON log output toggle.
    pub const LOG_JSON: &str = "PATHWAY_LOG_JSON";
}

const MAX_THREADS: usize = 256;
const MAX_MESSAGE_BYTES: usize = 16 * 1024 * 1024;
const MAX_IDLE_TIMEOUT_SECS: u64 = 24 * 60 * 60;

/// A `PATHWAY_*` variable that was set but could not be used.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RejectedVar {
    /// Variable name.
    pub key: &'static str,
    /// Raw value as found in the environment.
    pub value: String,
}

impl fmt::Display for RejectedVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={:?}", self.key, self.value)
    }
}

/// Settings resolved from the file and environment layers.
///
/// Not yet validated: the caller applies its own overrides first, then
/// calls [`PathwaySettings::validate`].
#[derive(Clone, Debug, PartialEq)]
pub struct LoadedSettings {
    /// The merged settings.
    pub settings: PathwaySettings,
    /// Environment overrides that were skipped. Loading usually happens
    /// before logging is up, so the caller reports these.
    pub rejected: Vec<RejectedVar>,
}

/// Resolve the default settings file (`~/.pathway/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".pathway").join("settings.json")
}

/// Load settings from `path` with overrides from the process environment.
///
/// A missing file yields the defaults. Unparseable JSON is an error.
pub fn load_settings_from_path(path: &Path) -> Result<LoadedSettings> {
    load_settings_with_env(path, |name| std::env::var(name).ok())
}

/// Load settings from `path`, reading overrides through `lookup`.
pub fn load_settings_with_env<F>(path: &Path, lookup: F) -> Result<LoadedSettings>
where
    F: Fn(&str) -> Option<String>,
{
    let mut settings = read_file_layer(path)?;
    let rejected = apply_env_overrides(&mut settings, lookup);
    Ok(LoadedSettings { settings, rejected })
}

fn read_file_layer(path: &Path) -> Result<PathwaySettings> {
    if !path.exists() {
        debug!(?path, "settings file not found, using defaults");
        return Ok(PathwaySettings::default());
    }
    debug!(?path, "loading settings from file");
    let content = std::fs::read_to_string(path)?;
    let user: Value = serde_json::from_str(&content)?;
    let defaults = serde_json::to_value(PathwaySettings::default())?;
    Ok(serde_json::from_value(deep_merge(defaults, user))?)
}

/// Recursive deep merge of `source` over `target`.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut merged), Value::Object(overrides)) => {
            for (key, value) in overrides {
                if value.is_null() {
                    continue;
                }
                let next = match merged.remove(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => value,
                };
                let _ = merged.insert(key, next);
            }
            Value::Object(merged)
        }
        (_, source) => source,
    }
}

/// Apply `PATHWAY_*` overrides, reading each variable through `lookup`.
///
/// Unset or empty variables are skipped. Values that fail to parse or fall
/// outside their range leave the setting alone and are returned.
pub fn apply_env_overrides<F>(settings: &mut PathwaySettings, lookup: F) -> Vec<RejectedVar>
where
    F: Fn(&str) -> Option<String>,
{
    let read = |name: &str| lookup(name).filter(|v| !v.is_empty());
    let mut rejected = Vec::new();
    let mut reject = |key: &'static str, value: String| rejected.push(RejectedVar { key, value });

    if let Some(v) = read(env::HOST) {
        settings.server.host = v;
    }
    if let Some(v) = read(env::PORT) {
        match parse_u16_range(&v, 0, u16::MAX) {
            Some(port) => settings.server.port = port,
            None => reject(env::PORT, v),
        }
    }
    if let Some(v) = read(env::THREADS) {
        match parse_usize_range(&v, 1, MAX_THREADS) {
            Some(threads) => settings.server.threads = threads,
            None => reject(env::THREADS, v),
        }
    }
    if let Some(v) = read(env::MAX_MESSAGE_SIZE) {
        match parse_usize_range(&v, 1, MAX_MESSAGE_BYTES) {
            Some(size) => settings.server.max_message_size = size,
            None => reject(env::MAX_MESSAGE_SIZE, v),
        }
    }
    if let Some(v) = read(env::IDLE_TIMEOUT_SECS) {
        match parse_u64_range(&v, 1, MAX_IDLE_TIMEOUT_SECS) {
            Some(secs) => settings.server.idle_timeout_secs = secs,
            None => reject(env::IDLE_TIMEOUT_SECS, v),
        }
    }
    if let Some(v) = read(env::LOG_LEVEL) {
        match parse_log_level(&v) {
            Some(level) => settings.logging.level = level,
            None => reject(env::LOG_LEVEL, v),
        }
    }
    if let Some(v) = read(env::LOG_JSON) {
        match parse_bool(&v) {
            Some(json) => settings.logging.json = json,
            None => reject(env::LOG_JSON, v),
        }
    }
    rejected
}

/// Parse a boolean: `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`,
/// case-insensitive.
pub fn parse_bool(val: &str) -> Option<bool> {
    match val.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a `u16` within `min..=max`.
pub fn parse_u16_range(val: &str, min: u16, max: u16) -> Option<u16> {
    let n: u16 = val.trim().parse().ok()?;
    (min..=max).contains(&n).then_some(n)
}

/// Parse a `usize` within `min..=max`.
pub fn parse_usize_range(val: &str, min: usize, max: usize) -> Option<usize> {
    let n: usize = val.trim().parse().ok()?;
    (min..=max).contains(&n).then_some(n)
}

/// Parse a `u64` within `min..=max`.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.trim().parse().ok()?;
    (min..=max).contains(&n).then_some(n)
}

/// Parse a log level name, case-insensitive.
pub fn parse_log_level(val: &str) -> Option<LogLevel> {
    let lower = val.trim().to_ascii_lowercase();
    serde_json::from_value(Value::String(lower)).ok()
}
