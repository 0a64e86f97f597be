//! # pathway-settings
//!
//! Layered configuration for the Pathway server.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`PathwaySettings::default()`]
//! 2. **User file**: `~/.pathway/settings.json` (deep-merged over defaults)
//! 3. **Environment variables**: `PATHWAY_*` overrides (highest priority)
//!
//! Command-line flags are applied on top by the binary.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{
    LoadedSettings, RejectedVar, deep_merge, load_settings_from_path,
    load_settings_with_env, settings_path,
};
pub use types::*;
