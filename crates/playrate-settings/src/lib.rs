//! # playrate-settings
//!
//! Persistence and configuration for playrate.
//!
//! - **Store**: the shared key-value [`SettingsStore`] with the
//!   [`MemoryStore`] and file-backed [`JsonFileStore`] backends
//! - **Access**: typed reads ([`load_speed_config`]) and writes
//!   ([`commit_speed`]) over the `videoSpeed`, `perSiteSpeeds` and `settings`
//!   keys
//! - **Runtime config**: [`RuntimeConfig`] loaded from three layers
//!   1. compiled defaults
//!   2. `~/.playrate/config.json` (deep-merged over defaults)
//!   3. `PLAYRATE_*` environment variables

#![deny(unsafe_code)]

pub mod access;
pub mod config;
pub mod errors;
pub mod file;
pub mod loader;
pub mod memory;
pub mod store;

pub use access::{commit_speed, load_global_speed, load_settings, load_speed_config, save_settings};
pub use config::{RuntimeConfig, TimingConfig};
pub use errors::{Result, SettingsError, StoreError};
pub use file::JsonFileStore;
pub use loader::{config_path, deep_merge, load_config, load_config_from_path};
pub use memory::MemoryStore;
pub use store::{PER_SITE_SPEEDS, SETTINGS, SettingsStore, VIDEO_SPEED};
